use std::path::PathBuf;

use thiserror::Error;

pub type TranslateResult<T> = Result<T, TranslateError>;

/// Problems with the chart configuration itself. Fatal to the call that hits them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown chart id: {0}")]
    UnknownChart(String),

    #[error("invalid configuration for chart '{chart_id}': {reason}")]
    Invalid { chart_id: String, reason: String },

    #[error("invalid aggregation path '{path}' in chart '{chart_id}': {reason}")]
    InvalidPath {
        chart_id: String,
        path: String,
        reason: String,
    },

    #[error("failed to parse chart configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read chart configuration from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("aggregation shape error at '{path}': {reason}")]
    Shape { path: String, reason: String },

    #[error("unsupported chart type: {0}")]
    UnsupportedChartType(String),

    #[error("failed to parse aggregation response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to export chart: {0}")]
    Export(#[from] csv::Error),
}

impl TranslateError {
    pub(crate) fn shape(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Shape {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
