use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ConfigError;
use crate::ir::ResolvedChart;
use crate::resolve::resolve_chart;

/// Per-chart configuration, deserialized from the chart API config document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub chart_name: String,
    /// Kept raw; validated against `ChartType` when the chart is assembled
    pub chart_type: String,
    pub drill_chart: String,
    /// Default unit symbol, also used for plots synthesized by completion
    pub value_type: String,
    #[serde(default)]
    pub filter_keys: Option<Vec<String>>,
    pub aggregation_paths: Vec<String>,
    /// Path expression (as written) or metric name -> unit symbol; may be `{}`
    pub path_data_type_mapping: IndexMap<String, String>,
    /// Ranking target and name of the `percentage` action's field; may be empty when
    /// neither is configured
    pub plot_label: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub order: Option<Order>,
    #[serde(default)]
    pub action: Option<ChartAction>,
    #[serde(default)]
    pub computed_fields: Vec<ComputedField>,
    #[serde(default)]
    pub plot_keys: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartAction {
    /// Derive `plotLabel` as the first path's metric over the second's, in percent
    Percentage,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComputedField {
    pub name: String,
    pub part: String,
    pub whole: String,
}

impl ChartConfig {
    /// Build a minimal configuration; optional directives start empty.
    pub fn new(
        chart_name: impl Into<String>,
        chart_type: impl Into<String>,
        aggregation_paths: Vec<String>,
    ) -> Self {
        Self {
            chart_name: chart_name.into(),
            chart_type: chart_type.into(),
            drill_chart: "none".to_string(),
            value_type: "number".to_string(),
            filter_keys: None,
            aggregation_paths,
            path_data_type_mapping: IndexMap::new(),
            plot_label: String::new(),
            limit: None,
            order: None,
            action: None,
            computed_fields: Vec::new(),
            plot_keys: Vec::new(),
        }
    }
}

/// Resolves a chart id to its configuration.
pub trait ChartConfigLookup {
    fn chart_config(&self, chart_id: &str) -> Option<&ChartConfig>;

    /// The chart in executable form. Resolves on every call unless the lookup
    /// keeps resolved charts around.
    fn resolved_chart(&self, chart_id: &str) -> Result<Cow<'_, ResolvedChart>, ConfigError> {
        let config = self
            .chart_config(chart_id)
            .ok_or_else(|| ConfigError::UnknownChart(chart_id.to_string()))?;
        resolve_chart(chart_id, config).map(Cow::Owned)
    }
}

impl ChartConfigLookup for HashMap<String, ChartConfig> {
    fn chart_config(&self, chart_id: &str) -> Option<&ChartConfig> {
        self.get(chart_id)
    }
}

/// Immutable snapshot of every chart configuration, resolved once when loaded.
#[derive(Debug, Clone, Default)]
pub struct ChartConfigStore {
    charts: IndexMap<String, LoadedChart>,
}

#[derive(Debug, Clone)]
struct LoadedChart {
    config: ChartConfig,
    resolved: ResolvedChart,
}

impl LoadedChart {
    fn load(chart_id: &str, config: ChartConfig) -> Result<Self, ConfigError> {
        let resolved = resolve_chart(chart_id, &config)?;
        Ok(Self { config, resolved })
    }
}

impl ChartConfigStore {
    /// Parse a document of the form `{ "<chartId>": { ...chart... }, ... }`
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let document: IndexMap<String, Value> = serde_json::from_str(input)?;
        Self::from_document(document)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let document: IndexMap<String, Value> = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    fn from_document(document: IndexMap<String, Value>) -> Result<Self, ConfigError> {
        let mut charts = IndexMap::with_capacity(document.len());
        for (chart_id, raw) in document {
            let config: ChartConfig =
                serde_json::from_value(raw).map_err(|e| ConfigError::Invalid {
                    chart_id: chart_id.clone(),
                    reason: e.to_string(),
                })?;
            let loaded = LoadedChart::load(&chart_id, config)?;
            charts.insert(chart_id, loaded);
        }
        debug!("Loaded {} chart configurations", charts.len());
        Ok(Self { charts })
    }

    pub fn insert(
        &mut self,
        chart_id: impl Into<String>,
        config: ChartConfig,
    ) -> Result<(), ConfigError> {
        let chart_id = chart_id.into();
        let loaded = LoadedChart::load(&chart_id, config)?;
        self.charts.insert(chart_id, loaded);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn chart_ids(&self) -> impl Iterator<Item = &str> {
        self.charts.keys().map(String::as_str)
    }
}

impl ChartConfigLookup for ChartConfigStore {
    fn chart_config(&self, chart_id: &str) -> Option<&ChartConfig> {
        self.charts.get(chart_id).map(|chart| &chart.config)
    }

    fn resolved_chart(&self, chart_id: &str) -> Result<Cow<'_, ResolvedChart>, ConfigError> {
        self.charts
            .get(chart_id)
            .map(|chart| Cow::Borrowed(&chart.resolved))
            .ok_or_else(|| ConfigError::UnknownChart(chart_id.to_string()))
    }
}
