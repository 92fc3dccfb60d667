use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TranslateError, TranslateResult};

/// A single named measurement attached to a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub name: String,
    pub value: f64,
    /// Unit tag such as "count" or "percentage". Never used in arithmetic.
    pub symbol: String,
}

impl Plot {
    pub fn new(name: impl Into<String>, value: f64, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            symbol: symbol.into(),
        }
    }
}

/// One data series: a label plus its plots, names unique within the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data {
    pub label: String,
    pub plots: Vec<Plot>,
}

impl Data {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            plots: Vec::new(),
        }
    }

    pub fn with_plots(label: impl Into<String>, plots: Vec<Plot>) -> Self {
        let mut data = Self::new(label);
        for plot in plots {
            data.push_plot(plot);
        }
        data
    }

    pub fn plot(&self, name: &str) -> Option<&Plot> {
        self.plots.iter().find(|p| p.name == name)
    }

    pub fn plot_value(&self, name: &str) -> Option<f64> {
        self.plot(name).map(|p| p.value)
    }

    pub fn has_plot(&self, name: &str) -> bool {
        self.plot(name).is_some()
    }

    pub fn plot_names(&self) -> impl Iterator<Item = &str> {
        self.plots.iter().map(|p| p.name.as_str())
    }

    /// Append a plot unless one with the same name exists.
    /// Returns `false` when the plot was rejected as a duplicate.
    pub fn push_plot(&mut self, plot: Plot) -> bool {
        if self.has_plot(&plot.name) {
            return false;
        }
        self.plots.push(plot);
        true
    }

    /// Insert a plot, overwriting value and symbol of an existing plot with the same name
    /// in place.
    pub fn upsert_plot(&mut self, plot: Plot) {
        match self.plots.iter_mut().find(|p| p.name == plot.name) {
            Some(existing) => {
                existing.value = plot.value;
                existing.symbol = plot.symbol;
            }
            None => self.plots.push(plot),
        }
    }
}

/// Supported chart kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Metric,
    Pie,
    Donut,
    Line,
    Bar,
    HorizontalBar,
    Table,
    XTable,
    Perform,
}

impl ChartType {
    pub const ALL: [ChartType; 9] = [
        ChartType::Metric,
        ChartType::Pie,
        ChartType::Donut,
        ChartType::Line,
        ChartType::Bar,
        ChartType::HorizontalBar,
        ChartType::Table,
        ChartType::XTable,
        ChartType::Perform,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartType::Metric => "metric",
            ChartType::Pie => "pie",
            ChartType::Donut => "donut",
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::HorizontalBar => "horizontalbar",
            ChartType::Table => "table",
            ChartType::XTable => "xtable",
            ChartType::Perform => "perform",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ChartType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TranslateError::UnsupportedChartType(s.to_string()))
    }
}

/// The translation result handed to chart consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateDto {
    pub drill_down_chart_id: String,
    pub chart_type: ChartType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<String>>,
    pub data: Vec<Data>,
}

impl AggregateDto {
    pub fn to_json_pretty(&self) -> TranslateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|d| d.label.as_str())
    }
}
