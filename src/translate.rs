use serde_json::Value;
use tracing::{debug, info};

use crate::assemble::assemble;
use crate::complete::complete_plots;
use crate::config::ChartConfigLookup;
use crate::data::AggregateDto;
use crate::derive::apply_derivations;
use crate::error::{ConfigError, TranslateError, TranslateResult};
use crate::rank::rank_data;
use crate::walk::walk_aggregations;

/// Envelope member holding the aggregation tree in a full search response
pub const AGGREGATIONS: &str = "aggregations";

/// Translates search aggregation responses into chart DTOs.
///
/// Holds only read-only configuration, so a single translator can be shared across
/// threads; every call works on its own data.
#[derive(Debug, Clone)]
pub struct Translator<L> {
    configs: L,
}

impl<L: ChartConfigLookup> Translator<L> {
    pub fn new(configs: L) -> Self {
        Self { configs }
    }

    /// Run the full pipeline for one chart:
    /// lookup -> walk -> derive -> complete -> rank -> assemble.
    /// Resolution is skipped when the lookup already holds the resolved chart.
    pub fn translate(&self, chart_id: &str, aggregations: &Value) -> TranslateResult<AggregateDto> {
        let config = self
            .configs
            .chart_config(chart_id)
            .ok_or_else(|| ConfigError::UnknownChart(chart_id.to_string()))?;
        let chart = self.configs.resolved_chart(chart_id)?;

        let root = aggregation_root(aggregations)?;
        let mut data = walk_aggregations(&chart, root)?;

        apply_derivations(&mut data, &chart.derivations);
        complete_plots(&mut data, &chart.static_plot_keys, &chart.default_symbol);
        rank_data(&mut data, &chart.ranking);

        let dto = assemble(config, data)?;
        info!(
            "Translated chart '{}' ({}) into {} series",
            chart_id,
            dto.chart_type,
            dto.data.len()
        );
        Ok(dto)
    }

    /// Same as [`Translator::translate`], starting from raw response text
    pub fn translate_str(&self, chart_id: &str, response: &str) -> TranslateResult<AggregateDto> {
        let value: Value = serde_json::from_str(response).map_err(TranslateError::Parse)?;
        self.translate(chart_id, &value)
    }
}

/// Accept either the aggregation map itself or a full response wrapping it
fn aggregation_root(input: &Value) -> TranslateResult<&Value> {
    let Some(fields) = input.as_object() else {
        return Err(TranslateError::shape(
            "$",
            "aggregation response must be a JSON object",
        ));
    };
    match fields.get(AGGREGATIONS) {
        Some(inner @ Value::Object(_)) => {
            debug!("Unwrapping '{}' envelope", AGGREGATIONS);
            Ok(inner)
        }
        _ => Ok(input),
    }
}
