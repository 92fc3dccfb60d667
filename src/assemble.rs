use crate::config::ChartConfig;
use crate::data::{AggregateDto, ChartType, Data};
use crate::error::TranslateResult;

/// Wrap the final series in the response envelope.
/// Fails with `UnsupportedChartType` when the configured chart type is not known.
pub fn assemble(config: &ChartConfig, data: Vec<Data>) -> TranslateResult<AggregateDto> {
    let chart_type: ChartType = config.chart_type.parse()?;
    Ok(AggregateDto {
        drill_down_chart_id: config.drill_chart.clone(),
        chart_type,
        filter: config.filter_keys.clone(),
        data,
    })
}
