use indexmap::IndexSet;

use crate::config::{ChartAction, ChartConfig};
use crate::error::ConfigError;
use crate::ir::{Derivation, Level, Ranking, ResolvedChart, ResolvedPath, SortKey, Step};
use crate::parser::{parse_aggregation_path, BucketRole};

/// Resolve a chart configuration into an executable chart.
/// Every configuration error the pipeline can hit is raised here.
pub fn resolve_chart(
    chart_id: &str,
    config: &ChartConfig,
) -> Result<ResolvedChart, ConfigError> {
    if config.aggregation_paths.is_empty() {
        return Err(invalid(chart_id, "aggregationPaths must not be empty"));
    }

    // 1. Parse and resolve paths
    let mut paths = Vec::with_capacity(config.aggregation_paths.len());
    for source in &config.aggregation_paths {
        paths.push(resolve_path(chart_id, source, config)?);
    }

    // 2. Derivations: the chart action first, then explicit computed fields
    let mut derivations = Vec::new();
    if let Some(ChartAction::Percentage) = config.action {
        let new_field = require_plot_label(chart_id, config, "action")?;
        let (part, whole) = match paths.as_slice() {
            [part, whole, ..] if !part.has_plot_level() && !whole.has_plot_level() => {
                (part.metric_name.clone(), whole.metric_name.clone())
            }
            [_, _, ..] => {
                return Err(invalid(
                    chart_id,
                    "percentage action needs the first two paths to end in metrics, \
                     not plot buckets",
                ))
            }
            _ => {
                return Err(invalid(
                    chart_id,
                    "percentage action needs at least two aggregation paths",
                ))
            }
        };
        derivations.push(Derivation {
            new_field,
            part,
            whole,
        });
    }
    for field in &config.computed_fields {
        if field.name.is_empty() || field.part.is_empty() || field.whole.is_empty() {
            return Err(invalid(
                chart_id,
                "computed fields need non-empty name, part and whole",
            ));
        }
        derivations.push(Derivation {
            new_field: field.name.clone(),
            part: field.part.clone(),
            whole: field.whole.clone(),
        });
    }

    // 3. Plot names known before any response is seen
    let mut static_plot_keys = IndexSet::new();
    for path in paths.iter().filter(|p| !p.has_plot_level()) {
        static_plot_keys.insert(path.metric_name.clone());
    }
    for derivation in &derivations {
        static_plot_keys.insert(derivation.new_field.clone());
    }
    static_plot_keys.extend(config.plot_keys.iter().cloned());

    // 4. Ranking
    let sort = match config.order {
        Some(order) => Some(SortKey {
            plot: require_plot_label(chart_id, config, "order")?,
            order,
        }),
        None => None,
    };

    Ok(ResolvedChart {
        chart_id: chart_id.to_string(),
        paths,
        derivations,
        static_plot_keys,
        default_symbol: config.value_type.clone(),
        ranking: Ranking {
            sort,
            limit: config.limit,
        },
    })
}

/// Parse one path expression and pin down its bucket levels
fn resolve_path(
    chart_id: &str,
    source: &str,
    config: &ChartConfig,
) -> Result<ResolvedPath, ConfigError> {
    let path_error = |reason: String| ConfigError::InvalidPath {
        chart_id: chart_id.to_string(),
        path: source.to_string(),
        reason,
    };

    let parsed = match parse_aggregation_path(source) {
        Ok((_, parsed)) => parsed,
        Err(e) => return Err(path_error(e.to_string())),
    };

    if parsed.segments.iter().any(|s| s.name.is_empty()) {
        return Err(path_error("empty segment name".to_string()));
    }
    if parsed.alias.as_deref() == Some("") {
        return Err(path_error("empty alias".to_string()));
    }

    let explicit_series = parsed
        .segments
        .iter()
        .filter(|s| s.bucket == Some(BucketRole::Series))
        .count();
    if explicit_series > 1 {
        return Err(path_error("more than one series level".to_string()));
    }

    // `[]` becomes the series level only when nothing claimed it explicitly
    let mut series_taken = explicit_series == 1;
    let metric_name = parsed
        .alias
        .clone()
        .unwrap_or_else(|| parsed.last_name().to_string());
    let mut steps = Vec::with_capacity(parsed.segments.len());
    for segment in parsed.segments {
        let level = segment.bucket.map(|role| match role {
            BucketRole::Series => Level::Series,
            BucketRole::Plot => Level::Plot,
            BucketRole::Auto if !series_taken => {
                series_taken = true;
                Level::Series
            }
            BucketRole::Auto => Level::Plot,
        });
        steps.push(Step {
            name: segment.name,
            level,
        });
    }

    let mapping = &config.path_data_type_mapping;
    let symbol = mapping
        .get(source)
        .or_else(|| mapping.get(source.trim()))
        .or_else(|| mapping.get(&metric_name))
        .cloned()
        .unwrap_or_else(|| config.value_type.clone());

    Ok(ResolvedPath {
        source: source.to_string(),
        deep: parsed.deep,
        steps,
        metric_name,
        symbol,
    })
}

fn require_plot_label(
    chart_id: &str,
    config: &ChartConfig,
    directive: &str,
) -> Result<String, ConfigError> {
    match config.plot_label.as_str() {
        "" => Err(invalid(
            chart_id,
            &format!("plotLabel is required when {directive} is set"),
        )),
        label => Ok(label.to_string()),
    }
}

fn invalid(chart_id: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        chart_id: chart_id.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ComputedField, Order};

    fn config(paths: &[&str]) -> ChartConfig {
        ChartConfig::new(
            "Test Chart",
            "table",
            paths.iter().map(|p| p.to_string()).collect(),
        )
    }

    fn levels(path: &ResolvedPath) -> Vec<Option<Level>> {
        path.steps.iter().map(|s| s.level).collect()
    }

    #[test]
    fn test_resolve_auto_levels() {
        let chart = resolve_chart("c", &config(&["Ward[].Month[].Amount"])).unwrap();
        assert_eq!(
            levels(&chart.paths[0]),
            vec![Some(Level::Series), Some(Level::Plot), None]
        );
        assert_eq!(chart.paths[0].metric_name, "Amount");
        assert!(chart.paths[0].has_plot_level());
        // Plot-level paths contribute no static key
        assert!(chart.static_plot_keys.is_empty());
    }

    #[test]
    fn test_resolve_explicit_series_turns_auto_into_plot() {
        let chart = resolve_chart("c", &config(&["Month[].Ward[series]"])).unwrap();
        assert_eq!(
            levels(&chart.paths[0]),
            vec![Some(Level::Plot), Some(Level::Series)]
        );
    }

    #[test]
    fn test_resolve_two_series_levels_rejected() {
        let err = resolve_chart("c", &config(&["A[series].B[series].C"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath { ref reason, .. } if reason.contains("series")));
    }

    #[test]
    fn test_resolve_empty_paths_rejected() {
        let err = resolve_chart("c", &config(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_resolve_empty_quoted_segment_rejected() {
        let err = resolve_chart("c", &config(&["Ward[].\"\""])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath { .. }));
    }

    #[test]
    fn test_resolve_symbols() {
        let mut cfg = config(&["Ward[].Open", "Ward[].Closed as closed", "Ward[].Total"]);
        cfg.value_type = "number".to_string();
        cfg.path_data_type_mapping
            .insert("Ward[].Open".to_string(), "count".to_string());
        cfg.path_data_type_mapping
            .insert("closed".to_string(), "amount".to_string());
        let chart = resolve_chart("c", &cfg).unwrap();
        let symbols: Vec<_> = chart.paths.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["count", "amount", "number"]);
        assert_eq!(chart.default_symbol, "number");
    }

    #[test]
    fn test_resolve_percentage_action() {
        let mut cfg = config(&["Ward[].Closed", "Ward[].Total"]);
        cfg.action = Some(ChartAction::Percentage);
        cfg.plot_label = "Closure Rate".to_string();
        cfg.computed_fields.push(ComputedField {
            name: "Open Rate".to_string(),
            part: "Open".to_string(),
            whole: "Total".to_string(),
        });
        let chart = resolve_chart("c", &cfg).unwrap();
        assert_eq!(
            chart.derivations[0],
            Derivation {
                new_field: "Closure Rate".to_string(),
                part: "Closed".to_string(),
                whole: "Total".to_string(),
            }
        );
        assert_eq!(chart.derivations[1].new_field, "Open Rate");
        assert_eq!(
            chart.static_plot_keys.iter().collect::<Vec<_>>(),
            vec!["Closed", "Total", "Closure Rate", "Open Rate"]
        );
    }

    #[test]
    fn test_resolve_percentage_action_requirements() {
        let mut cfg = config(&["Ward[].Closed", "Ward[].Total"]);
        cfg.action = Some(ChartAction::Percentage);
        assert!(resolve_chart("c", &cfg).is_err(), "needs plotLabel");

        let mut cfg = config(&["Ward[].Closed"]);
        cfg.action = Some(ChartAction::Percentage);
        cfg.plot_label = "Rate".to_string();
        assert!(resolve_chart("c", &cfg).is_err(), "needs two paths");

        let mut cfg = config(&["Ward[].Month[].Closed", "Ward[].Total"]);
        cfg.action = Some(ChartAction::Percentage);
        cfg.plot_label = "Rate".to_string();
        assert!(resolve_chart("c", &cfg).is_err(), "needs metric paths");
    }

    #[test]
    fn test_resolve_ranking() {
        let mut cfg = config(&["Ward[].Total"]);
        cfg.limit = Some(5);
        let chart = resolve_chart("c", &cfg).unwrap();
        assert_eq!(chart.ranking.sort, None);
        assert_eq!(chart.ranking.limit, Some(5));

        cfg.order = Some(Order::Asc);
        assert!(resolve_chart("c", &cfg).is_err(), "order needs plotLabel");

        cfg.plot_label = "Total".to_string();
        let chart = resolve_chart("c", &cfg).unwrap();
        assert_eq!(
            chart.ranking.sort,
            Some(SortKey {
                plot: "Total".to_string(),
                order: Order::Asc
            })
        );
    }

    #[test]
    fn test_resolve_extra_plot_keys() {
        let mut cfg = config(&["Status[plot]"]);
        cfg.plot_keys = vec!["open".to_string(), "closed".to_string()];
        let chart = resolve_chart("c", &cfg).unwrap();
        assert_eq!(
            chart.static_plot_keys.iter().collect::<Vec<_>>(),
            vec!["open", "closed"]
        );
        assert_eq!(chart.paths[0].top_level_key(), "Status");
    }
}
