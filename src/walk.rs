use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::data::{Data, Plot};
use crate::error::{TranslateError, TranslateResult};
use crate::ir::{Level, ResolvedChart, ResolvedPath, Step};

pub const BUCKETS: &str = "buckets";
pub const KEY: &str = "key";
pub const KEY_AS_STRING: &str = "key_as_string";
pub const VALUE: &str = "value";
pub const DOC_COUNT: &str = "doc_count";

/// Joins the keys of nested plot-level buckets into one plot name
pub const PLOT_KEY_SEPARATOR: &str = "/";

/// Main entry point: walk every configured path over the aggregation root and collect
/// one series per label, in first-seen order.
pub fn walk_aggregations(chart: &ResolvedChart, root: &Value) -> TranslateResult<Vec<Data>> {
    let mut collector = SeriesCollector::default();

    for path in &chart.paths {
        let before = collector.plot_count;
        visit(root, &path.steps, path, &Cursor::default(), path.deep, &mut collector)?;
        debug!(
            "Path '{}' produced {} plots",
            path.source,
            collector.plot_count - before
        );
    }

    let data = collector.finish();
    debug!(
        "Walked {} paths for chart '{}' into {} series",
        chart.paths.len(),
        chart.chart_id,
        data.len()
    );
    Ok(data)
}

/// Keys picked up from bucket levels on the way down
#[derive(Debug, Clone, Default)]
struct Cursor {
    label: Option<String>,
    plot_keys: Vec<String>,
}

#[derive(Default)]
struct SeriesCollector {
    series: IndexMap<String, Data>,
    plot_count: usize,
}

impl SeriesCollector {
    /// Make sure a series exists for `label`, even if no plot ever lands on it
    fn open(&mut self, label: &str) -> &mut Data {
        self.series
            .entry(label.to_string())
            .or_insert_with(|| Data::new(label))
    }

    fn record(&mut self, label: &str, plot: Plot) {
        let name = plot.name.clone();
        let data = self.open(label);
        if data.push_plot(plot) {
            self.plot_count += 1;
        } else {
            warn!("Dropping duplicate plot '{}' for series '{}'", name, label);
        }
    }

    fn finish(self) -> Vec<Data> {
        self.series.into_values().collect()
    }
}

fn visit(
    node: &Value,
    steps: &[Step],
    path: &ResolvedPath,
    cursor: &Cursor,
    deep: bool,
    out: &mut SeriesCollector,
) -> TranslateResult<()> {
    let Some((step, rest)) = steps.split_first() else {
        return emit(node, path, cursor, out);
    };

    let child = if deep {
        find_member(node, &step.name)
    } else {
        member(node, &step.name, path)?
    };
    // Partial responses are normal: a missing branch contributes nothing
    let Some(child) = child else {
        return Ok(());
    };

    let Some(level) = step.level else {
        return visit(child, rest, path, cursor, false, out);
    };

    for bucket in buckets(child, step, path)? {
        let fields = bucket.as_object().ok_or_else(|| {
            TranslateError::shape(
                &path.source,
                format!("bucket under '{}' is not an object", step.name),
            )
        })?;
        let key = bucket_key(fields, step, path)?;

        let mut next = cursor.clone();
        match level {
            Level::Series => {
                // Metrics missing under this bucket are backfilled by completion
                out.open(&key);
                next.label = Some(key);
            }
            Level::Plot => next.plot_keys.push(key),
        }
        // Remaining steps start from the bucket itself
        visit(bucket, rest, path, &next, false, out)?;
    }

    Ok(())
}

/// Record the metric found at the end of a path
fn emit(
    node: &Value,
    path: &ResolvedPath,
    cursor: &Cursor,
    out: &mut SeriesCollector,
) -> TranslateResult<()> {
    let Some(value) = metric_value(node, path)? else {
        return Ok(());
    };

    let name = if cursor.plot_keys.is_empty() {
        path.metric_name.clone()
    } else {
        cursor.plot_keys.join(PLOT_KEY_SEPARATOR)
    };
    let label = cursor
        .label
        .as_deref()
        .unwrap_or_else(|| path.top_level_key());

    out.record(label, Plot::new(name, value, path.symbol.clone()));
    Ok(())
}

/// Direct member lookup. `null` counts as absent, scalars and arrays cannot be descended.
fn member<'a>(
    node: &'a Value,
    name: &str,
    path: &ResolvedPath,
) -> TranslateResult<Option<&'a Value>> {
    match node {
        Value::Object(map) => Ok(map.get(name).filter(|v| !v.is_null())),
        Value::Null => Ok(None),
        other => Err(TranslateError::shape(
            &path.source,
            format!(
                "cannot look up '{}' in a {} node",
                name,
                json_kind(other)
            ),
        )),
    }
}

/// Depth-first search for the first member called `name`, in document order
fn find_member<'a>(node: &'a Value, name: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => {
            if let Some(found) = map.get(name).filter(|v| !v.is_null()) {
                return Some(found);
            }
            map.values().find_map(|v| find_member(v, name))
        }
        Value::Array(items) => items.iter().find_map(|v| find_member(v, name)),
        _ => None,
    }
}

fn buckets<'a>(
    node: &'a Value,
    step: &Step,
    path: &ResolvedPath,
) -> TranslateResult<&'a Vec<Value>> {
    let map = node.as_object().ok_or_else(|| {
        TranslateError::shape(
            &path.source,
            format!(
                "'{}' is a {} node, expected a bucket aggregation",
                step.name,
                json_kind(node)
            ),
        )
    })?;

    match map.get(BUCKETS) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(TranslateError::shape(
            &path.source,
            format!(
                "'{}.{}' is a {}, expected an array",
                step.name,
                BUCKETS,
                json_kind(other)
            ),
        )),
        None => Err(TranslateError::shape(
            &path.source,
            format!("'{}' has no '{}'", step.name, BUCKETS),
        )),
    }
}

fn bucket_key(
    bucket: &Map<String, Value>,
    step: &Step,
    path: &ResolvedPath,
) -> TranslateResult<String> {
    if let Some(Value::String(key)) = bucket.get(KEY_AS_STRING) {
        return Ok(key.clone());
    }

    match bucket.get(KEY) {
        Some(Value::String(key)) => Ok(key.clone()),
        Some(Value::Number(key)) => Ok(key.to_string()),
        Some(Value::Bool(key)) => Ok(key.to_string()),
        Some(other) => Err(TranslateError::shape(
            &path.source,
            format!(
                "bucket key under '{}' is a {}, expected a string or number",
                step.name,
                json_kind(other)
            ),
        )),
        None => Err(TranslateError::shape(
            &path.source,
            format!("bucket under '{}' has no '{}'", step.name, KEY),
        )),
    }
}

/// Numeric value of a terminal node: a bare number, `value`, or `doc_count`.
/// `Ok(None)` means the metric carries no value (JSON `null`).
fn metric_value(node: &Value, path: &ResolvedPath) -> TranslateResult<Option<f64>> {
    match node {
        Value::Number(n) => Ok(n.as_f64()),
        Value::Null => Ok(None),
        Value::Object(map) => {
            let field = if map.contains_key(VALUE) { VALUE } else { DOC_COUNT };
            match map.get(field) {
                Some(Value::Number(n)) => Ok(n.as_f64()),
                Some(Value::Null) | None => Ok(None),
                Some(other) => Err(TranslateError::shape(
                    &path.source,
                    format!(
                        "'{}' of '{}' is a {}, expected a number",
                        field,
                        path.metric_name,
                        json_kind(other)
                    ),
                )),
            }
        }
        other => Err(TranslateError::shape(
            &path.source,
            format!("metric '{}' is a {} node", path.metric_name, json_kind(other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartConfig;
    use crate::resolve::resolve_chart;
    use serde_json::json;

    fn chart(paths: &[&str]) -> ResolvedChart {
        let mut config = ChartConfig::new(
            "Complaints",
            "table",
            paths.iter().map(|p| p.to_string()).collect(),
        );
        config.value_type = "number".to_string();
        resolve_chart("complaints", &config).unwrap()
    }

    fn wards() -> Value {
        json!({
            "Ward": {
                "doc_count_error_upper_bound": 0,
                "buckets": [
                    { "key": "Ward 1", "doc_count": 30, "Open": { "value": 10.0 }, "Closed": { "value": 20.0 } },
                    { "key": "Ward 2", "doc_count": 12, "Open": { "value": 12.0 } },
                    { "key": "Ward 3", "doc_count": 40, "Open": { "value": null }, "Closed": { "value": 30.0 } }
                ]
            }
        })
    }

    fn names(data: &Data) -> Vec<&str> {
        data.plot_names().collect()
    }

    #[test]
    fn test_walk_series_per_bucket() {
        let data = walk_aggregations(&chart(&["Ward[].Open", "Ward[].Closed"]), &wards()).unwrap();

        let labels: Vec<_> = data.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["Ward 1", "Ward 2", "Ward 3"]);
        assert_eq!(names(&data[0]), vec!["Open", "Closed"]);
        assert_eq!(data[0].plot_value("Closed"), Some(20.0));
        // Missing metric and null metric both leave the plot out
        assert_eq!(names(&data[1]), vec!["Open"]);
        assert_eq!(names(&data[2]), vec!["Closed"]);
        assert_eq!(data[0].plot("Open").unwrap().symbol, "number");
    }

    #[test]
    fn test_walk_bucket_doc_count() {
        let data = walk_aggregations(&chart(&["Ward[] as complaints"]), &wards()).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data[2].plot_value("complaints"), Some(40.0));
    }

    #[test]
    fn test_walk_plot_level_without_series_uses_top_level_key() {
        let root = json!({
            "Collections": {
                "Month": {
                    "buckets": [
                        { "key": 1704067200000i64, "key_as_string": "2024-01", "Amount": { "value": 100.5 } },
                        { "key": 1706745600000i64, "key_as_string": "2024-02", "Amount": { "value": 80.0 } }
                    ]
                }
            }
        });
        let data = walk_aggregations(&chart(&["Collections.Month[plot].Amount"]), &root).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].label, "Collections");
        assert_eq!(names(&data[0]), vec!["2024-01", "2024-02"]);
        assert_eq!(data[0].plot_value("2024-01"), Some(100.5));
    }

    #[test]
    fn test_walk_nested_plot_levels_join_keys() {
        let root = json!({
            "Ward": { "buckets": [
                { "key": "W1", "Status": { "buckets": [
                    { "key": "open", "Channel": { "buckets": [ { "key": "web", "doc_count": 3 }, { "key": "app", "doc_count": 4 } ] } }
                ] } }
            ] }
        });
        let data = walk_aggregations(&chart(&["Ward[].Status[].Channel[]"]), &root).unwrap();
        assert_eq!(names(&data[0]), vec!["open/web", "open/app"]);
        assert_eq!(data[0].plot_value("open/app"), Some(4.0));
    }

    #[test]
    fn test_walk_numeric_and_boolean_keys() {
        let root = json!({
            "Year": { "buckets": [ { "key": 2023, "doc_count": 1 }, { "key": true, "doc_count": 2 } ] }
        });
        let data = walk_aggregations(&chart(&["Year[]"]), &root).unwrap();
        let labels: Vec<_> = data.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["2023", "true"]);
    }

    #[test]
    fn test_walk_merges_paths_into_top_level_series() {
        let root = json!({ "Summary": { "Total": { "value": 50 }, "Target": { "value": 200 } } });
        let data = walk_aggregations(&chart(&["Summary.Total", "Summary.Target"]), &root).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].label, "Summary");
        assert_eq!(names(&data[0]), vec!["Total", "Target"]);
    }

    #[test]
    fn test_walk_bare_number_metric() {
        let root = json!({ "Summary": { "Total": 7 } });
        let data = walk_aggregations(&chart(&["Summary.Total"]), &root).unwrap();
        assert_eq!(data[0].plot_value("Total"), Some(7.0));
    }

    #[test]
    fn test_walk_deep_search() {
        let root = json!({
            "Filtered": { "doc_count": 82, "Inner": { "Ward": { "buckets": [ { "key": "W1", "Open": { "value": 1 } } ] } } }
        });
        let data = walk_aggregations(&chart(&["..Ward[].Open"]), &root).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].plot_value("Open"), Some(1.0));

        // Without the deep marker the same path finds nothing
        let data = walk_aggregations(&chart(&["Ward[].Open"]), &root).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_walk_missing_branch_is_skipped() {
        let data = walk_aggregations(&chart(&["Zone[].Open"]), &wards()).unwrap();
        assert!(data.is_empty());

        // The wards exist even though the metric branch below them does not
        let data = walk_aggregations(&chart(&["Ward[].Escalated.Level"]), &wards()).unwrap();
        assert_eq!(data.len(), 3);
        assert!(data.iter().all(|d| d.plots.is_empty()));
    }

    #[test]
    fn test_walk_series_bucket_without_metrics_is_kept() {
        let root = json!({
            "Ward": { "buckets": [
                { "key": "Ward 1", "doc_count": 20, "Closed": { "value": 20 } },
                { "key": "Ward 2", "doc_count": 4 },
                { "key": "Ward 3", "doc_count": 9, "Closed": { "value": null } }
            ] }
        });
        let data = walk_aggregations(&chart(&["Ward[].Closed"]), &root).unwrap();

        let labels: Vec<_> = data.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["Ward 1", "Ward 2", "Ward 3"]);
        assert!(data[1].plots.is_empty());
        assert!(data[2].plots.is_empty());
    }

    #[test]
    fn test_walk_empty_buckets() {
        let root = json!({ "Ward": { "buckets": [] } });
        let data = walk_aggregations(&chart(&["Ward[].Open"]), &root).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_walk_duplicate_plot_keeps_first() {
        let data = walk_aggregations(&chart(&["Ward[].Open", "Ward[].Closed as Open"]), &wards()).unwrap();
        assert_eq!(data[0].plots.len(), 1);
        assert_eq!(data[0].plot_value("Open"), Some(10.0));
    }

    #[test]
    fn test_walk_buckets_not_array_is_shape_error() {
        let root = json!({ "Ward": { "buckets": { "W1": { "doc_count": 1 } } } });
        let err = walk_aggregations(&chart(&["Ward[].Open"]), &root).unwrap_err();
        match err {
            TranslateError::Shape { path, reason } => {
                assert_eq!(path, "Ward[].Open");
                assert!(reason.contains("expected an array"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_walk_shape_errors() {
        let cases = [
            json!({ "Ward": { "doc_count": 3 } }),
            json!({ "Ward": 3 }),
            json!({ "Ward": { "buckets": [ 1, 2 ] } }),
            json!({ "Ward": { "buckets": [ { "doc_count": 1 } ] } }),
            json!({ "Ward": { "buckets": [ { "key": [1], "doc_count": 1 } ] } }),
            json!({ "Ward": { "buckets": [ { "key": "W1", "Open": { "value": "ten" } } ] } }),
            json!({ "Ward": { "buckets": [ { "key": "W1", "Open": "ten" } ] } }),
            json!({ "Ward": { "buckets": [ { "key": "W1", "Open": [ 1 ] } ] } }),
        ];
        for root in cases {
            let result = walk_aggregations(&chart(&["Ward[].Open"]), &root);
            assert!(
                matches!(result, Err(TranslateError::Shape { .. })),
                "expected shape error for {root}"
            );
        }
    }

    #[test]
    fn test_walk_descending_into_scalar_is_shape_error() {
        let root = json!({ "Summary": 5 });
        let result = walk_aggregations(&chart(&["Summary.Total"]), &root);
        assert!(matches!(result, Err(TranslateError::Shape { .. })));
    }
}
