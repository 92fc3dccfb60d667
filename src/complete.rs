use indexmap::IndexSet;
use tracing::debug;

use crate::data::{Data, Plot};

/// Add a 0.0 plot for every key the series does not expose yet.
/// Returns the number of plots added; `plot_keys` is left untouched.
pub fn append_missing_plot(plot_keys: &IndexSet<String>, data: &mut Data, symbol: &str) -> usize {
    let mut added = 0;
    for key in plot_keys {
        if !data.has_plot(key) {
            data.plots.push(Plot::new(key.as_str(), 0.0, symbol));
            added += 1;
        }
    }
    added
}

/// Static keys first, then every plot name seen across the series in first-seen order.
pub fn required_plot_keys(static_keys: &IndexSet<String>, data: &[Data]) -> IndexSet<String> {
    let mut keys = static_keys.clone();
    for series in data {
        for name in series.plot_names() {
            if !keys.contains(name) {
                keys.insert(name.to_string());
            }
        }
    }
    keys
}

/// Give every series the same set of plot names
pub fn complete_plots(data: &mut [Data], static_keys: &IndexSet<String>, symbol: &str) {
    let keys = required_plot_keys(static_keys, data);
    let added: usize = data
        .iter_mut()
        .map(|series| append_missing_plot(&keys, series, symbol))
        .sum();
    debug!(
        "Completed {} series over {} plot keys ({} plots filled)",
        data.len(),
        keys.len(),
        added
    );
}
