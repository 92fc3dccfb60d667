use std::cmp::Ordering;

use tracing::debug;

use crate::config::Order;
use crate::data::Data;
use crate::ir::Ranking;

/// Sort by the ranking plot, then keep the first `limit` series.
pub fn rank_data(data: &mut Vec<Data>, ranking: &Ranking) {
    if ranking.is_noop() {
        return;
    }
    if let Some(sort) = &ranking.sort {
        sort_by_plot(data, &sort.plot, sort.order);
    }
    if let Some(limit) = ranking.limit {
        let before = data.len();
        data.truncate(limit);
        debug!("Limited {} series to {}", before, data.len());
    }
}

/// Stable sort on one plot's value. A series without the plot ranks as 0.0.
pub fn sort_by_plot(data: &mut [Data], plot: &str, order: Order) {
    data.sort_by(|a, b| match order {
        Order::Asc => compare_by_plot(a, b, plot),
        Order::Desc => compare_by_plot(b, a, plot),
    });
}

/// Ascending comparison of two series on one plot
pub fn compare_by_plot(a: &Data, b: &Data, plot: &str) -> Ordering {
    rank_value(a, plot).total_cmp(&rank_value(b, plot))
}

fn rank_value(data: &Data, plot: &str) -> f64 {
    data.plot_value(plot).unwrap_or(0.0)
}
