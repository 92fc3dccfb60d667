use indexmap::IndexSet;

use crate::config::Order;

// =============================================================================
// Phase 1: Resolution
// =============================================================================

/// A chart configuration resolved into the shape the pipeline executes:
/// parsed paths, concrete bucket levels, symbols and derivation order.
#[derive(Debug, Clone)]
pub struct ResolvedChart {
    pub chart_id: String,
    pub paths: Vec<ResolvedPath>,
    /// Applied in order; later derivations may read earlier results
    pub derivations: Vec<Derivation>,
    /// Plot names every series must expose, whatever the response contains
    pub static_plot_keys: IndexSet<String>,
    /// Symbol for plots synthesized by completion
    pub default_symbol: String,
    pub ranking: Ranking,
}

#[derive(Debug, Clone)]
pub struct ResolvedPath {
    /// The expression as written in the configuration, used in error reports
    pub source: String,
    pub deep: bool,
    pub steps: Vec<Step>,
    /// Plot name used when the path has no plot-level buckets
    pub metric_name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub name: String,
    pub level: Option<Level>,
}

/// Meaning of a bucket level once `[]` has been resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Series,
    Plot,
}

impl ResolvedPath {
    pub fn has_plot_level(&self) -> bool {
        self.steps.iter().any(|s| s.level == Some(Level::Plot))
    }

    /// Series label for plots produced without a series level: the top-level key.
    pub fn top_level_key(&self) -> &str {
        self.steps.first().map(|s| s.name.as_str()).unwrap_or_default()
    }
}

/// `new_field = part / whole * 100`
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub new_field: String,
    pub part: String,
    pub whole: String,
}

// =============================================================================
// Phase 5: Ranking (after walk, derive and completion)
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    pub sort: Option<SortKey>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub plot: String,
    pub order: Order,
}

impl Ranking {
    pub fn is_noop(&self) -> bool {
        self.sort.is_none() && self.limit.is_none()
    }
}
