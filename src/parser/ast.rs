// Abstract Syntax Tree for aggregation path expressions

/// A parsed path such as `..Ward[series].Status[plot].Count as open`
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationPath {
    /// Leading `..`: the first segment is searched for anywhere below the root
    pub deep: bool,
    pub segments: Vec<Segment>,
    /// Plot name override for paths without plot-level buckets
    pub alias: Option<String>,
}

/// One named step of a path
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub name: String,
    /// `Some` when the step fans out over the node's `buckets`
    pub bucket: Option<BucketRole>,
}

/// What a bucket level's keys mean in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketRole {
    /// `[]`: decided at resolution time
    Auto,
    /// `[series]`: each key labels a series
    Series,
    /// `[plot]`: each key names a plot
    Plot,
}

impl AggregationPath {
    pub fn last_name(&self) -> &str {
        self.segments.last().map(|s| s.name.as_str()).unwrap_or_default()
    }
}
