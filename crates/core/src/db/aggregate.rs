use crate::limits::SpecLimits;
use crate::stats::SampleStats;
use serde::Serialize;

/// One bucket's persisted aggregate row: the specification limits in force
/// plus the statistics over the bucket's full reading set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregate {
    pub limits: Option<SpecLimits>,
    pub stats: SampleStats,
}

impl Aggregate {
    pub fn new(limits: Option<SpecLimits>, stats: SampleStats) -> Self {
        Self { limits, stats }
    }

    /// Build an aggregate from scratch over the bucket's full value set.
    /// Aggregates are never patched incrementally; this is the only
    /// constructor the engine uses.
    pub fn compute(values: &[f64], limits: Option<SpecLimits>) -> Self {
        Self {
            limits,
            stats: SampleStats::from_values(values, limits),
        }
    }
}
