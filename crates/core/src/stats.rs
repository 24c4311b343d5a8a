//! Descriptive statistics and process-capability indices.
//!
//! Statistics are always recomputed from the full value set. Nothing in
//! here is incremental: an aggregate produced twice from the same values
//! is bit-identical, which is what makes upserts idempotent.

use crate::limits::SpecLimits;
use serde::Serialize;

/// Statistics over one set of values, plus capability against limits.
///
/// A `None` means "not available": the sample was empty, or (for the
/// capability fields) the limits were absent or the sample had zero
/// variance. Division by a zero sigma is never performed, so no field
/// ever holds a NaN or an infinity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SampleStats {
    pub count: u64,
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Population standard deviation, `sqrt(mean((v - avg)^2))`.
    pub std_dev: Option<f64>,
    pub three_sigma: Option<f64>,
    pub six_sigma: Option<f64>,
    pub cp: Option<f64>,
    pub cpk_upper: Option<f64>,
    pub cpk_lower: Option<f64>,
    /// `min(cpk_upper, cpk_lower)`. Negative when the mean sits outside
    /// the specification band; never clamped.
    pub cpk: Option<f64>,
}

impl SampleStats {
    /// Stats for an empty sample: count 0, everything else unavailable.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compute the full set of statistics over `values`.
    ///
    /// Capability indices are filled in only when `limits` is present and
    /// the sample's standard deviation is strictly positive.
    pub fn from_values(values: &[f64], limits: Option<SpecLimits>) -> Self {
        if values.is_empty() {
            return Self::empty();
        }
        let n = values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // Accumulated rounding can hand a constant sample a mean slightly
        // off the shared value and a nonzero variance; min == max pins both.
        let constant = min == max;
        let average = if constant {
            min
        } else {
            values.iter().sum::<f64>() / n
        };
        let variance = if constant {
            0.0
        } else {
            values
                .iter()
                .map(|v| {
                    let d = v - average;
                    d * d
                })
                .sum::<f64>()
                / n
        };
        let std_dev = variance.sqrt();

        let mut stats = Self {
            count: values.len() as u64,
            average: Some(average),
            min: Some(min),
            max: Some(max),
            std_dev: Some(std_dev),
            three_sigma: Some(3.0 * std_dev),
            six_sigma: Some(6.0 * std_dev),
            ..Self::default()
        };

        if let Some(limits) = limits {
            if std_dev > 0.0 {
                let cp = limits.width() / (6.0 * std_dev);
                let cpk_upper = (limits.upper - average) / (3.0 * std_dev);
                let cpk_lower = (average - limits.lower) / (3.0 * std_dev);
                stats.cp = Some(cp);
                stats.cpk_upper = Some(cpk_upper);
                stats.cpk_lower = Some(cpk_lower);
                stats.cpk = Some(cpk_upper.min(cpk_lower));
            }
        }
        stats
    }
}
