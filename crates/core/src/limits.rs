//! Specification limits and the per-plant defaults file.

use crate::error::GreensandError;
use crate::reading::SeriesId;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;

/// Lower/upper specification limits for one series.
///
/// Limits are what the process is *supposed* to hold, set by metallurgy,
/// not derived from the data. Capability indices compare the observed
/// spread against this band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecLimits {
    pub lower: f64,
    pub upper: f64,
}

impl SpecLimits {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        let limits = Self { lower, upper };
        limits.validate()?;
        Ok(limits)
    }

    /// Check invariants after deserializing.
    pub fn validate(&self) -> Result<()> {
        if !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(GreensandError::InvalidLimits(format!(
                "limits must be finite, got {}..{}",
                self.lower, self.upper
            )));
        }
        if self.lower >= self.upper {
            return Err(GreensandError::InvalidLimits(format!(
                "lower limit {} must be below upper limit {}",
                self.lower, self.upper
            )));
        }
        Ok(())
    }

    /// Width of the specification band.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl Display for SpecLimits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.lower, self.upper)
    }
}

/// What to do with a bucket's limits during an upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum LimitsUpdate {
    /// Leave whatever the bucket already has.
    #[default]
    Keep,
    Set(SpecLimits),
    Clear,
}

/// Default limits per series, loaded from a TOML file.
///
/// ```toml
/// [moisture]
/// lower = 2.8
/// upper = 4.2
///
/// [pouring_temperature]
/// lower = 1380.0
/// upper = 1420.0
/// ```
///
/// The import pipeline stamps these onto buckets it creates; buckets that
/// already carry limits are left alone.
#[derive(Debug, Clone, Default)]
pub struct LimitsConfig {
    defaults: HashMap<SeriesId, SpecLimits>,
}

impl LimitsConfig {
    /// Parse a defaults file from TOML on disk.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse defaults from raw TOML.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let raw: HashMap<String, SpecLimits> = toml::from_str(toml)?;
        let mut defaults = HashMap::with_capacity(raw.len());
        for (name, limits) in raw {
            let series: SeriesId = name.parse()?;
            limits.validate()?;
            defaults.insert(series, limits);
        }
        Ok(Self { defaults })
    }

    pub fn get(&self, series: SeriesId) -> Option<SpecLimits> {
        self.defaults.get(&series).copied()
    }

    pub fn insert(&mut self, series: SeriesId, limits: SpecLimits) {
        self.defaults.insert(series, limits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{RunnerMetric, SandParameter};

    #[test]
    fn rejects_inverted_limits() {
        assert!(SpecLimits::new(5.0, 20.0).is_ok());
        assert!(SpecLimits::new(20.0, 5.0).is_err());
        assert!(SpecLimits::new(5.0, 5.0).is_err());
        assert!(SpecLimits::new(f64::NAN, 5.0).is_err());
    }

    #[test]
    fn width_spans_the_band() {
        let limits = SpecLimits::new(5.0, 20.0).unwrap();
        assert_eq!(limits.width(), 15.0);
    }

    #[test]
    fn parses_defaults_toml() {
        let cfg = LimitsConfig::from_toml_str(
            r#"
            [moisture]
            lower = 2.8
            upper = 4.2

            [pouring_temperature]
            lower = 1380.0
            upper = 1420.0
            "#,
        )
        .unwrap();

        let moisture = cfg.get(SeriesId::Sand(SandParameter::Moisture)).unwrap();
        assert_eq!(moisture.lower, 2.8);
        assert_eq!(moisture.upper, 4.2);
        let pour = cfg
            .get(SeriesId::Runner(RunnerMetric::PouringTemperature))
            .unwrap();
        assert_eq!(pour.upper, 1420.0);
        assert!(cfg.get(SeriesId::Sand(SandParameter::Ph)).is_none());
    }

    #[test]
    fn rejects_unknown_series_in_defaults() {
        let res = LimitsConfig::from_toml_str(
            r#"
            [sand_quality]
            lower = 1.0
            upper = 2.0
            "#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn rejects_invalid_band_in_defaults() {
        let res = LimitsConfig::from_toml_str(
            r#"
            [moisture]
            lower = 4.2
            upper = 2.8
            "#,
        );
        assert!(res.is_err());
    }
}
