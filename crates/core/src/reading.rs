//! Measurement series identifiers and reading records.
//!
//! Series names form a closed set: batch imports and CLI arguments are
//! validated against these enums before anything reaches the aggregation
//! core, so a typo'd parameter name can never create a stray bucket.

use crate::error::GreensandError;
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use strum::{EnumIter, EnumString, IntoEnumIterator};

/// The two reading families the plant records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, strum::Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Family {
    /// Green-sand laboratory tests, sampled from the moulding line.
    Sand,
    /// Per-pour measurements taken at the runner/gating system.
    Runner,
}

/// Green-sand test parameters tracked by the lab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, strum::Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum SandParameter {
    Moisture,
    Compactability,
    Permeability,
    GreenCompressiveStrength,
    WetTensileStrength,
    ShearStrength,
    ActiveClay,
    DeadClay,
    TotalClay,
    VolatileMatter,
    LossOnIgnition,
    AfsFineness,
    SandTemperature,
    MouldHardness,
    Friability,
    SpecimenWeight,
    Ph,
    Fines,
}

/// Per-pour measurements taken at the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, strum::Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum RunnerMetric {
    PouringTemperature,
    PouringTime,
    PouringWeight,
    HeadHeight,
}

/// One measured series: a sand-test parameter or a runner metric.
///
/// Serialized/displayed as the bare snake_case name; names are disjoint
/// across the two families, so the name alone identifies the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesId {
    Sand(SandParameter),
    Runner(RunnerMetric),
}

impl SeriesId {
    pub fn family(&self) -> Family {
        match self {
            SeriesId::Sand(_) => Family::Sand,
            SeriesId::Runner(_) => Family::Runner,
        }
    }

    /// Unit of measure, for display only.
    pub fn unit(&self) -> &'static str {
        match self {
            SeriesId::Sand(p) => match p {
                SandParameter::Moisture
                | SandParameter::Compactability
                | SandParameter::ActiveClay
                | SandParameter::DeadClay
                | SandParameter::TotalClay
                | SandParameter::VolatileMatter
                | SandParameter::LossOnIgnition
                | SandParameter::Friability
                | SandParameter::Fines => "%",
                SandParameter::Permeability => "AFS",
                SandParameter::GreenCompressiveStrength
                | SandParameter::WetTensileStrength
                | SandParameter::ShearStrength => "kPa",
                SandParameter::AfsFineness => "GFN",
                SandParameter::SandTemperature => "\u{00b0}C",
                SandParameter::MouldHardness => "B",
                SandParameter::SpecimenWeight => "g",
                SandParameter::Ph => "pH",
            },
            SeriesId::Runner(m) => match m {
                RunnerMetric::PouringTemperature => "\u{00b0}C",
                RunnerMetric::PouringTime => "s",
                RunnerMetric::PouringWeight => "kg",
                RunnerMetric::HeadHeight => "mm",
            },
        }
    }

    /// Every known series, sand parameters first.
    pub fn all() -> impl Iterator<Item = SeriesId> {
        SandParameter::iter()
            .map(SeriesId::Sand)
            .chain(RunnerMetric::iter().map(SeriesId::Runner))
    }

    /// Parse a name that must belong to `family`. Used by the import
    /// pipeline, where the family is fixed per payload.
    pub fn parse_in_family(name: &str, family: Family) -> Result<SeriesId, GreensandError> {
        let series: SeriesId = name.parse()?;
        if series.family() != family {
            return Err(GreensandError::FamilyMismatch {
                series: series.to_string(),
                family: family.to_string(),
            });
        }
        Ok(series)
    }
}

impl Display for SeriesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesId::Sand(p) => write!(f, "{p}"),
            SeriesId::Runner(m) => write!(f, "{m}"),
        }
    }
}

impl FromStr for SeriesId {
    type Err = GreensandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if let Ok(p) = name.parse::<SandParameter>() {
            return Ok(SeriesId::Sand(p));
        }
        if let Ok(m) = name.parse::<RunnerMetric>() {
            return Ok(SeriesId::Runner(m));
        }
        Err(GreensandError::UnknownSeries(name.to_owned()))
    }
}

impl Serialize for SeriesId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One observed measurement, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Plant-local wall-clock time of the measurement. Sources that only
    /// supply a date get midnight.
    pub taken_at: NaiveDateTime,
    pub value: f64,
    pub remark: Option<String>,
}

impl Reading {
    /// Build a reading, rejecting NaN/infinite values. The aggregation core
    /// assumes every stored value is finite.
    pub fn new(
        taken_at: NaiveDateTime,
        value: f64,
        remark: Option<String>,
    ) -> Result<Self, GreensandError> {
        if !value.is_finite() {
            return Err(GreensandError::NonFiniteValue(value));
        }
        Ok(Self {
            taken_at,
            value,
            remark,
        })
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.taken_at.time()
    }
}

/// A reading as returned from the store, with its assigned row id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredReading {
    pub id: i64,
    pub reading: Reading,
}
