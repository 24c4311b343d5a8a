use crate::db::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GreensandError {
    #[error("storage error")]
    Store(#[from] StoreError),

    #[error("unknown series name: '{0}'")]
    UnknownSeries(String),

    #[error("series '{series}' does not belong to the {family} family")]
    FamilyMismatch { series: String, family: String },

    #[error("invalid spec limits: {0}")]
    InvalidLimits(String),

    #[error("failed to parse limits config: {0}")]
    LimitsConfig(#[from] toml::de::Error),

    #[error("io error")]
    Io(#[from] std::io::Error),

    #[error("value is not a finite number: {0}")]
    NonFiniteValue(f64),

    #[error("no reading with id {0}")]
    ReadingNotFound(i64),

    #[error("invalid date range: {start} is after {end}")]
    InvalidRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("import payload is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("failed to read import payload: {0}")]
    Csv(#[from] csv::Error),
}
