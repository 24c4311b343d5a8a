use crate::util::bold;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArgsError {
    #[error("invalid day '{0}'; expected YYYY-MM-DD, DD-MM-YYYY, or DD/MM/YYYY")]
    DayInvalid(String),

    #[error("nothing to change; set {}, {} or {}", bold("--value"), bold("--remark"), bold("--clear-remark"))]
    EditArgsMissing,

    #[error("unknown family '{0}'; expected 'sand' or 'runner'")]
    FamilyInvalid(String),

    #[error("{} and {} must be set together", bold("--lower"), bold("--upper"))]
    LimitsIncomplete,

    #[error("invalid limits")]
    LimitsInvalid(#[from] greensand_core::GreensandError),

    #[error("either set {} or clear them with {}", bold("--lower/--upper"), bold("--clear"))]
    LimitsUpdateMissing,

    #[error("{} and {} must be set together", bold("--start"), bold("--end"))]
    RangeIncomplete,

    #[error("invalid timestamp '{0}'; expected 'YYYY-MM-DD HH:MM[:SS]'")]
    TimestampInvalid(String),
}
