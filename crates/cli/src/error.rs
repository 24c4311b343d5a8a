use crate::{commands::error::ArgsError, util::error::UtilError};
use greensand_core::GreensandError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid arg(s)")]
    Args(#[from] ArgsError),

    #[error("core error")]
    Core(#[from] GreensandError),

    #[error("csv error")]
    Csv(#[from] csv::Error),

    #[error("db error")]
    Db(#[from] greensand_sqlite::Error),

    #[error("io error")]
    Io(#[from] std::io::Error),

    #[error("json serialization error")]
    Json(#[from] serde_json::Error),

    #[error("util error")]
    Util(#[from] UtilError),
}
