use thiserror::Error;

#[derive(Debug, Error)]
pub enum UtilError {
    #[error("env error")]
    EnvVar(#[from] std::env::VarError),

    #[error("io error")]
    Io(#[from] std::io::Error),

    #[error("failed to make a backup of the DB: {0}")]
    DBBackupFailed(std::io::Error),

    #[error("failed to import DB from file: {0}")]
    DBImportFailed(std::io::Error),

    #[error("source database file does not exist")]
    DBDoesNotExist,

    #[error("failed to export database: {0}")]
    DBExportFailed(std::io::Error),
}
