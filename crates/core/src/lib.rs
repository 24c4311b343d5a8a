pub mod bucket;
pub mod db;
pub mod error;
pub mod import;
pub mod limits;
pub mod reading;
pub mod stats;
pub mod summary;
pub mod upsert;

pub type Result<T> = std::result::Result<T, error::GreensandError>;
pub use error::GreensandError;
