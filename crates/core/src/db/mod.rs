mod aggregate;
mod error;
mod mock;
mod r#trait;

pub use aggregate::Aggregate;
pub use error::StoreError;
pub use mock::{MockError, MockStore};
pub use r#trait::ReadingStore;
