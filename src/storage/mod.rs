pub mod storage_error;
pub use storage_error::*;

pub mod record_storage;
pub use record_storage::*;
