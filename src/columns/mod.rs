pub mod column_ref;
pub use column_ref::*;

pub mod column_meta;
pub use column_meta::*;

pub mod column_error;
pub use column_error::*;

pub mod column_catalog;
pub use column_catalog::*;

pub mod column_resolver;
pub use column_resolver::*;
