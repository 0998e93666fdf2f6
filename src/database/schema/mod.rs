pub mod json_primitive;
pub use json_primitive::*;

pub mod field_info;
pub use field_info::*;

pub mod schema_dict;
pub use schema_dict::*;
