pub mod id_type;
pub use id_type::*;

pub mod id_manager;
pub use id_manager::*;

pub mod table_config;
pub use table_config::*;

pub mod schema;
pub use schema::*;

pub mod record_eval;
pub use record_eval::*;

pub mod memory_table;
pub use memory_table::*;

pub mod db;
pub use db::*;
