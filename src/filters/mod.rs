pub mod logical_op;
pub use logical_op::*;

pub mod filter_node;
pub use filter_node::*;

pub mod filter_parse_error;
pub use filter_parse_error::*;

pub mod filter_folder;
pub use filter_folder::*;

pub mod filter_tree_transformer;
pub use filter_tree_transformer::*;
