pub mod grouping_spec;
pub use grouping_spec::*;

pub mod group_result;
pub use group_result::*;

pub mod record_post_processor;
pub use record_post_processor::*;

pub mod group_by_assembler;
pub use group_by_assembler::*;
