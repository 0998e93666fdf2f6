pub mod pagination_error;
pub use pagination_error::*;

pub mod pagination_config;
pub use pagination_config::*;

pub mod page_params;
pub use page_params::*;

pub mod order_by;
pub use order_by::*;

pub mod page_result;
pub use page_result::*;

pub mod pagination_controller;
pub use pagination_controller::*;

#[cfg(test)]
mod _tests;
