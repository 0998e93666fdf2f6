use thiserror::Error;

use crate::{database::JsonPrimitive, filters::LogicalOp};

/// Reasons a JSON document is not a valid filter tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterParseError {
    #[error("filter node must be a JSON object, found {0:?}")]
    NotAnObject(JsonPrimitive),
    #[error("unknown filter combinator '{0}'")]
    UnknownCombinator(String),
    #[error("filter node is missing '{0}'")]
    MissingKey(&'static str),
    #[error("filter operator must be a string")]
    InvalidOperator,
    #[error("'{0}' requires a non-empty list of filters")]
    EmptyCombinator(LogicalOp),
    #[error("'not' takes exactly one filter, found {0}")]
    NotArity(usize),
    #[error("'get_duplicates' requires a non-empty list of columns")]
    EmptyDuplicates,
    #[error("invalid column reference: {0}")]
    InvalidField(String),
}
