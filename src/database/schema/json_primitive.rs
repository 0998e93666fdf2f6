use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coarse kind of a JSON value, as seen by schema inference and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum JsonPrimitive {
    Null,
    Bool,
    Int,
    Float,
    String,
    Object,
    Array,
}

impl JsonPrimitive {
    pub fn of_value(value: &Value) -> JsonPrimitive {
        match value {
            Value::Null => JsonPrimitive::Null,
            Value::Bool(_) => JsonPrimitive::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => JsonPrimitive::Int,
            Value::Number(_) => JsonPrimitive::Float,
            Value::String(_) => JsonPrimitive::String,
            Value::Array(_) => JsonPrimitive::Array,
            Value::Object(_) => JsonPrimitive::Object,
        }
    }

    /// Common type of a column that has held both `a` and `b`.
    ///
    /// `Int` and `Float` meet at `Float`; `Null` yields to the other side;
    /// otherwise the first seen type wins.
    pub fn promote(a: JsonPrimitive, b: JsonPrimitive) -> JsonPrimitive {
        use JsonPrimitive::*;
        match (a, b) {
            _ if a == b => a,
            (Int, Float) | (Float, Int) => Float,
            (Null, other) => other,
            (first, _) => first,
        }
    }

    /// Position of this kind when values of different kinds are sorted
    /// together. Numbers share a rank and `Null` sorts after everything.
    pub fn sort_rank(self) -> u8 {
        match self {
            JsonPrimitive::Bool => 0,
            JsonPrimitive::Int | JsonPrimitive::Float => 1,
            JsonPrimitive::String => 2,
            JsonPrimitive::Array => 3,
            JsonPrimitive::Object => 4,
            JsonPrimitive::Null => 5,
        }
    }
}
