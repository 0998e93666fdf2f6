use serde::{de::DeserializeOwned, ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{database::JsonPrimitive, filters::{FilterParseError, LogicalOp}};

/// Operator of the comparison that matches rows duplicated across a column set.
pub const GET_DUPLICATES: &str = "get_duplicates";

/// A node of a filter expression tree.
///
/// `F` is the column key: `ColumnRef` for trees coming from clients, `String`
/// (column name) for trees handed to the record store.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode<F> {
    /// `{"and": [...]}`, `{"or": [...]}`, `{"not": [...]}`
    Logical { op: LogicalOp, children: Vec<FilterNode<F>> },
    /// `{"field": f, "op": "eq", "value": v}`
    Comparison { op: String, field: F, value: Value },
    /// `{"op": "get_duplicates", "value": [f1, f2]}`
    Duplicates { columns: Vec<F> },
}

impl<F> FilterNode<F> {
    pub fn and(children: Vec<Self>) -> Self {
        Self::Logical { op: LogicalOp::And, children }
    }

    pub fn or(children: Vec<Self>) -> Self {
        Self::Logical { op: LogicalOp::Or, children }
    }

    pub fn not(child: Self) -> Self {
        Self::Logical { op: LogicalOp::Not, children: vec![child] }
    }

    pub fn compare(op: impl Into<String>, field: F, value: Value) -> Self {
        Self::Comparison { op: op.into(), field, value }
    }

    pub fn duplicates(columns: Vec<F>) -> Self {
        Self::Duplicates { columns }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::Logical { .. })
    }
}

impl<F: DeserializeOwned> FilterNode<F> {
    /// Parse a whole filter tree.
    ///
    /// `null`, `{}` and `[]` are the empty tree. A non-empty top-level array is
    /// read as an implicit `and` of its entries.
    pub fn parse_tree(value: &Value) -> Result<Option<Self>, FilterParseError> {
        match value {
            Value::Null => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            Value::Array(items) if items.is_empty() => Ok(None),
            Value::Array(items) => Ok(Some(Self::and(Self::parse_list(items)?))),
            other => Self::parse(other).map(Some),
        }
    }

    /// Parse a single, non-empty filter node.
    pub fn parse(value: &Value) -> Result<Self, FilterParseError> {
        let Value::Object(map) = value else {
            return Err(FilterParseError::NotAnObject(JsonPrimitive::of_value(value)));
        };

        match map.get("op") {
            Some(Value::String(op)) if op == GET_DUPLICATES => Self::parse_duplicates(map),
            Some(Value::String(op)) => {
                let field = map.get("field").ok_or(FilterParseError::MissingKey("field"))?;
                Ok(Self::Comparison {
                    op: op.clone(),
                    field: Self::parse_field(field)?,
                    value: map.get("value").cloned().unwrap_or(Value::Null),
                })
            }
            Some(_) => Err(FilterParseError::InvalidOperator),
            None if map.contains_key("field") => Err(FilterParseError::MissingKey("op")),
            None => Self::parse_logical(map),
        }
    }

    fn parse_logical(map: &Map<String, Value>) -> Result<Self, FilterParseError> {
        let mut entries = map.iter();
        let (key, inner) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                let keys = map.keys().cloned().collect::<Vec<_>>().join(",");
                return Err(FilterParseError::UnknownCombinator(keys));
            }
        };
        let op = LogicalOp::parse(key).ok_or_else(|| FilterParseError::UnknownCombinator(key.clone()))?;

        let children = match (op, inner) {
            (LogicalOp::Not, Value::Object(_)) => vec![Self::parse(inner)?],
            (_, Value::Array(items)) => Self::parse_list(items)?,
            _ => return Err(FilterParseError::EmptyCombinator(op)),
        };

        match (op, children.len()) {
            (LogicalOp::Not, 1) => {}
            (LogicalOp::Not, n) => return Err(FilterParseError::NotArity(n)),
            (_, 0) => return Err(FilterParseError::EmptyCombinator(op)),
            _ => {}
        }

        Ok(Self::Logical { op, children })
    }

    fn parse_duplicates(map: &Map<String, Value>) -> Result<Self, FilterParseError> {
        let columns = match map.get("value") {
            Some(Value::Array(items)) => items.iter().map(Self::parse_field).collect::<Result<Vec<_>, _>>()?,
            Some(other) => return Err(FilterParseError::InvalidField(other.to_string())),
            None => return Err(FilterParseError::MissingKey("value")),
        };
        if columns.is_empty() {
            return Err(FilterParseError::EmptyDuplicates);
        }
        Ok(Self::Duplicates { columns })
    }

    fn parse_list(items: &[Value]) -> Result<Vec<Self>, FilterParseError> {
        items.iter().map(Self::parse).collect()
    }

    fn parse_field(value: &Value) -> Result<F, FilterParseError> {
        serde_json::from_value(value.clone()).map_err(|_| FilterParseError::InvalidField(value.to_string()))
    }
}

impl<F: Serialize> Serialize for FilterNode<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterNode::Logical { op, children } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(op.as_str(), children)?;
                map.end()
            }
            FilterNode::Comparison { op, field, value } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("field", field)?;
                map.serialize_entry("op", op)?;
                map.serialize_entry("value", value)?;
                map.end()
            }
            FilterNode::Duplicates { columns } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("op", GET_DUPLICATES)?;
                map.serialize_entry("value", columns)?;
                map.end()
            }
        }
    }
}

impl<'de, F: DeserializeOwned> Deserialize<'de> for FilterNode<F> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}
