use serde_json::Value;

use crate::database::JsonPrimitive;

/// Inferred type and nullability of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub ty: JsonPrimitive,
    pub nullable: bool,
}

impl FieldInfo {
    pub fn infer(value: &Value) -> FieldInfo {
        let ty = JsonPrimitive::of_value(value);
        FieldInfo { ty, nullable: ty == JsonPrimitive::Null }
    }

    pub fn merge(&self, other: &FieldInfo) -> FieldInfo {
        FieldInfo {
            ty: JsonPrimitive::promote(self.ty, other.ty),
            nullable: self.nullable || other.nullable,
        }
    }
}
