use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::database::FieldInfo;

/// Columns of a table inferred from the rows loaded into it, in the order
/// they were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDict {
    pub fields: IndexMap<String, FieldInfo>,
}

impl SchemaDict {
    pub fn get(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fold one more row into the schema. Columns missing from `row` become
    /// nullable; new columns are appended.
    pub fn merge_row(&mut self, row: &Map<String, Value>) {
        for (name, info) in self.fields.iter_mut() {
            if !row.contains_key(name) {
                info.nullable = true;
            }
        }

        for (name, value) in row {
            let seen = FieldInfo::infer(value);
            match self.fields.get_mut(name) {
                Some(known) => *known = known.merge(&seen),
                None => {
                    self.fields.insert(name.clone(), seen);
                }
            }
        }
    }
}
