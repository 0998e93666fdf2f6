use std::fmt::Display;

use thiserror::Error;
use uuid::Uuid;

use crate::database::IdType;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdValue {
    Uuid(String),
    Int(u64),
}

impl Display for IdValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdValue::Uuid(uuid) => f.write_str(uuid),
            IdValue::Int(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot seed a {id_type:?} id generator with {value}")]
pub struct IdSeedError {
    pub id_type: IdType,
    pub value: IdValue,
}

/// Id generator for one table, or for the column registry of a `Db`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IdManager {
    pub id_type: IdType,
    pub current: Option<IdValue>,
}

impl IdManager {
    pub fn new(id_type: IdType) -> Self {
        Self { id_type, current: None }
    }

    /// Continue numbering after `value`. Only integer generators can be
    /// seeded, and never backwards.
    pub fn seed(&mut self, value: IdValue) -> Result<(), IdSeedError> {
        let (IdType::Int, IdValue::Int(new)) = (self.id_type, &value) else {
            return Err(IdSeedError { id_type: self.id_type, value });
        };
        let new = *new;

        if !matches!(self.current, Some(IdValue::Int(current)) if current >= new) {
            self.current = Some(IdValue::Int(new));
        }
        Ok(())
    }
}

impl Iterator for IdManager {
    type Item = IdValue;

    fn next(&mut self) -> Option<Self::Item> {
        let item = match (&self.id_type, &self.current) {
            (IdType::None, _) => return None,
            (IdType::Int, Some(IdValue::Int(id))) => IdValue::Int(id.checked_add(1)?),
            (IdType::Int, _) => IdValue::Int(1),
            (IdType::Uuid, _) => IdValue::Uuid(Uuid::new_v4().to_string()),
        };

        self.current = Some(item.clone());
        Some(item)
    }
}
