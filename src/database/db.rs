use std::sync::{Arc, RwLock};

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use tracing::debug;

use crate::{
    columns::{CatalogError, ColumnCatalog, ColumnMeta, ColumnRef},
    database::{IdManager, IdType, IdValue, InternalMemoryTable, MemoryTable, TableCommon, TableConfig},
    storage::StorageError,
};

pub type Db = Arc<RwLock<InternalDb>>;

#[derive(Debug, Clone)]
struct RegisteredColumn {
    table: String,
    meta: ColumnMeta,
}

/// Tables plus a registry giving every (table, column) pair a stable
/// [`ColumnRef`], so the database can act as a column catalog.
#[derive(Debug)]
pub struct InternalDb {
    config: TableConfig,
    tables: IndexMap<String, MemoryTable>,
    columns: IndexMap<ColumnRef, RegisteredColumn>,
    column_ids: IdManager,
}

impl InternalDb {
    pub fn new_db() -> Self {
        Self::new_db_with_config(TableConfig::default())
    }

    pub fn new_db_with_config(config: TableConfig) -> Self {
        Self {
            config,
            tables: IndexMap::new(),
            columns: IndexMap::new(),
            column_ids: IdManager::new(IdType::Int),
        }
    }

    pub fn into_protected(self) -> Db {
        Arc::new(RwLock::new(self))
    }

    pub fn create(&mut self, name: &str) -> MemoryTable {
        self.create_with_config(name, self.config.clone())
    }

    /// Create (or replace) a table. Column refs of a replaced table are
    /// dropped; re-register them with [`InternalDb::sync_columns`].
    pub fn create_with_config(&mut self, name: &str, config: TableConfig) -> MemoryTable {
        let table = InternalMemoryTable::new(name, config).into_protected();
        let key = name.to_ascii_lowercase();
        self.columns.retain(|_, column| column.table != key);
        self.tables.insert(key, Arc::clone(&table));
        table
    }

    pub fn get(&self, name: &str) -> Option<MemoryTable> {
        self.tables.get(&name.to_ascii_lowercase()).map(Arc::clone)
    }

    pub fn list_tables(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    /// Give a [`ColumnRef`] to every schema column of `name` that has none
    /// yet, then return the table's columns in schema order.
    pub fn sync_columns(&mut self, name: &str) -> Result<Vec<ColumnMeta>, StorageError> {
        let key = name.to_ascii_lowercase();
        let table = self.get(&key).ok_or_else(|| StorageError::InvalidData(format!("no table named '{key}'")))?;
        let schema = table.schema()?;

        for column in schema.names() {
            if self.column_ref(&key, column).is_some() {
                continue;
            }
            let id = match self.column_ids.next() {
                Some(IdValue::Int(id)) => i64::try_from(id).ok(),
                _ => None,
            }
            .map(ColumnRef)
            .ok_or_else(|| StorageError::Unavailable("column id space exhausted".to_string()))?;
            debug!(table = %key, column, id = %id, "registered column");
            self.columns.insert(id, RegisteredColumn { table: key.clone(), meta: ColumnMeta::new(id, column) });
        }

        Ok(self.table_columns(&key))
    }

    /// Registered columns of a table; empty for unknown tables.
    pub fn table_columns(&self, name: &str) -> Vec<ColumnMeta> {
        let key = name.to_ascii_lowercase();
        self.columns
            .values()
            .filter(|column| column.table == key)
            .map(|column| column.meta.clone())
            .collect()
    }

    pub fn column_ref(&self, table: &str, column: &str) -> Option<ColumnRef> {
        let key = table.to_ascii_lowercase();
        self.columns
            .iter()
            .find(|(_, registered)| registered.table == key && registered.meta.name == column)
            .map(|(id, _)| *id)
    }
}

impl ColumnCatalog for InternalDb {
    fn lookup(&self, ids: &IndexSet<ColumnRef>) -> Result<IndexMap<ColumnRef, ColumnMeta>, CatalogError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.columns.get(id).map(|column| (*id, column.meta.clone())))
            .collect())
    }
}

pub trait DbCommon {
    fn new_db() -> Self;
    fn new_db_with_config(config: TableConfig) -> Self;
    fn create(&self, name: &str) -> Result<MemoryTable, StorageError>;
    fn create_with_config(&self, name: &str, config: TableConfig) -> Result<MemoryTable, StorageError>;
    /// Create `name` from a JSON array of rows and register its columns.
    fn load_table(&self, name: &str, rows: Value) -> Result<MemoryTable, StorageError>;
    fn get(&self, name: &str) -> Result<Option<MemoryTable>, StorageError>;
    fn list_tables(&self) -> Result<Vec<String>, StorageError>;
    fn sync_columns(&self, name: &str) -> Result<Vec<ColumnMeta>, StorageError>;
    fn table_columns(&self, name: &str) -> Result<Vec<ColumnMeta>, StorageError>;
    fn column_ref(&self, table: &str, column: &str) -> Result<Option<ColumnRef>, StorageError>;
}

impl DbCommon for Db {
    fn new_db() -> Self {
        InternalDb::new_db().into_protected()
    }

    fn new_db_with_config(config: TableConfig) -> Self {
        InternalDb::new_db_with_config(config).into_protected()
    }

    fn create(&self, name: &str) -> Result<MemoryTable, StorageError> {
        Ok(self.write()?.create(name))
    }

    fn create_with_config(&self, name: &str, config: TableConfig) -> Result<MemoryTable, StorageError> {
        Ok(self.write()?.create_with_config(name, config))
    }

    fn load_table(&self, name: &str, rows: Value) -> Result<MemoryTable, StorageError> {
        let mut db = self.write()?;
        let table = db.create(name);
        table.load_from_json(rows, false)?;
        db.sync_columns(name)?;
        Ok(table)
    }

    fn get(&self, name: &str) -> Result<Option<MemoryTable>, StorageError> {
        Ok(self.read()?.get(name))
    }

    fn list_tables(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read()?.list_tables())
    }

    fn sync_columns(&self, name: &str) -> Result<Vec<ColumnMeta>, StorageError> {
        self.write()?.sync_columns(name)
    }

    fn table_columns(&self, name: &str) -> Result<Vec<ColumnMeta>, StorageError> {
        Ok(self.read()?.table_columns(name))
    }

    fn column_ref(&self, table: &str, column: &str) -> Result<Option<ColumnRef>, StorageError> {
        Ok(self.read()?.column_ref(table, column))
    }
}

impl ColumnCatalog for Db {
    fn lookup(&self, ids: &IndexSet<ColumnRef>) -> Result<IndexMap<ColumnRef, ColumnMeta>, CatalogError> {
        self.read()
            .map_err(|_| CatalogError::Unavailable("database lock poisoned".to_string()))?
            .lookup(ids)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn mk_db() -> Db {
        let db = Db::new_db_with_config(TableConfig::int("id"));
        db.load_table("People", json!([
            {"id": 1, "name": "Ana", "city": "Porto"},
            {"id": 2, "name": "Bruno", "city": "Braga"}
        ]))
        .unwrap();
        db.load_table("pets", json!([{"id": 1, "name": "Rex", "owner": 1}])).unwrap();
        db
    }

    #[test]
    fn test_columns_get_sequential_refs_across_tables() {
        let db = mk_db();

        let people = db.table_columns("people").unwrap();
        let pets = db.table_columns("pets").unwrap();

        assert_eq!(people, vec![ColumnMeta::new(1, "id"), ColumnMeta::new(2, "name"), ColumnMeta::new(3, "city")]);
        assert_eq!(pets, vec![ColumnMeta::new(4, "id"), ColumnMeta::new(5, "name"), ColumnMeta::new(6, "owner")]);
        assert_eq!(db.column_ref("PEOPLE", "city").unwrap(), Some(ColumnRef(3)));
        assert_eq!(db.list_tables().unwrap(), vec!["people", "pets"]);
    }

    #[test]
    fn test_sync_registers_only_new_columns() {
        let db = mk_db();
        let people = db.get("people").unwrap().unwrap();
        people.add(json!({"name": "Carla", "email": "c@x.pt"})).unwrap();

        let columns = db.sync_columns("people").unwrap();

        assert_eq!(columns.last(), Some(&ColumnMeta::new(7, "email")));
        assert_eq!(db.column_ref("people", "name").unwrap(), Some(ColumnRef(2)));
    }

    #[test]
    fn test_lookup_skips_unknown_ids() {
        let db = mk_db();
        let ids: IndexSet<ColumnRef> = [ColumnRef(3), ColumnRef(42), ColumnRef(5)].into_iter().collect();

        let found = db.lookup(&ids).unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[&ColumnRef(3)].name, "city");
        assert_eq!(found[&ColumnRef(5)].name, "name");
    }

    #[test]
    fn test_replacing_a_table_drops_its_refs() {
        let db = mk_db();

        db.create("people").unwrap();

        assert!(db.table_columns("people").unwrap().is_empty());
        assert_eq!(db.column_ref("pets", "owner").unwrap(), Some(ColumnRef(6)));
    }

    #[test]
    fn test_sync_unknown_table() {
        let db = mk_db();

        assert!(matches!(db.sync_columns("nope"), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_poisoned_lock_is_reported_as_unavailable() {
        let db = mk_db();
        let poisoner = Arc::clone(&db);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(db.get("people"), Err(StorageError::Unavailable(_))));
        assert!(matches!(db.list_tables(), Err(StorageError::Unavailable(_))));
        assert!(matches!(db.column_ref("people", "name"), Err(StorageError::Unavailable(_))));
        assert!(matches!(db.table_columns("people"), Err(StorageError::Unavailable(_))));
        assert!(matches!(db.create("other"), Err(StorageError::Unavailable(_))));
        assert!(matches!(db.lookup(&IndexSet::new()), Err(CatalogError::Unavailable(_))));
    }
}
