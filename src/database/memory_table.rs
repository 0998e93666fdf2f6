use std::{cmp::Ordering, fs, path::Path, sync::{Arc, RwLock}};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::{
    database::{IdManager, IdType, IdValue, RecordEval, SchemaDict, TableConfig},
    filters::NamedFilter,
    grouping::{DISTINCT_MODE, GROUP_ID_KEY, GROUP_METADATA_KEY},
    pagination::{OrderBySpec, SortDirection},
    storage::{FetchRequest, Record, RecordStorage, StorageError},
};

/// Shared handle to an in-memory table.
pub type MemoryTable = Arc<RwLock<InternalMemoryTable>>;

/// Rows of one table keyed by their id, kept in insertion order, plus the
/// schema inferred from everything loaded so far.
#[derive(Debug)]
pub struct InternalMemoryTable {
    rows: IndexMap<String, Record>,
    id_manager: IdManager,
    config: TableConfig,
    pub name: String,
    pub schema: SchemaDict,
}

struct DistinctGroup {
    count: usize,
    values: Map<String, Value>,
}

impl InternalMemoryTable {
    pub fn new(name: &str, config: TableConfig) -> Self {
        Self {
            rows: IndexMap::new(),
            id_manager: IdManager::new(config.id_type),
            config,
            name: name.to_ascii_lowercase(),
            schema: SchemaDict::default(),
        }
    }

    pub fn into_protected(self) -> MemoryTable {
        Arc::new(RwLock::new(self))
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.rows.get(id)
    }

    /// Store one object row. An id already present under the id key is kept
    /// (and advances an integer generator); otherwise one is generated.
    /// Returns `None` for non-objects and for rows that end up without an id.
    pub fn add(&mut self, item: Value) -> Option<Record> {
        let Value::Object(row) = item else {
            warn!(table = %self.name, "skipping non-object row");
            return None;
        };
        self.insert_row(row)
    }

    /// Store every object in a JSON array; returns the rows actually stored.
    pub fn add_batch(&mut self, items: Value) -> Vec<Record> {
        let Value::Array(items) = items else {
            warn!(table = %self.name, "batch is not a JSON array, nothing added");
            return Vec::new();
        };

        let total = items.len();
        let added: Vec<Record> = items.into_iter().filter_map(|item| self.add(item)).collect();
        if added.len() < total {
            warn!(table = %self.name, skipped = total - added.len(), "rows skipped while loading");
        }
        added
    }

    pub fn clear(&mut self) -> usize {
        let count = self.rows.len();
        self.rows.clear();
        self.schema = SchemaDict::default();
        self.id_manager = IdManager::new(self.config.id_type);
        count
    }

    /// Load rows from a JSON array, replacing the current content unless `keep`.
    pub fn load_from_json(&mut self, json: Value, keep: bool) -> Result<Vec<Record>, StorageError> {
        if !json.is_array() {
            return Err(StorageError::InvalidData(format!(
                "data for table '{}' is not a JSON array",
                self.name
            )));
        }
        if !keep {
            self.clear();
        }
        Ok(self.add_batch(json))
    }

    pub fn load_from_file(&mut self, path: &Path) -> Result<usize, StorageError> {
        let content = fs::read_to_string(path)
            .map_err(|e| StorageError::Unavailable(format!("could not read {}: {e}", path.display())))?;
        let json = serde_json::from_str::<Value>(&content)
            .map_err(|e| StorageError::InvalidData(format!("{} is not valid JSON: {e}", path.display())))?;

        let loaded = self.load_from_json(json, false)?.len();
        debug!(table = %self.name, loaded, path = %path.display(), "loaded table from file");
        Ok(loaded)
    }

    fn insert_row(&mut self, mut row: Record) -> Option<Record> {
        let id = match row.get(&self.config.id_key) {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => {
                if let (IdType::Int, Some(n)) = (self.id_manager.id_type, id.as_u64()) {
                    if let Err(e) = self.id_manager.seed(IdValue::Int(n)) {
                        warn!(table = %self.name, error = %e, "could not advance id generator");
                    }
                }
                id.to_string()
            }
            _ => {
                let Some(generated) = self.next_free_id() else {
                    warn!(table = %self.name, id_key = %self.config.id_key, "row has no id, skipping");
                    return None;
                };
                let value = match &generated {
                    IdValue::Int(n) => Value::from(*n),
                    IdValue::Uuid(uuid) => Value::String(uuid.clone()),
                };
                row.insert(self.config.id_key.clone(), value);
                generated.to_string()
            }
        };

        if self.rows.contains_key(&id) {
            warn!(table = %self.name, id = %id, "replacing the row already stored under this id");
        }

        self.schema.merge_row(&row);
        self.rows.insert(id, row.clone());
        Some(row)
    }

    /// Next generated id not already taken by a row that brought its own.
    fn next_free_id(&mut self) -> Option<IdValue> {
        loop {
            let id = self.id_manager.next()?;
            if !self.rows.contains_key(&id.to_string()) {
                return Some(id);
            }
        }
    }

    fn ensure_column(&self, column: &str) -> Result<(), StorageError> {
        if self.schema.contains(column) {
            Ok(())
        } else {
            Err(StorageError::UnknownColumn(column.to_string()))
        }
    }

    fn filtered_rows(&self, filters: Option<&NamedFilter>) -> Result<Vec<&Record>, StorageError> {
        let Some(filter) = filters else {
            return Ok(self.rows.values().collect());
        };

        let compiled = RecordEval::compile(filter, &self.schema, self.rows.values())?;
        let rows: Vec<&Record> = self.rows.values().filter(|row| RecordEval::matches(&compiled, row)).collect();
        trace!(table = %self.name, scanned = self.rows.len(), matched = rows.len(), "filtered table scan");
        Ok(rows)
    }

    /// Grouping columns lead the ordering so each group is contiguous; an
    /// explicit direction given for a grouping column is honoured.
    fn sort_keys(order_by: &[OrderBySpec<String>], group_columns: &[String]) -> Vec<OrderBySpec<String>> {
        let mut keys: Vec<OrderBySpec<String>> = group_columns
            .iter()
            .map(|column| {
                order_by
                    .iter()
                    .find(|spec| &spec.field == column)
                    .cloned()
                    .unwrap_or_else(|| OrderBySpec::asc(column.clone()))
            })
            .collect();
        keys.extend(order_by.iter().filter(|spec| !group_columns.contains(&spec.field)).cloned());
        keys
    }

    fn sort_rows(rows: &mut [&Record], keys: &[OrderBySpec<String>]) {
        rows.sort_by(|a, b| {
            for key in keys {
                let ordering = RecordEval::compare_values(
                    RecordEval::cell(a, &key.field),
                    RecordEval::cell(b, &key.field),
                );
                let ordering = match key.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    /// Index of the group each sorted row belongs to, and the groups found.
    fn distinct_groups(rows: &[&Record], columns: &[String]) -> (Vec<usize>, Vec<DistinctGroup>) {
        let mut membership = Vec::with_capacity(rows.len());
        let mut groups: Vec<DistinctGroup> = Vec::new();
        let mut previous: Option<String> = None;

        for row in rows {
            let key = RecordEval::group_key(row, columns);
            if previous.as_ref() != Some(&key) {
                let values = columns
                    .iter()
                    .map(|column| (column.clone(), RecordEval::cell(row, column).clone()))
                    .collect();
                groups.push(DistinctGroup { count: 0, values });
                previous = Some(key);
            }
            if let Some(group) = groups.last_mut() {
                group.count += 1;
            }
            membership.push(groups.len() - 1);
        }

        (membership, groups)
    }

    fn annotation(group_id: usize, group: &DistinctGroup) -> Value {
        let mut annotation = Map::new();
        annotation.insert(GROUP_ID_KEY.to_string(), Value::from(group_id));
        annotation.insert("count".to_string(), Value::from(group.count));
        annotation.insert("first_value".to_string(), Value::Object(group.values.clone()));
        annotation.insert("last_value".to_string(), Value::Object(group.values.clone()));
        Value::Object(annotation)
    }
}

impl RecordStorage for InternalMemoryTable {
    fn count(&self, filters: Option<&NamedFilter>) -> Result<u64, StorageError> {
        Ok(self.filtered_rows(filters)?.len() as u64)
    }

    fn fetch(&self, request: &FetchRequest<'_>) -> Result<Vec<Record>, StorageError> {
        let group_columns: &[String] = match request.grouping {
            Some(grouping) if grouping.mode != DISTINCT_MODE => {
                return Err(StorageError::UnsupportedGrouping(grouping.mode.clone()));
            }
            Some(grouping) => &grouping.columns,
            None => &[],
        };

        let keys = Self::sort_keys(request.order_by, group_columns);
        for key in &keys {
            self.ensure_column(&key.field)?;
        }

        let mut rows = self.filtered_rows(request.filters)?;
        Self::sort_rows(&mut rows, &keys);

        let offset = usize::try_from(request.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(request.limit).unwrap_or(usize::MAX);

        if request.grouping.is_none() {
            return Ok(rows.into_iter().skip(offset).take(limit).cloned().collect());
        }

        // groups span the whole filtered set, not only the requested page
        let (membership, groups) = Self::distinct_groups(&rows, group_columns);
        let page = rows
            .into_iter()
            .zip(membership)
            .skip(offset)
            .take(limit)
            .map(|(row, group)| {
                let mut record = row.clone();
                record.insert(GROUP_METADATA_KEY.to_string(), Self::annotation(group + 1, &groups[group]));
                record
            })
            .collect();
        Ok(page)
    }
}

/// Lock-taking operations on a shared [`MemoryTable`].
pub trait TableCommon {
    fn new_table(name: &str, config: TableConfig) -> Self;
    fn name(&self) -> Result<String, StorageError>;
    fn add(&self, item: Value) -> Result<Option<Record>, StorageError>;
    fn add_batch(&self, items: Value) -> Result<Vec<Record>, StorageError>;
    fn load_from_json(&self, json: Value, keep: bool) -> Result<Vec<Record>, StorageError>;
    fn load_from_file(&self, path: &Path) -> Result<usize, StorageError>;
    fn get_row(&self, id: &str) -> Result<Option<Record>, StorageError>;
    fn row_count(&self) -> Result<usize, StorageError>;
    fn schema(&self) -> Result<SchemaDict, StorageError>;
}

impl TableCommon for MemoryTable {
    fn new_table(name: &str, config: TableConfig) -> Self {
        InternalMemoryTable::new(name, config).into_protected()
    }

    fn name(&self) -> Result<String, StorageError> {
        Ok(self.read()?.name.clone())
    }

    fn add(&self, item: Value) -> Result<Option<Record>, StorageError> {
        Ok(self.write()?.add(item))
    }

    fn add_batch(&self, items: Value) -> Result<Vec<Record>, StorageError> {
        Ok(self.write()?.add_batch(items))
    }

    fn load_from_json(&self, json: Value, keep: bool) -> Result<Vec<Record>, StorageError> {
        self.write()?.load_from_json(json, keep)
    }

    fn load_from_file(&self, path: &Path) -> Result<usize, StorageError> {
        self.write()?.load_from_file(path)
    }

    fn get_row(&self, id: &str) -> Result<Option<Record>, StorageError> {
        Ok(self.read()?.get(id).cloned())
    }

    fn row_count(&self) -> Result<usize, StorageError> {
        Ok(self.read()?.len())
    }

    fn schema(&self) -> Result<SchemaDict, StorageError> {
        Ok(self.read()?.schema.clone())
    }
}

impl RecordStorage for MemoryTable {
    fn count(&self, filters: Option<&NamedFilter>) -> Result<u64, StorageError> {
        self.read()?.count(filters)
    }

    fn fetch(&self, request: &FetchRequest<'_>) -> Result<Vec<Record>, StorageError> {
        self.read()?.fetch(request)
    }
}
