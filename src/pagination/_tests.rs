#[cfg(test)]
pub mod fixtures {
    use std::{
        cell::{Cell, RefCell},
        sync::Once,
    };

    use indexmap::{IndexMap, IndexSet};

    use serde_json::json;

    use crate::{
        columns::{CatalogError, ColumnCatalog, ColumnMeta, ColumnRef},
        database::{Db, DbCommon, TableConfig},
        filters::NamedFilter,
        grouping::{GroupAnnotationError, GroupMeta, GroupMetadataSplitter, RecordPostProcessor},
        storage::{FetchRequest, Record, RecordStorage, StorageError},
    };

    static INIT: Once = Once::new();

    /// Route `tracing` output to the test harness; honours `RUST_LOG`.
    pub fn init_tracing() {
        INIT.call_once(|| {
            use tracing_subscriber::{fmt, EnvFilter};
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            let _ = fmt().with_env_filter(filter).with_target(false).with_test_writer().try_init();
        });
    }

    pub fn create_people(db: &Db) {
        let rows = json!([
            { "id": 1,  "full_name": "Alice Johnson",    "age": 29, "city": "Porto",    "vip": true  },
            { "id": 2,  "full_name": "Bruno Martins",    "age": 34, "city": "Lisboa",   "vip": false },
            { "id": 3,  "full_name": "Carla Sousa",      "age": 41, "city": "Braga",    "vip": false },
            { "id": 4,  "full_name": "David Pereira",    "age": 25, "city": "Coimbra",  "vip": true  },
            { "id": 5,  "full_name": "Elisa Ramos",      "age": 38, "city": "Aveiro",   "vip": false },
            { "id": 6,  "full_name": "Fernando Lopes",   "age": 47, "city": "Porto",    "vip": false },
            { "id": 7,  "full_name": "Gabriela Costa",   "age": 30, "city": "Lisboa",   "vip": true  },
            { "id": 8,  "full_name": "Hugo Fernandes",   "age": 33, "city": "Guimarães","vip": false },
            { "id": 9,  "full_name": "Inês Almeida",     "age": 27, "city": "Braga",    "vip": false },
            { "id": 10, "full_name": "João Rocha",       "age": 36, "city": "Lisboa",   "vip": false },
            { "id": 11, "full_name": "Katia Figueiredo", "age": 44, "city": "Coimbra",  "vip": true  },
            { "id": 12, "full_name": "Luis Carvalho",    "age": 28, "city": "Porto",    "vip": false },
            { "id": 13, "full_name": "Marta Nunes",      "age": 35, "city": "Faro",     "vip": false },
            { "id": 14, "full_name": "Nuno Teixeira",    "age": 32, "city": "Évora",    "vip": true  },
            { "id": 15, "full_name": "Olga Ferreira",    "age": 39, "city": "Lisboa",   "vip": false }
        ]);
        db.load_table("People", rows).unwrap();
    }

    pub fn people_db() -> Db {
        init_tracing();
        let db = Db::new_db_with_config(TableConfig::int("id"));
        create_people(&db);
        db
    }

    pub fn col(db: &Db, name: &str) -> ColumnRef {
        db.column_ref("people", name).unwrap().unwrap()
    }

    /// Forwards to another catalog and keeps every id set it is asked for.
    pub struct CountingCatalog<'a> {
        pub inner: &'a dyn ColumnCatalog,
        pub lookups: RefCell<Vec<IndexSet<ColumnRef>>>,
    }

    impl<'a> CountingCatalog<'a> {
        pub fn new(inner: &'a dyn ColumnCatalog) -> Self {
            Self { inner, lookups: RefCell::new(Vec::new()) }
        }
    }

    impl ColumnCatalog for CountingCatalog<'_> {
        fn lookup(&self, ids: &IndexSet<ColumnRef>) -> Result<IndexMap<ColumnRef, ColumnMeta>, CatalogError> {
            self.lookups.borrow_mut().push(ids.clone());
            self.inner.lookup(ids)
        }
    }

    /// Forwards to another store and counts the calls it receives.
    pub struct CountingStorage<'a> {
        pub inner: &'a dyn RecordStorage,
        pub counts: Cell<usize>,
        pub fetches: Cell<usize>,
        pub grouped_fetches: Cell<usize>,
    }

    impl<'a> CountingStorage<'a> {
        pub fn new(inner: &'a dyn RecordStorage) -> Self {
            Self { inner, counts: Cell::new(0), fetches: Cell::new(0), grouped_fetches: Cell::new(0) }
        }

        pub fn calls(&self) -> usize {
            self.counts.get() + self.fetches.get()
        }
    }

    impl RecordStorage for CountingStorage<'_> {
        fn count(&self, filters: Option<&NamedFilter>) -> Result<u64, StorageError> {
            self.counts.set(self.counts.get() + 1);
            self.inner.count(filters)
        }

        fn fetch(&self, request: &FetchRequest<'_>) -> Result<Vec<Record>, StorageError> {
            self.fetches.set(self.fetches.get() + 1);
            if request.grouping.is_some() {
                self.grouped_fetches.set(self.grouped_fetches.get() + 1);
            }
            self.inner.fetch(request)
        }
    }

    #[derive(Default)]
    pub struct CountingProcessor {
        pub calls: Cell<usize>,
    }

    impl RecordPostProcessor for CountingProcessor {
        fn split(&self, records: Vec<Record>) -> Result<(Vec<Record>, Vec<GroupMeta>), GroupAnnotationError> {
            self.calls.set(self.calls.get() + 1);
            GroupMetadataSplitter.split(records)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        columns::{ColumnMeta, ColumnNotFoundError, ColumnRef},
        database::{DbCommon, MemoryTable},
        filters::FilterNode,
        grouping::{GroupingSpec, GROUP_METADATA_KEY},
        pagination::{OrderBySpec, PageParams, PaginationConfig, PaginationController, PaginationError},
        storage::{Record, StorageError},
    };

    use super::fixtures::*;

    fn ids(records: &[Record]) -> Vec<i64> {
        records.iter().map(|r| r["id"].as_i64().unwrap()).collect()
    }

    fn people(db: &crate::database::Db) -> MemoryTable {
        db.get("people").unwrap().unwrap()
    }

    #[test]
    fn test_default_page_and_total_count() {
        let db = people_db();
        let table = people(&db);
        let controller = PaginationController::new(PaginationConfig::from(10, 500), &db, &table);

        let page = controller.paginate(&PageParams::default(), None, &[], None).unwrap();

        assert_eq!(page.count, 15);
        assert_eq!(ids(&page.results), (1..=10).collect::<Vec<_>>());
        assert!(page.grouping.is_none());
        assert_eq!(page.page_count(10), 2);
    }

    #[test]
    fn test_count_does_not_depend_on_limit() {
        let db = people_db();
        let table = people(&db);
        let controller = PaginationController::new(PaginationConfig::default(), &db, &table);
        let filter = FilterNode::compare("gt", col(&db, "age"), json!(30));

        let small = controller.paginate(&PageParams::new(Some(1), None), Some(&filter), &[], None).unwrap();
        let huge = controller.paginate(&PageParams::new(Some(1_000_000), None), Some(&filter), &[], None).unwrap();

        assert_eq!(small.count, 10);
        assert_eq!(huge.count, 10);
        assert_eq!(small.results.len(), 1);
        assert_eq!(huge.results.len(), 10);
    }

    #[test]
    fn test_limit_is_clamped_to_max() {
        let db = people_db();
        let table = people(&db);
        let controller = PaginationController::new(PaginationConfig::from(2, 3), &db, &table);

        let default = controller.paginate(&PageParams::default(), None, &[], None).unwrap();
        let clamped = controller.paginate(&PageParams::new(Some(100), Some(12)), None, &[], None).unwrap();

        assert_eq!(default.results.len(), 2);
        assert_eq!(ids(&clamped.results), vec![13, 14, 15]);
    }

    #[test]
    fn test_invalid_limit_reaches_no_collaborator() {
        let db = people_db();
        let table = people(&db);
        let storage = CountingStorage::new(&table);
        let controller = PaginationController::new(PaginationConfig::default(), &db, &storage);

        let err = controller.paginate(&PageParams::new(Some(0), None), None, &[], None).unwrap_err();

        assert!(matches!(err, PaginationError::InvalidParameter { name: "limit", .. }));
        assert!(err.is_client_error());
        assert_eq!(storage.calls(), 0);
    }

    #[test]
    fn test_query_string_params() {
        let db = people_db();
        let table = people(&db);
        let controller = PaginationController::new(PaginationConfig::default(), &db, &table);
        let params = PageParams::from_query([("limit", "3"), ("offset", "5"), ("format", "json")]).unwrap();

        let page = controller.paginate(&params, None, &[], None).unwrap();

        assert_eq!(ids(&page.results), vec![6, 7, 8]);
    }

    #[test]
    fn test_filter_and_order_by_column_refs() {
        let db = people_db();
        let table = people(&db);
        let controller = PaginationController::new(PaginationConfig::default(), &db, &table);
        let filter = FilterNode::compare("eq", col(&db, "city"), json!("Lisboa"));
        let order = [OrderBySpec::desc(col(&db, "age"))];

        let page = controller.paginate(&PageParams::default(), Some(&filter), &order, None).unwrap();

        assert_eq!(page.count, 4);
        assert_eq!(ids(&page.results), vec![15, 10, 2, 7]);
    }

    #[test]
    fn test_wire_filter_with_duplicates() {
        let db = people_db();
        let table = people(&db);
        let controller = PaginationController::new(PaginationConfig::default(), &db, &table);
        let (city, vip) = (col(&db, "city"), col(&db, "vip"));
        let filter: FilterNode<ColumnRef> = FilterNode::parse(&json!({"and": [
            {"op": "get_duplicates", "value": [city.get()]},
            {"field": vip.get(), "op": "eq", "value": true}
        ]}))
        .unwrap();

        let page = controller.paginate(&PageParams::default(), Some(&filter), &[], None).unwrap();

        assert_eq!(page.count, 4);
        assert_eq!(ids(&page.results), vec![1, 4, 7, 11]);
    }

    #[test]
    fn test_unknown_column_reaches_no_storage() {
        let db = people_db();
        let table = people(&db);
        let storage = CountingStorage::new(&table);
        let controller = PaginationController::new(PaginationConfig::default(), &db, &storage);
        let filter = FilterNode::compare("eq", ColumnRef(999), json!(1));

        let err = controller.paginate(&PageParams::default(), Some(&filter), &[], None).unwrap_err();

        assert_eq!(err, PaginationError::ColumnNotFound(ColumnNotFoundError::new(ColumnRef(999))));
        assert_eq!(storage.calls(), 0);
    }

    #[test]
    fn test_grouped_page() {
        let db = people_db();
        let table = people(&db);
        let processor = CountingProcessor::default();
        let controller =
            PaginationController::new(PaginationConfig::default(), &db, &table).with_post_processor(&processor);
        let grouping = GroupingSpec::distinct(vec![col(&db, "city")]);
        let order = [OrderBySpec::asc(col(&db, "full_name"))];

        let page = controller
            .paginate(&PageParams::new(Some(4), None), None, &order, Some(&grouping))
            .unwrap();

        assert_eq!(processor.calls.get(), 1);
        assert_eq!(page.count, 15);
        assert_eq!(ids(&page.results), vec![5, 3, 9, 4]);
        assert!(page.results.iter().all(|r| !r.contains_key(GROUP_METADATA_KEY)));

        let grouping = page.grouping.unwrap();
        assert_eq!(grouping.columns, vec!["city"]);
        assert_eq!(grouping.num_groups, 3);
        assert_eq!(serde_json::to_value(grouping.groups.unwrap()).unwrap(), json!([
            {"count": 1, "first_value": {"city": "Aveiro"},  "last_value": {"city": "Aveiro"},  "result_indices": [0]},
            {"count": 2, "first_value": {"city": "Braga"},   "last_value": {"city": "Braga"},   "result_indices": [1, 2]},
            {"count": 2, "first_value": {"city": "Coimbra"}, "last_value": {"city": "Coimbra"}, "result_indices": [3]}
        ]));
    }

    #[test]
    fn test_grouped_empty_page_skips_post_processing() {
        let db = people_db();
        let table = people(&db);
        let processor = CountingProcessor::default();
        let controller =
            PaginationController::new(PaginationConfig::default(), &db, &table).with_post_processor(&processor);
        let grouping = GroupingSpec::distinct(vec![col(&db, "city")]);

        let page = controller
            .paginate(&PageParams::new(None, Some(100)), None, &[], Some(&grouping))
            .unwrap();

        assert_eq!(processor.calls.get(), 0);
        assert_eq!(page.count, 15);
        assert!(page.results.is_empty());
        let grouping = page.grouping.unwrap();
        assert_eq!(grouping.num_groups, 0);
        assert!(grouping.groups.is_none());
    }

    #[test]
    fn test_empty_grouping_is_rejected() {
        let db = people_db();
        let table = people(&db);
        let storage = CountingStorage::new(&table);
        let controller = PaginationController::new(PaginationConfig::default(), &db, &storage);

        let err = controller
            .paginate(&PageParams::default(), None, &[], Some(&GroupingSpec::distinct(vec![])))
            .unwrap_err();

        assert_eq!(err, PaginationError::EmptyGrouping);
        assert_eq!(storage.calls(), 0);
    }

    #[test]
    fn test_storage_errors_propagate() {
        let db = people_db();
        let table = people(&db);
        let controller = PaginationController::new(PaginationConfig::default(), &db, &table);
        let grouping = GroupingSpec::new(vec![col(&db, "full_name")], "prefix", false);

        let err = controller
            .paginate(&PageParams::default(), None, &[], Some(&grouping))
            .unwrap_err();

        assert_eq!(err, PaginationError::Storage(StorageError::UnsupportedGrouping("prefix".into())));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_page_serialization() {
        let db = people_db();
        let table = people(&db);
        let controller = PaginationController::new(PaginationConfig::default(), &db, &table);
        let filter = FilterNode::compare("eq", col(&db, "id"), json!(14));

        let page = controller.paginate(&PageParams::default(), Some(&filter), &[], None).unwrap();

        assert_eq!(serde_json::to_value(&page).unwrap(), json!({
            "count": 1,
            "results": [{"id": 14, "full_name": "Nuno Teixeira", "age": 32, "city": "Évora", "vip": true}]
        }));
    }

    #[test]
    fn test_paginate_columns() {
        let db = people_db();
        let table = people(&db);
        let controller = PaginationController::new(PaginationConfig::default(), &db, &table);
        let columns = db.table_columns("people").unwrap();

        let page = controller.paginate_columns(&PageParams::new(Some(2), Some(1)), &columns).unwrap();

        assert_eq!(page.count, 5);
        assert_eq!(page.results, vec![ColumnMeta::new(2, "full_name"), ColumnMeta::new(3, "age")]);
    }

    #[test]
    fn test_ungrouped_page_makes_no_grouping_calls() {
        let db = people_db();
        let table = people(&db);
        let storage = CountingStorage::new(&table);
        let processor = CountingProcessor::default();
        let controller =
            PaginationController::new(PaginationConfig::default(), &db, &storage).with_post_processor(&processor);

        let page = controller.paginate(&PageParams::new(Some(5), None), None, &[], None).unwrap();

        assert_eq!(processor.calls.get(), 0);
        assert_eq!(storage.grouped_fetches.get(), 0);
        assert_eq!((storage.counts.get(), storage.fetches.get()), (1, 1));
        assert!(page.grouping.is_none());
        assert!(page.results.iter().all(|r| !r.contains_key(GROUP_METADATA_KEY)));
    }

    #[test]
    fn test_all_ids_resolved_in_one_lookup() {
        let db = people_db();
        let table = people(&db);
        let catalog = CountingCatalog::new(&db);
        let controller = PaginationController::new(PaginationConfig::default(), &catalog, &table);
        let (age, city, name, vip) = (col(&db, "age"), col(&db, "city"), col(&db, "full_name"), col(&db, "vip"));
        let filter = FilterNode::and(vec![
            FilterNode::compare("gt", age, json!(30)),
            FilterNode::duplicates(vec![city, vip]),
        ]);
        let order = [OrderBySpec::asc(name), OrderBySpec::desc(age)];
        let grouping = GroupingSpec::distinct(vec![city]);

        controller
            .paginate(&PageParams::default(), Some(&filter), &order, Some(&grouping))
            .unwrap();

        let lookups = catalog.lookups.borrow();
        assert_eq!(lookups.len(), 1);
        assert_eq!(lookups[0].iter().copied().collect::<Vec<_>>(), vec![name, age, city, vip]);
    }

    #[test]
    fn test_no_ids_means_no_lookup() {
        let db = people_db();
        let table = people(&db);
        let catalog = CountingCatalog::new(&db);
        let controller = PaginationController::new(PaginationConfig::default(), &catalog, &table);

        controller.paginate(&PageParams::default(), None, &[], None).unwrap();

        assert!(catalog.lookups.borrow().is_empty());
    }
}
