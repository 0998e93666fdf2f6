use indexmap::IndexSet;
use tracing::debug;

use crate::{
    columns::{ColumnCatalog, ColumnMeta, ColumnRef, ColumnResolver},
    filters::{FilterNode, FilterTreeTransformer},
    grouping::{GroupByAssembler, GroupMetadataSplitter, GroupingSpec, RecordPostProcessor},
    pagination::{OrderBySpec, PageParams, PageResult, PaginationConfig, PaginationError},
    storage::{FetchRequest, RecordStorage},
};

/// Turns a client listing request into one record store query and shapes the
/// answer into a [`PageResult`].
///
/// Each call resolves its column ids once, counts once and fetches once. The
/// controller keeps no state between calls, so one instance can serve
/// concurrent requests as long as its collaborators can.
pub struct PaginationController<'a> {
    config: PaginationConfig,
    catalog: &'a dyn ColumnCatalog,
    storage: &'a dyn RecordStorage,
    post_processor: &'a dyn RecordPostProcessor,
}

impl<'a> PaginationController<'a> {
    pub fn new(config: PaginationConfig, catalog: &'a dyn ColumnCatalog, storage: &'a dyn RecordStorage) -> Self {
        Self {
            config,
            catalog,
            storage,
            post_processor: &GroupMetadataSplitter,
        }
    }

    pub fn with_post_processor(mut self, post_processor: &'a dyn RecordPostProcessor) -> Self {
        self.post_processor = post_processor;
        self
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    pub fn paginate(
        &self,
        params: &PageParams,
        filters: Option<&FilterNode<ColumnRef>>,
        order_by: &[OrderBySpec<ColumnRef>],
        grouping: Option<&GroupingSpec<ColumnRef>>,
    ) -> Result<PageResult, PaginationError> {
        let window = self.config.window(params)?;
        if grouping.is_some_and(|spec| spec.columns.is_empty()) {
            return Err(PaginationError::EmptyGrouping);
        }

        let ids = Self::referenced_columns(filters, order_by, grouping);
        let resolved = ColumnResolver::resolve(self.catalog, &ids)?;
        resolved.ensure_all(&ids)?;

        let order_by = order_by
            .iter()
            .map(|spec| spec.with_name(&resolved))
            .collect::<Result<Vec<_>, _>>()?;
        let filters = FilterTreeTransformer::rewrite_with_names(filters, &resolved)?;
        let descriptor = grouping
            .map(|spec| GroupByAssembler::descriptor(spec, &resolved))
            .transpose()?;

        // recomputed on every call, nothing is cached between pages
        let count = self.storage.count(filters.as_ref())?;
        let records = self.storage.fetch(&FetchRequest {
            limit: window.limit,
            offset: window.offset,
            filters: filters.as_ref(),
            order_by: &order_by,
            grouping: descriptor.as_ref(),
        })?;
        debug!(
            count,
            returned = records.len(),
            limit = window.limit,
            offset = window.offset,
            grouped = descriptor.is_some(),
            "fetched page"
        );

        let Some(descriptor) = descriptor else {
            return Ok(PageResult::new(count, records));
        };

        if records.is_empty() {
            return Ok(PageResult {
                count,
                grouping: Some(GroupByAssembler::assemble(descriptor, None)),
                results: records,
            });
        }

        let (results, groups) = self.post_processor.split(records)?;
        Ok(PageResult {
            count,
            grouping: Some(GroupByAssembler::assemble(descriptor, Some(groups))),
            results,
        })
    }

    /// Page through a table's column list under the same limit policy.
    pub fn paginate_columns(&self, params: &PageParams, columns: &[ColumnMeta]) -> Result<PageResult<ColumnMeta>, PaginationError> {
        let window = self.config.window(params)?;
        let results = columns
            .iter()
            .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(PageResult::new(columns.len() as u64, results))
    }

    fn referenced_columns(
        filters: Option<&FilterNode<ColumnRef>>,
        order_by: &[OrderBySpec<ColumnRef>],
        grouping: Option<&GroupingSpec<ColumnRef>>,
    ) -> IndexSet<ColumnRef> {
        let mut ids: IndexSet<ColumnRef> = order_by.iter().map(|spec| spec.field).collect();
        if let Some(spec) = grouping {
            ids.extend(spec.columns.iter().copied());
        }
        ids.extend(FilterTreeTransformer::collect_referenced_columns(filters));
        ids
    }
}
