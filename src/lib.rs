pub mod columns;
pub use columns::{ColumnCatalog, ColumnMeta, ColumnRef, ColumnResolver, ResolvedColumns};

pub mod filters;
pub use filters::{FilterNode, FilterTreeTransformer, NamedFilter};

pub mod grouping;
pub use grouping::{GroupByAssembler, GroupResult, GroupingSpec};

pub mod storage;
pub use storage::{Record, RecordStorage};

pub mod pagination;
pub use pagination::{OrderBySpec, PageParams, PageResult, PaginationConfig, PaginationController, PaginationError};

pub mod database;
pub use database::{Db, DbCommon, MemoryTable, TableCommon, TableConfig};
