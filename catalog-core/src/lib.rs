//! # Catalog Core
//!
//! Core library for the model catalog console.
//! Provides the filter state store, query composition, table sorting,
//! row selection, preference storage, configuration and catalog domain types.

pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod preferences;
pub mod query;
pub mod selection;
pub mod sort;
pub mod types;

// Re-export commonly used types at the crate root.
pub use config::{ConsoleConfig, load_config};
pub use error::{CoreError, Result};
pub use fetch::FetchState;
pub use filter::{
    FilterKey, FilterOptionsCatalog, FilterSchema, FilterState, FilterStateStore, FilterValue,
    LatencyField, LatencyMetric, LatencyPercentile, NumberFilterKey, StringFilterKey,
};
pub use preferences::{FilePreferences, InMemoryPreferences, PreferenceStore};
pub use query::{CatalogQuery, PageCursor, QueryParams, SourceLabelScope, compose};
pub use selection::SelectionSet;
pub use sort::{CellValue, SortDirection, SortableColumn, TableSortEngine};
pub use types::{
    CatalogModel, CatalogModelList, CatalogSource, CatalogSourceConfig, CatalogSourceList,
    McpServer, McpServerList, PagedList,
};
