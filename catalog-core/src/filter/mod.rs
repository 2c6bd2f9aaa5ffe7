//! Catalog filter model: keys, latency selection, state store and the
//! option domains advertised by the API.

pub mod keys;
pub mod latency;
pub mod options;
pub mod state;

pub use keys::{FilterKey, FilterSchema, NumberFilterKey, StringFilterKey};
pub use latency::{LatencyField, LatencyFilter, LatencyMetric, LatencyPercentile, LatencyThreshold};
pub use options::{FilterOption, FilterOptionsCatalog, FilterViolation, NumberRange};
pub use state::{FilterState, FilterStateStore, FilterValue};
