//! Query composition: filter state + search + scope + cursor → request
//! parameters for the catalog list endpoints.
//!
//! Composition is a pure function. Values are not validated against the
//! filter options; range checks are the backend's job.

use crate::filter::FilterState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const PARAM_SEARCH: &str = "q";
pub const PARAM_SOURCE: &str = "source";
pub const PARAM_SOURCE_LABEL: &str = "sourceLabel";
pub const PARAM_PAGE_SIZE: &str = "pageSize";
pub const PARAM_NEXT_PAGE_TOKEN: &str = "nextPageToken";

/// Which catalog sources a list is scoped to, by label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceLabelScope {
    #[default]
    All,
    Label(String),
}

impl SourceLabelScope {
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Label(label) => Some(label),
        }
    }
}

impl From<Option<String>> for SourceLabelScope {
    fn from(label: Option<String>) -> Self {
        match label {
            Some(label) if !label.is_empty() && label != "All" => Self::Label(label),
            _ => Self::All,
        }
    }
}

impl fmt::Display for SourceLabelScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().unwrap_or("All"))
    }
}

/// Pagination cursor, passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    pub page_size: Option<u32>,
    pub next_page_token: Option<String>,
}

/// Everything besides the filter state that shapes a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: String,
    pub source_id: Option<String>,
    pub source_label: SourceLabelScope,
    pub page: PageCursor,
}

impl CatalogQuery {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    pub fn with_label(mut self, label: SourceLabelScope) -> Self {
        self.source_label = label;
        self
    }

    pub fn with_page(mut self, page: PageCursor) -> Self {
        self.page = page;
        self
    }

    /// A request can only be issued once a source or a label is chosen.
    pub fn has_scope(&self) -> bool {
        self.source_id.as_deref().is_some_and(|s| !s.is_empty())
            || self.source_label != SourceLabelScope::All
    }
}

/// Request parameters, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless `value` is empty.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.0.insert(name.into(), value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pairs suitable for `reqwest::RequestBuilder::query`.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// `application/x-www-form-urlencoded` rendering, without a leading `?`.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Build the request parameters for a list call.
pub fn compose(state: &FilterState, query: &CatalogQuery) -> QueryParams {
    let mut params = QueryParams::new();

    for (key, values) in state.applied_strings() {
        let joined = values
            .iter()
            .map(|v| escape_token(v))
            .collect::<Vec<_>>()
            .join(",");
        params.insert(key.param_name(), joined);
    }

    for (key, value) in state.applied_numbers() {
        params.insert(key.param_name(), format_number(value));
    }

    // Only the selected latency field is sent; thresholds remembered for
    // other fields stay in the state.
    if let Some(threshold) = state.latency().active_threshold() {
        params.insert(threshold.field.param_name(), format_number(threshold.value));
    }

    let search = query.search.trim();
    params.insert(PARAM_SEARCH, search);
    if let Some(label) = query.source_label.label() {
        params.insert(PARAM_SOURCE_LABEL, label);
    }
    if let Some(source) = &query.source_id {
        params.insert(PARAM_SOURCE, source.as_str());
    }
    if let Some(size) = query.page.page_size {
        params.insert(PARAM_PAGE_SIZE, size.to_string());
    }
    if let Some(token) = &query.page.next_page_token {
        params.insert(PARAM_NEXT_PAGE_TOKEN, token.as_str());
    }

    tracing::debug!(params = %params, "Composed catalog query");
    params
}

/// Backslash-escape the list separator so `{"a,b"}` and `{"a", "b"}` stay
/// distinct.
fn escape_token(token: &str) -> String {
    token.replace('\\', "\\\\").replace(',', "\\,")
}

fn format_number(value: f64) -> String {
    format!("{value}")
}
