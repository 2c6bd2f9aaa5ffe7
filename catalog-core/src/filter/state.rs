//! Filter state and the store that mutates it.
//!
//! Presence convention, encoded in the types below:
//! - string-set keys of the store's schema are always present; an empty set
//!   means "nothing selected",
//! - number keys are absent unless a bound was entered,
//! - the latency filter has a threshold only for fields the user filled in.
//!
//! In every case "empty" and "absent" both mean "no constraint".

use super::keys::{FilterKey, FilterSchema, NumberFilterKey, StringFilterKey};
use super::latency::{LatencyField, LatencyFilter, LatencyThreshold};
use crate::preferences::{PreferenceStore, keys as pref_keys};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Value of a single filter key.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Strings(BTreeSet<String>),
    Number(f64),
    Latency(LatencyThreshold),
}

/// Immutable snapshot of every applied filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    strings: BTreeMap<StringFilterKey, BTreeSet<String>>,
    numbers: BTreeMap<NumberFilterKey, f64>,
    latency: LatencyFilter,
}

impl FilterState {
    /// Selected tokens of a string key; `None` when the key is not tracked.
    pub fn strings(&self, key: StringFilterKey) -> Option<&BTreeSet<String>> {
        self.strings.get(&key)
    }

    pub fn number(&self, key: NumberFilterKey) -> Option<f64> {
        self.numbers.get(&key).copied()
    }

    pub fn latency(&self) -> &LatencyFilter {
        &self.latency
    }

    /// String keys with at least one selected token.
    pub fn applied_strings(&self) -> impl Iterator<Item = (StringFilterKey, &BTreeSet<String>)> {
        self.strings
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(k, v)| (*k, v))
    }

    pub fn applied_numbers(&self) -> impl Iterator<Item = (NumberFilterKey, f64)> + '_ {
        self.numbers.iter().map(|(k, v)| (*k, *v))
    }

    pub fn has_any_filter_applied(&self) -> bool {
        self.strings.values().any(|v| !v.is_empty())
            || !self.numbers.is_empty()
            || self.latency.is_applied()
    }

    /// Number of keys carrying a constraint.
    pub fn applied_count(&self) -> usize {
        self.applied_strings().count()
            + self.numbers.len()
            + usize::from(self.latency.is_applied())
    }
}

/// Owner of one view's [`FilterState`].
///
/// Mutations are synchronous; `get` and [`Self::has_any_filter_applied`]
/// always read the current state.
#[derive(Debug, Clone)]
pub struct FilterStateStore {
    schema: FilterSchema,
    state: FilterState,
}

impl FilterStateStore {
    pub fn new(schema: FilterSchema) -> Self {
        let mut state = FilterState::default();
        for &key in schema.string_keys {
            state.strings.insert(key, BTreeSet::new());
        }
        Self { schema, state }
    }

    pub fn models() -> Self {
        Self::new(FilterSchema::models())
    }

    pub fn mcp_servers() -> Self {
        Self::new(FilterSchema::mcp_servers())
    }

    pub fn schema(&self) -> &FilterSchema {
        &self.schema
    }

    /// Read view of the current state.
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> FilterState {
        self.state.clone()
    }

    /// Current constraint for `key`, `None` when unconstrained.
    ///
    /// String keys of the schema always yield a (possibly empty) set.
    pub fn get(&self, key: FilterKey) -> Option<FilterValue> {
        match key {
            FilterKey::Strings(k) => self
                .state
                .strings
                .get(&k)
                .map(|values| FilterValue::Strings(values.clone())),
            FilterKey::Number(k) => self.state.number(k).map(FilterValue::Number),
            FilterKey::Latency => self.state.latency.active_threshold().map(FilterValue::Latency),
        }
    }

    /// Replace the constraint for a single key.
    ///
    /// `None` clears it. A value of the wrong kind for `key`, or a key outside
    /// the schema, is ignored and logged.
    pub fn set(&mut self, key: FilterKey, value: Option<FilterValue>) {
        match (key, value) {
            (FilterKey::Strings(k), Some(FilterValue::Strings(values))) => {
                self.set_strings(k, values)
            }
            (FilterKey::Strings(k), None) => self.set_strings(k, BTreeSet::<String>::new()),
            (FilterKey::Number(k), Some(FilterValue::Number(n))) => self.set_number(k, Some(n)),
            (FilterKey::Number(k), None) => self.set_number(k, None),
            (FilterKey::Latency, Some(FilterValue::Latency(threshold))) => {
                self.select_latency_field(threshold.field);
                self.set_latency_threshold(Some(threshold.value));
            }
            (FilterKey::Latency, None) => self.set_latency_threshold(None),
            (key, Some(value)) => {
                warn!(%key, ?value, "Ignoring filter value of the wrong kind");
            }
        }
    }

    /// Replace the selected tokens of a string key. Empty tokens are dropped.
    pub fn set_strings<I, S>(&mut self, key: StringFilterKey, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.schema.contains(key.into()) {
            warn!(%key, "Ignoring filter outside of the current schema");
            return;
        }
        let values: BTreeSet<String> = values
            .into_iter()
            .map(Into::into)
            .filter(|v: &String| !v.is_empty())
            .collect();
        debug!(%key, count = values.len(), "String filter updated");
        self.state.strings.insert(key, values);
    }

    /// Add `token` if absent, remove it if present.
    pub fn toggle_string(&mut self, key: StringFilterKey, token: &str) {
        let mut values = self.state.strings.get(&key).cloned().unwrap_or_default();
        if !values.remove(token) {
            values.insert(token.to_string());
        }
        self.set_strings(key, values);
    }

    /// Set or clear a numeric bound. Non-finite numbers clear it.
    pub fn set_number(&mut self, key: NumberFilterKey, value: Option<f64>) {
        if !self.schema.contains(key.into()) {
            warn!(%key, "Ignoring filter outside of the current schema");
            return;
        }
        match value.filter(|v| v.is_finite()) {
            Some(v) => {
                debug!(%key, value = v, "Number filter updated");
                self.state.numbers.insert(key, v);
            }
            None => {
                debug!(%key, "Number filter cleared");
                self.state.numbers.remove(&key);
            }
        }
    }

    /// Selected latency field of this store.
    pub fn latency_field(&self) -> LatencyField {
        self.state.latency.active_field()
    }

    /// Switch the latency field the threshold applies to. The threshold
    /// entered for the previous field is kept and comes back when that field
    /// is selected again.
    pub fn select_latency_field(&mut self, field: LatencyField) {
        if !self.schema.latency {
            warn!(%field, "Latency filter is not available for this view");
            return;
        }
        debug!(%field, "Latency field selected");
        self.state.latency.select(field);
    }

    /// Set or clear the threshold of the selected latency field.
    pub fn set_latency_threshold(&mut self, value: Option<f64>) {
        if !self.schema.latency {
            warn!("Latency filter is not available for this view");
            return;
        }
        self.state.latency.set_threshold(value);
    }

    /// Reset the listed keys to unconstrained.
    pub fn clear(&mut self, keys: &[FilterKey]) {
        for &key in keys {
            match key {
                FilterKey::Strings(k) => {
                    if let Some(values) = self.state.strings.get_mut(&k) {
                        values.clear();
                    }
                }
                FilterKey::Number(k) => {
                    self.state.numbers.remove(&k);
                }
                FilterKey::Latency => self.state.latency.clear(),
            }
        }
    }

    /// Reset every key of the schema: string keys to an empty set, number
    /// and latency keys to unconstrained.
    pub fn clear_all(&mut self) {
        let keys = self.schema.keys();
        self.clear(&keys);
        debug!("All filters cleared");
    }

    pub fn has_any_filter_applied(&self) -> bool {
        self.state.has_any_filter_applied()
    }

    /// Restore the latency field saved by [`Self::persist_latency_field`].
    /// Unreadable values are ignored.
    pub fn restore_latency_field(&mut self, prefs: &dyn PreferenceStore) {
        let Some(raw) = prefs.get(pref_keys::LATENCY_FIELD) else {
            return;
        };
        match raw.parse::<LatencyField>() {
            Ok(field) => self.select_latency_field(field),
            Err(e) => warn!(error = %e, "Ignoring stored latency field"),
        }
    }

    pub fn persist_latency_field(&self, prefs: &mut dyn PreferenceStore) -> crate::Result<()> {
        prefs.set(pref_keys::LATENCY_FIELD, &self.latency_field().to_string())
    }
}

impl Default for FilterStateStore {
    fn default() -> Self {
        Self::models()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::latency::{LatencyMetric, LatencyPercentile};
    use crate::preferences::InMemoryPreferences;

    fn set_of(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_store_is_unconstrained() {
        let store = FilterStateStore::models();
        assert!(!store.has_any_filter_applied());
        assert_eq!(
            store.get(StringFilterKey::Provider.into()),
            Some(FilterValue::Strings(BTreeSet::new()))
        );
        assert_eq!(store.get(NumberFilterKey::MaxLatency.into()), None);
        assert_eq!(store.get(FilterKey::Latency), None);
    }

    #[test]
    fn test_set_empty_set_stays_present() {
        let mut store = FilterStateStore::models();
        store.set_strings(StringFilterKey::License, ["apache-2.0"]);
        store.set(
            StringFilterKey::License.into(),
            Some(FilterValue::Strings(BTreeSet::new())),
        );
        assert_eq!(
            store.get(StringFilterKey::License.into()),
            Some(FilterValue::Strings(BTreeSet::new()))
        );
        assert!(!store.has_any_filter_applied());
    }

    #[test]
    fn test_set_and_get_each_kind() {
        let mut store = FilterStateStore::models();
        store.set(
            StringFilterKey::Provider.into(),
            Some(FilterValue::Strings(set_of(&["Red Hat", "IBM"]))),
        );
        store.set(NumberFilterKey::MaxLatency.into(), Some(FilterValue::Number(300.0)));

        assert_eq!(
            store.get(StringFilterKey::Provider.into()),
            Some(FilterValue::Strings(set_of(&["IBM", "Red Hat"])))
        );
        assert_eq!(
            store.get(NumberFilterKey::MaxLatency.into()),
            Some(FilterValue::Number(300.0))
        );
        assert_eq!(store.state().applied_count(), 2);

        store.set(NumberFilterKey::MaxLatency.into(), None);
        assert_eq!(store.get(NumberFilterKey::MaxLatency.into()), None);
    }

    #[test]
    fn test_wrong_kind_is_ignored() {
        let mut store = FilterStateStore::models();
        store.set(NumberFilterKey::MinRps.into(), Some(FilterValue::Strings(set_of(&["x"]))));
        assert!(!store.has_any_filter_applied());
    }

    #[test]
    fn test_keys_outside_schema_are_ignored() {
        let mut store = FilterStateStore::mcp_servers();
        store.set_number(NumberFilterKey::MaxLatency, Some(10.0));
        store.set_strings(StringFilterKey::Task, ["text-generation"]);
        store.set_latency_threshold(Some(5.0));
        assert!(!store.has_any_filter_applied());
        assert_eq!(store.get(StringFilterKey::Task.into()), None);

        store.set_strings(StringFilterKey::Transport, ["stdio"]);
        assert!(store.has_any_filter_applied());
    }

    #[test]
    fn test_empty_tokens_dropped() {
        let mut store = FilterStateStore::models();
        store.set_strings(StringFilterKey::Language, ["", "en"]);
        assert_eq!(
            store.state().strings(StringFilterKey::Language),
            Some(&set_of(&["en"]))
        );
    }

    #[test]
    fn test_toggle_string() {
        let mut store = FilterStateStore::models();
        store.toggle_string(StringFilterKey::Task, "text-generation");
        assert!(store.has_any_filter_applied());
        store.toggle_string(StringFilterKey::Task, "text-generation");
        assert!(!store.has_any_filter_applied());
    }

    #[test]
    fn test_non_finite_number_clears() {
        let mut store = FilterStateStore::models();
        store.set_number(NumberFilterKey::MinRps, Some(1.0));
        store.set_number(NumberFilterKey::MinRps, Some(f64::INFINITY));
        assert_eq!(store.get(NumberFilterKey::MinRps.into()), None);
    }

    #[test]
    fn test_clear_listed_keys_only() {
        let mut store = FilterStateStore::models();
        store.set_strings(StringFilterKey::Provider, ["Red Hat"]);
        store.set_number(NumberFilterKey::MinRps, Some(2.0));
        store.clear(&[StringFilterKey::Provider.into()]);
        assert_eq!(
            store.get(StringFilterKey::Provider.into()),
            Some(FilterValue::Strings(BTreeSet::new()))
        );
        assert_eq!(store.get(NumberFilterKey::MinRps.into()), Some(FilterValue::Number(2.0)));
    }

    #[test]
    fn test_clear_all_asymmetry() {
        let mut store = FilterStateStore::models();
        store.set_strings(StringFilterKey::Provider, ["Red Hat"]);
        store.set_number(NumberFilterKey::MaxLatency, Some(300.0));
        store.set_latency_threshold(Some(120.0));
        assert!(store.has_any_filter_applied());

        store.clear_all();
        assert!(!store.has_any_filter_applied());
        for &key in FilterSchema::models().string_keys {
            assert_eq!(
                store.get(key.into()),
                Some(FilterValue::Strings(BTreeSet::new()))
            );
        }
        for &key in FilterSchema::models().number_keys {
            assert_eq!(store.get(key.into()), None);
        }
        assert_eq!(store.get(FilterKey::Latency), None);
    }

    #[test]
    fn test_latency_set_through_generic_setter() {
        let mut store = FilterStateStore::models();
        let field = LatencyField::new(LatencyMetric::E2e, LatencyPercentile::P95);
        store.set(
            FilterKey::Latency,
            Some(FilterValue::Latency(LatencyThreshold { field, value: 800.0 })),
        );
        assert_eq!(store.latency_field(), field);
        assert_eq!(
            store.get(FilterKey::Latency),
            Some(FilterValue::Latency(LatencyThreshold { field, value: 800.0 }))
        );
    }

    #[test]
    fn test_stores_do_not_share_latency_selection() {
        let mut first = FilterStateStore::models();
        let second = FilterStateStore::models();
        first.select_latency_field(LatencyField::new(LatencyMetric::Itl, LatencyPercentile::P99));
        assert_ne!(first.latency_field(), second.latency_field());
    }

    #[test]
    fn test_latency_field_persistence() {
        let mut prefs = InMemoryPreferences::default();
        let mut store = FilterStateStore::models();
        let field = LatencyField::new(LatencyMetric::Itl, LatencyPercentile::Mean);
        store.select_latency_field(field);
        store.persist_latency_field(&mut prefs).unwrap();

        let mut restored = FilterStateStore::models();
        restored.restore_latency_field(&prefs);
        assert_eq!(restored.latency_field(), field);
    }

    #[test]
    fn test_restore_ignores_garbage() {
        let mut prefs = InMemoryPreferences::default();
        prefs.set(pref_keys::LATENCY_FIELD, "fastest").unwrap();
        let mut store = FilterStateStore::models();
        store.restore_latency_field(&prefs);
        assert_eq!(store.latency_field(), LatencyField::default());
    }
}
