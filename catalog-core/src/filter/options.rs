//! Filter option domains reported by the catalog API.
//!
//! The catalog is reference data for rendering filter widgets. It never
//! rejects or clamps a filter value; [`FilterOptionsCatalog::violations`]
//! only reports values outside the advertised domain so callers can warn.

use super::keys::{NumberFilterKey, StringFilterKey};
use super::state::FilterState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumberRange {
    pub min: f64,
    pub max: f64,
}

impl NumberRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Domain of a single filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterOption {
    String {
        #[serde(default)]
        values: Vec<String>,
    },
    Number {
        range: NumberRange,
    },
}

/// Per-key filter domains, keyed by request parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptionsCatalog {
    #[serde(default)]
    pub filters: BTreeMap<String, FilterOption>,
}

impl FilterOptionsCatalog {
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn option(&self, param: &str) -> Option<&FilterOption> {
        self.filters.get(param)
    }

    /// Allowed tokens of a string filter.
    pub fn values(&self, key: StringFilterKey) -> Option<&[String]> {
        match self.filters.get(key.param_name()) {
            Some(FilterOption::String { values }) => Some(values),
            _ => None,
        }
    }

    pub fn range(&self, key: NumberFilterKey) -> Option<NumberRange> {
        self.range_for(key.param_name())
    }

    /// Range of any numeric parameter, including latency fields such as
    /// `ttft_p90`.
    pub fn range_for(&self, param: &str) -> Option<NumberRange> {
        match self.filters.get(param) {
            Some(FilterOption::Number { range }) => Some(*range),
            _ => None,
        }
    }

    /// Values in `state` that fall outside the advertised domains. Keys the
    /// catalog says nothing about are not reported.
    pub fn violations(&self, state: &FilterState) -> Vec<FilterViolation> {
        let mut out = Vec::new();

        for (key, selected) in state.applied_strings() {
            let Some(allowed) = self.values(key) else {
                continue;
            };
            for value in selected {
                if !allowed.iter().any(|a| a == value) {
                    out.push(FilterViolation::UnknownValue {
                        param: key.param_name().to_string(),
                        value: value.clone(),
                    });
                }
            }
        }

        for (key, value) in state.applied_numbers() {
            if let Some(range) = self.range(key) {
                if !range.contains(value) {
                    out.push(FilterViolation::OutOfRange {
                        param: key.param_name().to_string(),
                        value,
                        range,
                    });
                }
            }
        }

        if let Some(threshold) = state.latency().active_threshold() {
            let param = threshold.field.param_name();
            if let Some(range) = self.range_for(&param) {
                if !range.contains(threshold.value) {
                    out.push(FilterViolation::OutOfRange {
                        param,
                        value: threshold.value,
                        range,
                    });
                }
            }
        }

        out
    }
}

/// A filter value outside the advertised domain.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterViolation {
    UnknownValue {
        param: String,
        value: String,
    },
    OutOfRange {
        param: String,
        value: f64,
        range: NumberRange,
    },
}

impl fmt::Display for FilterViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownValue { param, value } => {
                write!(f, "{param}: '{value}' is not a known value")
            }
            Self::OutOfRange { param, value, range } => write!(
                f,
                "{param}: {value} is outside [{}, {}]",
                range.min, range.max
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterStateStore;
    use pretty_assertions::assert_eq;

    const OPTIONS_JSON: &str = r#"{
        "filters": {
            "provider": { "type": "string", "values": ["Red Hat", "IBM", "Meta"] },
            "license": { "type": "string", "values": ["apache-2.0", "llama3"] },
            "max_latency": { "type": "number", "range": { "min": 0, "max": 1000 } },
            "ttft_p90": { "type": "number", "range": { "min": 10, "max": 500 } }
        }
    }"#;

    fn catalog() -> FilterOptionsCatalog {
        serde_json::from_str(OPTIONS_JSON).unwrap()
    }

    #[test]
    fn test_decode_options() {
        let catalog = catalog();
        assert_eq!(
            catalog.values(StringFilterKey::Provider).unwrap(),
            &["Red Hat".to_string(), "IBM".to_string(), "Meta".to_string()]
        );
        assert_eq!(
            catalog.range(NumberFilterKey::MaxLatency),
            Some(NumberRange { min: 0.0, max: 1000.0 })
        );
        assert_eq!(catalog.values(StringFilterKey::Task), None);
        assert_eq!(catalog.range(NumberFilterKey::MinRps), None);
        assert_eq!(catalog.range_for("provider"), None);
    }

    #[test]
    fn test_empty_body_decodes() {
        let catalog: FilterOptionsCatalog = serde_json::from_str("{}").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_no_violations_for_valid_state() {
        let mut store = FilterStateStore::models();
        store.set_strings(StringFilterKey::Provider, ["Red Hat"]);
        store.set_number(NumberFilterKey::MaxLatency, Some(300.0));
        assert!(catalog().violations(store.state()).is_empty());
    }

    #[test]
    fn test_violations_reported() {
        let mut store = FilterStateStore::models();
        store.set_strings(StringFilterKey::Provider, ["Acme"]);
        store.set_strings(StringFilterKey::Task, ["anything"]);
        store.set_number(NumberFilterKey::MaxLatency, Some(5000.0));
        store.set_latency_threshold(Some(1.0));

        let violations = catalog().violations(store.state());
        assert_eq!(violations.len(), 3);
        assert_eq!(
            violations[0].to_string(),
            "provider: 'Acme' is not a known value"
        );
        assert_eq!(
            violations[1].to_string(),
            "max_latency: 5000 is outside [0, 1000]"
        );
        assert_eq!(violations[2].to_string(), "ttft_p90: 1 is outside [10, 500]");
    }
}
