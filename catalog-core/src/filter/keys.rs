//! Filter keys and the schemas that group them per catalog view.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A filter whose value is a set of selected tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringFilterKey {
    Provider,
    License,
    #[serde(rename = "tasks")]
    Task,
    Language,
    HardwareType,
    UseCase,
    Transport,
    DeploymentMode,
}

impl StringFilterKey {
    pub const ALL: [StringFilterKey; 8] = [
        StringFilterKey::Provider,
        StringFilterKey::License,
        StringFilterKey::Task,
        StringFilterKey::Language,
        StringFilterKey::HardwareType,
        StringFilterKey::UseCase,
        StringFilterKey::Transport,
        StringFilterKey::DeploymentMode,
    ];

    /// Name of the request parameter (and of the filter-options entry).
    pub fn param_name(&self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::License => "license",
            Self::Task => "tasks",
            Self::Language => "language",
            Self::HardwareType => "hardware_type",
            Self::UseCase => "use_case",
            Self::Transport => "transport",
            Self::DeploymentMode => "deployment_mode",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Provider => "Provider",
            Self::License => "License",
            Self::Task => "Task",
            Self::Language => "Language",
            Self::HardwareType => "Hardware type",
            Self::UseCase => "Use case",
            Self::Transport => "Transport",
            Self::DeploymentMode => "Deployment mode",
        }
    }
}

impl fmt::Display for StringFilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param_name())
    }
}

impl FromStr for StringFilterKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.param_name() == s)
            .ok_or_else(|| CoreError::unknown("string filter", s))
    }
}

/// A filter whose value is a single optional numeric bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFilterKey {
    MinRps,
    MaxLatency,
    MaxInputTokens,
    MaxOutputTokens,
}

impl NumberFilterKey {
    pub const ALL: [NumberFilterKey; 4] = [
        NumberFilterKey::MinRps,
        NumberFilterKey::MaxLatency,
        NumberFilterKey::MaxInputTokens,
        NumberFilterKey::MaxOutputTokens,
    ];

    pub fn param_name(&self) -> &'static str {
        match self {
            Self::MinRps => "min_rps",
            Self::MaxLatency => "max_latency",
            Self::MaxInputTokens => "max_input_tokens",
            Self::MaxOutputTokens => "max_output_tokens",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::MinRps => "Min RPS",
            Self::MaxLatency => "Max latency",
            Self::MaxInputTokens => "Max input tokens",
            Self::MaxOutputTokens => "Max output tokens",
        }
    }
}

impl fmt::Display for NumberFilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param_name())
    }
}

impl FromStr for NumberFilterKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.param_name() == s)
            .ok_or_else(|| CoreError::unknown("number filter", s))
    }
}

/// Any filter key a [`FilterStateStore`](super::FilterStateStore) understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterKey {
    Strings(StringFilterKey),
    Number(NumberFilterKey),
    /// The single latency-metric filter; its parameter name depends on the
    /// selected metric and percentile.
    Latency,
}

impl From<StringFilterKey> for FilterKey {
    fn from(key: StringFilterKey) -> Self {
        Self::Strings(key)
    }
}

impl From<NumberFilterKey> for FilterKey {
    fn from(key: NumberFilterKey) -> Self {
        Self::Number(key)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strings(k) => k.fmt(f),
            Self::Number(k) => k.fmt(f),
            Self::Latency => f.write_str("latency"),
        }
    }
}

impl FromStr for FilterKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "latency" {
            return Ok(Self::Latency);
        }
        if let Ok(k) = s.parse::<StringFilterKey>() {
            return Ok(Self::Strings(k));
        }
        s.parse::<NumberFilterKey>()
            .map(Self::Number)
            .map_err(|_| CoreError::unknown("filter key", s))
    }
}

/// The keys known to one catalog view.
///
/// `clear_all` on a store resets exactly these keys, and string keys listed
/// here are always present (possibly empty) in the store's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSchema {
    pub string_keys: &'static [StringFilterKey],
    pub number_keys: &'static [NumberFilterKey],
    pub latency: bool,
}

impl FilterSchema {
    /// Schema of the model catalog list.
    pub const fn models() -> Self {
        Self {
            string_keys: &[
                StringFilterKey::Provider,
                StringFilterKey::License,
                StringFilterKey::Task,
                StringFilterKey::Language,
                StringFilterKey::HardwareType,
                StringFilterKey::UseCase,
            ],
            number_keys: &NumberFilterKey::ALL,
            latency: true,
        }
    }

    /// Schema of the MCP server catalog list.
    pub const fn mcp_servers() -> Self {
        Self {
            string_keys: &[
                StringFilterKey::Provider,
                StringFilterKey::License,
                StringFilterKey::Transport,
                StringFilterKey::DeploymentMode,
            ],
            number_keys: &[],
            latency: false,
        }
    }

    pub fn contains(&self, key: FilterKey) -> bool {
        match key {
            FilterKey::Strings(k) => self.string_keys.contains(&k),
            FilterKey::Number(k) => self.number_keys.contains(&k),
            FilterKey::Latency => self.latency,
        }
    }

    /// Every key of the schema, string keys first.
    pub fn keys(&self) -> Vec<FilterKey> {
        let mut keys: Vec<FilterKey> = self.string_keys.iter().map(|&k| k.into()).collect();
        keys.extend(self.number_keys.iter().map(|&k| FilterKey::from(k)));
        if self.latency {
            keys.push(FilterKey::Latency);
        }
        keys
    }
}

impl Default for FilterSchema {
    fn default() -> Self {
        Self::models()
    }
}
