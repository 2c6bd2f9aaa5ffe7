//! Latency-metric filter.
//!
//! One metric/percentile pair is selected at a time and decides which
//! latency field (`ttft_p90`, `itl_mean`, ...) the threshold applies to.
//! Thresholds are remembered per field, so switching away and back restores
//! the value entered earlier. The selection belongs to the filter store that
//! owns it; nothing here is process-global.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyMetric {
    /// Time to first token.
    Ttft,
    /// Inter-token latency.
    Itl,
    /// End-to-end request latency.
    E2e,
}

impl LatencyMetric {
    pub const ALL: [LatencyMetric; 3] = [Self::Ttft, Self::Itl, Self::E2e];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ttft => "ttft",
            Self::Itl => "itl",
            Self::E2e => "e2e",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ttft => "TTFT",
            Self::Itl => "ITL",
            Self::E2e => "E2E",
        }
    }
}

impl FromStr for LatencyMetric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ttft" => Ok(Self::Ttft),
            "itl" => Ok(Self::Itl),
            "e2e" => Ok(Self::E2e),
            _ => Err(CoreError::unknown("latency metric", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyPercentile {
    Mean,
    P90,
    P95,
    P99,
}

impl LatencyPercentile {
    pub const ALL: [LatencyPercentile; 4] = [Self::Mean, Self::P90, Self::P95, Self::P99];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::P90 => "p90",
            Self::P95 => "p95",
            Self::P99 => "p99",
        }
    }
}

impl FromStr for LatencyPercentile {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "p90" => Ok(Self::P90),
            "p95" => Ok(Self::P95),
            "p99" => Ok(Self::P99),
            _ => Err(CoreError::unknown("latency percentile", s)),
        }
    }
}

/// A concrete latency field: metric plus percentile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LatencyField {
    pub metric: LatencyMetric,
    pub percentile: LatencyPercentile,
}

impl LatencyField {
    pub const fn new(metric: LatencyMetric, percentile: LatencyPercentile) -> Self {
        Self { metric, percentile }
    }

    /// Request parameter name, e.g. `ttft_p90`.
    pub fn param_name(&self) -> String {
        format!("{}_{}", self.metric.as_str(), self.percentile.as_str())
    }
}

impl Default for LatencyField {
    fn default() -> Self {
        Self::new(LatencyMetric::Ttft, LatencyPercentile::P90)
    }
}

impl fmt::Display for LatencyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.metric.as_str(), self.percentile.as_str())
    }
}

impl FromStr for LatencyField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (metric, percentile) = s
            .split_once('_')
            .ok_or_else(|| CoreError::unknown("latency field", s))?;
        Ok(Self::new(metric.parse()?, percentile.parse()?))
    }
}

/// The active threshold of a latency filter, as returned by `get`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyThreshold {
    pub field: LatencyField,
    pub value: f64,
}

/// Latency filter state: the selected field plus remembered thresholds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencyFilter {
    active: LatencyField,
    thresholds: BTreeMap<LatencyField, f64>,
}

impl LatencyFilter {
    pub fn new(active: LatencyField) -> Self {
        Self {
            active,
            thresholds: BTreeMap::new(),
        }
    }

    pub fn active_field(&self) -> LatencyField {
        self.active
    }

    /// Switch the selected field. Stored thresholds are kept.
    pub fn select(&mut self, field: LatencyField) {
        self.active = field;
    }

    /// Threshold of the selected field, if one was entered.
    pub fn active_threshold(&self) -> Option<LatencyThreshold> {
        self.thresholds
            .get(&self.active)
            .map(|&value| LatencyThreshold {
                field: self.active,
                value,
            })
    }

    pub fn threshold_for(&self, field: LatencyField) -> Option<f64> {
        self.thresholds.get(&field).copied()
    }

    /// Set or clear the threshold of the selected field. Non-finite values
    /// clear it.
    pub fn set_threshold(&mut self, value: Option<f64>) {
        match value.filter(|v| v.is_finite()) {
            Some(v) => {
                self.thresholds.insert(self.active, v);
            }
            None => {
                self.thresholds.remove(&self.active);
            }
        }
    }

    /// Drop every remembered threshold; the selected field stays.
    pub fn clear(&mut self) {
        self.thresholds.clear();
    }

    pub fn is_applied(&self) -> bool {
        self.thresholds.contains_key(&self.active)
    }
}
