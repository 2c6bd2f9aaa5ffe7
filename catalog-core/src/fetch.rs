//! View-side state of a fetched resource.
//!
//! The client hands back `Result<T, E>`; `FetchState` is what a view keeps
//! between requests, including the data of the previous successful load
//! while a refresh is in flight or after it failed.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    /// A required input (source, label, id) is missing; no request is made.
    NotReady,
    Loading {
        previous: Option<T>,
    },
    Loaded(T),
    Failed {
        error: String,
        previous: Option<T>,
    },
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self::NotReady
    }
}

impl<T> FetchState<T> {
    pub fn from_result<E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::Loaded(data),
            Err(e) => Self::Failed {
                error: e.to_string(),
                previous: None,
            },
        }
    }

    /// Latest data available, stale or not.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Loaded(data) => Some(data),
            Self::Loading { previous } | Self::Failed { previous, .. } => previous.as_ref(),
            Self::NotReady => None,
        }
    }

    pub fn loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn is_ready(&self) -> bool {
        !matches!(self, Self::NotReady)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Start a refresh, keeping the current data visible.
    pub fn refresh(self) -> Self {
        let previous = match self {
            Self::Loaded(data) => Some(data),
            Self::Loading { previous } | Self::Failed { previous, .. } => previous,
            Self::NotReady => None,
        };
        Self::Loading { previous }
    }

    /// Settle a refresh with its outcome.
    pub fn resolve<E: fmt::Display>(self, result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::Loaded(data),
            Err(e) => {
                let previous = match self {
                    Self::Loaded(data) => Some(data),
                    Self::Loading { previous } | Self::Failed { previous, .. } => previous,
                    Self::NotReady => None,
                };
                tracing::warn!(error = %e, stale = previous.is_some(), "Fetch failed");
                Self::Failed {
                    error: e.to_string(),
                    previous,
                }
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchState<U> {
        match self {
            Self::NotReady => FetchState::NotReady,
            Self::Loading { previous } => FetchState::Loading {
                previous: previous.map(f),
            },
            Self::Loaded(data) => FetchState::Loaded(f(data)),
            Self::Failed { error, previous } => FetchState::Failed {
                error,
                previous: previous.map(f),
            },
        }
    }
}
