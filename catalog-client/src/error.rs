//! Client error types.

/// Errors returned by [`crate::CatalogClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response body: {message}")]
    Decode { message: String },

    /// A required request input is missing, so no request was sent.
    #[error("Request not ready: {what} is required")]
    NotReady { what: &'static str },

    #[error("Invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },
}

impl ClientError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ClientError::Api {
            status: 404,
            message: "source config 'x' not found".into(),
        };
        assert_eq!(err.to_string(), "API error (404): source config 'x' not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_not_ready_display() {
        let err = ClientError::NotReady {
            what: "source or source label",
        };
        assert_eq!(
            err.to_string(),
            "Request not ready: source or source label is required"
        );
        assert_eq!(err.status(), None);
    }
}
