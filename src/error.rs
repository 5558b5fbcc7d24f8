//! Error taxonomy for the client library layer.
//!
//! The binary layer wraps these in `anyhow` with context; the session
//! layer catches them and stores a display message per (model, kind).

use thiserror::Error;

/// Errors surfaced by the analysis service client and the local pipelines.
///
/// Missing payload fields are deliberately NOT an error: the normalizer
/// defaults them instead (see `risk::normalizer`).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not reach the analysis service at all.
    #[error("cannot connect to the analysis service at {url}")]
    Connect { url: String },

    /// The service did not answer within the configured timeout.
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Any other transport-level failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service error {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body could not be decoded at all.
    #[error("failed to decode service response: {0}")]
    Decode(String),

    /// Required client-side input is missing or unusable.
    #[error("{0}")]
    Validation(String),
}

impl ClientError {
    /// True for transport-level failures (connect/timeout/other I/O).
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ClientError::Connect { .. } | ClientError::Timeout { .. } | ClientError::Transport(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_classification() {
        assert!(ClientError::Connect {
            url: "http://localhost:8000".to_string()
        }
        .is_network());
        assert!(ClientError::Timeout { seconds: 30 }.is_network());
        assert!(!ClientError::Validation("no file".to_string()).is_network());
        assert!(!ClientError::Api {
            status: 500,
            body: "boom".to_string()
        }
        .is_network());
    }

    #[test]
    fn test_display_messages() {
        let err = ClientError::Validation("Please choose a file.".to_string());
        assert_eq!(err.to_string(), "Please choose a file.");

        let err = ClientError::Timeout { seconds: 120 };
        assert!(err.to_string().contains("120s"));
    }
}
