use crate::retry::Transient;
use crate::transient::{is_transient_message, is_transient_status};
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure reported by an external collaborator (persistence, music,
/// image or storage service).
///
/// Carries only owned strings so it can be cloned into state and
/// serialized into a track's `error` column.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The collaborator answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The prompt was refused by the provider's content policy.
    #[error("{message}")]
    ContentPolicy {
        message: String,
        suggestion: Option<String>,
    },

    /// Any other failure, already rendered to text.
    #[error("{0}")]
    Failed(String),
}

impl ServiceError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Human-readable message suitable for storing on a track.
    ///
    /// JSON bodies of the shape `{"error": "..."}` are unwrapped; HTML
    /// error pages are replaced by a generic status line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { status, body } => {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
                    if let Some(msg) = value.get("error").and_then(|v| v.as_str()) {
                        return msg.to_string();
                    }
                }
                let trimmed = body.trim();
                if trimmed.is_empty() || trimmed.starts_with('<') {
                    format!("Request failed with status {status}")
                } else {
                    trimmed.to_string()
                }
            }
            Self::ContentPolicy {
                message,
                suggestion: Some(suggestion),
            } => format!("{message}. Suggested prompt: {suggestion}"),
            Self::ContentPolicy { message, .. } => message.clone(),
            Self::Failed(message) => message.clone(),
        }
    }
}

impl Transient for ServiceError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, body } => {
                is_transient_status(*status)
                    || (*status >= 500 && is_transient_message(body))
            }
            Self::ContentPolicy { .. } => false,
            Self::Failed(message) => is_transient_message(message),
        }
    }
}
