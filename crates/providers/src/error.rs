use hyde_core::error::ServiceError;

/// Errors from the provider HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The provider refused the prompt.
    #[error("{message}")]
    ContentPolicy {
        message: String,
        suggestion: Option<String>,
    },

    /// The API key or base URL for a provider is missing.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// A 2xx response whose body could not be used.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl From<base64::DecodeError> for ProviderError {
    fn from(e: base64::DecodeError) -> Self {
        Self::InvalidResponse(format!("bad base64 payload: {e}"))
    }
}

impl From<ProviderError> for ServiceError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Api { status, body } => ServiceError::Status { status, body },
            ProviderError::ContentPolicy {
                message,
                suggestion,
            } => ServiceError::ContentPolicy {
                message,
                suggestion,
            },
            other => ServiceError::Failed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hyde_core::retry::Transient;

    use super::*;

    #[test]
    fn api_errors_keep_their_status() {
        let err: ServiceError = ProviderError::Api {
            status: 503,
            body: "unavailable".into(),
        }
        .into();
        assert_matches!(err, ServiceError::Status { status: 503, .. });
        assert!(err.is_transient());
    }

    #[test]
    fn content_policy_is_terminal() {
        let err: ServiceError = ProviderError::ContentPolicy {
            message: "bad prompt".into(),
            suggestion: Some("a calm piano piece".into()),
        }
        .into();
        assert!(!err.is_transient());
    }

    #[test]
    fn missing_configuration_is_terminal() {
        let err: ServiceError = ProviderError::NotConfigured("ELEVENLABS_API_KEY").into();
        assert_eq!(err.user_message(), "ELEVENLABS_API_KEY is not configured");
        assert!(!err.is_transient());
    }
}
