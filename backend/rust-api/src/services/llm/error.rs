//! LLM client errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("no API key configured")]
    MissingApiKey,

    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("network error: {0}")]
    NetworkError(String),

    /// The reply parsed but carried no text.
    #[error("model returned an empty response")]
    EmptyResponse,
}

impl ProviderError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. }
            | ProviderError::Timeout(_)
            | ProviderError::NetworkError(_) => true,
            ProviderError::ApiError { status, .. } => *status >= 500,
            ProviderError::AuthenticationFailed(_)
            | ProviderError::MissingApiKey
            | ProviderError::EmptyResponse => false,
        }
    }

    /// Short label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::RateLimited { .. } => "rate_limited",
            ProviderError::AuthenticationFailed(_) | ProviderError::MissingApiKey => "auth",
            ProviderError::ApiError { .. } => "api_error",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::NetworkError(_) => "network",
            ProviderError::EmptyResponse => "empty",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        assert!(ProviderError::ApiError {
            status: 503,
            message: "overloaded".into()
        }
        .is_retryable());
        assert!(ProviderError::RateLimited { retry_after_ms: 1000 }.is_retryable());
        assert!(ProviderError::Timeout(60).is_retryable());
    }

    #[test]
    fn client_errors_are_permanent() {
        assert!(!ProviderError::ApiError {
            status: 400,
            message: "bad".into()
        }
        .is_retryable());
        assert!(!ProviderError::AuthenticationFailed("nope".into()).is_retryable());
        assert!(!ProviderError::MissingApiKey.is_retryable());
    }
}
