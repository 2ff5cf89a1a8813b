//! Provider error types.

use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to a hosting provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the credential.
    #[error("{operation} failed: credential rejected: {message}")]
    Authentication { operation: String, message: String },

    /// The provider asked us to slow down. Retried with backoff.
    #[error("{operation} was rate limited: {message}")]
    RateLimited {
        operation: String,
        message: String,
        retry_after: Option<Duration>,
    },

    /// Still rate limited after the retry budget was used up.
    #[error("{operation} still rate limited after {attempts} attempts")]
    RateLimitExceeded { operation: String, attempts: u32 },

    /// Connection, timeout or server-side failure. Retried with backoff.
    #[error("{operation} failed: {message}")]
    Transient { operation: String, message: String },

    /// A transient failure persisted after the retry budget was used up.
    #[error("{operation} failed after {attempts} attempts: {message}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        message: String,
    },

    /// The requested resource does not exist.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Any other unsuccessful response.
    #[error("{operation} failed with status {status}: {message}")]
    Api {
        operation: String,
        status: u16,
        message: String,
    },

    /// The response body could not be decoded.
    #[error("{operation} returned an unexpected response: {message}")]
    Decode { operation: String, message: String },

    /// The configured API base URL is unusable.
    #[error("Invalid API base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },
}

impl ProviderError {
    /// Returns true for errors worth retrying with backoff.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transient { .. })
    }

    /// Returns true for errors that must abort the whole run.
    ///
    /// Everything else is isolated to the repository being processed.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::NotFound { .. } | Self::Api { .. } | Self::Decode { .. }
        )
    }

    /// Returns the provider's `Retry-After` hint, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Converts a retryable error into its terminal form once `attempts`
    /// attempts have been made.
    #[must_use]
    pub fn escalate(self, attempts: u32) -> Self {
        match self {
            Self::RateLimited { operation, .. } => Self::RateLimitExceeded {
                operation,
                attempts,
            },
            Self::Transient { operation, message } => Self::RetriesExhausted {
                operation,
                attempts,
                message,
            },
            other => other,
        }
    }
}

/// Maps an unsuccessful HTTP status to an error.
///
/// `401` is an authentication failure; `429`, or a `403` whose message
/// mentions the rate limit, is rate limiting; `5xx` is transient.
pub(crate) fn classify_status(
    operation: &str,
    resource: &str,
    status: StatusCode,
    message: String,
    retry_after: Option<Duration>,
) -> ProviderError {
    let operation = operation.to_string();
    let mentions_rate_limit = message.to_lowercase().contains("rate limit");

    match status {
        StatusCode::UNAUTHORIZED => ProviderError::Authentication { operation, message },
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            operation,
            message,
            retry_after,
        },
        StatusCode::FORBIDDEN if mentions_rate_limit => ProviderError::RateLimited {
            operation,
            message,
            retry_after,
        },
        StatusCode::NOT_FOUND => ProviderError::NotFound {
            resource: resource.to_string(),
        },
        status if status.is_server_error() => ProviderError::Transient {
            operation,
            message: format!("{status}: {message}"),
        },
        status => ProviderError::Api {
            operation,
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(status: StatusCode, message: &str) -> ProviderError {
        classify_status("list pulls", "acme/app", status, message.to_string(), None)
    }

    #[test]
    fn classifies_statuses() {
        assert!(matches!(
            classify(StatusCode::UNAUTHORIZED, "Bad credentials"),
            ProviderError::Authentication { .. }
        ));
        assert!(matches!(
            classify(StatusCode::TOO_MANY_REQUESTS, ""),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            classify(StatusCode::FORBIDDEN, "API rate limit exceeded for user"),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            classify(StatusCode::FORBIDDEN, "Resource not accessible"),
            ProviderError::Api { status: 403, .. }
        ));
        assert!(matches!(
            classify(StatusCode::NOT_FOUND, "Not Found"),
            ProviderError::NotFound { .. }
        ));
        assert!(matches!(
            classify(StatusCode::BAD_GATEWAY, ""),
            ProviderError::Transient { .. }
        ));
    }

    #[test]
    fn repository_scoped_errors_are_not_fatal() {
        assert!(!classify(StatusCode::NOT_FOUND, "").is_fatal());
        assert!(!classify(StatusCode::FORBIDDEN, "nope").is_fatal());
        assert!(classify(StatusCode::UNAUTHORIZED, "").is_fatal());
        assert!(classify(StatusCode::TOO_MANY_REQUESTS, "")
            .escalate(5)
            .is_fatal());
    }
}
