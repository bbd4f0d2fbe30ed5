// Error types for session operations
//
// Two layers:
// - ProviderError: what went wrong talking to the identity/database provider
// - AuthError: what an auth operation reports to its caller (validation,
//   rejection, or a generic unexpected failure that never leaks internals)

use thiserror::Error;

/// Generic message shown for unexpected failures.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Errors returned by provider clients
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider understood the request and refused it (4xx)
    #[error("provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The provider could not be reached
    #[error("provider unreachable: {0}")]
    Transport(String),

    /// The provider answered with something we could not use (5xx, bad payload)
    #[error("unexpected provider response: {0}")]
    Unexpected(String),
}

impl ProviderError {
    /// Create a rejection error
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        ProviderError::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Create an unexpected-response error
    pub fn unexpected(message: impl Into<String>) -> Self {
        ProviderError::Unexpected(message.into())
    }

    /// Whether the provider refused the request (bad credentials, expired secret, ...)
    pub fn is_rejection(&self) -> bool {
        matches!(self, ProviderError::Rejected { .. })
    }

    /// Whether the provider reported a missing resource
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::Rejected { status: 404, .. })
    }
}

/// Outcome of a failed auth operation, safe to show to the user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Input rejected before any network call; message is shown verbatim
    #[error("{0}")]
    Validation(String),

    /// Provider refused the operation; message is human-readable
    #[error("{0}")]
    Rejected(String),

    /// Anything else; details are logged server-side only
    #[error("{}", UNEXPECTED_ERROR_MESSAGE)]
    Unexpected,
}

impl AuthError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        AuthError::Validation(msg.into())
    }

    /// Normalize a provider error.
    ///
    /// Rejections keep the provider's message when it has one, otherwise
    /// `fallback`. Transport and payload errors collapse to `Unexpected`.
    pub fn from_provider(err: &ProviderError, fallback: &str) -> Self {
        match err {
            ProviderError::Rejected { message, .. } if !message.trim().is_empty() => {
                AuthError::Rejected(message.clone())
            }
            ProviderError::Rejected { .. } => AuthError::Rejected(fallback.to_string()),
            ProviderError::Transport(_) | ProviderError::Unexpected(_) => AuthError::Unexpected,
        }
    }

    /// Message to display to the user
    pub fn message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_keeps_provider_message() {
        let err = ProviderError::rejected(401, "Invalid credentials. Please check the email and password.");
        assert_eq!(
            AuthError::from_provider(&err, "Invalid credentials"),
            AuthError::Rejected("Invalid credentials. Please check the email and password.".into())
        );
    }

    #[test]
    fn test_rejection_without_message_uses_fallback() {
        let err = ProviderError::rejected(401, "  ");
        assert_eq!(
            AuthError::from_provider(&err, "Invalid credentials"),
            AuthError::Rejected("Invalid credentials".into())
        );
    }

    #[test]
    fn test_transport_errors_do_not_leak() {
        let err = ProviderError::Transport("connection refused (10.0.0.3:443)".into());
        let auth = AuthError::from_provider(&err, "Login failed");
        assert_eq!(auth, AuthError::Unexpected);
        assert_eq!(auth.message(), UNEXPECTED_ERROR_MESSAGE);
        assert!(!auth.message().contains("10.0.0.3"));
    }

    #[test]
    fn test_provider_error_classification() {
        assert!(ProviderError::rejected(404, "missing").is_not_found());
        assert!(ProviderError::rejected(401, "nope").is_rejection());
        assert!(!ProviderError::unexpected("boom").is_rejection());
    }
}
