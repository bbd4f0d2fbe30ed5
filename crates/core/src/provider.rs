// Provider traits for pluggable identity backends
//
// These traits let the session service run against:
// - An Appwrite-compatible REST backend in production
// - The in-memory provider for local development and tests
//
// Session-scoped calls take the secret explicitly; implementations hold no
// per-user state, so one handle is shared by every request.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::ProviderError;
use crate::oauth::OAuthProvider;
use crate::session::Session;
use crate::user::{Profile, SubscriptionUpdate, User};

/// Result type alias for provider calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

// ============================================================================
// IdentityProvider - accounts, sessions and credential checks
// ============================================================================

/// Remote service of record for accounts and sessions
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account with email/password credentials
    async fn create_account(&self, email: &str, password: &str, name: &str)
        -> ProviderResult<User>;

    /// Verify email/password and issue a session (with secret)
    async fn create_password_session(&self, email: &str, password: &str)
        -> ProviderResult<Session>;

    /// Exchange an OAuth callback's user id + one-time secret for a session
    async fn create_token_session(&self, user_id: &str, secret: &str) -> ProviderResult<Session>;

    /// Resolve the account that owns a session secret
    async fn get_account(&self, secret: &SecretString) -> ProviderResult<User>;

    /// Resolve the session a secret belongs to
    async fn get_current_session(&self, secret: &SecretString) -> ProviderResult<Session>;

    /// Delete one session by id (never "all sessions")
    async fn delete_session(
        &self,
        secret: Option<&SecretString>,
        session_id: &str,
    ) -> ProviderResult<()>;

    /// Send a password recovery email pointing at `url`
    async fn create_recovery(&self, email: &str, url: &str) -> ProviderResult<()>;

    /// Build the consent URL for an OAuth provider. No network call.
    fn oauth2_authorization_url(
        &self,
        provider: OAuthProvider,
        success_url: &str,
        failure_url: &str,
        scopes: &[&str],
    ) -> ProviderResult<String>;
}

// ============================================================================
// ProfileStore - profile documents in the provider's database
// ============================================================================

/// Profile documents keyed by user id
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile, `None` when the document does not exist
    async fn get_profile(&self, user_id: &str) -> ProviderResult<Option<Profile>>;

    /// Write subscription tier and end date on a profile
    async fn update_subscription(
        &self,
        user_id: &str,
        update: &SubscriptionUpdate,
    ) -> ProviderResult<()>;
}
