// Session service: issue, read and terminate provider sessions
// Decision: Every operation returns a result value; provider errors never escape
// Decision: Validity is always decided by a provider round trip, never locally
// Decision: No retries here; the user is the retry mechanism

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

use crate::error::AuthError;
use crate::oauth::OAuthProvider;
use crate::provider::IdentityProvider;
use crate::session::Session;
use crate::user::User;
use crate::validation::{validate_login, validate_recovery, validate_registration};

/// Path the provider sends the browser back to after OAuth consent.
pub const OAUTH_CALLBACK_PATH: &str = "/oauth";

/// Path the browser lands on when OAuth consent is denied.
pub const OAUTH_FAILURE_PATH: &str = "/login";

/// Path used in password recovery emails.
pub const RECOVERY_PATH: &str = "/reset-password";

/// Settings the session service needs from configuration
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Public origin of the application, without trailing slash
    pub app_url: String,
    /// Whether new accounts may be created
    pub signup_enabled: bool,
    /// OAuth providers offered on the login page
    pub oauth_providers: Vec<OAuthProvider>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:3000".to_string(),
            signup_enabled: true,
            oauth_providers: OAuthProvider::ALL.to_vec(),
        }
    }
}

impl AuthSettings {
    /// Absolute URL for a path on this application
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.app_url.trim_end_matches('/'), path)
    }

    pub fn oauth_enabled(&self, provider: OAuthProvider) -> bool {
        self.oauth_providers.contains(&provider)
    }
}

/// A freshly issued session and the user it belongs to
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session: Session,
    pub user: User,
}

/// Result of resolving identity from a request's secret
#[derive(Debug, Clone)]
pub enum Lookup<T> {
    /// No secret was presented
    NoSession,
    /// A secret was presented but the provider refused it
    Invalid,
    /// The provider confirmed the secret
    Found(T),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NoSession | Lookup::Invalid => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Result of completing an OAuth callback
#[derive(Debug, Clone)]
pub enum CallbackOutcome {
    /// `userId` or `secret` missing; the provider was not contacted
    InvalidCallback,
    /// Session created; caller must persist it in cookies
    Established(Session),
    /// The provider refused to create the session; caller redirects home anyway
    Degraded,
}

/// Converts credentials into sessions and resolves sessions into users
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    settings: AuthSettings,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl AuthService {
    pub fn new(provider: Arc<dyn IdentityProvider>, settings: AuthSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    // ============================================
    // Session Issuer
    // ============================================

    /// Verify email/password with the provider and issue a session
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError> {
        validate_login(email, password)?;

        let session = self
            .provider
            .create_password_session(email.trim(), password)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Login rejected");
                AuthError::from_provider(&e, "Invalid credentials")
            })?;

        let user = self.load_issued_user(&session, "Login failed").await?;

        tracing::info!(user_id = %user.id, session_id = %session.id, "Session issued from password");
        Ok(IssuedSession { session, user })
    }

    /// Create an account, then issue a password session for it
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<IssuedSession, AuthError> {
        if !self.settings.signup_enabled {
            return Err(AuthError::validation("Registration is disabled"));
        }
        validate_registration(email, password, name)?;

        let user = self
            .provider
            .create_account(email.trim(), password, name.trim())
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Account creation failed");
                AuthError::from_provider(&e, "Registration failed")
            })?;

        let session = self
            .provider
            .create_password_session(email.trim(), password)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Session creation after registration failed");
                AuthError::from_provider(&e, "Registration failed")
            })?;

        tracing::info!(user_id = %user.id, session_id = %session.id, "Account registered");
        Ok(IssuedSession { session, user })
    }

    /// Finish an OAuth redirect: exchange the callback's user id and secret for a session.
    ///
    /// Missing parameters fail closed without contacting the provider. A provider
    /// failure degrades to a plain redirect home.
    pub async fn complete_oauth(
        &self,
        user_id: Option<&str>,
        secret: Option<&str>,
    ) -> CallbackOutcome {
        let (Some(user_id), Some(secret)) = (non_empty(user_id), non_empty(secret)) else {
            tracing::warn!("OAuth callback missing userId or secret");
            return CallbackOutcome::InvalidCallback;
        };

        match self.provider.create_token_session(user_id, secret).await {
            Ok(session) => {
                tracing::info!(user_id = %user_id, session_id = %session.id, "Session issued from OAuth callback");
                CallbackOutcome::Established(session)
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "OAuth session creation failed");
                CallbackOutcome::Degraded
            }
        }
    }

    /// Build the provider consent URL for an OAuth login. Sets no session state.
    pub fn begin_oauth(&self, provider: OAuthProvider) -> Result<String, AuthError> {
        if !self.settings.oauth_enabled(provider) {
            return Err(AuthError::validation(format!(
                "{} login is not available",
                provider.display_name()
            )));
        }

        self.provider
            .oauth2_authorization_url(
                provider,
                &self.settings.url_for(OAUTH_CALLBACK_PATH),
                &self.settings.url_for(OAUTH_FAILURE_PATH),
                provider.scopes(),
            )
            .map_err(|e| {
                tracing::error!(provider = %provider, error = %e, "Failed to build OAuth URL");
                AuthError::Unexpected
            })
    }

    /// Send a recovery email; `url` defaults to this app's reset page
    pub async fn recover_password(&self, email: &str, url: Option<&str>) -> Result<(), AuthError> {
        validate_recovery(email)?;

        let url = match non_empty(url) {
            Some(url) => url.to_string(),
            None => self.settings.url_for(RECOVERY_PATH),
        };

        self.provider
            .create_recovery(email.trim(), &url)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Password recovery failed");
                AuthError::from_provider(&e, "Failed to send recovery email")
            })
    }

    // ============================================
    // Session Reader
    // ============================================

    /// Resolve the authoritative user for a session secret
    pub async fn current_user(&self, secret: Option<&str>) -> Lookup<User> {
        let Some(secret) = non_empty(secret) else {
            return Lookup::NoSession;
        };
        let secret = SecretString::from(secret.to_string());

        match self.provider.get_account(&secret).await {
            Ok(user) => Lookup::Found(user),
            Err(e) => {
                tracing::debug!(error = %e, "Session secret not accepted");
                Lookup::Invalid
            }
        }
    }

    /// Resolve the session record for a session secret
    pub async fn current_session(&self, secret: Option<&str>) -> Lookup<Session> {
        let Some(secret) = non_empty(secret) else {
            return Lookup::NoSession;
        };
        let secret = SecretString::from(secret.to_string());

        match self.provider.get_current_session(&secret).await {
            Ok(session) => Lookup::Found(session),
            Err(e) => {
                tracing::debug!(error = %e, "Session secret not accepted");
                Lookup::Invalid
            }
        }
    }

    // ============================================
    // Logout
    // ============================================

    /// Delete the current session provider-side, best effort.
    ///
    /// Never fails: the caller clears cookies regardless of what happens here.
    pub async fn terminate(&self, session_id: Option<&str>, secret: Option<&str>) {
        let Some(session_id) = non_empty(session_id) else {
            tracing::debug!("Logout without session cookie; nothing to delete");
            return;
        };
        let secret = non_empty(secret).map(|s| SecretString::from(s.to_string()));

        match self.provider.delete_session(secret.as_ref(), session_id).await {
            Ok(()) => tracing::info!(session_id = %session_id, "Session deleted"),
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Session deletion failed; clearing cookies anyway")
            }
        }
    }

    // ============================================
    // Helpers
    // ============================================

    /// Fetch the user for a session just created; roll the session back on failure
    async fn load_issued_user(&self, session: &Session, fallback: &str) -> Result<User, AuthError> {
        match self.provider.get_account(&session.secret).await {
            Ok(user) => Ok(user),
            Err(e) => {
                tracing::error!(session_id = %session.id, error = %e, "Failed to load user for new session");
                if let Err(cleanup) = self
                    .provider
                    .delete_session(Some(&session.secret), &session.id)
                    .await
                {
                    tracing::warn!(session_id = %session.id, error = %cleanup, "Failed to roll back session");
                }
                Err(AuthError::from_provider(&e, fallback))
            }
        }
    }
}

/// Expose a secret for transport into a cookie value
pub fn secret_value(secret: &SecretString) -> &str {
    secret.expose_secret()
}
