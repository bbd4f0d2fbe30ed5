// In-memory identity provider for dev mode and tests
// Decision: Use parking_lot for thread-safe access
// Decision: Mirror the remote provider's status codes so callers see the same errors
//
// All data is lost on restart. Passwords are kept as SHA-256 digests only so
// that a memory dump of a dev server does not show them in clear text.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::oauth::OAuthProvider;
use crate::provider::{IdentityProvider, ProfileStore, ProviderResult};
use crate::session::Session;
use crate::user::{Profile, SubscriptionUpdate, User};
use crate::validation::MIN_PASSWORD_LENGTH;

const DEFAULT_ENDPOINT: &str = "http://localhost/v1";
const SECRET_BYTES: usize = 32;

struct MemoryAccount {
    user: User,
    password_hash: String,
}

struct MemorySession {
    id: String,
    user_id: String,
    provider: String,
    expires_at: chrono::DateTime<Utc>,
    secret: String,
}

impl MemorySession {
    fn to_session(&self) -> Session {
        Session {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            provider: self.provider.clone(),
            expires_at: self.expires_at,
            secret: SecretString::from(self.secret.clone()),
        }
    }
}

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<String, MemoryAccount>,
    sessions: HashMap<String, MemorySession>,
    // user id -> pending one-time OAuth secret
    oauth_tokens: HashMap<String, String>,
    profiles: HashMap<String, Profile>,
    recoveries: Vec<(String, String)>,
}

/// In-memory provider implementing both provider traits
pub struct InMemoryIdentityProvider {
    state: RwLock<MemoryState>,
    calls: AtomicUsize,
    session_ttl: Duration,
    endpoint: String,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn generate_secret() -> String {
    let bytes: [u8; SECRET_BYTES] = rand::thread_rng().gen();
    hex::encode(bytes)
}

fn generate_id() -> String {
    Uuid::now_v7().simple().to_string()
}

fn invalid_session() -> ProviderError {
    ProviderError::rejected(401, "Invalid or expired session")
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            calls: AtomicUsize::new(0),
            session_ttl: Duration::days(365),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Override how long issued sessions live
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    // ============================================
    // Seeding and inspection (dev tooling, tests)
    // ============================================

    /// Create an account directly, bypassing validation. Returns the user id.
    pub fn seed_user(&self, email: &str, password: &str, name: &str) -> String {
        let user = self.insert_account(email, password, name);
        user.id
    }

    /// Simulate the provider's OAuth redirect: mint a one-time secret for a user
    pub fn issue_oauth_token(&self, user_id: &str) -> String {
        let secret = generate_secret();
        self.state
            .write()
            .oauth_tokens
            .insert(user_id.to_string(), secret.clone());
        secret
    }

    /// Number of provider operations served so far (seeding excluded)
    pub fn provider_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of live sessions
    pub fn session_count(&self) -> usize {
        self.state.read().sessions.len()
    }

    /// Recovery emails "sent", as (email, url)
    pub fn recoveries(&self) -> Vec<(String, String)> {
        self.state.read().recoveries.clone()
    }

    /// Current profile document for a user
    pub fn profile(&self, user_id: &str) -> Option<Profile> {
        self.state.read().profiles.get(user_id).cloned()
    }

    /// Drop a profile document (to exercise missing-document paths)
    pub fn remove_profile(&self, user_id: &str) {
        self.state.write().profiles.remove(user_id);
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn insert_account(&self, email: &str, password: &str, name: &str) -> User {
        let now = Utc::now().to_rfc3339();
        let user = User {
            id: generate_id(),
            name: name.to_string(),
            email: email.to_string(),
            email_verification: false,
            prefs: serde_json::Value::Object(Default::default()),
        };
        let profile = Profile {
            id: user.id.clone(),
            display_name: name.to_string(),
            image_url: String::new(),
            created_at: now,
            ..Default::default()
        };

        let mut state = self.state.write();
        state.profiles.insert(user.id.clone(), profile);
        state.accounts.insert(
            user.id.clone(),
            MemoryAccount {
                user: user.clone(),
                password_hash: hash_password(password),
            },
        );
        user
    }

    fn open_session(&self, user_id: &str, provider: &str) -> Session {
        let session = MemorySession {
            id: generate_id(),
            user_id: user_id.to_string(),
            provider: provider.to_string(),
            expires_at: Utc::now() + self.session_ttl,
            secret: generate_secret(),
        };
        let issued = session.to_session();
        self.state
            .write()
            .sessions
            .insert(session.id.clone(), session);
        issued
    }

    /// Find the live session a secret belongs to
    fn session_for_secret(&self, secret: &SecretString) -> ProviderResult<Session> {
        let state = self.state.read();
        state
            .sessions
            .values()
            .find(|s| s.secret == secret.expose_secret())
            .filter(|s| s.expires_at > Utc::now())
            .map(MemorySession::to_session)
            .ok_or_else(invalid_session)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> ProviderResult<User> {
        self.record_call();

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ProviderError::rejected(
                400,
                "Invalid `password` param: Password must be at least 8 characters",
            ));
        }
        let taken = self
            .state
            .read()
            .accounts
            .values()
            .any(|a| a.user.email.eq_ignore_ascii_case(email));
        if taken {
            return Err(ProviderError::rejected(
                409,
                "A user with the same id, email, or phone already exists in this project.",
            ));
        }

        Ok(self.insert_account(email, password, name))
    }

    async fn create_password_session(
        &self,
        email: &str,
        password: &str,
    ) -> ProviderResult<Session> {
        self.record_call();

        let user_id = {
            let state = self.state.read();
            state
                .accounts
                .values()
                .find(|a| {
                    a.user.email.eq_ignore_ascii_case(email)
                        && a.password_hash == hash_password(password)
                })
                .map(|a| a.user.id.clone())
        };

        match user_id {
            Some(user_id) => Ok(self.open_session(&user_id, "email")),
            None => Err(ProviderError::rejected(
                401,
                "Invalid credentials. Please check the email and password.",
            )),
        }
    }

    async fn create_token_session(&self, user_id: &str, secret: &str) -> ProviderResult<Session> {
        self.record_call();

        let valid = {
            let mut state = self.state.write();
            match state.oauth_tokens.get(user_id) {
                Some(expected) if expected == secret => {
                    state.oauth_tokens.remove(user_id);
                    true
                }
                _ => false,
            }
        };

        if !valid {
            return Err(ProviderError::rejected(401, "Invalid token passed in the request."));
        }
        Ok(self.open_session(user_id, "oauth2"))
    }

    async fn get_account(&self, secret: &SecretString) -> ProviderResult<User> {
        self.record_call();

        let session = self.session_for_secret(secret)?;
        self.state
            .read()
            .accounts
            .get(&session.user_id)
            .map(|a| a.user.clone())
            .ok_or_else(invalid_session)
    }

    async fn get_current_session(&self, secret: &SecretString) -> ProviderResult<Session> {
        self.record_call();
        self.session_for_secret(secret)
    }

    async fn delete_session(
        &self,
        secret: Option<&SecretString>,
        session_id: &str,
    ) -> ProviderResult<()> {
        self.record_call();

        let mut state = self.state.write();
        let owned = match (state.sessions.get(session_id), secret) {
            (Some(s), Some(secret)) => s.secret == secret.expose_secret(),
            (Some(_), None) => return Err(ProviderError::rejected(401, "Missing session secret")),
            (None, _) => {
                return Err(ProviderError::rejected(
                    404,
                    "Session with the requested ID could not be found.",
                ))
            }
        };
        if !owned {
            return Err(ProviderError::rejected(401, "Session does not belong to caller"));
        }
        state.sessions.remove(session_id);
        Ok(())
    }

    async fn create_recovery(&self, email: &str, url: &str) -> ProviderResult<()> {
        self.record_call();

        let mut state = self.state.write();
        let known = state
            .accounts
            .values()
            .any(|a| a.user.email.eq_ignore_ascii_case(email));
        if !known {
            return Err(ProviderError::rejected(
                404,
                "User with the requested ID could not be found.",
            ));
        }
        state.recoveries.push((email.to_string(), url.to_string()));
        Ok(())
    }

    fn oauth2_authorization_url(
        &self,
        provider: OAuthProvider,
        success_url: &str,
        failure_url: &str,
        scopes: &[&str],
    ) -> ProviderResult<String> {
        let mut url = Url::parse(&format!(
            "{}/account/tokens/oauth2/{}",
            self.endpoint,
            provider.as_str()
        ))
        .map_err(|e| ProviderError::unexpected(e.to_string()))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("project", "memory");
            query.append_pair("success", success_url);
            query.append_pair("failure", failure_url);
            for scope in scopes {
                query.append_pair("scopes[]", scope);
            }
        }
        Ok(url.to_string())
    }
}

#[async_trait]
impl ProfileStore for InMemoryIdentityProvider {
    async fn get_profile(&self, user_id: &str) -> ProviderResult<Option<Profile>> {
        self.record_call();
        Ok(self.state.read().profiles.get(user_id).cloned())
    }

    async fn update_subscription(
        &self,
        user_id: &str,
        update: &SubscriptionUpdate,
    ) -> ProviderResult<()> {
        self.record_call();

        let mut state = self.state.write();
        let profile = state.profiles.get_mut(user_id).ok_or_else(|| {
            ProviderError::rejected(404, "Document with the requested ID could not be found.")
        })?;
        profile.subscription_tier = Some(update.tier.clone());
        profile.subscription_end_date = update.end_date.map(|d| d.to_rfc3339());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_password_session_roundtrip() {
        let provider = InMemoryIdentityProvider::new();
        let user_id = provider.seed_user("ada@example.com", "correct-horse", "Ada");

        let session = provider
            .create_password_session("ada@example.com", "correct-horse")
            .await
            .unwrap();
        assert_eq!(session.user_id, user_id);

        let user = provider.get_account(&session.secret).await.unwrap();
        assert_eq!(user.id, user_id);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_rejected() {
        let provider = InMemoryIdentityProvider::new().with_session_ttl(Duration::seconds(-1));
        provider.seed_user("ada@example.com", "correct-horse", "Ada");

        let session = provider
            .create_password_session("ada@example.com", "correct-horse")
            .await
            .unwrap();
        let err = provider.get_account(&session.secret).await.unwrap_err();
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn test_oauth_token_is_single_use() {
        let provider = InMemoryIdentityProvider::new();
        let user_id = provider.seed_user("ada@example.com", "correct-horse", "Ada");
        let token = provider.issue_oauth_token(&user_id);

        assert!(provider.create_token_session(&user_id, &token).await.is_ok());
        assert!(provider.create_token_session(&user_id, &token).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_session_requires_owner_secret() {
        let provider = InMemoryIdentityProvider::new();
        provider.seed_user("ada@example.com", "correct-horse", "Ada");
        let session = provider
            .create_password_session("ada@example.com", "correct-horse")
            .await
            .unwrap();

        let other = SecretString::from("someone-else".to_string());
        assert!(provider.delete_session(Some(&other), &session.id).await.is_err());
        assert!(provider
            .delete_session(Some(&session.secret), &session.id)
            .await
            .is_ok());
        assert_eq!(provider.session_count(), 0);
    }

    #[tokio::test]
    async fn test_update_subscription() {
        let provider = InMemoryIdentityProvider::new();
        let user_id = provider.seed_user("ada@example.com", "correct-horse", "Ada");

        let end = Utc::now() + Duration::days(30);
        provider
            .update_subscription(
                &user_id,
                &SubscriptionUpdate {
                    tier: "premium".into(),
                    end_date: Some(end),
                },
            )
            .await
            .unwrap();

        let profile = provider.profile(&user_id).unwrap();
        assert_eq!(profile.subscription_tier.as_deref(), Some("premium"));
        assert_eq!(profile.subscription_end_date, Some(end.to_rfc3339()));

        let missing = provider
            .update_subscription(
                "nobody",
                &SubscriptionUpdate {
                    tier: "premium".into(),
                    end_date: None,
                },
            )
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
    }
}
