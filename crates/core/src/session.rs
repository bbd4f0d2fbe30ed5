// Session domain types
//
// A Session is one authenticated browser/provider pairing. The secret is an
// opaque, provider-issued bearer credential; nothing here can validate it.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Session issued by the identity provider.
///
/// Deliberately not `Serialize`: the secret must only ever travel in an
/// HTTP-only cookie. Use [`SessionView`] for anything client-facing.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque session identifier, used to target deletion on logout.
    pub id: String,
    /// Owner of the session.
    pub user_id: String,
    /// How the session was created (e.g. "email", "google").
    pub provider: String,
    /// Provider-side expiry; cookie expiry is synchronized to it.
    pub expires_at: DateTime<Utc>,
    /// Bearer credential presented on every authenticated provider call.
    pub secret: SecretString,
}

impl Session {
    /// Whether the provider-side expiry has passed
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Client-safe projection of this session
    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            provider: self.provider.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Session without its secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SessionView {
    /// Opaque session identifier.
    pub id: String,
    /// Owner of the session.
    pub user_id: String,
    /// How the session was created.
    pub provider: String,
    /// When the session stops being accepted by the provider.
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_at: DateTime<Utc>) -> Session {
        Session {
            id: "sess_1".to_string(),
            user_id: "user_1".to_string(),
            provider: "email".to_string(),
            expires_at,
            secret: SecretString::from("top-secret".to_string()),
        }
    }

    #[test]
    fn test_view_omits_secret() {
        let s = session(Utc::now() + Duration::days(1));
        let json = serde_json::to_string(&s.view()).unwrap();
        assert!(json.contains("sess_1"));
        assert!(!json.contains("top-secret"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let s = session(Utc::now() + Duration::days(1));
        assert!(!format!("{:?}", s).contains("top-secret"));
    }

    #[test]
    fn test_is_expired() {
        assert!(!session(Utc::now() + Duration::hours(1)).is_expired());
        assert!(session(Utc::now() - Duration::seconds(1)).is_expired());
    }
}
