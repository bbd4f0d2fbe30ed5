// Appwrite wire types
//
// Field names follow the REST API ($id, userId, emailVerification, ...). These
// never leave this crate; callers see the core domain types.

use atelier_core::error::ProviderError;
use atelier_core::user::{Profile, SubscriptionRecord, User};
use atelier_core::Session;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Error body returned on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct AppwriteErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: u16,
    #[serde(rename = "type", default)]
    pub error_type: String,
}

#[derive(Debug, Deserialize)]
pub struct AppwriteSession {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub expire: String,
    #[serde(default)]
    pub provider: String,
    /// Only populated when the request carried a server key
    #[serde(default)]
    pub secret: String,
}

impl AppwriteSession {
    /// Convert to a domain session. `presented` fills in the secret when the
    /// response does not repeat it (reads of an existing session).
    pub fn into_session(self, presented: Option<&SecretString>) -> Result<Session, ProviderError> {
        let expires_at = DateTime::parse_from_rfc3339(&self.expire)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| {
                ProviderError::unexpected(format!("invalid session expiry {:?}: {}", self.expire, e))
            })?;

        let secret = if !self.secret.is_empty() {
            SecretString::from(self.secret)
        } else if let Some(presented) = presented {
            presented.clone()
        } else {
            return Err(ProviderError::unexpected(
                "session response carried no secret; is the API key missing?",
            ));
        };

        Ok(Session {
            id: self.id,
            user_id: self.user_id,
            provider: self.provider,
            expires_at,
            secret,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AppwriteUser {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "emailVerification", default)]
    pub email_verification: bool,
    #[serde(default)]
    pub prefs: serde_json::Value,
}

impl From<AppwriteUser> for User {
    fn from(u: AppwriteUser) -> Self {
        User {
            id: u.id,
            name: u.name,
            email: u.email,
            email_verification: u.email_verification,
            prefs: if u.prefs.is_null() {
                serde_json::Value::Object(Default::default())
            } else {
                u.prefs
            },
        }
    }
}

/// Profile document as stored in the profiles collection
#[derive(Debug, Deserialize)]
pub struct ProfileDocument {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Either an embedded object or a JSON string, depending on the attribute type
    #[serde(default)]
    pub subscription: serde_json::Value,
    #[serde(rename = "subscriptionTier", default)]
    pub subscription_tier: Option<String>,
    #[serde(rename = "subscriptionEndDate", default)]
    pub subscription_end_date: Option<String>,
}

impl From<ProfileDocument> for Profile {
    fn from(doc: ProfileDocument) -> Self {
        let subscription = match doc.subscription {
            serde_json::Value::String(raw) => serde_json::from_str::<SubscriptionRecord>(&raw).ok(),
            serde_json::Value::Null => None,
            other => serde_json::from_value::<SubscriptionRecord>(other).ok(),
        };

        Profile {
            id: doc.id,
            display_name: doc.display_name.unwrap_or_default(),
            image_url: doc.image_url.unwrap_or_default(),
            created_at: doc.created_at.unwrap_or_default(),
            subscription,
            subscription_tier: doc.subscription_tier,
            subscription_end_date: doc.subscription_end_date,
        }
    }
}

// ============================================
// Request bodies
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest<'a> {
    pub user_id: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct EmailSessionRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSessionRequest<'a> {
    pub user_id: &'a str,
    pub secret: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RecoveryRequest<'a> {
    pub email: &'a str,
    pub url: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionPatch {
    #[serde(rename = "subscriptionTier")]
    pub subscription_tier: String,
    #[serde(rename = "subscriptionEndDate")]
    pub subscription_end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentPatch<T> {
    pub data: T,
}
