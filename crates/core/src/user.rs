// User and profile domain types
//
// Users are owned by the identity provider; profiles are documents in the
// provider's database, keyed by user id. Neither is mutated here except via
// passthrough provider calls (the billing webhook updates subscription fields).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Subscription tier written when a checkout completes.
pub const PREMIUM_TIER: &str = "premium";

/// Provider-owned identity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct User {
    /// Provider user id. Empty for the anonymous placeholder.
    pub id: String,
    pub name: String,
    pub email: String,
    /// Whether the email address has been verified.
    pub email_verification: bool,
    /// Free-form user preferences.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    #[serde(default)]
    pub prefs: serde_json::Value,
}

impl User {
    /// Placeholder returned when nobody is signed in
    pub fn anonymous() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            email: String::new(),
            email_verification: false,
            prefs: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.id.is_empty()
    }
}

/// Billing details recorded on a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SubscriptionRecord {
    pub created_at: String,
    pub customer_id: String,
    pub subscription_id: String,
    pub end_at: String,
}

/// Application profile document for a user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Profile {
    /// Document id (same as the user id).
    pub id: String,
    pub display_name: String,
    pub image_url: String,
    pub created_at: String,
    #[serde(default)]
    pub subscription: Option<SubscriptionRecord>,
    /// Tier set by the billing webhook (e.g. "premium").
    #[serde(default)]
    pub subscription_tier: Option<String>,
    /// RFC 3339 end of the paid period, if known.
    #[serde(default)]
    pub subscription_end_date: Option<String>,
}

/// User joined with their profile, as consumed by the front-end user query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ExtendedUser {
    #[serde(flatten)]
    pub user: User,
    pub profile: Profile,
}

impl ExtendedUser {
    /// The empty initial user: no id, no profile
    pub fn anonymous() -> Self {
        Self {
            user: User::anonymous(),
            profile: Profile::default(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.user.is_anonymous()
    }
}

/// Subscription fields to write on a profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionUpdate {
    pub tier: String,
    pub end_date: Option<DateTime<Utc>>,
}

/// Subscription state as reported to the front-end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SubscriptionStatus {
    pub user_id: String,
    pub tier: Option<String>,
    pub end_date: Option<String>,
}

impl SubscriptionStatus {
    pub fn from_profile(user_id: &str, profile: Option<&Profile>) -> Self {
        Self {
            user_id: user_id.to_string(),
            tier: profile.and_then(|p| p.subscription_tier.clone()),
            end_date: profile.and_then(|p| p.subscription_end_date.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_extended_user_shape() {
        let user = ExtendedUser::anonymous();
        assert!(!user.is_authenticated());

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], "");
        assert_eq!(json["email_verification"], false);
        assert_eq!(json["profile"]["display_name"], "");
        assert!(json["profile"]["subscription"].is_null());
    }

    #[test]
    fn test_subscription_status_from_profile() {
        let profile = Profile {
            id: "u1".into(),
            subscription_tier: Some(PREMIUM_TIER.into()),
            subscription_end_date: Some("2026-11-01T00:00:00+00:00".into()),
            ..Default::default()
        };
        let status = SubscriptionStatus::from_profile("u1", Some(&profile));
        assert_eq!(status.tier.as_deref(), Some("premium"));

        let empty = SubscriptionStatus::from_profile("u2", None);
        assert!(empty.tier.is_none());
        assert!(empty.end_date.is_none());
    }
}
