// Payment processor webhook handling
// Decision: Verify the raw body before parsing; a bad signature never reaches serde
// Decision: Only checkout completion changes state; every other event is acknowledged
//
// Stripe signs `"{timestamp}.{body}"` with HMAC-SHA256 and sends
// `Stripe-Signature: t=<unix>,v1=<hex>[,v1=<hex>...]`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use crate::user::{SubscriptionUpdate, PREMIUM_TIER};

type HmacSha256 = Hmac<Sha256>;

/// Event type that upgrades a profile.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Default accepted clock skew between the signature timestamp and now, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing signature header")]
    MissingSignature,

    #[error("malformed signature header")]
    MalformedHeader,

    #[error("no matching signature")]
    SignatureMismatch,

    #[error("signature timestamp outside tolerance")]
    Stale,

    #[error("invalid event payload: {0}")]
    InvalidPayload(String),
}

/// Checks that a webhook body really came from the payment processor
pub trait WebhookVerifier: Send + Sync {
    fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<(), WebhookError>;
}

/// Stripe "v1" signature scheme
pub struct StripeSignatureVerifier {
    secret: SecretString,
    tolerance_secs: i64,
}

impl StripeSignatureVerifier {
    pub fn new(secret: SecretString, tolerance_secs: i64) -> Self {
        Self {
            secret,
            tolerance_secs,
        }
    }

    /// Verify against an explicit clock
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), WebhookError> {
        let header = signature
            .filter(|s| !s.trim().is_empty())
            .ok_or(WebhookError::MissingSignature)?;

        let mut timestamp: Option<i64> = None;
        let mut candidates = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => {
                    timestamp = Some(value.parse().map_err(|_| WebhookError::MalformedHeader)?)
                }
                Some(("v1", value)) => candidates.push(value),
                // other schemes (v0) are ignored
                Some(_) => {}
                None => return Err(WebhookError::MalformedHeader),
            }
        }
        let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
        if candidates.is_empty() {
            return Err(WebhookError::MalformedHeader);
        }

        let matched = candidates.iter().any(|candidate| {
            let Ok(expected) = hex::decode(candidate) else {
                return false;
            };
            let mac = self.mac(timestamp, payload);
            // verify_slice compares in constant time
            mac.verify_slice(&expected).is_ok()
        });
        if !matched {
            return Err(WebhookError::SignatureMismatch);
        }

        if self.tolerance_secs > 0 && (now.timestamp() - timestamp).abs() > self.tolerance_secs {
            return Err(WebhookError::Stale);
        }
        Ok(())
    }

    /// Produce a header value for a payload, as the processor would
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        let digest = self.mac(timestamp, payload).finalize().into_bytes();
        format!("t={},v1={}", timestamp, hex::encode(digest))
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac
    }
}

impl WebhookVerifier for StripeSignatureVerifier {
    fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<(), WebhookError> {
        self.verify_at(payload, signature, Utc::now())
    }
}

// ============================================
// Event payloads
// ============================================

/// The parts of a processor event this service reads
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct CheckoutSession {
    #[serde(default)]
    metadata: Option<CheckoutMetadata>,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct CheckoutMetadata {
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
}

impl WebhookEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }

    /// Subscription change implied by this event, if any.
    ///
    /// Only a completed checkout that carries `metadata.userId` yields a change.
    pub fn subscription_change(&self) -> Option<(String, SubscriptionUpdate)> {
        if self.event_type != CHECKOUT_COMPLETED {
            return None;
        }
        let session: CheckoutSession = serde_json::from_value(self.data.object.clone()).ok()?;
        let user_id = session
            .metadata
            .and_then(|m| m.user_id)
            .filter(|id| !id.is_empty())?;
        let end_date = session
            .expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

        Some((
            user_id,
            SubscriptionUpdate {
                tier: PREMIUM_TIER.to_string(),
                end_date,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn verifier() -> StripeSignatureVerifier {
        StripeSignatureVerifier::new(
            SecretString::from("whsec_test".to_string()),
            DEFAULT_TOLERANCE_SECS,
        )
    }

    const BODY: &[u8] = br#"{"type":"checkout.session.completed","data":{"object":{"metadata":{"userId":"u1"},"expires_at":1767225600}}}"#;

    #[test]
    fn test_signed_payload_verifies() {
        let v = verifier();
        let now = Utc::now();
        let header = v.sign(BODY, now.timestamp());
        assert_eq!(v.verify_at(BODY, Some(&header), now), Ok(()));
    }

    #[test]
    fn test_tampered_payload_fails() {
        let v = verifier();
        let now = Utc::now();
        let header = v.sign(BODY, now.timestamp());
        assert_eq!(
            v.verify_at(b"{\"type\":\"other\"}", Some(&header), now),
            Err(WebhookError::SignatureMismatch)
        );
    }

    #[test]
    fn test_other_secret_fails() {
        let now = Utc::now();
        let other = StripeSignatureVerifier::new(SecretString::from("whsec_other".to_string()), 300);
        let header = other.sign(BODY, now.timestamp());
        assert!(verifier().verify_at(BODY, Some(&header), now).is_err());
    }

    #[test]
    fn test_missing_and_malformed_headers() {
        let v = verifier();
        let now = Utc::now();
        assert_eq!(v.verify_at(BODY, None, now), Err(WebhookError::MissingSignature));
        assert_eq!(v.verify_at(BODY, Some(""), now), Err(WebhookError::MissingSignature));
        assert_eq!(
            v.verify_at(BODY, Some("garbage"), now),
            Err(WebhookError::MalformedHeader)
        );
        assert_eq!(
            v.verify_at(BODY, Some("t=123"), now),
            Err(WebhookError::MalformedHeader)
        );
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let v = verifier();
        let now = Utc::now();
        let header = v.sign(BODY, now.timestamp() - 3600);
        assert_eq!(v.verify_at(BODY, Some(&header), now), Err(WebhookError::Stale));
    }

    #[test]
    fn test_checkout_completed_upgrades_user() {
        let event = WebhookEvent::parse(BODY).unwrap();
        let (user_id, update) = event.subscription_change().unwrap();
        assert_eq!(user_id, "u1");
        assert_eq!(update.tier, "premium");
        assert_eq!(
            update.end_date,
            Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_checkout_without_expiry_clears_end_date() {
        let body = br#"{"type":"checkout.session.completed","data":{"object":{"metadata":{"userId":"u1"}}}}"#;
        let (_, update) = WebhookEvent::parse(body)
            .unwrap()
            .subscription_change()
            .unwrap();
        assert!(update.end_date.is_none());
    }

    #[test]
    fn test_events_without_user_or_of_other_types_are_ignored() {
        let no_user = br#"{"type":"checkout.session.completed","data":{"object":{"metadata":{}}}}"#;
        assert!(WebhookEvent::parse(no_user)
            .unwrap()
            .subscription_change()
            .is_none());

        let other = br#"{"type":"invoice.paid","data":{"object":{"metadata":{"userId":"u1"}}}}"#;
        assert!(WebhookEvent::parse(other)
            .unwrap()
            .subscription_change()
            .is_none());
    }
}
