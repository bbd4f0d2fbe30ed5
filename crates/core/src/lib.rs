// Session lifecycle core
//
// This crate holds everything about authentication that does not depend on
// an HTTP framework or a specific identity backend.
//
// Key design decisions:
// - Identity backends plug in through traits (IdentityProvider, ProfileStore)
// - Session validity is always decided by the provider; nothing here trusts a cookie
// - The route guard is a pure function over (path, cookie present)
// - Auth operations return user-safe errors; provider details are only logged
// - An in-memory provider ships in the crate for local development and tests

pub mod auth;
pub mod billing;
pub mod error;
pub mod guard;
pub mod oauth;
pub mod provider;
pub mod response;
pub mod session;
pub mod user;
pub mod validation;

// Telemetry (console logging + optional OTLP export)
pub mod telemetry;

// In-memory provider for dev mode and tests
pub mod memory;

// Re-exports for convenience
pub use auth::{AuthService, AuthSettings, CallbackOutcome, IssuedSession, Lookup};
pub use billing::{StripeSignatureVerifier, WebhookError, WebhookEvent, WebhookVerifier};
pub use error::{AuthError, ProviderError};
pub use guard::GuardDecision;
pub use memory::InMemoryIdentityProvider;
pub use oauth::OAuthProvider;
pub use provider::{IdentityProvider, ProfileStore, ProviderResult};
pub use response::AuthResponse;
pub use session::{Session, SessionView};
pub use user::{ExtendedUser, Profile, SubscriptionStatus, SubscriptionUpdate, User};
