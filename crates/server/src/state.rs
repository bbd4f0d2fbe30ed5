// Shared application state
// Decision: One provider handle per process; handlers only clone Arcs

use atelier_core::{AuthService, ProfileStore, WebhookVerifier};
use std::sync::Arc;

use crate::auth::cookies::CookiePolicy;

/// State shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub profiles: Arc<dyn ProfileStore>,
    pub cookies: CookiePolicy,
    /// `None` when no webhook secret is configured
    pub webhook: Option<Arc<dyn WebhookVerifier>>,
}

impl AppState {
    pub fn new(
        auth: AuthService,
        profiles: Arc<dyn ProfileStore>,
        cookies: CookiePolicy,
        webhook: Option<Arc<dyn WebhookVerifier>>,
    ) -> Self {
        Self {
            auth: Arc::new(auth),
            profiles,
            cookies,
            webhook,
        }
    }
}
