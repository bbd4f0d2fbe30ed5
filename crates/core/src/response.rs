// Operation result shape crossing from the session layer to the UI
//
// Always carries `success`; on failure only `error` is set, on success the
// session view and user may be attached. Never persisted.

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::auth::IssuedSession;
use crate::error::AuthError;
use crate::session::SessionView;
use crate::user::User;

/// Outcome of an auth operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AuthResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Human-readable failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthResponse {
    /// Success without payload (logout, recovery)
    pub fn ok() -> Self {
        Self {
            success: true,
            session: None,
            user: None,
            error: None,
        }
    }

    pub fn issued(issued: &IssuedSession) -> Self {
        Self {
            success: true,
            session: Some(issued.session.view()),
            user: Some(issued.user.clone()),
            error: None,
        }
    }

    pub fn failure(err: &AuthError) -> Self {
        Self {
            success: false,
            session: None,
            user: None,
            error: Some(err.message()),
        }
    }
}
