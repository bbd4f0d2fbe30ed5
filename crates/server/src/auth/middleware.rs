// Authentication extractors and error responses
// Decision: Identity always comes from a provider round trip; cookies alone never authenticate
// Decision: Failures render as AuthResponse so every auth endpoint has one body shape

use atelier_core::{AuthError, AuthResponse, Lookup, User};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;

use super::cookies::SessionCookies;
use crate::state::AppState;

/// Auth operation failure rendered as `{success:false, error}`
#[derive(Debug, Clone)]
pub struct AuthFailure(pub AuthError);

impl AuthFailure {
    pub fn unauthorized() -> Self {
        Self(AuthError::Rejected("Authentication required".to_string()))
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Rejected(_) => StatusCode::UNAUTHORIZED,
            AuthError::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for AuthFailure {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AuthFailure {
    fn into_response(self) -> Response {
        (self.status(), Json(AuthResponse::failure(&self.0))).into_response()
    }
}

/// Session cookies of the current request. Never fails.
#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionCookies
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(SessionCookies::from_jar(&jar))
    }
}

/// Authenticated user, confirmed by the identity provider.
/// Required - returns 401 if there is no valid session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthFailure;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let cookies = SessionCookies::from_jar(&CookieJar::from_headers(&parts.headers));

        match app.auth.current_user(cookies.secret.as_deref()).await {
            Lookup::Found(user) => Ok(CurrentUser(user)),
            Lookup::NoSession | Lookup::Invalid => Err(AuthFailure::unauthorized()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_status_mapping() {
        assert_eq!(
            AuthFailure(AuthError::validation("x")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthFailure(AuthError::Rejected("x".into())).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthFailure(AuthError::Unexpected).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
