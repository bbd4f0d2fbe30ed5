// OAuth callback: the provider redirects here with `userId` and `secret`
// Decision: Missing parameters fail closed without contacting the provider
// Decision: Provider-side session failures redirect home (logged), not to an error page

use atelier_core::CallbackOutcome;
use axum::{
    extract::{Query, State},
    response::Redirect,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use utoipa::IntoParams;

use super::routes::persist_session;
use crate::state::AppState;

pub const INVALID_CALLBACK_REDIRECT: &str = "/login?error=invalid_callback";
pub const AUTH_FAILED_REDIRECT: &str = "/login?error=auth_failed";
pub const SUCCESS_REDIRECT: &str = "/";

/// Query parameters appended by the provider
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OAuthCallbackQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub secret: Option<String>,
}

/// GET /oauth - Complete an OAuth sign-in
#[utoipa::path(
    get,
    path = "/oauth",
    params(OAuthCallbackQuery),
    responses(
        (status = 307, description = "Redirect to / on success, or to /login with an error code")
    ),
    tag = "auth"
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    query: Option<Query<OAuthCallbackQuery>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let has_params = [&query.user_id, &query.secret]
        .iter()
        .all(|v| v.as_deref().is_some_and(|v| !v.is_empty()));

    // Incomplete callbacks fall through to InvalidCallback below
    if has_params && state.auth.settings().oauth_providers.is_empty() {
        tracing::warn!("OAuth callback received while OAuth is disabled");
        return (jar, Redirect::temporary(AUTH_FAILED_REDIRECT));
    }

    match state
        .auth
        .complete_oauth(query.user_id.as_deref(), query.secret.as_deref())
        .await
    {
        CallbackOutcome::InvalidCallback => (jar, Redirect::temporary(INVALID_CALLBACK_REDIRECT)),
        CallbackOutcome::Established(session) => {
            match persist_session(&state, jar.clone(), &session).await {
                Ok(jar) => (jar, Redirect::temporary(SUCCESS_REDIRECT)),
                Err(_) => (jar, Redirect::temporary(AUTH_FAILED_REDIRECT)),
            }
        }
        CallbackOutcome::Degraded => (jar, Redirect::temporary(SUCCESS_REDIRECT)),
    }
}
