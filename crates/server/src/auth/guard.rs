// Route guard middleware
// Decision: Runs on every request before routing; only cookie presence is inspected

use atelier_core::guard::{self, GuardDecision};
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use super::cookies::AUTH_SESSION_COOKIE;

/// Redirect away from protected or auth-only pages based on the `auth_session` cookie
pub async fn route_guard(jar: CookieJar, request: Request, next: Next) -> Response {
    let has_session = guard::session_present(jar.get(AUTH_SESSION_COOKIE).map(|c| c.value()));

    match guard::evaluate(request.uri().path(), has_session) {
        GuardDecision::Proceed => next.run(request).await,
        GuardDecision::Redirect(to) => {
            tracing::debug!(path = %request.uri().path(), to = %to, "Route guard redirect");
            Redirect::temporary(to).into_response()
        }
    }
}
