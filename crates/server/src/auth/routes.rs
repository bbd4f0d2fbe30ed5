// Authentication HTTP routes
// Decision: Use /v1/auth/* prefix for all auth endpoints (consistent with other API routes)
// Decision: Responses carry an AuthResponse; the secret only ever travels in cookies

use atelier_core::{
    auth::secret_value, AuthError, AuthResponse, IssuedSession, Lookup, OAuthProvider, Session,
    SessionView, User,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::cookies::SessionCookies;
use super::middleware::AuthFailure;
use crate::state::AppState;

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Register request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Password recovery request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecoveryRequest {
    #[serde(default)]
    pub email: String,
    /// Page the recovery email links to (default: {APP_URL}/reset-password)
    #[serde(default)]
    pub url: Option<String>,
}

/// Auth configuration response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthConfigResponse {
    pub oauth_providers: Vec<OAuthProvider>,
    pub signup_enabled: bool,
}

/// Authentication status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// OAuth consent URL for a provider
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OAuthRedirectResponse {
    pub success: bool,
    pub redirect_url: String,
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/config", get(get_auth_config))
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/recover", post(recover_password))
        .route("/v1/auth/logout", post(logout))
        .route("/v1/auth/session", get(get_session))
        .route("/v1/auth/status", get(get_status))
        .route(
            "/v1/auth/oauth/:provider",
            get(oauth_redirect).post(begin_oauth),
        )
}

/// Write session cookies for a freshly issued session.
///
/// If the cookies cannot be built the session is deleted again, so a failure
/// never leaves a provider session without a client holding it.
pub(crate) async fn persist_session(
    state: &AppState,
    jar: CookieJar,
    session: &Session,
) -> Result<CookieJar, AuthError> {
    match state.cookies.set_session(jar, session) {
        Ok(jar) => Ok(jar),
        Err(e) => {
            tracing::error!(session_id = %session.id, error = %e, "Session expiry not representable as cookie expiry");
            state
                .auth
                .terminate(Some(&session.id), Some(secret_value(&session.secret)))
                .await;
            Err(AuthError::Unexpected)
        }
    }
}

async fn issued_response(
    state: &AppState,
    jar: CookieJar,
    issued: IssuedSession,
) -> Result<(CookieJar, Json<AuthResponse>), AuthFailure> {
    let jar = persist_session(state, jar, &issued.session).await?;
    Ok((jar, Json(AuthResponse::issued(&issued))))
}

/// GET /v1/auth/config - Get authentication configuration
#[utoipa::path(
    get,
    path = "/v1/auth/config",
    responses((status = 200, description = "Enabled sign-in methods", body = AuthConfigResponse)),
    tag = "auth"
)]
pub async fn get_auth_config(State(state): State<AppState>) -> Json<AuthConfigResponse> {
    let settings = state.auth.settings();
    Json(AuthConfigResponse {
        oauth_providers: settings.oauth_providers.clone(),
        signup_enabled: settings.signup_enabled,
    })
}

/// POST /v1/auth/login - Login with email and password
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued; cookies set", body = AuthResponse),
        (status = 400, description = "Missing fields", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AuthResponse),
        (status = 500, description = "Unexpected error", body = AuthResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AuthFailure> {
    let issued = state.auth.login(&req.email, &req.password).await?;
    issued_response(&state, jar, issued).await
}

/// POST /v1/auth/register - Create an account and sign in
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; cookies set", body = AuthResponse),
        (status = 400, description = "Invalid input or signup disabled", body = AuthResponse),
        (status = 401, description = "Provider refused the account", body = AuthResponse),
        (status = 500, description = "Unexpected error", body = AuthResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AuthFailure> {
    let issued = state
        .auth
        .register(&req.email, &req.password, &req.name)
        .await?;
    let (jar, body) = issued_response(&state, jar, issued).await?;
    Ok((StatusCode::CREATED, jar, body))
}

/// POST /v1/auth/recover - Send a password recovery email
#[utoipa::path(
    post,
    path = "/v1/auth/recover",
    request_body = RecoveryRequest,
    responses(
        (status = 200, description = "Recovery email sent", body = AuthResponse),
        (status = 400, description = "Missing or invalid email", body = AuthResponse),
        (status = 401, description = "Provider refused the request", body = AuthResponse)
    ),
    tag = "auth"
)]
pub async fn recover_password(
    State(state): State<AppState>,
    Json(req): Json<RecoveryRequest>,
) -> Result<Json<AuthResponse>, AuthFailure> {
    state
        .auth
        .recover_password(&req.email, req.url.as_deref())
        .await?;
    Ok(Json(AuthResponse::ok()))
}

/// POST /v1/auth/logout - Delete the current session and clear cookies
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses((status = 200, description = "Cookies cleared", body = AuthResponse)),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    cookies: SessionCookies,
    jar: CookieJar,
) -> (CookieJar, Json<AuthResponse>) {
    state
        .auth
        .terminate(cookies.session_id.as_deref(), cookies.secret.as_deref())
        .await;
    (state.cookies.clear_session(jar), Json(AuthResponse::ok()))
}

/// GET /v1/auth/session - Current session (without its secret)
#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Current session", body = SessionView),
        (status = 204, description = "No valid session")
    ),
    tag = "auth"
)]
pub async fn get_session(State(state): State<AppState>, cookies: SessionCookies) -> Response {
    match state.auth.current_session(cookies.secret.as_deref()).await {
        Lookup::Found(session) => Json(session.view()).into_response(),
        Lookup::NoSession | Lookup::Invalid => StatusCode::NO_CONTENT.into_response(),
    }
}

/// GET /v1/auth/status - Whether the request carries a valid session
#[utoipa::path(
    get,
    path = "/v1/auth/status",
    responses((status = 200, description = "Authentication status", body = AuthStatusResponse)),
    tag = "auth"
)]
pub async fn get_status(
    State(state): State<AppState>,
    cookies: SessionCookies,
) -> Json<AuthStatusResponse> {
    let user = state
        .auth
        .current_user(cookies.secret.as_deref())
        .await
        .found();
    Json(AuthStatusResponse {
        authenticated: user.is_some(),
        user,
    })
}

fn consent_url(state: &AppState, provider: &str) -> Result<String, AuthError> {
    let provider = OAuthProvider::from_str(provider)
        .ok_or_else(|| AuthError::validation("Unknown OAuth provider"))?;
    state.auth.begin_oauth(provider)
}

/// POST /v1/auth/oauth/:provider - Build the provider consent URL
#[utoipa::path(
    post,
    path = "/v1/auth/oauth/{provider}",
    params(("provider" = String, Path, description = "OAuth provider (google, github)")),
    responses(
        (status = 200, description = "Consent URL", body = OAuthRedirectResponse),
        (status = 400, description = "Unknown or disabled provider", body = AuthResponse)
    ),
    tag = "auth"
)]
pub async fn begin_oauth(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Json<OAuthRedirectResponse>, AuthFailure> {
    let redirect_url = consent_url(&state, &provider)?;
    Ok(Json(OAuthRedirectResponse {
        success: true,
        redirect_url,
    }))
}

/// GET /v1/auth/oauth/:provider - Redirect to the provider consent screen
#[utoipa::path(
    get,
    path = "/v1/auth/oauth/{provider}",
    params(("provider" = String, Path, description = "OAuth provider (google, github)")),
    responses(
        (status = 303, description = "Redirect to the provider"),
        (status = 400, description = "Unknown or disabled provider", body = AuthResponse)
    ),
    tag = "auth"
)]
pub async fn oauth_redirect(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Redirect, AuthFailure> {
    let url = consent_url(&state, &provider)?;
    Ok(Redirect::to(&url))
}
