// Current-user routes
// Decision: /v1/users/me never fails on a missing session; it returns the empty initial user
// Decision: Freshness is left to the client (private, 5 minutes)

use atelier_core::{ExtendedUser, Lookup, Profile, SubscriptionStatus};
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::common::ErrorResponse;
use crate::auth::{CurrentUser, SessionCookies};
use crate::state::AppState;

/// Cache policy for per-user reads.
pub const USER_CACHE_CONTROL: &str = "private, max-age=300";

/// Create users routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/users/me", get(get_me))
        .route("/v1/users/me/subscription", get(get_subscription))
}

/// GET /v1/users/me - Current user joined with their profile
///
/// Returns the empty initial user (empty id) when there is no valid session.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    responses((status = 200, description = "Current user and profile", body = ExtendedUser)),
    tag = "users"
)]
pub async fn get_me(State(state): State<AppState>, cookies: SessionCookies) -> impl IntoResponse {
    let user = match state.auth.current_user(cookies.secret.as_deref()).await {
        Lookup::Found(user) => {
            let profile = match state.profiles.get_profile(&user.id).await {
                Ok(Some(profile)) => profile,
                Ok(None) => Profile {
                    id: user.id.clone(),
                    ..Default::default()
                },
                Err(e) => {
                    tracing::warn!(user_id = %user.id, error = %e, "Failed to load profile");
                    Profile {
                        id: user.id.clone(),
                        ..Default::default()
                    }
                }
            };
            ExtendedUser { user, profile }
        }
        Lookup::NoSession | Lookup::Invalid => ExtendedUser::anonymous(),
    };

    (
        [(
            header::CACHE_CONTROL,
            HeaderValue::from_static(USER_CACHE_CONTROL),
        )],
        Json(user),
    )
}

/// GET /v1/users/me/subscription - Subscription tier of the current user
#[utoipa::path(
    get,
    path = "/v1/users/me/subscription",
    responses(
        (status = 200, description = "Subscription status", body = SubscriptionStatus),
        (status = 401, description = "Not authenticated", body = atelier_core::AuthResponse),
        (status = 500, description = "Profile store unavailable", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_subscription(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SubscriptionStatus>, (StatusCode, Json<ErrorResponse>)> {
    let profile = state.profiles.get_profile(&user.id).await.map_err(|e| {
        tracing::error!(user_id = %user.id, error = %e, "Failed to load profile");
        ErrorResponse::new("Failed to load subscription").into_response(StatusCode::INTERNAL_SERVER_ERROR)
    })?;

    Ok(Json(SubscriptionStatus::from_profile(
        &user.id,
        profile.as_ref(),
    )))
}
