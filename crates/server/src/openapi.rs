// OpenAPI specification generation
//
// Served by Swagger UI at /swagger-ui; the raw document is at /api-doc/openapi.json.

use crate::{api, auth, webhooks};
use atelier_core::{
    user::SubscriptionRecord, AuthResponse, ExtendedUser, OAuthProvider, Profile, SessionView,
    SubscriptionStatus, User,
};
use utoipa::OpenApi;

/// OpenAPI documentation for the Atelier API
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::routes::get_auth_config,
        auth::routes::login,
        auth::routes::register,
        auth::routes::recover_password,
        auth::routes::logout,
        auth::routes::get_session,
        auth::routes::get_status,
        auth::routes::begin_oauth,
        auth::routes::oauth_redirect,
        auth::callback::oauth_callback,
        api::users::get_me,
        api::users::get_subscription,
        webhooks::stripe::handle_stripe_webhook,
    ),
    components(
        schemas(
            AuthResponse, SessionView, User, Profile, SubscriptionRecord, ExtendedUser,
            SubscriptionStatus, OAuthProvider,
            auth::routes::LoginRequest, auth::routes::RegisterRequest,
            auth::routes::RecoveryRequest, auth::routes::AuthConfigResponse,
            auth::routes::AuthStatusResponse, auth::routes::OAuthRedirectResponse,
            api::ErrorResponse,
            webhooks::stripe::WebhookAck,
        )
    ),
    tags(
        (name = "auth", description = "Sessions, sign-in and OAuth"),
        (name = "users", description = "Current user and profile"),
        (name = "webhooks", description = "Payment processor callbacks")
    ),
    info(
        title = "Atelier API",
        version = "0.1.0",
        description = "Account and session layer in front of the identity provider",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_auth_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/v1/auth/login",
            "/v1/auth/logout",
            "/v1/auth/oauth/{provider}",
            "/oauth",
            "/v1/users/me",
            "/api/webhooks/stripe",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected}"
            );
        }
    }
}
