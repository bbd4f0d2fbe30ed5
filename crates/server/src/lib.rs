// Atelier server library
// Decision: Router construction lives here so integration tests drive the real app

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::path::PathBuf;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Public API routes
pub mod api;

// Authentication: cookies, extractors, guard, routes
pub mod auth;

// Configuration
pub mod config;

// OpenAPI spec generation
pub mod openapi;

// Shared state
pub mod state;

// Inbound webhooks
pub mod webhooks;

pub use config::{IdentityBackend, ServerConfig};
pub use state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the application router.
///
/// The route guard wraps everything, including the static front-end fallback,
/// so it runs before any handler or page.
pub fn build_app(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/oauth", get(auth::callback::oauth_callback))
        .merge(auth::routes::routes())
        .merge(api::users::routes())
        .merge(webhooks::stripe::routes());

    if let Some(dir) = static_dir {
        tracing::info!(dir = %dir.display(), "Serving static front-end");
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", openapi::ApiDoc::openapi()))
        .layer(middleware::from_fn(auth::route_guard))
}
