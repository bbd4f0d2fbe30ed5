// Atelier API server
// Decision: Identity backend is selected once at start-up and shared behind Arc
// Decision: Telemetry is initialised before configuration so config warnings are logged

use anyhow::{Context, Result};
use atelier_appwrite::{AppwriteClient, AppwriteConfig};
use atelier_core::telemetry::{init_telemetry, TelemetryConfig};
use atelier_core::{
    AuthService, IdentityProvider, InMemoryIdentityProvider, ProfileStore,
    StripeSignatureVerifier, WebhookVerifier,
};
use atelier_server::{auth::CookiePolicy, build_app, AppState, IdentityBackend, ServerConfig};
use axum::http::{header, HeaderValue, Method};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Provider handles for both traits, backed by the same instance
fn build_providers(
    config: &ServerConfig,
) -> Result<(Arc<dyn IdentityProvider>, Arc<dyn ProfileStore>)> {
    match config.identity_backend {
        IdentityBackend::Appwrite => {
            let appwrite_config =
                AppwriteConfig::from_env().context("Invalid Appwrite configuration")?;
            tracing::info!(
                endpoint = %appwrite_config.endpoint,
                project = %appwrite_config.project_id,
                "Using Appwrite identity backend"
            );
            let client = Arc::new(
                AppwriteClient::new(appwrite_config).context("Failed to create Appwrite client")?,
            );
            Ok((client.clone(), client))
        }
        IdentityBackend::Memory => {
            if config.is_production() {
                tracing::warn!("In-memory identity backend in production: accounts are lost on restart");
            } else {
                tracing::info!("Using in-memory identity backend");
            }
            let provider = Arc::new(InMemoryIdentityProvider::new());
            Ok((provider.clone(), provider))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();

    // Initialize telemetry with OpenTelemetry support
    // Configure via environment variables:
    // - OTEL_SERVICE_NAME: Service name (default: "atelier-server")
    // - OTEL_EXPORTER_OTLP_ENDPOINT: OTLP endpoint (e.g., "http://localhost:4317")
    // - RUST_LOG: Log filter (default: "atelier_server=debug,atelier_core=info,tower_http=debug")
    let mut telemetry_config = TelemetryConfig::from_env().with_version(env!("CARGO_PKG_VERSION"));
    if telemetry_config.service_name == "atelier" {
        telemetry_config.service_name = "atelier-server".to_string();
    }
    if telemetry_config.log_filter.is_none() {
        telemetry_config.log_filter =
            Some("atelier_server=debug,atelier_core=info,tower_http=debug".to_string());
    }

    // Keep the guard alive for the lifetime of the application
    let _telemetry_guard = init_telemetry(telemetry_config);

    tracing::info!("atelier-server starting...");

    let config = ServerConfig::from_env();
    tracing::info!(
        app_url = %config.app_url,
        environment = %config.environment,
        oauth_providers = ?config.oauth_providers,
        signup_enabled = !config.disable_signup,
        "Server configured"
    );

    let (identity, profiles) = build_providers(&config)?;

    let webhook: Option<Arc<dyn WebhookVerifier>> = match &config.stripe_webhook_secret {
        Some(secret) => Some(Arc::new(StripeSignatureVerifier::new(
            secret.clone(),
            config.stripe_webhook_tolerance,
        ))),
        None => {
            tracing::warn!("STRIPE_WEBHOOK_SECRET not set; payment webhook disabled");
            None
        }
    };

    let state = AppState::new(
        AuthService::new(identity, config.auth_settings()),
        profiles,
        CookiePolicy::new(config.is_production()),
        webhook,
    );

    let app = build_app(state, config.static_dir.clone());

    // Only needed when the front-end is served from a different origin
    let cors_origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let app = if !cors_origins.is_empty() {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    header::ORIGIN,
                    header::CACHE_CONTROL,
                ])
                .allow_credentials(true),
        )
    } else {
        tracing::info!("CORS not configured (same-origin requests only)");
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    tracing::info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
