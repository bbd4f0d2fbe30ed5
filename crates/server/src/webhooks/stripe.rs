// Payment processor webhook
// Decision: The signature is checked against the raw body before anything is parsed
// Decision: A failed profile update answers 500 so the processor retries delivery

use atelier_core::WebhookEvent;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::ErrorResponse;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Acknowledgement returned for every verified event
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}

/// Create webhook routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/webhooks/stripe", post(handle_stripe_webhook))
}

/// POST /api/webhooks/stripe - Receive a signed payment event
#[utoipa::path(
    post,
    path = "/api/webhooks/stripe",
    request_body(content = String, description = "Raw event JSON as signed by the processor"),
    params(("Stripe-Signature" = String, Header, description = "t=<unix>,v1=<hex hmac>")),
    responses(
        (status = 200, description = "Event accepted", body = WebhookAck),
        (status = 400, description = "Invalid signature or payload"),
        (status = 500, description = "Profile update failed", body = ErrorResponse),
        (status = 503, description = "Webhook secret not configured", body = ErrorResponse)
    ),
    tag = "webhooks"
)]
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(verifier) = state.webhook.as_ref() else {
        tracing::error!("Payment webhook received but STRIPE_WEBHOOK_SECRET is not set");
        return ErrorResponse::new("Webhook not configured")
            .into_response(StatusCode::SERVICE_UNAVAILABLE)
            .into_response();
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = verifier.verify(&body, signature) {
        tracing::warn!(error = %e, "Webhook signature verification failed");
        return (StatusCode::BAD_REQUEST, "Invalid signature").into_response();
    }

    let event = match WebhookEvent::parse(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Webhook payload rejected");
            return (StatusCode::BAD_REQUEST, "Invalid payload").into_response();
        }
    };

    if let Some((user_id, update)) = event.subscription_change() {
        if let Err(e) = state.profiles.update_subscription(&user_id, &update).await {
            tracing::error!(user_id = %user_id, error = %e, "Failed to record subscription");
            return ErrorResponse::new("Failed to update subscription")
                .into_response(StatusCode::INTERNAL_SERVER_ERROR)
                .into_response();
        }
        tracing::info!(user_id = %user_id, tier = %update.tier, "Subscription activated");
    } else {
        tracing::debug!(event_type = %event.event_type, "Webhook event acknowledged without action");
    }

    Json(WebhookAck { received: true }).into_response()
}
