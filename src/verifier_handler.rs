use crate::config::VerifierConfig;
use crate::errors::AppError;
use crate::models::{ErrorPayload, Lead, PipelineMessage, VerificationResult};
use crate::pubsub::{PubSubClient, PushEnvelope};
use crate::services::EmailValidationService;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared state for the email-verification stage.
pub struct VerifierState {
    pub config: VerifierConfig,
    pub validator: EmailValidationService,
    pub publisher: PubSubClient,
}

pub fn router(state: Arc<VerifierState>) -> Router {
    Router::new()
        .route("/", post(verification_webhook))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "email-verifier",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Email-verification webhook.
///
/// Receives a pub/sub push envelope carrying a `Lead`, asks the validation
/// service for a verdict on its email, and republishes: a passing verdict to
/// the next topic as a `create_lead` message, everything else to the error
/// topic. Exactly one publish attempt per decoded delivery; downstream
/// failures never surface to the push subscription.
pub async fn verification_webhook(
    State(state): State<Arc<VerifierState>>,
    Json(envelope): Json<PushEnvelope>,
) -> Result<StatusCode, AppError> {
    let lead: Lead = envelope.decode_payload()?;
    tracing::info!(
        "Received lead uid={} (delivery {})",
        lead.uid,
        envelope.message.id
    );

    match state.validator.verify(&lead.email).await {
        Err(e) => {
            tracing::warn!("Validation request failed for uid={}: {}", lead.uid, e);
            let payload = ErrorPayload::request_error(&lead, e.to_string());
            state
                .publisher
                .publish_or_log(&state.config.error_topic, &payload)
                .await;
        }
        Ok(body) => match serde_json::from_str::<VerificationResult>(&body) {
            Ok(verdict) if verdict.is_valid() => {
                tracing::info!("Email verified for uid={}", lead.uid);
                let message = PipelineMessage::create_lead(lead);
                state
                    .publisher
                    .publish_or_log(&state.config.next_topic, &message)
                    .await;
            }
            Ok(verdict) => {
                tracing::warn!(
                    "Email rejected for uid={}: status={} result={}",
                    lead.uid,
                    verdict.status,
                    verdict.result
                );
                let payload = ErrorPayload::response_error(&lead, body);
                state
                    .publisher
                    .publish_or_log(&state.config.error_topic, &payload)
                    .await;
            }
            Err(e) => {
                tracing::warn!("Unparseable validator response for uid={}: {}", lead.uid, e);
                let payload = ErrorPayload::response_error(&lead, body);
                state
                    .publisher
                    .publish_or_log(&state.config.error_topic, &payload)
                    .await;
            }
        },
    }

    Ok(StatusCode::OK)
}
