use crate::campaign_client::CampaignClient;
use crate::config::CrmConfig;
use crate::errors::AppError;
use crate::models::{CampaignTriggerRequest, LeadBatch};
use crate::pubsub::PushEnvelope;
use crate::services::ContactStoreService;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared state for the CRM-trigger stage.
pub struct CrmState {
    pub config: CrmConfig,
    pub contacts: ContactStoreService,
    pub campaign: CampaignClient,
}

pub fn router(state: Arc<CrmState>) -> Router {
    Router::new()
        .route("/", post(campaign_webhook))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "crm-trigger",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// CRM-trigger webhook.
///
/// Receives a pub/sub push envelope carrying a `LeadBatch`, resolves each
/// lead's CRM id from the contact store (misses and lookup failures are
/// logged, never fatal), then submits the enriched batch to the campaign
/// trigger. Fire-and-forget: the response is 200 whatever the campaign
/// service said.
pub async fn campaign_webhook(
    State(state): State<Arc<CrmState>>,
    Json(envelope): Json<PushEnvelope>,
) -> Result<StatusCode, AppError> {
    let mut batch: LeadBatch = envelope.decode_payload()?;
    tracing::info!(
        "Received batch of {} lead(s), {} token(s) (delivery {})",
        batch.leads.len(),
        batch.tokens.len(),
        envelope.message.id
    );

    // One lookup per lead, in batch order.
    for lead in batch.leads.iter_mut() {
        match state.contacts.get(&lead.uid).await {
            Ok(Some(contact)) => {
                lead.id = Some(contact.lead_id);
                tracing::debug!("Resolved uid={} to lead id {}", lead.uid, contact.lead_id);
            }
            Ok(None) => {
                tracing::warn!("No stored contact for uid={}", lead.uid);
            }
            Err(e) => {
                tracing::warn!("Contact lookup failed for uid={}: {}", lead.uid, e);
            }
        }
    }

    let request = CampaignTriggerRequest { input: batch };
    match state.campaign.trigger(&request).await {
        Ok(response) if response.success => {
            tracing::info!("Campaign triggered");
        }
        Ok(response) => {
            tracing::error!("Campaign trigger rejected: {:?}", response.errors);
        }
        Err(e) => {
            tracing::error!("Failed to trigger campaign: {}", e);
        }
    }

    Ok(StatusCode::OK)
}
