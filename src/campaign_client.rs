use crate::config::CrmConfig;
use crate::errors::AppError;
use crate::models::{CampaignTriggerRequest, CampaignTriggerResponse};
use std::time::Duration;

/// Client for the marketing-automation campaign-trigger endpoint.
#[derive(Clone)]
pub struct CampaignClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    campaign_id: String,
}

impl CampaignClient {
    pub fn new(config: &CrmConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create campaign client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.campaign_base_url.clone(),
            token: config.campaign_token.clone(),
            campaign_id: config.campaign_id.clone(),
        })
    }

    /// Submits an enriched lead batch to the configured campaign.
    ///
    /// A non-2xx status and an unreadable body are both transport-level
    /// failures; a parseable body with `success: false` is reported back to
    /// the caller through the response itself.
    pub async fn trigger(
        &self,
        request: &CampaignTriggerRequest,
    ) -> Result<CampaignTriggerResponse, AppError> {
        let url = format!(
            "{}/rest/v1/campaigns/{}/trigger.json",
            self.base_url, self.campaign_id
        );
        tracing::info!(
            "Triggering campaign {} with {} lead(s)",
            self.campaign_id,
            request.input.leads.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("Campaign request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Campaign trigger returned {}: {}",
                status, error_text
            )));
        }

        let result: CampaignTriggerResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse campaign response: {}", e))
        })?;

        Ok(result)
    }
}
