use crate::config::{CrmConfig, VerifierConfig};
use crate::errors::AppError;
use crate::models::StoredContact;
use reqwest::Client;

/// Client for the third-party email-validation API.
///
/// The verdict body is returned raw; the caller decides how to route an
/// answer that does not parse.
#[derive(Clone)]
pub struct EmailValidationService {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl EmailValidationService {
    pub fn new(config: &VerifierConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.validation_url.clone(),
            api_key: config.validation_key.clone(),
        }
    }

    /// Looks up a verification verdict for an email address.
    ///
    /// Only a transport failure is an `Err`; any HTTP answer, whatever its
    /// status or body, counts as a response from the validator.
    pub async fn verify(&self, email: &str) -> Result<String, AppError> {
        // Build URL with proper parameter encoding
        let url = reqwest::Url::parse_with_params(
            &self.endpoint,
            &[("key", self.api_key.as_str()), ("email", email)],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::info!("Verifying email address: {}", email);
        // Redact key from logs to prevent credential exposure
        tracing::debug!(
            "Validation URL: {}?key=[REDACTED]&email={}",
            self.endpoint,
            email
        );

        let response = self.client.get(url).send().await.map_err(|e| {
            AppError::ExternalApiError(format!("Validation request failed: {}", e))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to read validation response: {}", e))
        })?;

        tracing::debug!("Validator answered {} ({} bytes)", status, body.len());
        Ok(body)
    }
}

/// Read-only client for the contact key-value store.
#[derive(Clone)]
pub struct ContactStoreService {
    client: Client,
    base_url: String,
}

impl ContactStoreService {
    pub fn new(config: &CrmConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.contact_store_url.clone(),
        }
    }

    /// Fetches the stored contact for a `uid`, `None` when the store has no
    /// record under that key.
    pub async fn get(&self, uid: &str) -> Result<Option<StoredContact>, AppError> {
        let url = format!("{}/contacts/{}", self.base_url, uid);

        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::ExternalApiError(format!("Contact store request failed: {}", e))
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Contact store returned {}: {}",
                status, error_text
            )));
        }

        let contact: StoredContact = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse contact record: {}", e))
        })?;

        Ok(Some(contact))
    }
}
