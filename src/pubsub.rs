use crate::errors::AppError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Push-delivery envelope posted to a stage by the pub/sub subscription.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: String,
}

/// The delivered message: base64-encoded payload bytes plus a delivery id.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PushMessage {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub id: String,
}

impl PushEnvelope {
    /// Decodes the base64 payload into the stage's inbound type.
    ///
    /// Both a broken encoding and a payload that does not match the expected
    /// shape are the sender's fault and map to a 400 response.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let bytes = STANDARD.decode(&self.message.data).map_err(|e| {
            AppError::BadRequest(format!("Invalid message data encoding: {}", e))
        })?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::BadRequest(format!("Invalid message payload: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    #[serde(rename = "messageIds", default)]
    message_ids: Vec<String>,
}

/// Client for publishing messages to named pub/sub topics over the REST API.
#[derive(Clone)]
pub struct PubSubClient {
    client: reqwest::Client,
    base_url: String,
    project: String,
}

impl PubSubClient {
    pub fn new(base_url: String, project: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create pub/sub client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            project,
        })
    }

    /// Publishes one JSON message to a topic and returns the delivery id.
    pub async fn publish<T: Serialize>(&self, topic: &str, msg: &T) -> Result<String, AppError> {
        let payload = serde_json::to_vec(msg)?;
        let url = format!(
            "{}/v1/projects/{}/topics/{}:publish",
            self.base_url, self.project, topic
        );

        let body = serde_json::json!({
            "messages": [{"data": STANDARD.encode(&payload)}]
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Publish request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Publish to {} returned {}: {}",
                topic, status, error_text
            )));
        }

        let ack: PublishResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse publish response: {}", e))
        })?;

        let id = ack.message_ids.into_iter().next().ok_or_else(|| {
            AppError::ExternalApiError("Publish response missing message id".to_string())
        })?;

        tracing::info!("Published a message to {}; msg ID: {}", topic, id);
        Ok(id)
    }

    /// Publishes and logs any failure instead of propagating it.
    ///
    /// Webhook responses must not depend on publish success.
    pub async fn publish_or_log<T: Serialize>(&self, topic: &str, msg: &T) {
        if let Err(e) = self.publish(topic, msg).await {
            tracing::error!("Failed to publish to {}: {}", topic, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Lead;

    fn envelope_with(data: &str) -> PushEnvelope {
        PushEnvelope {
            message: PushMessage {
                data: data.to_string(),
                id: "m-1".to_string(),
            },
            subscription: "projects/test/subscriptions/leads".to_string(),
        }
    }

    #[test]
    fn test_decode_payload_roundtrip() {
        let payload = r#"{"uid":"abc","email":"a@b.com","first_name":"A","last_name":"B"}"#;
        let envelope = envelope_with(&STANDARD.encode(payload));

        let lead: Lead = envelope.decode_payload().unwrap();
        assert_eq!(lead.uid, "abc");
        assert_eq!(lead.email, "a@b.com");
    }

    #[test]
    fn test_decode_payload_rejects_bad_base64() {
        let envelope = envelope_with("not-base64!!");
        let result = envelope.decode_payload::<Lead>();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_decode_payload_rejects_wrong_shape() {
        let envelope = envelope_with(&STANDARD.encode(r#"{"foo":1}"#));
        let result = envelope.decode_payload::<Lead>();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_envelope_parses_push_format() {
        let json = r#"
        {
            "message": {"data": "eyJ1aWQiOiJhYmMifQ==", "id": "123"},
            "subscription": "projects/test/subscriptions/leads"
        }
        "#;
        let envelope: PushEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.message.id, "123");
        assert_eq!(envelope.subscription, "projects/test/subscriptions/leads");
    }
}
