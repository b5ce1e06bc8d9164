use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============ Pipeline Payloads ============

/// A prospective contact flowing through the validation pipeline.
///
/// `uid` is the join key correlating a lead across the validation stage,
/// the contact store, and the CRM; it is carried verbatim through every hop.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Lead {
    /// Stable unique identifier.
    pub uid: String,
    /// Email address to verify.
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Verdict returned by the email-validation API.
///
/// Only `status == "success"` together with `result == "valid"` counts as a
/// pass; every other combination routes to the error topic.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationResult {
    pub status: String,
    pub result: String,
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        self.status == "success" && self.result == "valid"
    }
}

/// Message published to the next topic when a lead's email verifies.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineMessage {
    pub msg: Lead,
    pub typ: String,
}

impl PipelineMessage {
    pub fn create_lead(lead: Lead) -> Self {
        Self {
            msg: lead,
            typ: "create_lead".to_string(),
        }
    }
}

/// Structured error record published to the error topic.
///
/// `error` carries the transport error text for request failures; `response`
/// carries the raw validator body for rejected or unparseable responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub uid: String,
    pub email: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl ErrorPayload {
    /// The validation service could not be reached at all.
    pub fn request_error(lead: &Lead, error: impl Into<String>) -> Self {
        Self {
            uid: lead.uid.clone(),
            email: lead.email.clone(),
            error_type: "request_error".to_string(),
            error: Some(error.into()),
            response: None,
        }
    }

    /// The validation service answered, but not with a passing verdict.
    pub fn response_error(lead: &Lead, raw_body: impl Into<String>) -> Self {
        Self {
            uid: lead.uid.clone(),
            email: lead.email.clone(),
            error_type: "response_error".to_string(),
            error: None,
            response: Some(raw_body.into()),
        }
    }
}

// ============ CRM Trigger Payloads ============

/// Batch of leads plus campaign tokens, as delivered to the CRM stage.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LeadBatch {
    #[serde(default)]
    pub leads: Vec<LeadRef>,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

/// Reference to a lead awaiting CRM-id enrichment.
///
/// `id` stays absent (and off the wire) when the contact store has no record
/// for the `uid`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LeadRef {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

/// Arbitrary key/value token forwarded untouched to the campaign trigger.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Token {
    pub name: String,
    pub value: String,
}

/// Contact record held in the external key-value store, keyed by `uid`.
/// These stages only ever read it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoredContact {
    pub lead_id: i64,
    pub uid: String,
    pub email: String,
    pub is_subscribed: bool,
}

/// Request envelope for the campaign-trigger endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignTriggerRequest {
    pub input: LeadBatch,
}

/// Campaign-trigger outcome; `errors` is populated when `success` is false.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignTriggerResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<Value>,
}
