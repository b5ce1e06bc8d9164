/// Integration tests for the CRM-trigger webhook with mocked collaborators:
/// the contact key-value store and the campaign-trigger endpoint.
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use lead_pipeline::campaign_client::CampaignClient;
use lead_pipeline::config::CrmConfig;
use lead_pipeline::crm_handler::{self, CrmState};
use lead_pipeline::services::ContactStoreService;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TRIGGER_PATH: &str = "/rest/v1/campaigns/1422/trigger.json";

/// Helper to build stage state with both collaborators on one mock server.
fn test_state(mock_uri: &str) -> Arc<CrmState> {
    let config = CrmConfig {
        port: 8080,
        contact_store_url: mock_uri.to_string(),
        campaign_base_url: mock_uri.to_string(),
        campaign_token: "test-token".to_string(),
        campaign_id: "1422".to_string(),
    };

    Arc::new(CrmState {
        contacts: ContactStoreService::new(&config),
        campaign: CampaignClient::new(&config).unwrap(),
        config,
    })
}

fn push_envelope(data: &str) -> serde_json::Value {
    json!({
        "message": {"data": data, "id": "m-9"},
        "subscription": "projects/test-project/subscriptions/crm-push"
    })
}

fn batch_envelope(batch: serde_json::Value) -> serde_json::Value {
    push_envelope(&STANDARD.encode(batch.to_string()))
}

async fn post_webhook(state: Arc<CrmState>, body: serde_json::Value) -> StatusCode {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = crm_handler::router(state).oneshot(request).await.unwrap();
    response.status()
}

fn mock_contact(uid: &str, lead_id: i64) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/contacts/{}", uid)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lead_id": lead_id,
            "uid": uid,
            "email": format!("{}@example.com", uid),
            "is_subscribed": true
        })))
}

async fn campaign_request_body(mock_server: &MockServer) -> serde_json::Value {
    let requests = mock_server.received_requests().await.unwrap();
    let trigger = requests
        .iter()
        .find(|r| r.url.path() == TRIGGER_PATH)
        .expect("expected a campaign trigger request");
    serde_json::from_slice(&trigger.body).unwrap()
}

#[tokio::test]
async fn test_known_uid_is_enriched_with_stored_lead_id() {
    let mock_server = MockServer::start().await;

    mock_contact("abc", 42).mount(&mock_server).await;
    Mock::given(method("POST"))
        .and(path(TRIGGER_PATH))
        .and(header_matcher("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let envelope = batch_envelope(json!({
        "leads": [{"uid": "abc"}],
        "tokens": [{"name": "{{my.source}}", "value": "newsletter"}]
    }));

    let status = post_webhook(test_state(&mock_server.uri()), envelope).await;
    assert_eq!(status, StatusCode::OK);

    let body = campaign_request_body(&mock_server).await;
    assert_eq!(
        body,
        json!({
            "input": {
                "leads": [{"uid": "abc", "id": 42}],
                "tokens": [{"name": "{{my.source}}", "value": "newsletter"}]
            }
        })
    );
}

#[tokio::test]
async fn test_unknown_uid_keeps_id_absent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contacts/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(TRIGGER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let envelope = batch_envelope(json!({"leads": [{"uid": "ghost"}], "tokens": []}));
    let status = post_webhook(test_state(&mock_server.uri()), envelope).await;
    assert_eq!(status, StatusCode::OK);

    let body = campaign_request_body(&mock_server).await;
    // A miss is not fatal and must not invent an id.
    assert_eq!(body["input"]["leads"][0], json!({"uid": "ghost"}));
}

#[tokio::test]
async fn test_batch_order_is_preserved_across_mixed_lookups() {
    let mock_server = MockServer::start().await;

    mock_contact("first", 1).mount(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/contacts/middle"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    mock_contact("last", 3).mount(&mock_server).await;
    Mock::given(method("POST"))
        .and(path(TRIGGER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let envelope = batch_envelope(json!({
        "leads": [{"uid": "first"}, {"uid": "middle"}, {"uid": "last"}],
        "tokens": []
    }));

    let status = post_webhook(test_state(&mock_server.uri()), envelope).await;
    assert_eq!(status, StatusCode::OK);

    let body = campaign_request_body(&mock_server).await;
    assert_eq!(
        body["input"]["leads"],
        json!([
            {"uid": "first", "id": 1},
            {"uid": "middle"},
            {"uid": "last", "id": 3}
        ])
    );
}

#[tokio::test]
async fn test_store_failure_treated_as_miss() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contacts/abc"))
        .respond_with(ResponseTemplate::new(500).set_body_string("store down"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(TRIGGER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let envelope = batch_envelope(json!({"leads": [{"uid": "abc"}], "tokens": []}));
    let status = post_webhook(test_state(&mock_server.uri()), envelope).await;

    // The batch still goes out, un-enriched.
    assert_eq!(status, StatusCode::OK);
    let body = campaign_request_body(&mock_server).await;
    assert_eq!(body["input"]["leads"][0], json!({"uid": "abc"}));
}

#[tokio::test]
async fn test_campaign_transport_failure_still_returns_ok() {
    let mock_server = MockServer::start().await;

    mock_contact("abc", 42).mount(&mock_server).await;
    Mock::given(method("POST"))
        .and(path(TRIGGER_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let envelope = batch_envelope(json!({"leads": [{"uid": "abc"}], "tokens": []}));
    let status = post_webhook(test_state(&mock_server.uri()), envelope).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_campaign_rejection_still_returns_ok() {
    let mock_server = MockServer::start().await;

    mock_contact("abc", 42).mount(&mock_server).await;
    Mock::given(method("POST"))
        .and(path(TRIGGER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errors": [{"code": "1003", "message": "campaign not triggerable"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let envelope = batch_envelope(json!({"leads": [{"uid": "abc"}], "tokens": []}));
    let status = post_webhook(test_state(&mock_server.uri()), envelope).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_envelope_returns_400_and_never_triggers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TRIGGER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let status = post_webhook(
        test_state(&mock_server.uri()),
        push_envelope("%%%not-base64%%%"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_batch_still_triggers_campaign() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TRIGGER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let envelope = batch_envelope(json!({"leads": [], "tokens": []}));
    let status = post_webhook(test_state(&mock_server.uri()), envelope).await;
    assert_eq!(status, StatusCode::OK);

    let body = campaign_request_body(&mock_server).await;
    assert_eq!(body["input"]["leads"], json!([]));
}
