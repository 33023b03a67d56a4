//! HTTP-level tests for the API client against a mock backend

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use bookflow_client::{
    ApiClient, ApiError, BookingFlowConfig, BookingFlowConfigDraft, ClientConfig, ClientId,
    ConfigId, ConfigQuery, EventId, EventResponses, EventStatus, EventTypeId, FlowId, Money,
    NewEvent, Note, NoteId, NoteQuery, PaymentMethod, PaymentRequest, ProductQuery,
    QuestionId, QuestionResponse, StepKind,
};
use serde_json::json;
use std::collections::BTreeSet;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches when the query string holds exactly these pairs, nothing more
struct ExactQuery(BTreeSet<(String, String)>);

impl ExactQuery {
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }
}

impl Match for ExactQuery {
    fn matches(&self, request: &Request) -> bool {
        let actual: BTreeSet<(String, String)> = request
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        actual == self.0
    }
}

fn client_for(server: &MockServer, access: Option<&str>, refresh: Option<&str>) -> ApiClient {
    let config = ClientConfig::new(server.uri())
        .with_tokens(access.map(String::from), refresh.map(String::from));
    ApiClient::new(&config).unwrap()
}

fn page(results: serde_json::Value) -> serde_json::Value {
    let count = results.as_array().map_or(0, Vec::len);
    json!({"count": count, "next": null, "previous": null, "results": results})
}

// ============================================================================
// Booking flow endpoints
// ============================================================================

#[tokio::test]
async fn active_flows_filters_by_event_type_and_sends_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bookingflow/flows/"))
        .and(query_param("event_type", "5"))
        .and(query_param("is_active", "true"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            {"id": 1, "name": "Wedding flow", "event_type": 5, "is_active": true, "deposit_percentage": 30}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("token-1"), None);
    let flows = client.active_flows(EventTypeId::new(5)).await.unwrap();

    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].id, FlowId::new(1));
    assert_eq!(flows[0].deposit_percentage, Some(30));
}

#[tokio::test]
async fn flow_steps_accepts_bare_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bookingflow/flows/1/steps/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 10, "step_type": "INTRO", "order": 0, "is_required": false, "is_visible": true},
            {"id": 11, "step_type": "DATE", "order": 1, "is_required": true, "is_visible": true,
             "date_config": {"min_days_in_future": 7, "max_days_in_future": 90}}
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server, None, None);
    let steps = client.flow_steps(FlowId::new(1)).await.unwrap();

    assert_eq!(steps.len(), 2);
    match &steps[1].kind {
        StepKind::Date(config) => {
            assert_eq!(config.min_days_in_future, 7);
            assert_eq!(config.max_days_in_future, 90);
        },
        other => panic!("expected date step, got {other:?}"),
    }
}

// ============================================================================
// Events and payments
// ============================================================================

#[tokio::test]
async fn create_event_posts_form_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events/events/"))
        .and(body_partial_json(json!({
            "client": 3,
            "event_type": 5,
            "total_price": "225.00",
            "questionnaire_responses": [{"question": 1, "value": "120"}]
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": 42, "status": "PENDING"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None, None);
    let event = client
        .create_event(&NewEvent {
            client: ClientId::new(3),
            event_type: EventTypeId::new(5),
            name: "Summer party".into(),
            start_time: "2025-06-01T00:00:00Z".parse().unwrap(),
            end_time: "2025-06-01T00:00:00Z".parse().unwrap(),
            total_price: Money::from_units(225),
            questionnaire_responses: vec![QuestionResponse {
                question: QuestionId::new(1),
                value: "120".into(),
            }],
        })
        .await
        .unwrap();

    assert_eq!(event.id, EventId::new(42));
    assert_eq!(event.status, EventStatus::Pending);
}

#[tokio::test]
async fn payment_and_confirmation_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payments/process/"))
        .and(body_json(json!({
            "event": 42,
            "amount": "67.50",
            "payment_method": "CREDIT_CARD",
            "is_deposit": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "amount": "67.50", "status": "SUCCEEDED"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/events/events/42/update-status/"))
        .and(body_json(json!({"status": "CONFIRMED"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 42, "status": "CONFIRMED"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None, None);
    let payment = client
        .process_payment(&PaymentRequest {
            event: EventId::new(42),
            amount: Money::from_cents(6_750),
            payment_method: PaymentMethod::CreditCard,
            is_deposit: true,
        })
        .await
        .unwrap();
    assert_eq!(payment.amount, Money::from_cents(6_750));

    let event = client
        .update_event_status(EventId::new(42), EventStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(event.status, EventStatus::Confirmed);
}

#[tokio::test]
async fn save_event_responses_ignores_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/questionnaires/responses/save_event_responses/"))
        .and(body_partial_json(json!({"event": 42})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None, None);
    client
        .save_event_responses(&EventResponses {
            event: EventId::new(42),
            responses: vec![],
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn list_products_returns_catalog_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/products/"))
        .and(ExactQuery::new(&[("is_active", "true")]))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            {"id": 1, "name": "DJ", "base_price": "100.00"}
        ]))))
        .mount(&server)
        .await;

    let client = client_for(&server, None, None);
    let catalog = client
        .list_products(&ProductQuery {
            page: None,
            is_active: Some(true),
        })
        .await
        .unwrap();

    assert_eq!(catalog.count, 1);
    assert_eq!(catalog.results[0].base_price, Money::from_units(100));
}

// ============================================================================
// Admin resources
// ============================================================================

#[tokio::test]
async fn list_configs_sends_exactly_the_set_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bookingflow/configs/"))
        .and(ExactQuery::new(&[
            ("page", "2"),
            ("event_type", "5"),
            ("is_active", "true"),
        ]))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None, None);
    let result = client
        .list::<BookingFlowConfig>(&ConfigQuery {
            page: Some(2),
            event_type: Some(EventTypeId::new(5)),
            is_active: Some(true),
        })
        .await
        .unwrap();

    assert!(result.results.is_empty());
}

#[tokio::test]
async fn list_notes_without_filters_sends_no_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes/"))
        .and(ExactQuery::new(&[]))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            {"id": 1, "client": 3, "title": "Call", "content": "Wants a quote"}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None, None);
    let notes = client.list::<Note>(&NoteQuery::default()).await.unwrap();
    assert_eq!(notes.results[0].id, NoteId::new(1));
}

#[tokio::test]
async fn resource_create_update_delete_paths() {
    let server = MockServer::start().await;
    let stored = json!({
        "id": 9, "name": "Corporate", "event_type": 2, "is_active": false, "description": ""
    });
    Mock::given(method("POST"))
        .and(path("/bookingflow/configs/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(stored.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/bookingflow/configs/9/"))
        .and(body_partial_json(json!({"is_active": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9, "name": "Corporate", "event_type": 2, "is_active": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/bookingflow/configs/9/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None, None);
    let mut config = client
        .create::<BookingFlowConfig>(&BookingFlowConfigDraft {
            name: "Corporate".into(),
            event_type: EventTypeId::new(2),
            is_active: false,
            description: String::new(),
            deposit_percentage: None,
        })
        .await
        .unwrap();
    assert_eq!(config.id, ConfigId::new(9));

    config.is_active = true;
    let updated = client.update(&config).await.unwrap();
    assert!(updated.is_active);

    client.delete::<BookingFlowConfig>(config.id).await.unwrap();
}

// ============================================================================
// Session refresh and error mapping
// ============================================================================

#[tokio::test]
async fn expired_token_is_refreshed_once_and_request_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes/"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/token/refresh/"))
        .and(body_json(json!({"refresh": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("stale"), Some("refresh-1"));
    let notes = client.list::<Note>(&NoteQuery::default()).await.unwrap();

    assert!(notes.results.is_empty());
    assert_eq!(client.session().access_token().await.as_deref(), Some("fresh"));
}

#[tokio::test]
async fn second_unauthorized_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("stale"), Some("refresh-1"));
    let result = client.list::<Note>(&NoteQuery::default()).await;

    assert_eq!(result, Err(ApiError::Unauthorized));
}

#[tokio::test]
async fn unauthorized_without_refresh_token_skips_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("stale"), None);
    let result = client.list::<Note>(&NoteQuery::default()).await;

    assert_eq!(result, Err(ApiError::Unauthorized));
}

#[tokio::test]
async fn status_codes_map_to_error_variants() {
    let server = MockServer::start().await;
    Mock::given(path("/events/events/1/update-status/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(path("/events/events/2/update-status/"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"status":["invalid"]}"#))
        .mount(&server)
        .await;
    Mock::given(path("/events/events/3/update-status/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;
    Mock::given(path("/events/events/4/update-status/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server, None, None);
    let status = |id| client.update_event_status(EventId::new(id), EventStatus::Confirmed);

    assert!(matches!(status(1).await, Err(ApiError::NotFound(_))));
    assert_eq!(
        status(2).await,
        Err(ApiError::Validation(r#"{"status":["invalid"]}"#.into()))
    );
    assert_eq!(
        status(3).await,
        Err(ApiError::Api {
            status: 503,
            body: "maintenance".into()
        })
    );
    assert!(matches!(status(4).await, Err(ApiError::Decode(_))));
}
