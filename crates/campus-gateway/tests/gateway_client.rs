//! Gateway client tests against a mock HTTP server.

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use campus_gateway::{GatewayClient, GatewayError};

async fn mock_client() -> (MockServer, GatewayClient) {
    let server = MockServer::start().await;
    let client = GatewayClient::for_platform("sk_test_xxx").with_base_url(server.uri());
    (server, client)
}

#[tokio::test]
async fn create_customer_sends_tenant_metadata() {
    let (server, client) = mock_client().await;

    Mock::given(method("POST"))
        .and(path("/customers"))
        .and(body_string_contains("metadata%5Btenant_id%5D=ten_1"))
        .and(body_string_contains("email=owner%40acme.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cus_123",
            "email": "owner@acme.test",
            "created": 1_700_000_000,
        })))
        .mount(&server)
        .await;

    let customer = client
        .create_customer("ten_1", Some("owner@acme.test"), Some("Acme"))
        .await
        .unwrap();
    assert_eq!(customer.id, "cus_123");
    assert_eq!(customer.email.as_deref(), Some("owner@acme.test"));
}

#[tokio::test]
async fn retrieve_customer_maps_404_to_none() {
    let (server, client) = mock_client().await;

    Mock::given(method("GET"))
        .and(path("/customers/cus_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "type": "invalid_request_error", "message": "No such customer" }
        })))
        .mount(&server)
        .await;

    let result = client.retrieve_customer("cus_missing").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn api_error_detail_is_surfaced() {
    let (server, client) = mock_client().await;

    Mock::given(method("POST"))
        .and(path("/payment_intents"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": {
                "type": "card_error",
                "message": "Your card was declined.",
                "code": "card_declined",
            }
        })))
        .mount(&server)
        .await;

    let err = client
        .create_payment_intent("cus_123", 3000, "usd", None)
        .await
        .unwrap_err();
    match err {
        GatewayError::Api {
            error_type,
            message,
            code,
        } => {
            assert_eq!(error_type, "card_error");
            assert_eq!(message, "Your card was declined.");
            assert_eq!(code.as_deref(), Some("card_declined"));
        }
        GatewayError::Http(_) => panic!("expected Api error"),
    }
}

#[tokio::test]
async fn tenant_client_sends_account_header() {
    let server = MockServer::start().await;
    let client =
        GatewayClient::for_tenant("sk_test_xxx", "acct_77").with_base_url(server.uri());

    Mock::given(method("POST"))
        .and(path("/setup_intents"))
        .and(header("Gateway-Account", "acct_77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "seti_1",
            "status": "requires_payment_method",
        })))
        .mount(&server)
        .await;

    let intent = client.create_setup_intent("cus_123").await.unwrap();
    assert_eq!(intent.id, "seti_1");
}

#[tokio::test]
async fn list_payment_methods_filters_cards() {
    let (server, client) = mock_client().await;

    Mock::given(method("GET"))
        .and(path("/payment_methods"))
        .and(query_param("customer", "cus_123"))
        .and(query_param("type", "card"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{
                "id": "pm_1",
                "type": "card",
                "card": { "brand": "visa", "last4": "4242", "exp_month": 12, "exp_year": 2030 },
            }],
            "has_more": false,
        })))
        .mount(&server)
        .await;

    let methods = client.list_payment_methods("cus_123").await.unwrap();
    assert_eq!(methods.data.len(), 1);
    assert_eq!(methods.data[0].card.as_ref().unwrap().last4, "4242");
}

#[tokio::test]
async fn create_subscription_sends_price_and_quantity() {
    let (server, client) = mock_client().await;

    Mock::given(method("POST"))
        .and(path("/subscriptions"))
        .and(body_string_contains("items%5B0%5D%5Bprice%5D=price_growth"))
        .and(body_string_contains("items%5B0%5D%5Bquantity%5D=12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sub_1",
            "status": "active",
            "customer": "cus_123",
            "current_period_start": 1_700_000_000,
            "current_period_end": 1_702_592_000,
            "cancel_at_period_end": false,
        })))
        .mount(&server)
        .await;

    let sub = client
        .create_subscription("cus_123", "price_growth", 12)
        .await
        .unwrap();
    assert_eq!(sub.id, "sub_1");
    assert_eq!(sub.status, "active");
    assert!(!sub.cancel_at_period_end);
}

#[tokio::test]
async fn cancel_at_period_end_posts_flag() {
    let (server, client) = mock_client().await;

    Mock::given(method("POST"))
        .and(path("/subscriptions/sub_1"))
        .and(body_string_contains("cancel_at_period_end=true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sub_1",
            "status": "active",
            "cancel_at_period_end": true,
        })))
        .mount(&server)
        .await;

    let sub = client.cancel_subscription("sub_1", true).await.unwrap();
    assert!(sub.cancel_at_period_end);
}

#[tokio::test]
async fn immediate_cancel_uses_delete() {
    let (server, client) = mock_client().await;

    Mock::given(method("DELETE"))
        .and(path("/subscriptions/sub_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sub_1",
            "status": "canceled",
        })))
        .mount(&server)
        .await;

    let sub = client.cancel_subscription("sub_1", false).await.unwrap();
    assert_eq!(sub.status, "canceled");
}

#[tokio::test]
async fn onboarding_link_roundtrip() {
    let (server, client) = mock_client().await;

    Mock::given(method("POST"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "acct_9",
            "charges_enabled": false,
            "details_submitted": false,
            "email": "owner@acme.test",
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/account_links"))
        .and(body_string_contains("account=acct_9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://onboard.gateway.example.com/x",
            "expires_at": 1_700_000_300,
        })))
        .mount(&server)
        .await;

    let account = client
        .create_connected_account("ten_1", "owner@acme.test")
        .await
        .unwrap();
    assert!(!account.charges_enabled);

    let link = client
        .create_onboarding_link(&account.id, "https://acme.test/refresh", "https://acme.test/done")
        .await
        .unwrap();
    assert!(link.url.starts_with("https://onboard."));
}
