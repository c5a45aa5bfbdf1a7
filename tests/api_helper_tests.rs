//! Integration tests for the API helper against a mock Shopify server.
//!
//! Every test points the client at a `wiremock` server through the
//! `api_host` setting and checks the request sent and the wrapper returned.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use rust_decimal::Decimal;
use serde_json::{json, Value};
use shopify_app::{
    ApiHelper, ApiHelperError, ApiKey, ApiSecretKey, AuthMode, ChargeReference, ChargeType,
    Credentials, HostUrl, PlanDetails, ShopDomain, ShopifyApi, ShopifyConfig, UsageChargeDetails,
    ValidationError,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASE: &str = "/admin/api/2020-01";

fn config_with(api_host: &str, max_tries: u32) -> ShopifyConfig {
    ShopifyConfig::builder()
        .api_key(ApiKey::new("test-api-key").unwrap())
        .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
        .host(HostUrl::new("https://app.example.com").unwrap())
        .api_host(HostUrl::new(api_host).unwrap())
        .api_max_tries(max_tries)
        .build()
        .unwrap()
}

fn config_for(server: &MockServer) -> ShopifyConfig {
    config_with(&server.uri(), 1)
}

fn helper_with(api_host: &str, max_tries: u32) -> ApiHelper {
    let config = config_with(api_host, max_tries);
    let credentials = Credentials::for_shop(
        &config,
        ShopDomain::new("example-shop").unwrap(),
        "shpat_test_token",
    );
    ApiHelper::make(config, credentials).unwrap()
}

fn helper_for(server: &MockServer) -> ApiHelper {
    helper_with(&server.uri(), 1)
}

fn api_for(server: &MockServer) -> Arc<ShopifyApi> {
    let config = config_for(server);
    let credentials = Credentials::for_shop(
        &config,
        ShopDomain::new("example-shop").unwrap(),
        "shpat_test_token",
    );
    Arc::new(ShopifyApi::new(&config, credentials).unwrap())
}

async fn stub(server: &MockServer, verb: &str, route: &str, status: u16, body: Value) {
    Mock::given(method(verb))
        .and(path(format!("{BASE}/{route}")))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_make_installs_configured_api() {
    let config = ShopifyConfig::builder()
        .api_key(ApiKey::new("test-api-key").unwrap())
        .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
        .api_rate_limiting_enabled(true)
        .build()
        .unwrap();
    let credentials =
        Credentials::for_shop(&config, ShopDomain::new("example-shop").unwrap(), "token");

    let helper = ApiHelper::make(config, credentials).unwrap();
    let api = helper.get_api().unwrap();

    assert_eq!(api.api_version().as_str(), "2020-01");
    assert!(api.rate_limiting_enabled());
    assert_eq!(api.credentials().api_secret_key().as_ref(), "test-secret");
}

#[tokio::test]
async fn test_set_and_get_api() {
    let server = MockServer::start().await;
    let made = helper_for(&server);

    let mut helper = ApiHelper::new(config_for(&server));
    assert!(helper.get_api().is_none());

    helper.set_api(Arc::clone(made.get_api().unwrap()));
    assert!(Arc::ptr_eq(
        helper.get_api().unwrap(),
        made.get_api().unwrap()
    ));
}

// ============================================================================
// with_api / scoped
// ============================================================================

#[tokio::test]
async fn test_with_api_runs_action_and_unsets() {
    let server = MockServer::start().await;
    let mut helper = ApiHelper::new(config_for(&server));

    let mut called = false;
    let shop = helper.with_api(api_for(&server), |helper| {
        called = true;
        helper
            .get_api()
            .map(|api| api.credentials().shop().to_string())
    });

    assert!(called);
    assert_eq!(shop.as_deref(), Some("example-shop.myshopify.com"));
    assert!(helper.get_api().is_none());
}

#[tokio::test]
async fn test_with_api_unsets_and_returns_error_unchanged() {
    let server = MockServer::start().await;
    let mut helper = ApiHelper::new(config_for(&server));

    let result: Result<(), ApiHelperError> = helper.with_api(api_for(&server), |_| {
        Err(ValidationError::MissingField { field: "name" }.into())
    });

    assert!(matches!(
        result,
        Err(ApiHelperError::Validation(ValidationError::MissingField {
            field: "name"
        }))
    ));
    assert!(helper.get_api().is_none());
}

#[tokio::test]
async fn test_with_api_unsets_on_panic() {
    let server = MockServer::start().await;
    let mut helper = ApiHelper::new(config_for(&server));
    let api = api_for(&server);

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        helper.with_api(api, |_| panic!("action failed"));
    }));

    assert!(outcome.is_err());
    assert!(helper.get_api().is_none());
}

#[tokio::test]
async fn test_scoped_guard_unsets_after_await() {
    let server = MockServer::start().await;
    stub(&server, "GET", "webhooks.json", 200, json!({"webhooks": []})).await;
    let mut helper = ApiHelper::new(config_for(&server));

    {
        let scope = helper.scoped(api_for(&server));
        let hooks = scope.get_webhooks().await.unwrap();
        assert!(hooks.is_empty());
    }

    assert!(helper.get_api().is_none());
}

#[tokio::test]
async fn test_operations_without_api_fail_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let helper = ApiHelper::new(config_for(&server));

    assert!(matches!(
        helper.get_webhooks().await,
        Err(ApiHelperError::ApiNotSet)
    ));
}

// ============================================================================
// Auth URL
// ============================================================================

#[tokio::test]
async fn test_build_auth_url() {
    let server = MockServer::start().await;
    let helper = helper_for(&server);

    let url = helper
        .build_auth_url(AuthMode::Offline, "read_content")
        .unwrap();
    assert!(url.starts_with(
        "https://example-shop.myshopify.com/admin/oauth/authorize?client_id=test-api-key"
    ));
    assert!(url.contains("scope=read_content"));
    assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fauthenticate"));
    assert!(!url.contains("per-user"));

    let online = helper
        .build_auth_url(AuthMode::Online, "read_content")
        .unwrap();
    assert!(online.contains("per-user"));
}

// ============================================================================
// Script tags
// ============================================================================

#[tokio::test]
async fn test_get_script_tags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BASE}/script_tags.json")))
        .and(header("X-Shopify-Access-Token", "shpat_test_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "script_tags": [
                {
                    "id": 421379493,
                    "src": "https://js-aplenty.com/bar.js",
                    "event": "onload",
                    "display_scope": "all"
                },
                {
                    "id": 596726825,
                    "src": "https://js-aplenty.com/foo.js",
                    "event": "onload",
                    "display_scope": "all"
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = helper_for(&server).get_script_tags().await.unwrap();

    assert_eq!(data[0]["event"], "onload");
    assert_eq!(data.len(), 2);
}

#[tokio::test]
async fn test_get_script_tags_filtered_sends_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BASE}/script_tags.json")))
        .and(query_param("src", "https://js-aplenty.com/foo.js"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"script_tags": []})))
        .expect(1)
        .mount(&server)
        .await;

    let data = helper_for(&server)
        .get_script_tags_filtered(json!({"src": "https://js-aplenty.com/foo.js"}))
        .await
        .unwrap();
    assert!(data.is_empty());
}

#[tokio::test]
async fn test_create_script_tag_against_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{BASE}/script_tags.json")))
        .and(body_json(json!({"script_tag": {}})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let data = helper_for(&server)
        .create_script_tag(json!({}))
        .await
        .unwrap();
    assert!(data.is_empty());
}

#[tokio::test]
async fn test_create_script_tag_rejects_non_object_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let result = helper_for(&server).create_script_tag(json!(["x"])).await;
    assert!(matches!(
        result,
        Err(ApiHelperError::Validation(ValidationError::NotAnObject {
            field: "script_tag"
        }))
    ));
}

// ============================================================================
// Charges
// ============================================================================

#[tokio::test]
async fn test_get_charge() {
    let server = MockServer::start().await;
    stub(
        &server,
        "GET",
        "application_charges/1234.json",
        200,
        json!({
            "application_charge": {
                "id": 1234,
                "name": "iPod Cleaning",
                "price": "5.00",
                "status": "accepted",
                "test": null
            }
        }),
    )
    .await;

    let data = helper_for(&server)
        .get_charge(ChargeType::Charge, ChargeReference::new(1234).unwrap())
        .await
        .unwrap();

    assert_eq!(data.field("name").as_str(), Some("iPod Cleaning"));
    assert_eq!(data["status"], "accepted");
}

#[tokio::test]
async fn test_each_charge_type_targets_its_own_resource() {
    let server = MockServer::start().await;
    stub(
        &server,
        "GET",
        "application_charges/7.json",
        200,
        json!({"application_charge": {"id": 7, "name": "One time"}}),
    )
    .await;
    stub(
        &server,
        "GET",
        "recurring_application_charges/7.json",
        200,
        json!({"recurring_application_charge": {"id": 7, "name": "Monthly"}}),
    )
    .await;

    let helper = helper_for(&server);
    let reference = ChargeReference::new(7).unwrap();

    let one_time = helper.get_charge(ChargeType::Charge, reference).await.unwrap();
    let recurring = helper
        .get_charge(ChargeType::Recurring, reference)
        .await
        .unwrap();

    assert_eq!(one_time["name"], "One time");
    assert_eq!(recurring["name"], "Monthly");
}

#[tokio::test]
async fn test_unknown_charge_type_fails_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let helper = helper_for(&server);

    let reference: ChargeReference = "1234".parse().unwrap();
    let result = match "MONTHLY".parse::<ChargeType>() {
        Ok(charge_type) => helper.get_charge(charge_type, reference).await,
        Err(e) => Err(ApiHelperError::from(e)),
    };

    assert!(matches!(
        result,
        Err(ApiHelperError::Validation(ValidationError::UnknownChargeType { value }))
            if value == "MONTHLY"
    ));
}

#[tokio::test]
async fn test_activate_charge() {
    let server = MockServer::start().await;
    stub(
        &server,
        "POST",
        "recurring_application_charges/1234/activate.json",
        200,
        json!({
            "recurring_application_charge": {
                "id": 1234,
                "name": "Super Mega Plan",
                "price": "15.00",
                "status": "active"
            }
        }),
    )
    .await;

    let data = helper_for(&server)
        .activate_charge(ChargeType::Recurring, ChargeReference::new(1234).unwrap())
        .await
        .unwrap();

    assert_eq!(data["name"], "Super Mega Plan");
}

#[tokio::test]
async fn test_create_charge() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{BASE}/recurring_application_charges.json")))
        .and(body_json(json!({
            "recurring_application_charge": {
                "name": "Test",
                "price": "12.00",
                "test": true,
                "trial_days": 7
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "recurring_application_charge": {
                "id": 455696195,
                "name": "Basic Plan",
                "price": "29.99",
                "status": "pending",
                "confirmation_url": "https://example-shop.myshopify.com/admin/charges/455696195/confirm_recurring_application_charge"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let plan = PlanDetails::builder("Test", Decimal::new(1200, 2))
        .test(true)
        .trial_days(7)
        .build()
        .unwrap();
    let data = helper_for(&server)
        .create_charge(ChargeType::Recurring, &plan)
        .await
        .unwrap();

    assert_eq!(data["name"], "Basic Plan");
}

#[tokio::test]
async fn test_create_usage_charge() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!(
            "{BASE}/recurring_application_charges/1/usage_charges.json"
        )))
        .and(body_json(json!({
            "usage_charge": {"price": "12.00", "description": "Hello!"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "usage_charge": {
                "id": 1034618208,
                "description": "Hello!",
                "price": "12.00"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut details = UsageChargeDetails::default();
    details.charge_reference = Some(ChargeReference::new(1).unwrap());
    details.price = Decimal::new(1200, 2);
    details.description = "Hello!".to_string();

    let data = helper_for(&server)
        .create_usage_charge(&details)
        .await
        .unwrap();
    assert_eq!(data["description"], "Hello!");
}

#[tokio::test]
async fn test_incomplete_usage_charge_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let details = UsageChargeDetails {
        price: Decimal::ONE,
        description: "Hello!".to_string(),
        ..UsageChargeDetails::default()
    };

    let result = helper_for(&server).create_usage_charge(&details).await;
    assert!(matches!(
        result,
        Err(ApiHelperError::Validation(ValidationError::MissingField {
            field: "charge_reference"
        }))
    ));
}

// ============================================================================
// Webhooks
// ============================================================================

#[tokio::test]
async fn test_get_webhooks() {
    let server = MockServer::start().await;
    stub(
        &server,
        "GET",
        "webhooks.json",
        200,
        json!({
            "webhooks": [{
                "id": 4759306,
                "address": "https://apple.com",
                "topic": "orders/create",
                "format": "json"
            }]
        }),
    )
    .await;

    let data = helper_for(&server).get_webhooks().await.unwrap();
    assert!(!data.is_empty());
}

#[tokio::test]
async fn test_create_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{BASE}/webhooks.json")))
        .and(body_json(json!({"webhook": {"topic": "app/uninstalled"}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "webhook": {
                "id": 1047897672,
                "address": "https://app.example.com/webhook/app-uninstalled",
                "topic": "app/uninstalled",
                "format": "json"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = helper_for(&server)
        .create_webhook(json!({"topic": "app/uninstalled"}))
        .await
        .unwrap();
    assert_eq!(data["topic"], "app/uninstalled");
}

#[tokio::test]
async fn test_delete_webhook_with_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{BASE}/webhooks/1.json")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let data = helper_for(&server).delete_webhook(1).await.unwrap();
    assert_eq!(*data, json!({}));
}

#[tokio::test]
async fn test_delete_webhook_rejects_zero_id() {
    let server = MockServer::start().await;
    let result = helper_for(&server).delete_webhook(0).await;
    assert!(matches!(
        result,
        Err(ApiHelperError::Validation(ValidationError::InvalidResourceId {
            resource: "webhook",
            value: 0
        }))
    ));
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_error_flagged_response_is_api_error() {
    let server = MockServer::start().await;
    stub(
        &server,
        "DELETE",
        "webhooks/1.json",
        200,
        json!({"errors": "Not Found"}),
    )
    .await;

    let error = helper_for(&server).delete_webhook(1).await.unwrap_err();
    assert!(error.is_api_error());
    let ApiHelperError::Api(api_error) = error else {
        panic!("expected an API error");
    };
    assert_eq!(api_error.message, "Not Found");
    assert_eq!(api_error.body, json!({"errors": "Not Found"}));
}

#[tokio::test]
async fn test_http_error_status_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BASE}/application_charges/99.json")))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("X-Request-Id", "req-404")
                .set_body_json(json!({"errors": "Not Found"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let error = helper_for(&server)
        .get_charge(ChargeType::Charge, ChargeReference::new(99).unwrap())
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(404));
    let ApiHelperError::Api(api_error) = error else {
        panic!("expected an API error");
    };
    assert_eq!(api_error.request_id.as_deref(), Some("req-404"));
    assert_eq!(api_error.body["errors"], "Not Found");
}

#[tokio::test]
async fn test_unreachable_server_is_api_error_without_status() {
    let server = MockServer::start().await;
    let helper = helper_for(&server);
    drop(server);

    let error = helper.get_webhooks().await.unwrap_err();
    assert!(error.is_api_error());
    assert_eq!(error.status(), None);
}

#[tokio::test]
async fn test_truncated_success_body_is_api_error() {
    // Promises more body than it sends, then hangs up
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0_u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        stream
            .write_all(
                b"HTTP/1.1 200 OK\r\n\
                  Content-Type: application/json\r\n\
                  Content-Length: 200\r\n\
                  \r\n\
                  {\"webhooks\":[{\"id\":1",
            )
            .unwrap();
    });

    let error = helper_with(&format!("http://{addr}"), 1)
        .get_webhooks()
        .await
        .unwrap_err();
    server.join().unwrap();

    assert!(error.is_api_error());
    assert_eq!(error.status(), None);
}

// ============================================================================
// Retries
// ============================================================================

#[tokio::test]
async fn test_throttled_request_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BASE}/webhooks.json")))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    stub(&server, "GET", "webhooks.json", 200, json!({"webhooks": [{"id": 7}]})).await;

    let webhooks = helper_with(&server.uri(), 2).get_webhooks().await.unwrap();
    assert_eq!(webhooks[0]["id"], 7);
}

#[tokio::test]
async fn test_unbounded_retry_after_falls_back_to_fixed_wait() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BASE}/webhooks.json")))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "inf"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    stub(&server, "GET", "webhooks.json", 200, json!({"webhooks": []})).await;

    let webhooks = helper_with(&server.uri(), 2).get_webhooks().await.unwrap();
    assert_eq!(webhooks.len(), 0);
}

#[tokio::test]
async fn test_persistent_server_error_exhausts_tries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BASE}/webhooks.json")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"errors": "boom"})))
        .expect(2)
        .mount(&server)
        .await;

    let error = helper_with(&server.uri(), 2)
        .get_webhooks()
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(500));
    let ApiHelperError::Api(api_error) = error else {
        panic!("expected an API error");
    };
    assert!(api_error.message.contains("retry count of 2"));
    assert_eq!(api_error.body["errors"], "boom");
}

#[tokio::test]
async fn test_single_try_returns_throttle_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BASE}/webhooks.json")))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .expect(1)
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let error = helper_with(&server.uri(), 1)
        .get_webhooks()
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(429));
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}
