//! HTTP transport behavior against a mock License API.

#![allow(clippy::unwrap_used)]

use ironlicensing::{
    HttpTransport, LicenseClient, LicenseOptions, LicenseStatus, LicenseTransport, LicenseType,
};
use ironlicensing_tests::{
    ApiJson, MockLicenseApi, TEST_MACHINE_ID, TEST_PRODUCT_SLUG, TEST_PUBLIC_KEY,
    init_test_logging,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_validate_sends_headers_and_body() {
    init_test_logging();
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/validate"))
        .and(header("Content-Type", "application/json"))
        .and(header("X-Public-Key", TEST_PUBLIC_KEY))
        .and(header("X-Product-Slug", TEST_PRODUCT_SLUG))
        .and(body_json(json!({
            "licenseKey": "KEY-1",
            "machineId": TEST_MACHINE_ID,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ApiJson::valid_result(
            ApiJson::license("KEY-1", "valid", "perpetual", &[("pro", true)]),
        )))
        .expect(1)
        .mount(&api.server)
        .await;

    let result = api.transport().unwrap().validate("KEY-1").await;

    assert!(result.valid);
    let license = result.license.unwrap();
    assert_eq!(license.key, "KEY-1");
    assert_eq!(license.status, LicenseStatus::Valid);
    assert_eq!(license.license_type, LicenseType::Perpetual);
    assert!(license.has_feature("pro"));
}

#[tokio::test]
async fn test_activate_sends_machine_details() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/activate"))
        .and(body_partial_json(json!({
            "licenseKey": "KEY-1",
            "machineId": TEST_MACHINE_ID,
            "machineName": "build-box",
            "platform": std::env::consts::OS,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ApiJson::valid_result(
            ApiJson::license("KEY-1", "valid", "subscription", &[]),
        )))
        .expect(1)
        .mount(&api.server)
        .await;

    let result = api.transport().unwrap().activate("KEY-1", Some("build-box")).await;

    assert!(result.valid);
    assert_eq!(result.license.unwrap().license_type, LicenseType::Subscription);
}

#[tokio::test]
async fn test_activate_defaults_machine_name_to_hostname() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/activate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valid": false })))
        .mount(&api.server)
        .await;

    api.transport().unwrap().activate("KEY-1", None).await;

    let bodies = api.received_bodies().await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["machineName"], ironlicensing::machine::hostname());
}

#[tokio::test]
async fn test_rejection_carries_server_error() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/activate"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(ApiJson::error("machine limit reached")),
        )
        .mount(&api.server)
        .await;

    let result = api.transport().unwrap().activate("KEY-1", None).await;

    assert!(!result.valid);
    assert!(result.license.is_none());
    assert_eq!(result.error.as_deref(), Some("machine limit reached"));
}

#[tokio::test]
async fn test_rejection_without_error_field_is_generic() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/validate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&api.server)
        .await;

    let result = api.transport().unwrap().validate("KEY-1").await;

    assert!(!result.valid);
    assert_eq!(result.error.as_deref(), Some("Request failed"));
}

#[tokio::test]
async fn test_ok_with_invalid_body_reports_invalid() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/validate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "valid": false, "error": "revoked" })),
        )
        .mount(&api.server)
        .await;

    let result = api.transport().unwrap().validate("KEY-1").await;

    assert!(!result.valid);
    assert_eq!(result.error.as_deref(), Some("revoked"));
}

#[tokio::test]
async fn test_network_failure_is_a_failed_result() {
    let options = LicenseOptions::new(TEST_PUBLIC_KEY, TEST_PRODUCT_SLUG)
        .with_api_base_url("http://127.0.0.1:1")
        .with_http_timeout(Duration::from_secs(2));
    let transport = HttpTransport::with_machine_id(&options, TEST_MACHINE_ID).unwrap();

    let result = transport.validate("KEY-1").await;

    assert!(!result.valid);
    assert!(!result.error.unwrap().is_empty());
    assert!(!transport.deactivate("KEY-1").await);
    assert!(transport.tiers().await.is_empty());
    assert!(!transport.start_checkout("tier_pro", "a@b.c").await.success);
}

#[tokio::test]
async fn test_timeout_is_a_failed_result() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/validate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "valid": true }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&api.server)
        .await;

    let options = api.options().with_http_timeout(Duration::from_millis(200));
    let transport = HttpTransport::with_machine_id(&options, TEST_MACHINE_ID).unwrap();

    let result = transport.validate("KEY-1").await;

    assert!(!result.valid);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_deactivate_success_is_status_only() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/deactivate"))
        .and(body_json(json!({
            "licenseKey": "KEY-1",
            "machineId": TEST_MACHINE_ID,
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&api.server)
        .await;

    assert!(api.transport().unwrap().deactivate("KEY-1").await);
}

#[tokio::test]
async fn test_deactivate_rejected() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/deactivate"))
        .respond_with(ResponseTemplate::new(404).set_body_json(ApiJson::error("not found")))
        .mount(&api.server)
        .await;

    assert!(!api.transport().unwrap().deactivate("KEY-1").await);
}

#[tokio::test]
async fn test_trial_request() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/trial"))
        .and(body_json(json!({
            "email": "dev@example.com",
            "machineId": TEST_MACHINE_ID,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(ApiJson::valid_result(
            ApiJson::license("TRIAL-1", "trial", "trial", &[("pro", true)]),
        )))
        .expect(1)
        .mount(&api.server)
        .await;

    let result = api.transport().unwrap().start_trial("dev@example.com").await;

    assert!(result.valid);
    assert_eq!(result.license.unwrap().status, LicenseStatus::Trial);
}

#[tokio::test]
async fn test_tiers() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("GET"))
        .and(path("/api/v1/tiers"))
        .and(header("X-Public-Key", TEST_PUBLIC_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tiers": [
                {
                    "id": "tier_pro",
                    "slug": "pro",
                    "name": "Pro",
                    "price": 49,
                    "currency": "USD",
                    "billingPeriod": "monthly",
                    "features": [{ "key": "pro", "name": "Pro", "enabled": true }]
                },
                { "id": "tier_free", "name": "Free", "price": 0, "currency": "USD" }
            ]
        })))
        .mount(&api.server)
        .await;

    let tiers = api.transport().unwrap().tiers().await;

    assert_eq!(tiers.len(), 2);
    assert_eq!(tiers[0].slug, "pro");
    assert_eq!(tiers[0].billing_period.as_deref(), Some("monthly"));
    assert_eq!(tiers[0].display_price(), "49.00 USD");
    assert_eq!(tiers[1].slug, "");
    assert!(tiers[1].features.is_empty());
}

#[tokio::test]
async fn test_tiers_failure_is_empty() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("GET"))
        .and(path("/api/v1/tiers"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&api.server)
        .await;

    assert!(api.transport().unwrap().tiers().await.is_empty());
}

#[tokio::test]
async fn test_checkout_success() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/checkout"))
        .and(body_json(json!({
            "tierId": "tier_pro",
            "email": "buyer@example.com",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "checkoutUrl": "https://pay.example.com/s/abc",
            "sessionId": "sess_abc",
        })))
        .expect(1)
        .mount(&api.server)
        .await;

    let result = api
        .transport()
        .unwrap()
        .start_checkout("tier_pro", "buyer@example.com")
        .await;

    assert!(result.success);
    assert_eq!(result.checkout_url.as_deref(), Some("https://pay.example.com/s/abc"));
    assert_eq!(result.session_id.as_deref(), Some("sess_abc"));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_checkout_rejected() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/checkout"))
        .respond_with(ResponseTemplate::new(400).set_body_json(ApiJson::error("unknown tier")))
        .mount(&api.server)
        .await;

    let result = api.transport().unwrap().start_checkout("nope", "a@b.c").await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("unknown tier"));
    assert!(result.checkout_url.is_none());
}

#[tokio::test]
async fn test_checkout_rejected_without_message() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/checkout"))
        .respond_with(ResponseTemplate::new(422).set_body_string(""))
        .mount(&api.server)
        .await;

    let result = api.transport().unwrap().start_checkout("t", "a@b.c").await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Checkout failed"));
}

#[tokio::test]
async fn test_base_url_trailing_slash() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("GET"))
        .and(path("/api/v1/tiers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tiers": [] })))
        .expect(1)
        .mount(&api.server)
        .await;

    let options = api
        .options()
        .with_api_base_url(format!("{}/", api.server.uri()));
    let transport = HttpTransport::with_machine_id(&options, TEST_MACHINE_ID).unwrap();

    assert!(transport.tiers().await.is_empty());
}

#[tokio::test]
async fn test_client_over_http_end_to_end() {
    let api = MockLicenseApi::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/activate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ApiJson::valid_result(
            ApiJson::license("KEY-1", "valid", "perpetual", &[("export", true)]),
        )))
        .mount(&api.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/deactivate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&api.server)
        .await;

    let client = api.client().unwrap();
    assert!(client.activate("KEY-1", Some("laptop")).await.valid);
    assert!(client.require_feature("export").is_ok());
    assert!(client.deactivate().await);
    assert!(client.license().is_none());
}

#[tokio::test]
async fn test_client_new_persists_machine_id() {
    let api = MockLicenseApi::start().await.unwrap();

    let first = LicenseClient::new(api.options()).unwrap();
    let second = LicenseClient::new(api.options()).unwrap();

    assert!(!first.machine_id().is_empty());
    assert_eq!(first.machine_id(), second.machine_id());
    let stored = std::fs::read_to_string(api.machine_id_path()).unwrap();
    assert_eq!(stored.trim(), first.machine_id());
}

#[tokio::test]
async fn test_unlimited_license_with_naive_timestamps_is_held() {
    let api = MockLicenseApi::start().await.unwrap();
    let mut license = ApiJson::license("KEY-U", "valid", "perpetual", &[("pro", true)]);
    license["maxActivations"] = json!(-1);
    license["createdAt"] = json!("2025-01-01T00:00:00");
    Mock::given(method("POST"))
        .and(path("/api/v1/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ApiJson::valid_result(license)))
        .mount(&api.server)
        .await;

    let client = api.client().unwrap();
    let result = client.validate("KEY-U").await;

    assert!(result.valid, "error: {:?}", result.error);
    assert_eq!(client.license(), result.license);
    assert_eq!(client.license().unwrap().max_activations, -1);
    assert!(client.has_feature("pro"));
}
