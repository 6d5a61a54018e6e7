//! End-to-end upload scenarios against a mocked Google Ads API.

mod support;

use adrelay_domain::AdRelayError;
use serde_json::json;
use support::*;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLICK_PIPELINE: &str = "google_ads_click_conversions";

#[tokio::test]
async fn cached_token_uploads_in_a_single_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "unused" })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CLICK_UPLOAD_PATH))
        .and(header("authorization", "Bearer cached"))
        .and(header("developer-token", "dev-token"))
        .and(body_partial_json(json!({
            "partialFailure": true,
            "conversions": [{
                "conversionAction": "customers/1234567890/conversionActions/12345",
                "conversionDateTime": "2021-06-10 18:08:04+00:00",
                "conversionValue": 200.0,
                "currencyCode": "USD"
            }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(success_body(1)))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry(&google_ads_config(&server.uri(), Some("123-456-7890")));
    seed_google_token(&registry, "cached").await;

    let pipeline = registry.get(CLICK_PIPELINE).unwrap();
    let result = pipeline.process(&click_event()).await.unwrap();

    assert_eq!(result.status, 201);
    assert!(result.is_success());
    assert_eq!(result.submitted, 1);
}

#[tokio::test]
async fn created_without_body_is_full_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CLICK_UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry(&google_ads_config(&server.uri(), Some("1234567890")));
    seed_google_token(&registry, "cached").await;

    let result = registry.get(CLICK_PIPELINE).unwrap().process(&click_event()).await.unwrap();
    assert_eq!(result.status, 201);
    assert!(result.is_success());
    assert!(result.into_result().is_ok());
}

#[tokio::test]
async fn uncached_custom_variable_is_looked_up_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEARCH_STREAM_PATH))
        .and(body_string_contains("conversion_custom_variable.name IN ('username')"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "results": [{
                "conversionCustomVariable": {
                    "resourceName": "customers/1234567890/conversionCustomVariables/77",
                    "name": "username"
                }
            }]
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CLICK_UPLOAD_PATH))
        .and(body_partial_json(json!({
            "conversions": [{
                "customVariables": [{
                    "conversionCustomVariable": "customers/1234567890/conversionCustomVariables/77",
                    "value": "spongebob"
                }]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(1)))
        .expect(2)
        .mount(&server)
        .await;

    let registry = registry(&google_ads_config(&server.uri(), Some("1234567890")));
    seed_google_token(&registry, "cached").await;
    let pipeline = registry.get(CLICK_PIPELINE).unwrap();

    let mut event = click_event();
    event.custom_attributes.insert("username".into(), "spongebob".into());

    assert!(pipeline.process(&event).await.unwrap().is_success());
    // Second upload is served from the resolver cache.
    assert!(pipeline.process(&event).await.unwrap().is_success());
}

#[tokio::test]
async fn missing_customer_id_fails_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let registry = registry(&google_ads_config(&server.uri(), None));
    let pipeline = registry.get(CLICK_PIPELINE).unwrap();

    match pipeline.process(&click_event()).await {
        Err(AdRelayError::Configuration(msg)) => assert!(msg.contains("Customer ID")),
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_conversion_is_reported_as_partial_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CLICK_UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "partialFailureError": {
                "code": 3,
                "message": "The imported gclid could not be decoded., at conversions[0].gclid",
                "details": [{
                    "errors": [{
                        "message": "The imported gclid could not be decoded.",
                        "location": {
                            "fieldPathElements": [{ "fieldName": "conversions", "index": 0 }]
                        }
                    }]
                }]
            },
            "results": [{}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry(&google_ads_config(&server.uri(), Some("1234567890")));
    seed_google_token(&registry, "cached").await;
    let pipeline = registry.get(CLICK_PIPELINE).unwrap();

    let result = pipeline.process(&click_event()).await.unwrap();
    assert!(result.partial_failure);
    assert_eq!(result.status, 200);
    assert_eq!(result.failed_indices, vec![0]);

    match result.into_result() {
        Err(AdRelayError::PartialFailure { status, message, failed_indices }) => {
            assert_eq!(status, 200);
            assert!(message.starts_with("The imported gclid could not be decoded."));
            assert_eq!(failed_indices, vec![0]);
        }
        other => panic!("expected partial failure, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_token_is_refreshed_and_request_replayed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "fresh", "expires_in": 3599 })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CLICK_UPLOAD_PATH))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CLICK_UPLOAD_PATH))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(1)))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry(&google_ads_config(&server.uri(), Some("1234567890")));
    seed_google_token(&registry, "stale").await;
    let pipeline = registry.get(CLICK_PIPELINE).unwrap();

    let result = pipeline.process(&click_event()).await.unwrap();
    assert!(result.is_success());
}

#[tokio::test]
async fn second_rejection_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CLICK_UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("token revoked"))
        .expect(2)
        .mount(&server)
        .await;

    let registry = registry(&google_ads_config(&server.uri(), Some("1234567890")));
    seed_google_token(&registry, "stale").await;
    let pipeline = registry.get(CLICK_PIPELINE).unwrap();

    match pipeline.process(&click_event()).await {
        Err(AdRelayError::Auth(msg)) => assert!(msg.contains("401")),
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn value_without_currency_is_validation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let registry = registry(&google_ads_config(&server.uri(), Some("1234567890")));
    let pipeline = registry.get(CLICK_PIPELINE).unwrap();

    let mut event = click_event();
    event.currency = None;

    assert_eq!(
        pipeline.process(&event).await.unwrap_err(),
        AdRelayError::Validation("Currency is required if value is set.".to_string())
    );
}
