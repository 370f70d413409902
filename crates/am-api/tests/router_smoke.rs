use std::sync::Arc;

use axum::{body::Body, http::Request, http::StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use am_geocoder::{GeocodeCandidate, GeocodeError, Geocoder};

struct StubGeocoder {
    candidate: Option<GeocodeCandidate>,
}

#[async_trait::async_trait]
impl Geocoder for StubGeocoder {
    async fn best_match(&self, _query: &str) -> Result<Option<GeocodeCandidate>, GeocodeError> {
        Ok(self.candidate.clone())
    }
}

fn echo_geocoder(full_address: &str) -> Arc<dyn Geocoder> {
    Arc::new(StubGeocoder {
        candidate: Some(GeocodeCandidate {
            full_address: full_address.to_string(),
            coordinates: None,
        }),
    })
}

fn score_request(address: &str, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/addresses")
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder
        .body(Body::from(json!({ "address": address }).to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn livez_healthy_and_scoring_requires_auth_when_key_set() {
    let state = am_api::test_state(Some("test-key"), echo_geocoder("anywhere"));
    let app = am_api::create_router(state);

    let livez = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/livez")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(livez.status(), StatusCode::OK);

    let unauthorized = app
        .clone()
        .oneshot(score_request("10 Downing Street, London", None))
        .await
        .unwrap();
    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

    let authorized = app
        .oneshot(score_request("10 Downing Street, London", Some("test-key")))
        .await
        .unwrap();
    assert_eq!(authorized.status(), StatusCode::OK);
}

#[tokio::test]
async fn identical_candidate_is_auto_accepted() {
    let address = "10 Downing Street, London, SW1A 2AA, UK";
    let state = am_api::test_state(None, echo_geocoder(address));
    let app = am_api::create_router(state);

    let response = app.oneshot(score_request(address, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["matched_address"], address);
    assert_eq!(body["decision"], "auto_accept");
    assert_eq!(body["manual_review_required"], false);
    assert!(body["score"].as_f64().unwrap() > 0.85);
    assert!(body["breakdown"].as_object().unwrap().len() >= 3);
}

#[tokio::test]
async fn unrelated_candidate_goes_to_manual_review() {
    let state = am_api::test_state(None, echo_geocoder("350 Fifth Avenue, New York, NY 10118"));
    let app = am_api::create_router(state);

    let response = app
        .oneshot(score_request("Dąbrowskiego 5, 30-532 Kraków, Poland", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["decision"], "manual_review");
    assert_eq!(body["manual_review_required"], true);
}

#[tokio::test]
async fn missing_candidate_yields_zero_score_review() {
    let state = am_api::test_state(None, Arc::new(StubGeocoder { candidate: None }));
    let app = am_api::create_router(state);

    let response = app
        .oneshot(score_request("somewhere that does not geocode", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["matched_address"], Value::Null);
    assert_eq!(body["score"], 0.0);
    assert_eq!(body["decision"], "manual_review");
}

#[tokio::test]
async fn blank_address_is_rejected() {
    let state = am_api::test_state(None, echo_geocoder("anywhere"));
    let app = am_api::create_router(state);

    let response = app.oneshot(score_request("   ", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["code"], "bad_request");
}
