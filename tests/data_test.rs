use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use media_relay_backend::config::UploadConfig;
use media_relay_backend::services::relay::{
    MediaKind, MediaRelay, RelayError, RelayOptions, RelayResult,
};
use media_relay_backend::services::stager::LocalStager;
use media_relay_backend::{AppState, create_app};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// The data endpoints never touch the relay; this double fails loudly if they do.
struct UnusedRelay;

#[async_trait]
impl MediaRelay for UnusedRelay {
    async fn relay(
        &self,
        _local_path: &Path,
        _kind: MediaKind,
        _opts: RelayOptions,
    ) -> Result<RelayResult, RelayError> {
        Err(RelayError::Rejected {
            message: "relay must not be called from data endpoints".to_string(),
        })
    }
}

fn test_app(scratch: &Path) -> axum::Router {
    let config = UploadConfig {
        scratch_dir: scratch.to_path_buf(),
        ..UploadConfig::default()
    };
    create_app(AppState {
        stager: Arc::new(LocalStager::new(
            scratch.to_path_buf(),
            config.max_upload_size,
        )),
        relay: Arc::new(UnusedRelay),
        config,
    })
}

async fn get_data(app: axum::Router) -> Value {
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/data")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn get_data_returns_five_fixed_records() {
    let scratch = TempDir::new().unwrap();
    let app = test_app(scratch.path());

    let json = get_data(app).await;
    let records = json.as_array().unwrap();

    assert_eq!(records.len(), 5);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record["id"], (i + 1) as u64);
    }
    assert_eq!(records[0]["name"], "John Doe");
    assert_eq!(records[0]["age"], 25);
    assert_eq!(records[4]["name"], "Pavithra");
}

#[tokio::test]
async fn get_data_is_stateless() {
    let scratch = TempDir::new().unwrap();
    let app = test_app(scratch.path());

    let first = get_data(app.clone()).await;
    let second = get_data(app).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn post_data_echoes_payload() {
    let scratch = TempDir::new().unwrap();
    let app = test_app(scratch.path());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/data")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"a":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let received: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(
        received,
        json!({
            "message": "Data received successfully",
            "receivedData": { "a": 1 },
        })
    );
}
