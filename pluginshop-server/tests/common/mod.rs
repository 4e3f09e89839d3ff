//! Shared helpers for server tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pluginshop_license::ManualClock;
use pluginshop_server::{AppState, build_router};
use serde_json::{Value, json};

/// 2023-11-14T22:13:20Z.
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
}

/// A running API on an OS-assigned port.
pub struct TestServer {
    pub base: String,
    pub clock: Arc<ManualClock>,
    pub state: AppState,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Issues a license and returns its key.
    pub async fn issue(&self, license_type: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/v1/licenses"))
            .json(&json!({
                "productId": 42,
                "userId": "user-1",
                "email": "buyer@example.com",
                "licenseType": license_type,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        body["key"].as_str().unwrap().to_string()
    }

    /// Activates `machine_id` under `key`, returning the raw response.
    pub async fn activate(&self, key: &str, machine_id: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/v1/licenses/{key}/activations")))
            .json(&json!({ "machineId": machine_id, "appVersion": "2024.1" }))
            .send()
            .await
            .unwrap()
    }

    /// Calls the validate endpoint and returns the JSON body.
    pub async fn validate(&self, key: &str) -> Value {
        let resp = self
            .client
            .post(self.url(&format!("/api/v1/licenses/{key}/validate")))
            .json(&json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }
}

/// Spin up the HTTP server with a manual clock at `fixed_now()`.
pub async fn spawn_test_server() -> TestServer {
    let clock = Arc::new(ManualClock::new(fixed_now()));
    let state = AppState::new(clock.clone());
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        clock,
        state,
        client: reqwest::Client::new(),
    }
}
