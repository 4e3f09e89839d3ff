mod common;

use chrono::Duration;
use common::spawn_test_server;
use pluginshop_license::validate_license_key_format;
use pluginshop_server::api::{ActivationList, ActivationResponse, LicenseDetails};
use pluginshop_server::error::ErrorResponse;
use serde_json::{Value, json};

// ── Basics ───────────────────────────────────────────────────────

#[tokio::test]
async fn health_endpoint() {
    let srv = spawn_test_server().await;
    let resp = reqwest::get(srv.url("/api/v1/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn license_types_table() {
    let srv = spawn_test_server().await;
    let resp = reqwest::get(srv.url("/api/v1/license-types")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(body.len(), 3);
    assert_eq!(body[0]["type"], "single");
    assert_eq!(body[0]["maxActivations"], 1);
    assert_eq!(body[1]["maxActivations"], 5);
    assert_eq!(body[2]["type"], "enterprise");
    assert_eq!(body[2]["maxActivations"], -1);
    assert_eq!(body[2]["durationDays"], -1);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let srv = spawn_test_server().await;
    let resp = reqwest::get(srv.url("/api/v1/nonexistent")).await.unwrap();
    assert_eq!(resp.status(), 404);
}

// ── Issuance ─────────────────────────────────────────────────────

#[tokio::test]
async fn issue_license_returns_key_and_record() {
    let srv = spawn_test_server().await;
    let resp = srv
        .client
        .post(srv.url("/api/v1/licenses"))
        .json(&json!({ "productId": 7, "userId": "erin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let body: Value = resp.json().await.unwrap();
    let key = body["key"].as_str().unwrap();
    assert!(validate_license_key_format(key));
    assert_eq!(body["license"]["key"], key);
    assert_eq!(body["license"]["type"], "single");
    assert_eq!(body["license"]["maxActivations"], 1);
    assert_eq!(body["license"]["currentActivations"], 0);
}

#[tokio::test]
async fn issue_rejects_zero_product() {
    let srv = spawn_test_server().await;
    let resp = srv
        .client
        .post(srv.url("/api/v1/licenses"))
        .json(&json!({ "productId": 0, "userId": "erin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: ErrorResponse = resp.json().await.unwrap();
    assert_eq!(body.error, "Bad request");
    assert!(body.details.unwrap().contains("product id"));
}

#[tokio::test]
async fn issue_rejects_blank_user() {
    let srv = spawn_test_server().await;
    let resp = srv
        .client
        .post(srv.url("/api/v1/licenses"))
        .json(&json!({ "productId": 1, "userId": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn issue_rejects_malformed_body() {
    let srv = spawn_test_server().await;
    for body in [
        json!({ "productId": "seven", "userId": "erin" }),
        json!({ "productId": -1, "userId": "erin" }),
        json!({ "userId": "erin" }),
    ] {
        let resp = srv
            .client
            .post(srv.url("/api/v1/licenses"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "body: {body}");
        assert!(
            resp.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("application/json")
        );
        let err: ErrorResponse = resp.json().await.unwrap();
        assert_eq!(err.error, "Bad request");
        assert!(err.details.is_some());
    }
}

#[tokio::test]
async fn issue_rejects_non_json_body() {
    let srv = spawn_test_server().await;
    let resp = srv
        .client
        .post(srv.url("/api/v1/licenses"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let err: ErrorResponse = resp.json().await.unwrap();
    assert_eq!(err.error, "Bad request");
}

#[tokio::test]
async fn issued_keys_are_unique() {
    let srv = spawn_test_server().await;
    let mut keys = std::collections::HashSet::new();
    for _ in 0..20 {
        assert!(keys.insert(srv.issue("team").await));
    }
}

// ── Lookup ───────────────────────────────────────────────────────

#[tokio::test]
async fn get_license_details() {
    let srv = spawn_test_server().await;
    let key = srv.issue("team").await;

    let resp = reqwest::get(srv.url(&format!("/api/v1/licenses/{key}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: LicenseDetails = resp.json().await.unwrap();
    assert_eq!(body.license.key, key);
    assert_eq!(body.remaining_activations, Some(5));

    let raw: Value = serde_json::to_value(&body).unwrap();
    assert_eq!(raw["status"], "active");
}

#[tokio::test]
async fn get_unknown_license_is_404() {
    let srv = spawn_test_server().await;
    let resp = reqwest::get(srv.url("/api/v1/licenses/ZZZZ-ZZZZ-ZZZZ-ZZZZ"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn malformed_key_is_400() {
    let srv = spawn_test_server().await;
    let resp = reqwest::get(srv.url("/api/v1/licenses/abcd-1234-efgh-5678"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: ErrorResponse = resp.json().await.unwrap();
    assert!(body.details.unwrap().contains("invalid license key format"));
}

// ── Validation & activation ──────────────────────────────────────

#[tokio::test]
async fn fresh_license_validates() {
    let srv = spawn_test_server().await;
    let key = srv.issue("single").await;
    let body = srv.validate(&key).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["status"]["reason"], "valid");
}

#[tokio::test]
async fn single_license_exhaustion() {
    let srv = spawn_test_server().await;
    let key = srv.issue("single").await;

    let resp = srv.activate(&key, "MACHINE-A").await;
    assert_eq!(resp.status(), 201);
    let first: ActivationResponse = resp.json().await.unwrap();
    assert_eq!(first.activation.license_key, key);
    assert_eq!(first.activation.machine_id, "MACHINE-A");
    assert_eq!(first.activation.os_info, "unknown");

    let body = srv.validate(&key).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["status"]["reason"], "activationLimitReached");
    assert_eq!(body["status"]["maxActivations"], 1);

    let resp = srv.activate(&key, "MACHINE-B").await;
    assert_eq!(resp.status(), 409);
    let err: ErrorResponse = resp.json().await.unwrap();
    assert_eq!(err.error, "Conflict");
}

#[tokio::test]
async fn reactivating_same_machine_reuses_slot() {
    let srv = spawn_test_server().await;
    let key = srv.issue("single").await;

    let first: ActivationResponse = srv.activate(&key, "MACHINE-A").await.json().await.unwrap();
    srv.clock.advance(Duration::hours(3));
    let resp = srv.activate(&key, "MACHINE-A").await;
    assert_eq!(resp.status(), 201);
    let second: ActivationResponse = resp.json().await.unwrap();

    assert_eq!(first.activation.id, second.activation.id);
    assert_eq!(
        second.activation.last_seen,
        first.activation.last_seen + Duration::hours(3)
    );

    let details: LicenseDetails = reqwest::get(srv.url(&format!("/api/v1/licenses/{key}")))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(details.license.current_activations, 1);
}

#[tokio::test]
async fn team_license_mid_use() {
    let srv = spawn_test_server().await;
    let key = srv.issue("team").await;

    for i in 0..3 {
        assert_eq!(srv.activate(&key, &format!("M-{i}")).await.status(), 201);
    }
    assert_eq!(srv.validate(&key).await["valid"], true);

    for i in 3..5 {
        assert_eq!(srv.activate(&key, &format!("M-{i}")).await.status(), 201);
    }
    assert_eq!(srv.validate(&key).await["valid"], false);
    assert_eq!(srv.activate(&key, "M-5").await.status(), 409);
}

#[tokio::test]
async fn enterprise_license_has_no_limit() {
    let srv = spawn_test_server().await;
    let key = srv.issue("enterprise").await;
    for i in 0..25 {
        assert_eq!(srv.activate(&key, &format!("M-{i}")).await.status(), 201);
    }
    assert_eq!(srv.validate(&key).await["valid"], true);

    let details: Value = reqwest::get(srv.url(&format!("/api/v1/licenses/{key}")))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(details["remainingActivations"].is_null());
    assert_eq!(details["license"]["currentActivations"], 25);
}

#[tokio::test]
async fn activation_requires_machine_and_version() {
    let srv = spawn_test_server().await;
    let key = srv.issue("team").await;

    let resp = srv.activate(&key, "   ").await;
    assert_eq!(resp.status(), 400);

    let resp = srv
        .client
        .post(srv.url(&format!("/api/v1/licenses/{key}/activations")))
        .json(&json!({ "machineId": "M", "appVersion": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn activation_rejects_incomplete_body() {
    let srv = spawn_test_server().await;
    let key = srv.issue("team").await;
    let resp = srv
        .client
        .post(srv.url(&format!("/api/v1/licenses/{key}/activations")))
        .json(&json!({ "machineId": "M" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let err: ErrorResponse = resp.json().await.unwrap();
    assert_eq!(err.error, "Bad request");
    assert!(err.details.unwrap().contains("appVersion"));
}

#[tokio::test]
async fn activation_records_reported_platform() {
    let srv = spawn_test_server().await;
    let key = srv.issue("team").await;
    let resp = srv
        .client
        .post(srv.url(&format!("/api/v1/licenses/{key}/activations")))
        .json(&json!({ "machineId": "M", "appVersion": "2025.2", "osInfo": "Windows 11" }))
        .send()
        .await
        .unwrap();
    let body: ActivationResponse = resp.json().await.unwrap();
    assert_eq!(body.activation.os_info, "Windows 11");
    assert_eq!(body.activation.app_version, "2025.2");
}

#[tokio::test]
async fn activation_on_unknown_key_is_404() {
    let srv = spawn_test_server().await;
    let resp = srv.activate("ZZZZ-ZZZZ-ZZZZ-ZZZZ", "M").await;
    assert_eq!(resp.status(), 404);
}

// ── Expiry ───────────────────────────────────────────────────────

#[tokio::test]
async fn expired_license_flow() {
    let srv = spawn_test_server().await;
    let key = srv.issue("single").await;
    srv.clock.advance(Duration::days(366));

    let body = srv.validate(&key).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["status"]["reason"], "expired");

    let resp = srv.activate(&key, "MACHINE-A").await;
    assert_eq!(resp.status(), 403);

    let details: Value = reqwest::get(srv.url(&format!("/api/v1/licenses/{key}")))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(details["status"], "expired");
}

#[tokio::test]
async fn license_valid_on_last_day() {
    let srv = spawn_test_server().await;
    let key = srv.issue("team").await;
    srv.clock.advance(Duration::days(365));
    assert_eq!(srv.validate(&key).await["valid"], true);
    srv.clock.advance(Duration::milliseconds(1));
    assert_eq!(srv.validate(&key).await["valid"], false);
}

// ── Listing & deactivation ───────────────────────────────────────

#[tokio::test]
async fn list_and_deactivate() {
    let srv = spawn_test_server().await;
    let key = srv.issue("single").await;
    let act: ActivationResponse = srv.activate(&key, "MACHINE-A").await.json().await.unwrap();

    let list: ActivationList = reqwest::get(srv.url(&format!("/api/v1/licenses/{key}/activations")))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.activations.len(), 1);
    assert_eq!(list.activations[0].id, act.activation.id);

    let resp = srv
        .client
        .delete(srv.url(&format!(
            "/api/v1/licenses/{key}/activations/{}",
            act.activation.id
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let list: ActivationList = reqwest::get(srv.url(&format!("/api/v1/licenses/{key}/activations")))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list.activations.is_empty());

    // The freed slot can be used by another machine.
    assert_eq!(srv.activate(&key, "MACHINE-B").await.status(), 201);
}

#[tokio::test]
async fn deactivate_unknown_activation_is_404() {
    let srv = spawn_test_server().await;
    let key = srv.issue("team").await;
    let resp = srv
        .client
        .delete(srv.url(&format!(
            "/api/v1/licenses/{key}/activations/67e55044-10b1-426f-9247-bb680e5fe0c8"
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn deactivate_with_bad_id_is_400() {
    let srv = spawn_test_server().await;
    let key = srv.issue("team").await;
    let resp = srv
        .client
        .delete(srv.url(&format!("/api/v1/licenses/{key}/activations/not-a-uuid")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn list_activations_unknown_key_is_404() {
    let srv = spawn_test_server().await;
    let resp = reqwest::get(srv.url("/api/v1/licenses/ZZZZ-ZZZZ-ZZZZ-ZZZZ/activations"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
