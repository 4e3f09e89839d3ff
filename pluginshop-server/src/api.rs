//! Request handlers and wire types.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use pluginshop_license::{
    Activation, ActivationId, LicenseKey, LicensePolicy, LicenseStatus, LicenseType, NewLicense,
    OperationalStatus, resolve_status,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{ApiError, Result};
use crate::extractors::Json as JsonBody;

/// `os_info` recorded when the client does not report one.
const UNKNOWN_PLATFORM: &str = "unknown";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueLicenseResponse {
    pub key: String,
    pub license: LicenseKey,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LicenseDetails {
    pub license: LicenseKey,
    pub status: OperationalStatus,
    /// Null when the license has no activation limit.
    pub remaining_activations: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ValidateResponse {
    pub valid: bool,
    pub status: LicenseStatus,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    pub machine_id: String,
    pub app_version: String,
    #[serde(default)]
    pub os_info: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ActivationResponse {
    pub activation: Activation,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ActivationList {
    pub activations: Vec<Activation>,
}

/// GET /api/v1/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /api/v1/license-types
pub async fn license_types() -> Json<Vec<LicensePolicy>> {
    Json(LicenseType::ALL.iter().map(LicenseType::policy).collect())
}

/// POST /api/v1/licenses
pub async fn issue_license(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewLicense>,
) -> Result<(StatusCode, Json<IssueLicenseResponse>)> {
    let license = state.store.issue(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(IssueLicenseResponse {
            key: license.key.clone(),
            license,
        }),
    ))
}

/// GET /api/v1/licenses/{key}
pub async fn get_license(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<LicenseDetails>> {
    let license = state.store.get(&key).await?;
    let status = resolve_status(&key, Some(&license), state.store.now());
    Ok(Json(LicenseDetails {
        remaining_activations: license.remaining_activations(),
        license,
        status,
    }))
}

/// POST /api/v1/licenses/{key}/validate
///
/// An unusable license is still a 200; the body says why.
pub async fn validate_license(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ValidateResponse>> {
    let status = state.store.validate(&key).await?;
    Ok(Json(ValidateResponse {
        valid: status.is_valid(),
        status,
    }))
}

/// POST /api/v1/licenses/{key}/activations
pub async fn activate(
    State(state): State<AppState>,
    Path(key): Path<String>,
    JsonBody(body): JsonBody<ActivateRequest>,
) -> Result<(StatusCode, Json<ActivationResponse>)> {
    if body.machine_id.trim().is_empty() {
        return Err(ApiError::BadRequest("machineId must not be empty".into()));
    }
    if body.app_version.trim().is_empty() {
        return Err(ApiError::BadRequest("appVersion must not be empty".into()));
    }

    let os_info = body.os_info.as_deref().unwrap_or(UNKNOWN_PLATFORM);
    let activation = state
        .store
        .activate(&key, &body.machine_id, &body.app_version, os_info)
        .await?;
    Ok((StatusCode::CREATED, Json(ActivationResponse { activation })))
}

/// GET /api/v1/licenses/{key}/activations
pub async fn list_activations(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ActivationList>> {
    let activations = state.store.list_activations(&key).await?;
    Ok(Json(ActivationList { activations }))
}

/// DELETE /api/v1/licenses/{key}/activations/{id}
pub async fn deactivate(
    State(state): State<AppState>,
    Path((key, id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let id: ActivationId = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid activation id: {e}")))?;
    state.store.deactivate(&key, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
