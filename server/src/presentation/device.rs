// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! Device-facing endpoints.
//!
//! The JSON field names and `errorCode` values are a firmware contract and
//! must not change: cabinets in the field match on them. Custody failures
//! come back as 400 with an `errorCode`, not as the admin-style 409.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::domain::device::DeviceId;
use crate::domain::error::{Conflict, CoreError, Resource};
use crate::domain::key::KeyId;
use crate::presentation::api::AppState;
use crate::presentation::auth::DeviceSession;
use crate::presentation::error::AdminError;

fn device_error(status: StatusCode, code: &str) -> Response {
    (
        status,
        Json(json!({ "status": "error", "errorCode": code })),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct InitRequest {
    pub device_id: String,
    pub auth_key: String,
}

pub async fn init(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InitRequest>,
) -> Response {
    let unauthorized =
        || (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response();

    let Ok(device_id) = DeviceId::from_string(&req.device_id) else {
        return unauthorized();
    };
    match state.sessions.authenticate_device(device_id, &req.auth_key).await {
        Ok(token) => Json(json!({ "token": token })).into_response(),
        Err(CoreError::Forbidden) => unauthorized(),
        Err(err) => AdminError(err).into_response(),
    }
}

#[derive(Deserialize)]
pub struct AuthCardRequest {
    #[serde(rename = "nfcId")]
    pub nfc_id: Option<String>,
}

pub async fn auth_card(
    State(state): State<Arc<AppState>>,
    DeviceSession(_): DeviceSession,
    Json(req): Json<AuthCardRequest>,
) -> Response {
    let error = || {
        (StatusCode::UNAUTHORIZED, Json(json!({ "status": "error" }))).into_response()
    };

    let Some(tag) = req.nfc_id.filter(|t| !t.is_empty()) else {
        return error();
    };
    match state.custody.validate_card(&tag).await {
        Ok(()) => Json(json!({ "status": "success" })).into_response(),
        Err(CoreError::NotFound(_)) => error(),
        Err(err) => AdminError(err).into_response(),
    }
}

#[derive(Deserialize)]
pub struct GetKeyRequest {
    pub number: Option<String>,
    #[serde(rename = "nfcId")]
    pub nfc_id: Option<String>,
}

pub async fn get_key(
    State(state): State<Arc<AppState>>,
    DeviceSession(device_id): DeviceSession,
    Json(req): Json<GetKeyRequest>,
) -> Response {
    let (Some(number), Some(nfc_id)) = (
        req.number.filter(|n| !n.is_empty()),
        req.nfc_id.filter(|n| !n.is_empty()),
    ) else {
        return device_error(StatusCode::BAD_REQUEST, "bad_request");
    };

    match state.custody.take_key(device_id, &number, &nfc_id).await {
        Ok(receipt) => Json(json!({
            "keySlotNumber": receipt.slot_number,
            "keyUuid": receipt.key_id.0,
        }))
        .into_response(),
        Err(CoreError::NotFound(_)) => device_error(StatusCode::BAD_REQUEST, "not_found"),
        Err(CoreError::Conflict(Conflict::AlreadyTaken)) => {
            device_error(StatusCode::BAD_REQUEST, "already_taken")
        }
        Err(CoreError::Forbidden) => device_error(StatusCode::UNAUTHORIZED, "no_access"),
        Err(err) => AdminError(err).into_response(),
    }
}

#[derive(Deserialize)]
pub struct ReturnKeyRequest {
    #[serde(rename = "keySlotNumber")]
    pub key_slot_number: Option<i32>,
    #[serde(rename = "keyUuid")]
    pub key_uuid: Option<String>,
    #[serde(rename = "nfcId")]
    pub nfc_id: Option<String>,
}

pub async fn return_key(
    State(state): State<Arc<AppState>>,
    DeviceSession(device_id): DeviceSession,
    Json(req): Json<ReturnKeyRequest>,
) -> Response {
    let (Some(slot_number), Some(key_uuid)) = (req.key_slot_number, req.key_uuid) else {
        return device_error(StatusCode::BAD_REQUEST, "bad_request");
    };
    let Ok(key_id) = KeyId::from_string(&key_uuid) else {
        return device_error(StatusCode::BAD_REQUEST, "key_not_found");
    };

    match state
        .custody
        .return_key(device_id, slot_number, key_id, req.nfc_id.as_deref())
        .await
    {
        Ok(()) => Json(json!({ "status": "success" })).into_response(),
        Err(CoreError::NotFound(Resource::Key)) => {
            device_error(StatusCode::BAD_REQUEST, "key_not_found")
        }
        Err(CoreError::NotFound(Resource::Slot)) => {
            device_error(StatusCode::NOT_FOUND, "key_slot_not_found")
        }
        Err(CoreError::Conflict(Conflict::AlreadyInStore)) => {
            device_error(StatusCode::BAD_REQUEST, "already_returned")
        }
        Err(CoreError::Conflict(Conflict::SlotOccupied)) => {
            device_error(StatusCode::BAD_REQUEST, "slot_occupied")
        }
        Err(err) => AdminError(err).into_response(),
    }
}

pub async fn get_empty_slot(
    State(state): State<Arc<AppState>>,
    DeviceSession(device_id): DeviceSession,
) -> Response {
    match state.custody.find_empty_slot(device_id).await {
        Ok(number) => Json(json!({ "status": "ok", "keySlotNumber": number })).into_response(),
        Err(CoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "error", "reason": "no empty slot" })),
        )
            .into_response(),
        Err(err) => AdminError(err).into_response(),
    }
}
