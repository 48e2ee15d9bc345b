// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! Admin endpoints: login, the operations log, and CRUD for devices, slots,
//! keys, users and roles. Everything except `/admin/login/` requires an
//! admin bearer token.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::device::{Device, DeviceId, DeviceUpdate};
use crate::domain::error::CoreError;
use crate::domain::key::{KeyId, KeyUpdate};
use crate::domain::operation::OperationFilter;
use crate::domain::role::{Role, RoleId};
use crate::domain::slot::SlotId;
use crate::domain::user::{UserId, UserUpdate};
use crate::presentation::api::AppState;
use crate::presentation::auth::AdminSession;
use crate::presentation::error::AdminError;

// --- Session ---

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Response {
    match state.sessions.admin_login(&req.username, &req.password) {
        Ok(token) => Json(json!({ "token": token })).into_response(),
        Err(CoreError::Forbidden) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response(),
        Err(err) => AdminError(err).into_response(),
    }
}

// --- Operations log ---

#[derive(Deserialize, Default)]
pub struct OperationsQuery {
    pub user_id: Option<Uuid>,
    pub key_number: Option<String>,
    pub device_id: Option<Uuid>,
}

pub async fn list_operations(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Query(query): Query<OperationsQuery>,
) -> Result<Json<Value>, AdminError> {
    let filter = OperationFilter {
        user_id: query.user_id.map(UserId),
        key_number: query.key_number,
        device_id: query.device_id.map(DeviceId),
    };
    let records = state.history.list_operations(&filter).await?;
    let body: Vec<Value> = records
        .iter()
        .map(|op| {
            json!({
                "id": op.id,
                "user_id": op.user_id.map(|u| u.0),
                "key_number": op.key_number,
                "device_id": op.device_id.0,
                "type": op.kind.as_str(),
                "timestamp": op.timestamp.to_rfc3339(),
            })
        })
        .collect();
    Ok(Json(Value::Array(body)))
}

// --- Devices ---

fn device_json(device: &Device) -> Value {
    json!({
        "id": device.id.0,
        "ip_address": device.ip_address,
        "auth_token": device.auth_token,
        "timeout": device.timeout_seconds,
        "created_at": device.created_at.to_rfc3339(),
        "updated_at": device.updated_at.to_rfc3339(),
    })
}

#[derive(Deserialize)]
pub struct CreateDeviceRequest {
    pub ip_address: Option<String>,
    pub auth_token: Option<String>,
    pub timeout: Option<i32>,
}

pub async fn create_device(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Json(req): Json<CreateDeviceRequest>,
) -> Result<Json<Value>, AdminError> {
    let ip_address = req.ip_address.ok_or(CoreError::BadRequest("ip_address"))?;
    let auth_token = req.auth_token.ok_or(CoreError::BadRequest("auth_token"))?;
    let timeout = req.timeout.ok_or(CoreError::BadRequest("timeout"))?;
    let device = state
        .inventory
        .create_device(&ip_address, &auth_token, timeout)
        .await?;
    Ok(Json(json!({ "status": "ok", "device": device_json(&device) })))
}

#[derive(Deserialize)]
pub struct UpdateDeviceRequest {
    pub ip_address: Option<String>,
    pub auth_token: Option<String>,
    pub timeout: Option<i32>,
}

pub async fn update_device(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDeviceRequest>,
) -> Result<Json<Value>, AdminError> {
    let update = DeviceUpdate {
        ip_address: req.ip_address,
        auth_token: req.auth_token,
        timeout_seconds: req.timeout,
    };
    let device = state.inventory.update_device(DeviceId(id), update).await?;
    Ok(Json(json!({ "status": "ok", "device": device_json(&device) })))
}

pub async fn delete_device(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AdminError> {
    state.inventory.delete_device(DeviceId(id)).await?;
    Ok(Json(json!({ "status": "ok", "message": format!("device {id} deleted") })))
}

pub async fn list_devices(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
) -> Result<Json<Value>, AdminError> {
    let devices = state.inventory.list_devices().await?;
    let body: Vec<Value> = devices.iter().map(device_json).collect();
    Ok(Json(json!({ "devices": body })))
}

// --- Slots ---

#[derive(Deserialize)]
pub struct CreateSlotRequest {
    pub slot_number: Option<i32>,
    pub device_id: Option<Uuid>,
}

pub async fn create_slot(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Json(req): Json<CreateSlotRequest>,
) -> Result<Json<Value>, AdminError> {
    let number = req.slot_number.ok_or(CoreError::BadRequest("slot_number"))?;
    let device_id = req.device_id.ok_or(CoreError::BadRequest("device_id"))?;
    let slot = state
        .inventory
        .create_slot(DeviceId(device_id), number)
        .await?;
    Ok(Json(json!({
        "status": "ok",
        "slot": {
            "slot_id": slot.id.0,
            "slot_number": slot.number,
            "is_locked": slot.is_locked,
            "device_id": slot.device_id.0,
        }
    })))
}

#[derive(Deserialize)]
pub struct UpdateSlotRequest {
    pub is_locked: Option<bool>,
}

pub async fn update_slot(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSlotRequest>,
) -> Result<Json<Value>, AdminError> {
    let locked = req.is_locked.ok_or(CoreError::BadRequest("is_locked"))?;
    let slot = state.inventory.set_slot_locked(SlotId(id), locked).await?;
    Ok(Json(json!({
        "status": "ok",
        "slot": {
            "slot_id": slot.id.0,
            "slot_number": slot.number,
            "is_locked": slot.is_locked,
            "device_id": slot.device_id.0,
        }
    })))
}

pub async fn delete_slot(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AdminError> {
    state.inventory.delete_slot(SlotId(id)).await?;
    Ok(Json(json!({ "status": "ok", "message": format!("slot {id} deleted") })))
}

pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
) -> Result<Json<Value>, AdminError> {
    let listings = state.inventory.list_slots().await?;
    let body: Vec<Value> = listings
        .iter()
        .map(|l| {
            json!({
                "slot_id": l.slot.id.0,
                "slot_number": l.slot.number,
                "is_locked": l.slot.is_locked,
                "device_id": l.slot.device_id.0,
                "key_number": l.key_number,
            })
        })
        .collect();
    Ok(Json(Value::Array(body)))
}

// --- Keys ---

#[derive(Deserialize)]
pub struct CreateKeyRequest {
    pub key_number: Option<String>,
    pub assigned_role_id: Option<Uuid>,
    pub key_slot_id: Option<Uuid>,
}

pub async fn create_key(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Json(req): Json<CreateKeyRequest>,
) -> Result<Json<Value>, AdminError> {
    let key_number = req.key_number.ok_or(CoreError::BadRequest("key_number"))?;
    let role_id = req
        .assigned_role_id
        .ok_or(CoreError::BadRequest("assigned_role_id"))?;
    let slot_id = req
        .key_slot_id
        .ok_or(CoreError::BadRequest("key_slot_id"))?;
    let key = state
        .inventory
        .create_key(&key_number, RoleId(role_id), SlotId(slot_id))
        .await?;
    Ok(Json(json!({
        "status": "ok",
        "key": {
            "id": key.id.0,
            "key_number": key.key_number,
            "assigned_role_id": key.assigned_role_id.0,
            "key_slot_id": key.key_slot_id.map(|s| s.0),
        }
    })))
}

#[derive(Deserialize)]
pub struct UpdateKeyRequest {
    pub key_number: Option<String>,
    pub assigned_role_id: Option<Uuid>,
    pub key_slot_id: Option<Uuid>,
}

pub async fn update_key(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateKeyRequest>,
) -> Result<Json<Value>, AdminError> {
    let update = KeyUpdate {
        key_number: req.key_number,
        assigned_role_id: req.assigned_role_id.map(RoleId),
        key_slot_id: req.key_slot_id.map(SlotId),
    };
    let key = state.inventory.update_key(KeyId(id), update).await?;
    Ok(Json(json!({
        "status": "ok",
        "key": {
            "id": key.id.0,
            "key_number": key.key_number,
            "assigned_role_id": key.assigned_role_id.0,
            "key_slot_id": key.key_slot_id.map(|s| s.0),
        }
    })))
}

pub async fn delete_key(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AdminError> {
    state.inventory.delete_key(KeyId(id)).await?;
    Ok(Json(json!({ "status": "ok", "message": format!("key {id} deleted") })))
}

pub async fn list_keys(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
) -> Result<Json<Value>, AdminError> {
    let listings = state.inventory.list_keys().await?;
    let body: Vec<Value> = listings
        .iter()
        .map(|l| {
            json!({
                "id": l.key.id.0,
                "key_number": l.key.key_number,
                "is_taken": l.key.is_taken(),
                "key_slot_id": l.key.key_slot_id.map(|s| s.0),
                "assigned_role_id": l.key.assigned_role_id.0,
                "device_id": l.device_id.map(|d| d.0),
                "created_at": l.key.created_at.to_rfc3339(),
                "updated_at": l.key.updated_at.to_rfc3339(),
            })
        })
        .collect();
    Ok(Json(Value::Array(body)))
}

// --- Users ---

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub nfc_tag: Option<String>,
    pub role_id: Option<Uuid>,
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<Value>, AdminError> {
    let name = req.name.ok_or(CoreError::BadRequest("name"))?;
    let nfc_tag = req.nfc_tag.ok_or(CoreError::BadRequest("nfc_tag"))?;
    let role_id = RoleId(req.role_id.ok_or(CoreError::BadRequest("role_id"))?);
    let user = state.directory.create_user(&name, &nfc_tag, role_id).await?;
    let role_name = state.directory.role_name(role_id).await?;
    Ok(Json(json!({
        "status": "ok",
        "user": {
            "id": user.id.0,
            "name": user.name,
            "nfc_tag": user.nfc_tag,
            "role": role_name,
            "created_at": user.created_at.to_rfc3339(),
        }
    })))
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub nfc_tag: Option<String>,
    pub role_id: Option<Uuid>,
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<Value>, AdminError> {
    let update = UserUpdate {
        name: req.name,
        nfc_tag: req.nfc_tag,
        role_id: req.role_id.map(RoleId),
    };
    let user = state.directory.update_user(UserId(id), update).await?;
    let role_name = match user.role_id {
        Some(role_id) => state.directory.role_name(role_id).await?,
        None => None,
    };
    Ok(Json(json!({
        "status": "ok",
        "user": {
            "id": user.id.0,
            "name": user.name,
            "nfc_tag": user.nfc_tag,
            "role": role_name,
            "updated_at": user.updated_at.to_rfc3339(),
        }
    })))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AdminError> {
    state.directory.delete_user(UserId(id)).await?;
    Ok(Json(json!({ "status": "ok", "message": format!("user {id} deleted") })))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
) -> Result<Json<Value>, AdminError> {
    let listings = state.directory.list_users().await?;
    let body: Vec<Value> = listings
        .iter()
        .map(|l| {
            json!({
                "id": l.user.id.0,
                "name": l.user.name,
                "nfc_tag": l.user.nfc_tag,
                "role_id": l.user.role_id.map(|r| r.0),
                "role_name": l.role_name,
            })
        })
        .collect();
    Ok(Json(Value::Array(body)))
}

// --- Roles ---

fn role_json(role: &Role) -> Value {
    json!({ "id": role.id.0, "name": role.name })
}

#[derive(Deserialize)]
pub struct RoleRequest {
    pub name: Option<String>,
}

pub async fn create_role(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Json(req): Json<RoleRequest>,
) -> Result<impl IntoResponse, AdminError> {
    let name = req.name.ok_or(CoreError::BadRequest("name"))?;
    let role = state.directory.create_role(&name).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "ok", "role": role_json(&role) })),
    ))
}

pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
) -> Result<Json<Value>, AdminError> {
    let roles = state.directory.list_roles().await?;
    let body: Vec<Value> = roles.iter().map(role_json).collect();
    Ok(Json(Value::Array(body)))
}

pub async fn update_role(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Path(id): Path<Uuid>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<Value>, AdminError> {
    let name = req.name.ok_or(CoreError::BadRequest("name"))?;
    let role = state.directory.rename_role(RoleId(id), &name).await?;
    Ok(Json(json!({ "status": "ok", "role": role_json(&role) })))
}

pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    AdminSession(_): AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AdminError> {
    state.directory.delete_role(RoleId(id)).await?;
    Ok(Json(json!({ "status": "ok", "message": format!("role {id} deleted") })))
}
