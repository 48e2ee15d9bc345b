// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! Bearer-token extractors for the two session kinds.
//!
//! A missing or non-Bearer `Authorization` header is 401; a header that is
//! present but fails verification is 403. The bodies match what the device
//! firmware expects.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::device::DeviceId;
use crate::presentation::api::AppState;

/// An authenticated device request; carries the device id from the token.
pub struct DeviceSession(pub DeviceId);

/// An authenticated admin request; carries the admin principal name.
pub struct AdminSession(pub String);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn missing_header() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Authorization header is missing" })),
    )
        .into_response()
}

fn invalid_token() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "Invalid or expired token" })),
    )
        .into_response()
}

impl FromRequestParts<Arc<AppState>> for DeviceSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(missing_header)?;
        let device_id = state
            .sessions
            .verify_device_token(token)
            .map_err(|_| invalid_token())?;
        Ok(DeviceSession(device_id))
    }
}

impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(missing_header)?;
        let admin_id = state
            .sessions
            .verify_admin_token(token)
            .map_err(|_| invalid_token())?;
        Ok(AdminSession(admin_id))
    }
}
