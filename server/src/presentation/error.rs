// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::domain::error::CoreError;

/// Admin-facing error response: `{"status":"error","reason":...}` with the
/// status code derived from the error kind. Internal detail never reaches
/// the body.
pub struct AdminError(pub CoreError);

impl From<CoreError> for AdminError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::Forbidden => StatusCode::FORBIDDEN,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let reason = match &self.0 {
            CoreError::Internal(detail) => {
                error!(%detail, "request failed");
                "internal error".to_string()
            }
            err => err.to_string(),
        };
        (status, Json(json!({ "status": "error", "reason": reason }))).into_response()
    }
}
