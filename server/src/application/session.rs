// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! Device and admin session gate.
//!
//! Devices authenticate once with their id and shared auth token and receive
//! a short-lived HS256 bearer token carrying the device id; every subsequent
//! device call presents it. The single admin principal logs in with
//! username/password and receives a longer-lived admin token. Verification
//! failures are always surfaced as `Forbidden` without detail.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::device::DeviceId;
use crate::domain::error::CoreError;
use crate::domain::repository::DeviceRepository;

const DEVICE_TOKEN_TTL_MINUTES: i64 = 60;
const ADMIN_TOKEN_TTL_HOURS: i64 = 6;

#[derive(Debug, Serialize, Deserialize)]
struct DeviceClaims {
    device_id: Uuid,
    exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct AdminClaims {
    admin_id: String,
    exp: i64,
}

pub struct SessionGate {
    devices: Arc<dyn DeviceRepository>,
    device_encoding: EncodingKey,
    device_decoding: DecodingKey,
    admin_encoding: EncodingKey,
    admin_decoding: DecodingKey,
    admin_username: String,
    admin_password: String,
}

impl SessionGate {
    pub fn new(devices: Arc<dyn DeviceRepository>, config: &AppConfig) -> Self {
        Self {
            devices,
            device_encoding: EncodingKey::from_secret(config.device_token_secret.as_bytes()),
            device_decoding: DecodingKey::from_secret(config.device_token_secret.as_bytes()),
            admin_encoding: EncodingKey::from_secret(config.admin_token_secret.as_bytes()),
            admin_decoding: DecodingKey::from_secret(config.admin_token_secret.as_bytes()),
            admin_username: config.admin_username.clone(),
            admin_password: config.admin_password.clone(),
        }
    }

    /// `/device/init/`: both the device id and its auth token must match.
    pub async fn authenticate_device(
        &self,
        device_id: DeviceId,
        auth_key: &str,
    ) -> Result<String, CoreError> {
        let device = self
            .devices
            .find_by_credentials(device_id, auth_key)
            .await?
            .ok_or_else(|| {
                warn!(device = %device_id.0, "device authentication failed");
                CoreError::Forbidden
            })?;

        let claims = DeviceClaims {
            device_id: device.id.0,
            exp: (Utc::now() + Duration::minutes(DEVICE_TOKEN_TTL_MINUTES)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.device_encoding)
            .map_err(|err| CoreError::Internal(err.to_string()))
    }

    pub fn verify_device_token(&self, token: &str) -> Result<DeviceId, CoreError> {
        let data = decode::<DeviceClaims>(token, &self.device_decoding, &Validation::default())
            .map_err(|_| CoreError::Forbidden)?;
        Ok(DeviceId(data.claims.device_id))
    }

    pub fn admin_login(&self, username: &str, password: &str) -> Result<String, CoreError> {
        if username != self.admin_username || password != self.admin_password {
            warn!(username, "admin login failed");
            return Err(CoreError::Forbidden);
        }
        let claims = AdminClaims {
            admin_id: self.admin_username.clone(),
            exp: (Utc::now() + Duration::hours(ADMIN_TOKEN_TTL_HOURS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.admin_encoding)
            .map_err(|err| CoreError::Internal(err.to_string()))
    }

    pub fn verify_admin_token(&self, token: &str) -> Result<String, CoreError> {
        let data = decode::<AdminClaims>(token, &self.admin_decoding, &Validation::default())
            .map_err(|_| CoreError::Forbidden)?;
        Ok(data.claims.admin_id)
    }
}
