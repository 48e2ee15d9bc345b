// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub Uuid);

impl DeviceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new()
    }
}

/// A physical key cabinet on the network. Owns its key slots; deletion is
/// forbidden while any of them holds a key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub ip_address: String,
    /// Shared secret presented at `/device/init/`. Globally unique.
    pub auth_token: String,
    pub timeout_seconds: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    pub fn new(
        ip_address: impl Into<String>,
        auth_token: impl Into<String>,
        timeout_seconds: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DeviceId::new(),
            ip_address: ip_address.into(),
            auth_token: auth_token.into(),
            timeout_seconds,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: DeviceUpdate) {
        if let Some(ip_address) = update.ip_address {
            self.ip_address = ip_address;
        }
        if let Some(auth_token) = update.auth_token {
            self.auth_token = auth_token;
        }
        if let Some(timeout_seconds) = update.timeout_seconds {
            self.timeout_seconds = timeout_seconds;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update; each field is independently present-or-absent.
#[derive(Debug, Clone, Default)]
pub struct DeviceUpdate {
    pub ip_address: Option<String>,
    pub auth_token: Option<String>,
    pub timeout_seconds: Option<i32>,
}
