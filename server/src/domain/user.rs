// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::role::RoleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// A person identified at a device by their NFC tag.
///
/// The device flow never mutates users; `Key::last_user` is the only
/// back-reference it touches, and that lives on the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Globally unique.
    pub nfc_tag: String,
    pub role_id: Option<RoleId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, nfc_tag: impl Into<String>, role_id: Option<RoleId>) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name: name.into(),
            nfc_tag: nfc_tag.into(),
            role_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: UserUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(nfc_tag) = update.nfc_tag {
            self.nfc_tag = nfc_tag;
        }
        if let Some(role_id) = update.role_id {
            self.role_id = Some(role_id);
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update; each field is independently present-or-absent.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub nfc_tag: Option<String>,
    pub role_id: Option<RoleId>,
}
