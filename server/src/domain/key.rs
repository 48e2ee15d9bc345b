// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::device::DeviceId;
use crate::domain::role::RoleId;
use crate::domain::slot::SlotId;
use crate::domain::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId(pub Uuid);

impl KeyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for KeyId {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a key currently is: resident in a slot, or with a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustodyState {
    InStore,
    Taken,
}

impl CustodyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustodyState::InStore => "in_store",
            CustodyState::Taken => "taken",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_store" => Some(CustodyState::InStore),
            "taken" => Some(CustodyState::Taken),
            _ => None,
        }
    }
}

/// A physical key.
///
/// Invariant: `custody == InStore` exactly when `key_slot_id` is set. Every
/// constructor and transition below preserves this; the stores re-validate it
/// inside their atomic commits.
///
/// `last_user_id` / `last_device_id` record the most recent custody event.
/// They are informational only and never enforce anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Key {
    pub id: KeyId,
    /// Human-facing label stamped on the fob. Globally unique.
    pub key_number: String,
    pub custody: CustodyState,
    pub key_slot_id: Option<SlotId>,
    pub assigned_role_id: RoleId,
    pub last_user_id: Option<UserId>,
    pub last_device_id: Option<DeviceId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Key {
    /// A new key starts in the given slot.
    pub fn new(key_number: impl Into<String>, assigned_role_id: RoleId, slot_id: SlotId) -> Self {
        let now = Utc::now();
        Self {
            id: KeyId::new(),
            key_number: key_number.into(),
            custody: CustodyState::InStore,
            key_slot_id: Some(slot_id),
            assigned_role_id,
            last_user_id: None,
            last_device_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_taken(&self) -> bool {
        self.custody == CustodyState::Taken
    }

    /// TAKE: detach from the slot and hand to the user.
    pub fn take(&mut self, user: UserId, device: DeviceId, at: DateTime<Utc>) {
        self.custody = CustodyState::Taken;
        self.key_slot_id = None;
        self.last_user_id = Some(user);
        self.last_device_id = Some(device);
        self.updated_at = at;
    }

    /// RETURN: attach to the slot. `returned_by` falls back to the user who
    /// took the key when the returning tag could not be resolved.
    pub fn put_in_slot(
        &mut self,
        slot: SlotId,
        device: DeviceId,
        returned_by: Option<UserId>,
        at: DateTime<Utc>,
    ) {
        self.custody = CustodyState::InStore;
        self.key_slot_id = Some(slot);
        self.last_device_id = Some(device);
        if let Some(user) = returned_by {
            self.last_user_id = Some(user);
        }
        self.updated_at = at;
    }

    /// Admin reassignment of an in-store key to a different slot.
    pub fn move_to_slot(&mut self, slot: SlotId) {
        self.key_slot_id = Some(slot);
        self.updated_at = Utc::now();
    }
}

/// Partial update; each field is independently present-or-absent.
#[derive(Debug, Clone, Default)]
pub struct KeyUpdate {
    pub key_number: Option<String>,
    pub assigned_role_id: Option<RoleId>,
    pub key_slot_id: Option<SlotId>,
}
