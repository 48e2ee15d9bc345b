// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::device::DeviceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(pub Uuid);

impl SlotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::new()
    }
}

/// A numbered compartment on a device. `number` is unique within the owning
/// device, not globally. Occupancy is recorded on the key side
/// (`Key::key_slot_id`); a slot with no key pointing at it is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySlot {
    pub id: SlotId,
    pub number: i32,
    pub is_locked: bool,
    pub device_id: DeviceId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KeySlot {
    pub fn new(number: i32, device_id: DeviceId) -> Self {
        let now = Utc::now();
        Self {
            id: SlotId::new(),
            number,
            is_locked: false,
            device_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.is_locked = locked;
        self.updated_at = Utc::now();
    }
}
