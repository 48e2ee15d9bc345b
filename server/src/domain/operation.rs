// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::device::DeviceId;
use crate::domain::key::KeyId;
use crate::domain::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    Take,
    Return,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Take => "take",
            OperationType::Return => "return",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "take" => Some(OperationType::Take),
            "return" => Some(OperationType::Return),
            _ => None,
        }
    }
}

/// One custody event in the append-only audit log. Written exactly once per
/// successful transition, inside the same transaction; never updated or
/// deleted afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Store-assigned, monotonically increasing.
    pub id: i64,
    pub user_id: Option<UserId>,
    pub key_id: KeyId,
    pub device_id: DeviceId,
    pub kind: OperationType,
    pub timestamp: DateTime<Utc>,
}

/// An operation joined with display fields for the audit listing. Referenced
/// entities may have been deleted since the event; the log row survives them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: i64,
    pub user_id: Option<UserId>,
    pub key_number: Option<String>,
    pub device_id: DeviceId,
    pub kind: OperationType,
    pub timestamp: DateTime<Utc>,
}

/// History filter; absent fields match everything.
#[derive(Debug, Clone, Default)]
pub struct OperationFilter {
    pub user_id: Option<UserId>,
    pub key_number: Option<String>,
    pub device_id: Option<DeviceId>,
}
