// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! Core error kinds shared by services and repositories.
//!
//! Every failure surfaced to a caller is one of five kinds; transports map
//! them to status codes, never the other way around. Storage failures are
//! collapsed into `Internal` so backend detail never leaks past the boundary.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Role,
    User,
    Device,
    Slot,
    Key,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Role => "role",
            Resource::User => "user",
            Resource::Device => "device",
            Resource::Slot => "key slot",
            Resource::Key => "key",
        };
        f.write_str(name)
    }
}

/// A state invariant that would be violated by the requested change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    AlreadyTaken,
    AlreadyInStore,
    SlotOccupied,
    TokenAlreadyUsed,
    RoleAlreadyExists,
    RoleInUse,
    NfcTagAlreadyInUse,
    KeyNumberAlreadyUsed,
    SlotNumberAlreadyUsed,
    DeviceHoldsKeys,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Conflict::AlreadyTaken => "key is already taken",
            Conflict::AlreadyInStore => "key is already in store",
            Conflict::SlotOccupied => "slot is locked or occupied",
            Conflict::TokenAlreadyUsed => "auth token already used",
            Conflict::RoleAlreadyExists => "role already exists",
            Conflict::RoleInUse => "role is assigned to users or keys and cannot be deleted",
            Conflict::NfcTagAlreadyInUse => "NFC tag already in use",
            Conflict::KeyNumberAlreadyUsed => "key number already exists",
            Conflict::SlotNumberAlreadyUsed => "slot number already exists for this device",
            Conflict::DeviceHoldsKeys => {
                "device contains keys in its slots; remove them before deletion"
            }
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("missing or malformed field: {0}")]
    BadRequest(&'static str),

    #[error("{0} not found")]
    NotFound(Resource),

    #[error("{0}")]
    Conflict(Conflict),

    #[error("access denied")]
    Forbidden,

    #[error("storage failure: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        CoreError::Internal(err.to_string())
    }
}
