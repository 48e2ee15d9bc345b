// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! Persistence contracts, one repository per aggregate root.
//!
//! Interfaces live in the domain layer and are implemented in
//! `crate::infrastructure::repositories`: in-memory for development and
//! tests, PostgreSQL for production. The backend is selected at startup from
//! `AppConfig`.
//!
//! [`CustodyStore`] is the one transactional contract: `commit_take` and
//! `commit_return` apply a whole custody transition — entity mutation plus
//! the appended `Operation` row — as a single atomic unit, re-validating the
//! state checks under their own lock so concurrent transitions serialize.

use async_trait::async_trait;

use crate::domain::custody::{ReturnTransition, TakeOutcome, TakeTransition};
use crate::domain::device::{Device, DeviceId};
use crate::domain::error::CoreError;
use crate::domain::key::{Key, KeyId};
use crate::domain::operation::{OperationFilter, OperationRecord};
use crate::domain::role::{Role, RoleId};
use crate::domain::slot::{KeySlot, SlotId};
use crate::domain::user::{User, UserId};

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Save role (create or update).
    async fn save(&self, role: &Role) -> Result<(), CoreError>;

    async fn find_by_id(&self, id: RoleId) -> Result<Option<Role>, CoreError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, CoreError>;

    async fn list_all(&self) -> Result<Vec<Role>, CoreError>;

    async fn delete(&self, id: RoleId) -> Result<(), CoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Save user (create or update).
    async fn save(&self, user: &User) -> Result<(), CoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, CoreError>;

    async fn find_by_nfc(&self, nfc_tag: &str) -> Result<Option<User>, CoreError>;

    async fn list_all(&self) -> Result<Vec<User>, CoreError>;

    async fn delete(&self, id: UserId) -> Result<(), CoreError>;

    /// How many users reference the role (role deletion guard).
    async fn count_with_role(&self, role_id: RoleId) -> Result<u64, CoreError>;
}

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Save device (create or update).
    async fn save(&self, device: &Device) -> Result<(), CoreError>;

    async fn find_by_id(&self, id: DeviceId) -> Result<Option<Device>, CoreError>;

    /// Lookup for `/device/init/`: id and auth token must both match.
    async fn find_by_credentials(
        &self,
        id: DeviceId,
        auth_token: &str,
    ) -> Result<Option<Device>, CoreError>;

    async fn find_by_auth_token(&self, auth_token: &str) -> Result<Option<Device>, CoreError>;

    async fn list_all(&self) -> Result<Vec<Device>, CoreError>;

    async fn delete(&self, id: DeviceId) -> Result<(), CoreError>;
}

#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Save slot (create or update).
    async fn save(&self, slot: &KeySlot) -> Result<(), CoreError>;

    async fn find_by_id(&self, id: SlotId) -> Result<Option<KeySlot>, CoreError>;

    /// Slot numbers are scoped per device.
    async fn find_by_number(
        &self,
        device_id: DeviceId,
        number: i32,
    ) -> Result<Option<KeySlot>, CoreError>;

    async fn list_all(&self) -> Result<Vec<KeySlot>, CoreError>;

    async fn list_for_device(&self, device_id: DeviceId) -> Result<Vec<KeySlot>, CoreError>;

    /// Slot allocator: the empty slot with the lowest number on the device.
    async fn first_empty(&self, device_id: DeviceId) -> Result<Option<KeySlot>, CoreError>;

    /// How many slots of the device hold a key (device deletion guard).
    async fn count_occupied(&self, device_id: DeviceId) -> Result<u64, CoreError>;

    async fn delete(&self, id: SlotId) -> Result<(), CoreError>;
}

#[async_trait]
pub trait KeyRepository: Send + Sync {
    /// Save key (create or update).
    async fn save(&self, key: &Key) -> Result<(), CoreError>;

    async fn find_by_id(&self, id: KeyId) -> Result<Option<Key>, CoreError>;

    async fn find_by_number(&self, key_number: &str) -> Result<Option<Key>, CoreError>;

    /// The key occupying the slot, if any.
    async fn find_by_slot(&self, slot_id: SlotId) -> Result<Option<Key>, CoreError>;

    async fn list_all(&self) -> Result<Vec<Key>, CoreError>;

    async fn delete(&self, id: KeyId) -> Result<(), CoreError>;

    /// How many keys are assigned to the role (role deletion guard).
    async fn count_assigned_to_role(&self, role_id: RoleId) -> Result<u64, CoreError>;
}

#[async_trait]
pub trait OperationRepository: Send + Sync {
    /// Audit listing, newest first. Rows are only ever written by
    /// [`CustodyStore`] commits.
    async fn list(&self, filter: &OperationFilter) -> Result<Vec<OperationRecord>, CoreError>;
}

/// Atomic application of custody transitions.
///
/// Both commits re-check the correctness-critical branches (`AlreadyTaken`,
/// `AlreadyInStore`, `SlotOccupied`) inside the same lock/transaction that
/// performs the mutation and appends the `Operation` row. A failed commit
/// leaves no partial state.
#[async_trait]
pub trait CustodyStore: Send + Sync {
    async fn commit_take(&self, transition: &TakeTransition) -> Result<TakeOutcome, CoreError>;

    async fn commit_return(&self, transition: &ReturnTransition) -> Result<(), CoreError>;
}
