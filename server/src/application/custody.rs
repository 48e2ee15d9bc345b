// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! Device-facing custody use cases: card validation, TAKE, RETURN, slot
//! discovery. All checks run before any mutation; the mutation itself is a
//! single [`CustodyStore`] commit.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::domain::custody::{self, ReturnTransition, TakeTransition};
use crate::domain::device::DeviceId;
use crate::domain::error::{CoreError, Resource};
use crate::domain::key::KeyId;
use crate::domain::repository::{CustodyStore, KeyRepository, SlotRepository, UserRepository};

/// Returned to the device after a TAKE so it knows which lock to release.
#[derive(Debug, Clone)]
pub struct TakeReceipt {
    pub key_id: KeyId,
    pub slot_number: i32,
}

#[async_trait]
pub trait CustodyService: Send + Sync {
    /// Pure existence check for an NFC tag.
    async fn validate_card(&self, nfc_tag: &str) -> Result<(), CoreError>;

    /// TAKE: hand the key identified by `key_number` to the user identified
    /// by `nfc_tag`, at the calling device.
    async fn take_key(
        &self,
        device_id: DeviceId,
        key_number: &str,
        nfc_tag: &str,
    ) -> Result<TakeReceipt, CoreError>;

    /// RETURN: place the key into slot `slot_number` of the calling device.
    /// The tag is optional and resolved best-effort.
    async fn return_key(
        &self,
        device_id: DeviceId,
        slot_number: i32,
        key_id: KeyId,
        nfc_tag: Option<&str>,
    ) -> Result<(), CoreError>;

    /// Lowest-numbered empty slot on the calling device.
    async fn find_empty_slot(&self, device_id: DeviceId) -> Result<i32, CoreError>;
}

pub struct StandardCustodyService {
    users: Arc<dyn UserRepository>,
    keys: Arc<dyn KeyRepository>,
    slots: Arc<dyn SlotRepository>,
    custody: Arc<dyn CustodyStore>,
}

impl StandardCustodyService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        keys: Arc<dyn KeyRepository>,
        slots: Arc<dyn SlotRepository>,
        custody: Arc<dyn CustodyStore>,
    ) -> Self {
        Self {
            users,
            keys,
            slots,
            custody,
        }
    }
}

#[async_trait]
impl CustodyService for StandardCustodyService {
    async fn validate_card(&self, nfc_tag: &str) -> Result<(), CoreError> {
        self.users
            .find_by_nfc(nfc_tag)
            .await?
            .map(|_| ())
            .ok_or(CoreError::NotFound(Resource::User))
    }

    async fn take_key(
        &self,
        device_id: DeviceId,
        key_number: &str,
        nfc_tag: &str,
    ) -> Result<TakeReceipt, CoreError> {
        let user = self
            .users
            .find_by_nfc(nfc_tag)
            .await?
            .ok_or(CoreError::NotFound(Resource::User))?;
        let key = self
            .keys
            .find_by_number(key_number)
            .await?
            .ok_or(CoreError::NotFound(Resource::Key))?;

        if let Err(err) = custody::validate_take(&user, &key) {
            warn!(key_number, user = %user.id.0, %err, "take denied");
            return Err(err);
        }

        // The commit re-checks the key state under its own lock; a racing
        // TAKE that passed the pre-check above loses here with AlreadyTaken.
        let outcome = self
            .custody
            .commit_take(&TakeTransition {
                key_id: key.id,
                user_id: user.id,
                device_id,
                at: Utc::now(),
            })
            .await?;

        info!(
            key_number,
            user = %user.id.0,
            device = %device_id.0,
            slot = outcome.freed_slot_number,
            "key taken"
        );
        Ok(TakeReceipt {
            key_id: outcome.key_id,
            slot_number: outcome.freed_slot_number,
        })
    }

    async fn return_key(
        &self,
        device_id: DeviceId,
        slot_number: i32,
        key_id: KeyId,
        nfc_tag: Option<&str>,
    ) -> Result<(), CoreError> {
        let key = self
            .keys
            .find_by_id(key_id)
            .await?
            .ok_or(CoreError::NotFound(Resource::Key))?;
        let slot = self
            .slots
            .find_by_number(device_id, slot_number)
            .await?
            .ok_or(CoreError::NotFound(Resource::Slot))?;
        let occupant = self.keys.find_by_slot(slot.id).await?.map(|k| k.id);

        custody::validate_return(&key, &slot, occupant)?;

        // Best-effort: an unknown tag never fails the return, last_user then
        // stays whoever took the key.
        let returned_by = match nfc_tag {
            Some(tag) => self.users.find_by_nfc(tag).await?.map(|u| u.id),
            None => None,
        };

        self.custody
            .commit_return(&ReturnTransition {
                key_id: key.id,
                slot_id: slot.id,
                device_id,
                returned_by,
                at: Utc::now(),
            })
            .await?;

        info!(
            key_number = %key.key_number,
            device = %device_id.0,
            slot = slot_number,
            "key returned"
        );
        Ok(())
    }

    async fn find_empty_slot(&self, device_id: DeviceId) -> Result<i32, CoreError> {
        self.slots
            .first_empty(device_id)
            .await?
            .map(|slot| slot.number)
            .ok_or(CoreError::NotFound(Resource::Slot))
    }
}
