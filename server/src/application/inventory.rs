// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! Admin CRUD for devices, slots and keys.
//!
//! The occupancy link between keys and slots is guarded here for admin
//! mutations (create/move/delete); device-flow transitions go through the
//! custody store instead. Deletion guards are explicit: a device cannot go
//! while a slot of it holds a key, a slot cannot go while occupied.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::domain::device::{Device, DeviceId, DeviceUpdate};
use crate::domain::error::{Conflict, CoreError, Resource};
use crate::domain::key::{Key, KeyId, KeyUpdate};
use crate::domain::repository::{DeviceRepository, KeyRepository, RoleRepository, SlotRepository};
use crate::domain::role::RoleId;
use crate::domain::slot::{KeySlot, SlotId};

/// A slot joined with the number of the key it holds, for listings.
#[derive(Debug, Clone)]
pub struct SlotListing {
    pub slot: KeySlot,
    pub key_number: Option<String>,
}

/// A key joined with the device its slot belongs to, for listings.
#[derive(Debug, Clone)]
pub struct KeyListing {
    pub key: Key,
    pub device_id: Option<DeviceId>,
}

pub struct InventoryService {
    devices: Arc<dyn DeviceRepository>,
    slots: Arc<dyn SlotRepository>,
    keys: Arc<dyn KeyRepository>,
    roles: Arc<dyn RoleRepository>,
}

impl InventoryService {
    pub fn new(
        devices: Arc<dyn DeviceRepository>,
        slots: Arc<dyn SlotRepository>,
        keys: Arc<dyn KeyRepository>,
        roles: Arc<dyn RoleRepository>,
    ) -> Self {
        Self {
            devices,
            slots,
            keys,
            roles,
        }
    }

    // --- Devices ---

    pub async fn create_device(
        &self,
        ip_address: &str,
        auth_token: &str,
        timeout_seconds: i32,
    ) -> Result<Device, CoreError> {
        if auth_token.is_empty() {
            return Err(CoreError::BadRequest("auth_token"));
        }
        if self.devices.find_by_auth_token(auth_token).await?.is_some() {
            return Err(CoreError::Conflict(Conflict::TokenAlreadyUsed));
        }
        let device = Device::new(ip_address, auth_token, timeout_seconds);
        self.devices.save(&device).await?;
        info!(device = %device.id.0, "device created");
        Ok(device)
    }

    pub async fn update_device(
        &self,
        id: DeviceId,
        update: DeviceUpdate,
    ) -> Result<Device, CoreError> {
        let mut device = self
            .devices
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound(Resource::Device))?;
        if let Some(auth_token) = &update.auth_token {
            if let Some(existing) = self.devices.find_by_auth_token(auth_token).await? {
                if existing.id != id {
                    return Err(CoreError::Conflict(Conflict::TokenAlreadyUsed));
                }
            }
        }
        device.apply(update);
        self.devices.save(&device).await?;
        Ok(device)
    }

    /// Delete a device and its (necessarily empty) slots. Rejected while any
    /// slot of the device holds a key.
    pub async fn delete_device(&self, id: DeviceId) -> Result<(), CoreError> {
        self.devices
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound(Resource::Device))?;
        if self.slots.count_occupied(id).await? > 0 {
            return Err(CoreError::Conflict(Conflict::DeviceHoldsKeys));
        }
        for slot in self.slots.list_for_device(id).await? {
            self.slots.delete(slot.id).await?;
        }
        self.devices.delete(id).await?;
        info!(device = %id.0, "device deleted");
        Ok(())
    }

    pub async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
        self.devices.list_all().await
    }

    // --- Slots ---

    pub async fn create_slot(&self, device_id: DeviceId, number: i32) -> Result<KeySlot, CoreError> {
        self.devices
            .find_by_id(device_id)
            .await?
            .ok_or(CoreError::NotFound(Resource::Device))?;
        if self.slots.find_by_number(device_id, number).await?.is_some() {
            return Err(CoreError::Conflict(Conflict::SlotNumberAlreadyUsed));
        }
        let slot = KeySlot::new(number, device_id);
        self.slots.save(&slot).await?;
        info!(device = %device_id.0, number, "slot created");
        Ok(slot)
    }

    pub async fn set_slot_locked(&self, id: SlotId, locked: bool) -> Result<KeySlot, CoreError> {
        let mut slot = self
            .slots
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound(Resource::Slot))?;
        slot.set_locked(locked);
        self.slots.save(&slot).await?;
        Ok(slot)
    }

    pub async fn delete_slot(&self, id: SlotId) -> Result<(), CoreError> {
        self.slots
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound(Resource::Slot))?;
        if self.keys.find_by_slot(id).await?.is_some() {
            return Err(CoreError::Conflict(Conflict::SlotOccupied));
        }
        self.slots.delete(id).await?;
        info!(slot = %id.0, "slot deleted");
        Ok(())
    }

    pub async fn list_slots(&self) -> Result<Vec<SlotListing>, CoreError> {
        let occupants: HashMap<SlotId, String> = self
            .keys
            .list_all()
            .await?
            .into_iter()
            .filter_map(|key| key.key_slot_id.map(|slot| (slot, key.key_number)))
            .collect();
        Ok(self
            .slots
            .list_all()
            .await?
            .into_iter()
            .map(|slot| {
                let key_number = occupants.get(&slot.id).cloned();
                SlotListing { slot, key_number }
            })
            .collect())
    }

    // --- Keys ---

    /// A new key is born in store, inside an existing empty slot.
    pub async fn create_key(
        &self,
        key_number: &str,
        assigned_role_id: RoleId,
        slot_id: SlotId,
    ) -> Result<Key, CoreError> {
        if key_number.is_empty() {
            return Err(CoreError::BadRequest("key_number"));
        }
        if self.keys.find_by_number(key_number).await?.is_some() {
            return Err(CoreError::Conflict(Conflict::KeyNumberAlreadyUsed));
        }
        self.roles
            .find_by_id(assigned_role_id)
            .await?
            .ok_or(CoreError::NotFound(Resource::Role))?;
        self.slots
            .find_by_id(slot_id)
            .await?
            .ok_or(CoreError::NotFound(Resource::Slot))?;
        if self.keys.find_by_slot(slot_id).await?.is_some() {
            return Err(CoreError::Conflict(Conflict::SlotOccupied));
        }
        let key = Key::new(key_number, assigned_role_id, slot_id);
        self.keys.save(&key).await?;
        info!(key = %key.id.0, key_number, "key created");
        Ok(key)
    }

    pub async fn update_key(&self, id: KeyId, update: KeyUpdate) -> Result<Key, CoreError> {
        let mut key = self
            .keys
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound(Resource::Key))?;

        if let Some(number) = update.key_number {
            if number != key.key_number {
                if self.keys.find_by_number(&number).await?.is_some() {
                    return Err(CoreError::Conflict(Conflict::KeyNumberAlreadyUsed));
                }
                key.key_number = number;
            }
        }
        if let Some(role_id) = update.assigned_role_id {
            self.roles
                .find_by_id(role_id)
                .await?
                .ok_or(CoreError::NotFound(Resource::Role))?;
            key.assigned_role_id = role_id;
        }
        if let Some(slot_id) = update.key_slot_id {
            if Some(slot_id) != key.key_slot_id {
                // Only a stored key can be reseated; a taken key has no slot.
                if key.is_taken() {
                    return Err(CoreError::Conflict(Conflict::AlreadyTaken));
                }
                self.slots
                    .find_by_id(slot_id)
                    .await?
                    .ok_or(CoreError::NotFound(Resource::Slot))?;
                if let Some(occupant) = self.keys.find_by_slot(slot_id).await? {
                    if occupant.id != key.id {
                        return Err(CoreError::Conflict(Conflict::SlotOccupied));
                    }
                }
                key.move_to_slot(slot_id);
            }
        }

        self.keys.save(&key).await?;
        Ok(key)
    }

    /// Deleting a key frees its slot implicitly (occupancy lives on the key).
    pub async fn delete_key(&self, id: KeyId) -> Result<(), CoreError> {
        self.keys
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound(Resource::Key))?;
        self.keys.delete(id).await?;
        info!(key = %id.0, "key deleted");
        Ok(())
    }

    pub async fn list_keys(&self) -> Result<Vec<KeyListing>, CoreError> {
        let slot_devices: HashMap<SlotId, DeviceId> = self
            .slots
            .list_all()
            .await?
            .into_iter()
            .map(|slot| (slot.id, slot.device_id))
            .collect();
        Ok(self
            .keys
            .list_all()
            .await?
            .into_iter()
            .map(|key| {
                let device_id = key.key_slot_id.and_then(|slot| slot_devices.get(&slot).copied());
                KeyListing { key, device_id }
            })
            .collect())
    }
}
