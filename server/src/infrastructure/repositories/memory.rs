// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! In-memory store, used for development (`KEYBOX_STORE=memory`) and tests.
//!
//! One mutex over the whole state: every repository call and, crucially,
//! every custody commit runs under the same lock, so commits are atomic and
//! concurrent transitions serialize exactly as they do against Postgres row
//! locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::custody::{ReturnTransition, TakeOutcome, TakeTransition};
use crate::domain::device::{Device, DeviceId};
use crate::domain::error::{Conflict, CoreError, Resource};
use crate::domain::key::{Key, KeyId};
use crate::domain::operation::{Operation, OperationFilter, OperationRecord, OperationType};
use crate::domain::repository::{
    CustodyStore, DeviceRepository, KeyRepository, OperationRepository, RoleRepository,
    SlotRepository, UserRepository,
};
use crate::domain::role::{Role, RoleId};
use crate::domain::slot::{KeySlot, SlotId};
use crate::domain::user::{User, UserId};

#[derive(Default)]
struct StoreInner {
    roles: HashMap<RoleId, Role>,
    users: HashMap<UserId, User>,
    devices: HashMap<DeviceId, Device>,
    slots: HashMap<SlotId, KeySlot>,
    keys: HashMap<KeyId, Key>,
    operations: Vec<Operation>,
    next_operation_id: i64,
}

impl StoreInner {
    fn occupant_of(&self, slot_id: SlotId) -> Option<&Key> {
        self.keys.values().find(|key| key.key_slot_id == Some(slot_id))
    }

    fn append_operation(
        &mut self,
        user_id: Option<UserId>,
        key_id: KeyId,
        device_id: DeviceId,
        kind: OperationType,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) {
        self.next_operation_id += 1;
        self.operations.push(Operation {
            id: self.next_operation_id,
            user_id,
            key_id,
            device_id,
            kind,
            timestamp,
        });
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, CoreError> {
        self.inner
            .lock()
            .map_err(|_| CoreError::Internal("store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl RoleRepository for InMemoryStore {
    async fn save(&self, role: &Role) -> Result<(), CoreError> {
        self.lock()?.roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: RoleId) -> Result<Option<Role>, CoreError> {
        Ok(self.lock()?.roles.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, CoreError> {
        Ok(self.lock()?.roles.values().find(|r| r.name == name).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Role>, CoreError> {
        let mut roles: Vec<Role> = self.lock()?.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn delete(&self, id: RoleId) -> Result<(), CoreError> {
        self.lock()?.roles.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn save(&self, user: &User) -> Result<(), CoreError> {
        self.lock()?.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, CoreError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_by_nfc(&self, nfc_tag: &str) -> Result<Option<User>, CoreError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.nfc_tag == nfc_tag)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, CoreError> {
        let mut users: Vec<User> = self.lock()?.users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn delete(&self, id: UserId) -> Result<(), CoreError> {
        self.lock()?.users.remove(&id);
        Ok(())
    }

    async fn count_with_role(&self, role_id: RoleId) -> Result<u64, CoreError> {
        Ok(self
            .lock()?
            .users
            .values()
            .filter(|u| u.role_id == Some(role_id))
            .count() as u64)
    }
}

#[async_trait]
impl DeviceRepository for InMemoryStore {
    async fn save(&self, device: &Device) -> Result<(), CoreError> {
        self.lock()?.devices.insert(device.id, device.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: DeviceId) -> Result<Option<Device>, CoreError> {
        Ok(self.lock()?.devices.get(&id).cloned())
    }

    async fn find_by_credentials(
        &self,
        id: DeviceId,
        auth_token: &str,
    ) -> Result<Option<Device>, CoreError> {
        Ok(self
            .lock()?
            .devices
            .get(&id)
            .filter(|d| d.auth_token == auth_token)
            .cloned())
    }

    async fn find_by_auth_token(&self, auth_token: &str) -> Result<Option<Device>, CoreError> {
        Ok(self
            .lock()?
            .devices
            .values()
            .find(|d| d.auth_token == auth_token)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Device>, CoreError> {
        let mut devices: Vec<Device> = self.lock()?.devices.values().cloned().collect();
        devices.sort_by_key(|d| d.created_at);
        Ok(devices)
    }

    async fn delete(&self, id: DeviceId) -> Result<(), CoreError> {
        self.lock()?.devices.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl SlotRepository for InMemoryStore {
    async fn save(&self, slot: &KeySlot) -> Result<(), CoreError> {
        self.lock()?.slots.insert(slot.id, slot.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: SlotId) -> Result<Option<KeySlot>, CoreError> {
        Ok(self.lock()?.slots.get(&id).cloned())
    }

    async fn find_by_number(
        &self,
        device_id: DeviceId,
        number: i32,
    ) -> Result<Option<KeySlot>, CoreError> {
        Ok(self
            .lock()?
            .slots
            .values()
            .find(|s| s.device_id == device_id && s.number == number)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<KeySlot>, CoreError> {
        let mut slots: Vec<KeySlot> = self.lock()?.slots.values().cloned().collect();
        slots.sort_by_key(|s| s.number);
        Ok(slots)
    }

    async fn list_for_device(&self, device_id: DeviceId) -> Result<Vec<KeySlot>, CoreError> {
        let mut slots: Vec<KeySlot> = self
            .lock()?
            .slots
            .values()
            .filter(|s| s.device_id == device_id)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.number);
        Ok(slots)
    }

    async fn first_empty(&self, device_id: DeviceId) -> Result<Option<KeySlot>, CoreError> {
        let inner = self.lock()?;
        let mut empties: Vec<&KeySlot> = inner
            .slots
            .values()
            .filter(|s| s.device_id == device_id && inner.occupant_of(s.id).is_none())
            .collect();
        empties.sort_by_key(|s| s.number);
        Ok(empties.first().map(|s| (*s).clone()))
    }

    async fn count_occupied(&self, device_id: DeviceId) -> Result<u64, CoreError> {
        let inner = self.lock()?;
        Ok(inner
            .slots
            .values()
            .filter(|s| s.device_id == device_id && inner.occupant_of(s.id).is_some())
            .count() as u64)
    }

    async fn delete(&self, id: SlotId) -> Result<(), CoreError> {
        self.lock()?.slots.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl KeyRepository for InMemoryStore {
    async fn save(&self, key: &Key) -> Result<(), CoreError> {
        self.lock()?.keys.insert(key.id, key.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: KeyId) -> Result<Option<Key>, CoreError> {
        Ok(self.lock()?.keys.get(&id).cloned())
    }

    async fn find_by_number(&self, key_number: &str) -> Result<Option<Key>, CoreError> {
        Ok(self
            .lock()?
            .keys
            .values()
            .find(|k| k.key_number == key_number)
            .cloned())
    }

    async fn find_by_slot(&self, slot_id: SlotId) -> Result<Option<Key>, CoreError> {
        Ok(self.lock()?.occupant_of(slot_id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Key>, CoreError> {
        let mut keys: Vec<Key> = self.lock()?.keys.values().cloned().collect();
        keys.sort_by(|a, b| a.key_number.cmp(&b.key_number));
        Ok(keys)
    }

    async fn delete(&self, id: KeyId) -> Result<(), CoreError> {
        self.lock()?.keys.remove(&id);
        Ok(())
    }

    async fn count_assigned_to_role(&self, role_id: RoleId) -> Result<u64, CoreError> {
        Ok(self
            .lock()?
            .keys
            .values()
            .filter(|k| k.assigned_role_id == role_id)
            .count() as u64)
    }
}

#[async_trait]
impl OperationRepository for InMemoryStore {
    async fn list(&self, filter: &OperationFilter) -> Result<Vec<OperationRecord>, CoreError> {
        let inner = self.lock()?;
        let mut records: Vec<OperationRecord> = inner
            .operations
            .iter()
            .map(|op| OperationRecord {
                id: op.id,
                user_id: op.user_id,
                key_number: inner.keys.get(&op.key_id).map(|k| k.key_number.clone()),
                device_id: op.device_id,
                kind: op.kind,
                timestamp: op.timestamp,
            })
            .filter(|record| {
                filter.user_id.is_none_or(|u| record.user_id == Some(u))
                    && filter
                        .key_number
                        .as_ref()
                        .is_none_or(|n| record.key_number.as_deref() == Some(n.as_str()))
                    && filter.device_id.is_none_or(|d| record.device_id == d)
            })
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(records)
    }
}

#[async_trait]
impl CustodyStore for InMemoryStore {
    async fn commit_take(&self, transition: &TakeTransition) -> Result<TakeOutcome, CoreError> {
        let mut inner = self.lock()?;

        let key = inner
            .keys
            .get(&transition.key_id)
            .ok_or(CoreError::NotFound(Resource::Key))?;
        if key.is_taken() {
            return Err(CoreError::Conflict(Conflict::AlreadyTaken));
        }
        let slot_id = key
            .key_slot_id
            .ok_or_else(|| CoreError::Internal("key in store without a slot".to_string()))?;
        let freed_slot_number = inner
            .slots
            .get(&slot_id)
            .map(|slot| slot.number)
            .ok_or_else(|| CoreError::Internal("key references a missing slot".to_string()))?;

        let key = inner
            .keys
            .get_mut(&transition.key_id)
            .ok_or(CoreError::NotFound(Resource::Key))?;
        key.take(transition.user_id, transition.device_id, transition.at);

        inner.append_operation(
            Some(transition.user_id),
            transition.key_id,
            transition.device_id,
            OperationType::Take,
            transition.at,
        );

        Ok(TakeOutcome {
            key_id: transition.key_id,
            freed_slot_number,
        })
    }

    async fn commit_return(&self, transition: &ReturnTransition) -> Result<(), CoreError> {
        let mut inner = self.lock()?;

        let slot = inner
            .slots
            .get(&transition.slot_id)
            .ok_or(CoreError::NotFound(Resource::Slot))?;
        if slot.is_locked {
            return Err(CoreError::Conflict(Conflict::SlotOccupied));
        }
        if let Some(occupant) = inner.occupant_of(transition.slot_id) {
            if occupant.id != transition.key_id {
                return Err(CoreError::Conflict(Conflict::SlotOccupied));
            }
        }

        let key = inner
            .keys
            .get_mut(&transition.key_id)
            .ok_or(CoreError::NotFound(Resource::Key))?;
        if !key.is_taken() {
            return Err(CoreError::Conflict(Conflict::AlreadyInStore));
        }
        key.put_in_slot(
            transition.slot_id,
            transition.device_id,
            transition.returned_by,
            transition.at,
        );
        let logged_user = key.last_user_id;

        inner.append_operation(
            logged_user,
            transition.key_id,
            transition.device_id,
            OperationType::Return,
            transition.at,
        );

        Ok(())
    }
}
