// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! The key-custody state machine.
//!
//! A key is either `InStore` (in a slot) or `Taken` (with a user). The two
//! transitions, TAKE and RETURN, are described by [`TakeTransition`] and
//! [`ReturnTransition`] and applied atomically by a
//! [`crate::domain::repository::CustodyStore`].
//!
//! Validation is split in two: the custody service runs the full pre-checks
//! (`validate_take` / `validate_return`) before committing, and every store
//! re-runs the state checks under its own lock or transaction. The second
//! pass is what makes two concurrent TAKEs of the same key resolve to exactly
//! one winner.

use chrono::{DateTime, Utc};

use crate::domain::access;
use crate::domain::device::DeviceId;
use crate::domain::error::{Conflict, CoreError};
use crate::domain::key::{Key, KeyId};
use crate::domain::slot::{KeySlot, SlotId};
use crate::domain::user::{User, UserId};

/// TAKE: detach the key from its slot and hand it to the user.
#[derive(Debug, Clone)]
pub struct TakeTransition {
    pub key_id: KeyId,
    pub user_id: UserId,
    pub device_id: DeviceId,
    pub at: DateTime<Utc>,
}

/// What a committed TAKE tells the device: which physical lock to release.
#[derive(Debug, Clone)]
pub struct TakeOutcome {
    pub key_id: KeyId,
    pub freed_slot_number: i32,
}

/// RETURN: attach the key to an empty slot on the device.
#[derive(Debug, Clone)]
pub struct ReturnTransition {
    pub key_id: KeyId,
    pub slot_id: SlotId,
    pub device_id: DeviceId,
    /// Resolved from the returning NFC tag, best-effort. `None` keeps the
    /// `last_user` recorded at TAKE time.
    pub returned_by: Option<UserId>,
    pub at: DateTime<Utc>,
}

/// TAKE pre-checks: key must be in store, user's role must match the key's
/// assigned role.
pub fn validate_take(user: &User, key: &Key) -> Result<(), CoreError> {
    if key.is_taken() {
        return Err(CoreError::Conflict(Conflict::AlreadyTaken));
    }
    if !access::allows(user.role_id, Some(key.assigned_role_id)) {
        return Err(CoreError::Forbidden);
    }
    Ok(())
}

/// RETURN pre-checks: key must be out, target slot must be unlocked and not
/// hold another key. `occupant` is whichever key currently claims the slot.
pub fn validate_return(key: &Key, slot: &KeySlot, occupant: Option<KeyId>) -> Result<(), CoreError> {
    if !key.is_taken() {
        return Err(CoreError::Conflict(Conflict::AlreadyInStore));
    }
    if slot.is_locked {
        return Err(CoreError::Conflict(Conflict::SlotOccupied));
    }
    if let Some(other) = occupant {
        if other != key.id {
            return Err(CoreError::Conflict(Conflict::SlotOccupied));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::RoleId;

    fn fixture() -> (User, Key, KeySlot) {
        let role = RoleId::new();
        let device = DeviceId::new();
        let slot = KeySlot::new(1, device);
        let key = Key::new("K-101", role, slot.id);
        let user = User::new("Alice", "04A224B98C6280", Some(role));
        (user, key, slot)
    }

    #[test]
    fn take_of_stored_key_by_matching_role_passes() {
        let (user, key, _) = fixture();
        assert!(validate_take(&user, &key).is_ok());
    }

    #[test]
    fn take_of_taken_key_conflicts() {
        let (user, mut key, _) = fixture();
        key.take(user.id, DeviceId::new(), Utc::now());
        assert_eq!(
            validate_take(&user, &key),
            Err(CoreError::Conflict(Conflict::AlreadyTaken))
        );
    }

    #[test]
    fn take_with_wrong_role_is_forbidden() {
        let (mut user, key, _) = fixture();
        user.role_id = Some(RoleId::new());
        assert_eq!(validate_take(&user, &key), Err(CoreError::Forbidden));
    }

    #[test]
    fn return_of_stored_key_conflicts() {
        let (_, key, slot) = fixture();
        assert_eq!(
            validate_return(&key, &slot, None),
            Err(CoreError::Conflict(Conflict::AlreadyInStore))
        );
    }

    #[test]
    fn return_into_locked_slot_conflicts() {
        let (user, mut key, mut slot) = fixture();
        key.take(user.id, DeviceId::new(), Utc::now());
        slot.set_locked(true);
        assert_eq!(
            validate_return(&key, &slot, None),
            Err(CoreError::Conflict(Conflict::SlotOccupied))
        );
    }

    #[test]
    fn return_into_occupied_slot_conflicts() {
        let (user, mut key, slot) = fixture();
        key.take(user.id, DeviceId::new(), Utc::now());
        assert_eq!(
            validate_return(&key, &slot, Some(KeyId::new())),
            Err(CoreError::Conflict(Conflict::SlotOccupied))
        );
    }

    #[test]
    fn take_then_put_back_preserves_exclusivity() {
        let (user, mut key, slot) = fixture();
        let device = DeviceId::new();
        key.take(user.id, device, Utc::now());
        assert!(key.key_slot_id.is_none());
        key.put_in_slot(slot.id, device, None, Utc::now());
        assert_eq!(key.key_slot_id, Some(slot.id));
        assert!(!key.is_taken());
        assert_eq!(key.last_user_id, Some(user.id));
    }
}
