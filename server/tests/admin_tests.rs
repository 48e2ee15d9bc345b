// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! Admin CRUD guard tests: uniqueness rules and referential deletion guards.

use std::sync::Arc;

use keybox_server::application::directory::DirectoryService;
use keybox_server::application::inventory::InventoryService;
use keybox_server::domain::error::{Conflict, CoreError, Resource};
use keybox_server::domain::key::KeyUpdate;
use keybox_server::domain::repository::SlotRepository;
use keybox_server::domain::user::UserUpdate;
use keybox_server::infrastructure::repositories::InMemoryStore;

struct Fixture {
    store: Arc<InMemoryStore>,
    directory: DirectoryService,
    inventory: InventoryService,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let directory = DirectoryService::new(store.clone(), store.clone(), store.clone());
    let inventory =
        InventoryService::new(store.clone(), store.clone(), store.clone(), store.clone());
    Fixture {
        store,
        directory,
        inventory,
    }
}

#[tokio::test]
async fn role_names_are_unique() {
    let f = fixture();
    f.directory.create_role("Engineer").await.unwrap();
    let err = f.directory.create_role("Engineer").await.unwrap_err();
    assert_eq!(err, CoreError::Conflict(Conflict::RoleAlreadyExists));
}

#[tokio::test]
async fn empty_role_name_is_rejected() {
    let f = fixture();
    assert_eq!(
        f.directory.create_role("").await.unwrap_err(),
        CoreError::BadRequest("name")
    );
}

#[tokio::test]
async fn role_referenced_by_user_cannot_be_deleted() {
    let f = fixture();
    let role = f.directory.create_role("Engineer").await.unwrap();
    let user = f
        .directory
        .create_user("Alice", "04A224B98C6280", role.id)
        .await
        .unwrap();

    let err = f.directory.delete_role(role.id).await.unwrap_err();
    assert_eq!(err, CoreError::Conflict(Conflict::RoleInUse));

    f.directory.delete_user(user.id).await.unwrap();
    f.directory.delete_role(role.id).await.unwrap();
}

#[tokio::test]
async fn role_referenced_by_key_cannot_be_deleted() {
    let f = fixture();
    let role = f.directory.create_role("Engineer").await.unwrap();
    let device = f
        .inventory
        .create_device("10.0.0.12", "cabinet-a-token", 30)
        .await
        .unwrap();
    let slot = f.inventory.create_slot(device.id, 1).await.unwrap();
    let key = f
        .inventory
        .create_key("K-101", role.id, slot.id)
        .await
        .unwrap();

    let err = f.directory.delete_role(role.id).await.unwrap_err();
    assert_eq!(err, CoreError::Conflict(Conflict::RoleInUse));

    f.inventory.delete_key(key.id).await.unwrap();
    f.directory.delete_role(role.id).await.unwrap();
}

#[tokio::test]
async fn nfc_tags_are_unique() {
    let f = fixture();
    let role = f.directory.create_role("Engineer").await.unwrap();
    f.directory
        .create_user("Alice", "04A224B98C6280", role.id)
        .await
        .unwrap();
    let err = f
        .directory
        .create_user("Bob", "04A224B98C6280", role.id)
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::Conflict(Conflict::NfcTagAlreadyInUse));

    // Updating a second user onto a used tag is also rejected.
    let bob = f
        .directory
        .create_user("Bob", "04B193D821AB", role.id)
        .await
        .unwrap();
    let err = f
        .directory
        .update_user(
            bob.id,
            UserUpdate {
                nfc_tag: Some("04A224B98C6280".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::Conflict(Conflict::NfcTagAlreadyInUse));
}

#[tokio::test]
async fn user_requires_existing_role() {
    let f = fixture();
    let err = f
        .directory
        .create_user(
            "Alice",
            "04A224B98C6280",
            keybox_server::domain::role::RoleId::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::NotFound(Resource::Role));
}

#[tokio::test]
async fn device_auth_tokens_are_unique() {
    let f = fixture();
    f.inventory
        .create_device("10.0.0.12", "cabinet-a-token", 30)
        .await
        .unwrap();
    let err = f
        .inventory
        .create_device("10.0.0.13", "cabinet-a-token", 30)
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::Conflict(Conflict::TokenAlreadyUsed));
}

#[tokio::test]
async fn device_with_stored_keys_cannot_be_deleted() {
    let f = fixture();
    let role = f.directory.create_role("Engineer").await.unwrap();
    let device = f
        .inventory
        .create_device("10.0.0.12", "cabinet-a-token", 30)
        .await
        .unwrap();
    let slot = f.inventory.create_slot(device.id, 1).await.unwrap();
    f.inventory.create_slot(device.id, 2).await.unwrap();
    let key = f
        .inventory
        .create_key("K-101", role.id, slot.id)
        .await
        .unwrap();

    let err = f.inventory.delete_device(device.id).await.unwrap_err();
    assert_eq!(err, CoreError::Conflict(Conflict::DeviceHoldsKeys));

    // Once the key is gone the device and its now-empty slots go together.
    f.inventory.delete_key(key.id).await.unwrap();
    f.inventory.delete_device(device.id).await.unwrap();
    let slots: Arc<dyn SlotRepository> = f.store.clone();
    assert!(slots.list_for_device(device.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn slot_numbers_are_unique_per_device() {
    let f = fixture();
    let a = f
        .inventory
        .create_device("10.0.0.12", "cabinet-a-token", 30)
        .await
        .unwrap();
    let b = f
        .inventory
        .create_device("10.0.0.13", "cabinet-b-token", 30)
        .await
        .unwrap();
    f.inventory.create_slot(a.id, 1).await.unwrap();
    let err = f.inventory.create_slot(a.id, 1).await.unwrap_err();
    assert_eq!(err, CoreError::Conflict(Conflict::SlotNumberAlreadyUsed));
    // Same number on a different device is fine.
    f.inventory.create_slot(b.id, 1).await.unwrap();
}

#[tokio::test]
async fn occupied_slot_cannot_be_deleted() {
    let f = fixture();
    let role = f.directory.create_role("Engineer").await.unwrap();
    let device = f
        .inventory
        .create_device("10.0.0.12", "cabinet-a-token", 30)
        .await
        .unwrap();
    let slot = f.inventory.create_slot(device.id, 1).await.unwrap();
    let key = f
        .inventory
        .create_key("K-101", role.id, slot.id)
        .await
        .unwrap();

    let err = f.inventory.delete_slot(slot.id).await.unwrap_err();
    assert_eq!(err, CoreError::Conflict(Conflict::SlotOccupied));

    f.inventory.delete_key(key.id).await.unwrap();
    f.inventory.delete_slot(slot.id).await.unwrap();
}

#[tokio::test]
async fn key_creation_enforces_slot_exclusivity_and_number_uniqueness() {
    let f = fixture();
    let role = f.directory.create_role("Engineer").await.unwrap();
    let device = f
        .inventory
        .create_device("10.0.0.12", "cabinet-a-token", 30)
        .await
        .unwrap();
    let slot = f.inventory.create_slot(device.id, 1).await.unwrap();
    f.inventory
        .create_key("K-101", role.id, slot.id)
        .await
        .unwrap();

    let other = f.inventory.create_slot(device.id, 2).await.unwrap();
    assert_eq!(
        f.inventory
            .create_key("K-101", role.id, other.id)
            .await
            .unwrap_err(),
        CoreError::Conflict(Conflict::KeyNumberAlreadyUsed)
    );
    assert_eq!(
        f.inventory
            .create_key("K-102", role.id, slot.id)
            .await
            .unwrap_err(),
        CoreError::Conflict(Conflict::SlotOccupied)
    );
}

#[tokio::test]
async fn stored_key_can_move_to_an_empty_slot() {
    let f = fixture();
    let role = f.directory.create_role("Engineer").await.unwrap();
    let device = f
        .inventory
        .create_device("10.0.0.12", "cabinet-a-token", 30)
        .await
        .unwrap();
    let slot = f.inventory.create_slot(device.id, 1).await.unwrap();
    let target = f.inventory.create_slot(device.id, 2).await.unwrap();
    let key = f
        .inventory
        .create_key("K-101", role.id, slot.id)
        .await
        .unwrap();

    let moved = f
        .inventory
        .update_key(
            key.id,
            KeyUpdate {
                key_slot_id: Some(target.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.key_slot_id, Some(target.id));

    // The vacated slot is free for a new key.
    f.inventory
        .create_key("K-102", role.id, slot.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn key_move_into_occupied_slot_is_rejected() {
    let f = fixture();
    let role = f.directory.create_role("Engineer").await.unwrap();
    let device = f
        .inventory
        .create_device("10.0.0.12", "cabinet-a-token", 30)
        .await
        .unwrap();
    let slot_a = f.inventory.create_slot(device.id, 1).await.unwrap();
    let slot_b = f.inventory.create_slot(device.id, 2).await.unwrap();
    let key = f
        .inventory
        .create_key("K-101", role.id, slot_a.id)
        .await
        .unwrap();
    f.inventory
        .create_key("K-102", role.id, slot_b.id)
        .await
        .unwrap();

    let err = f
        .inventory
        .update_key(
            key.id,
            KeyUpdate {
                key_slot_id: Some(slot_b.id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::Conflict(Conflict::SlotOccupied));
}

#[tokio::test]
async fn slot_lock_flag_round_trips() {
    let f = fixture();
    let device = f
        .inventory
        .create_device("10.0.0.12", "cabinet-a-token", 30)
        .await
        .unwrap();
    let slot = f.inventory.create_slot(device.id, 1).await.unwrap();
    assert!(!slot.is_locked);

    let locked = f.inventory.set_slot_locked(slot.id, true).await.unwrap();
    assert!(locked.is_locked);
    let unlocked = f.inventory.set_slot_locked(slot.id, false).await.unwrap();
    assert!(!unlocked.is_locked);
}

#[tokio::test]
async fn listings_join_display_fields() {
    let f = fixture();
    let role = f.directory.create_role("Engineer").await.unwrap();
    let device = f
        .inventory
        .create_device("10.0.0.12", "cabinet-a-token", 30)
        .await
        .unwrap();
    let slot = f.inventory.create_slot(device.id, 1).await.unwrap();
    f.inventory
        .create_key("K-101", role.id, slot.id)
        .await
        .unwrap();
    f.directory
        .create_user("Alice", "04A224B98C6280", role.id)
        .await
        .unwrap();

    let slots = f.inventory.list_slots().await.unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].key_number.as_deref(), Some("K-101"));

    let keys = f.inventory.list_keys().await.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].device_id, Some(device.id));

    let users = f.directory.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].role_name.as_deref(), Some("Engineer"));
}
