// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! Custody flow tests against the in-memory store: take/return round trips,
//! denial paths, the slot allocator and the audit log.

use std::sync::Arc;

use keybox_server::application::custody::{CustodyService, StandardCustodyService};
use keybox_server::domain::device::{Device, DeviceId};
use keybox_server::domain::error::{Conflict, CoreError, Resource};
use keybox_server::domain::key::Key;
use keybox_server::domain::operation::{OperationFilter, OperationType};
use keybox_server::domain::repository::{
    DeviceRepository, KeyRepository, OperationRepository, RoleRepository, SlotRepository,
    UserRepository,
};
use keybox_server::domain::role::Role;
use keybox_server::domain::slot::KeySlot;
use keybox_server::domain::user::User;
use keybox_server::infrastructure::repositories::InMemoryStore;

struct Fixture {
    store: Arc<InMemoryStore>,
    service: Arc<StandardCustodyService>,
    role: Role,
    device: Device,
    slot: KeySlot,
    key: Key,
    user: User,
}

/// One device with a single slot 3 holding key K-101, assigned to the
/// Engineer role, and one engineer.
async fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let roles: Arc<dyn RoleRepository> = store.clone();
    let users: Arc<dyn UserRepository> = store.clone();
    let devices: Arc<dyn DeviceRepository> = store.clone();
    let slots: Arc<dyn SlotRepository> = store.clone();
    let keys: Arc<dyn KeyRepository> = store.clone();

    let role = Role::new("Engineer");
    roles.save(&role).await.unwrap();

    let device = Device::new("10.0.0.12", "cabinet-a-token", 30);
    devices.save(&device).await.unwrap();

    let slot = KeySlot::new(3, device.id);
    slots.save(&slot).await.unwrap();

    let key = Key::new("K-101", role.id, slot.id);
    keys.save(&key).await.unwrap();

    let user = User::new("Alice", "04A224B98C6280", Some(role.id));
    users.save(&user).await.unwrap();

    let service = Arc::new(StandardCustodyService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    ));

    Fixture {
        store,
        service,
        role,
        device,
        slot,
        key,
        user,
    }
}

#[tokio::test]
async fn take_then_return_round_trip() {
    let f = fixture().await;

    let receipt = f
        .service
        .take_key(f.device.id, "K-101", &f.user.nfc_tag)
        .await
        .unwrap();
    assert_eq!(receipt.key_id, f.key.id);
    assert_eq!(receipt.slot_number, 3);

    let keys: Arc<dyn KeyRepository> = f.store.clone();
    let taken = keys.find_by_id(f.key.id).await.unwrap().unwrap();
    assert!(taken.is_taken());
    assert_eq!(taken.key_slot_id, None);
    assert_eq!(taken.last_user_id, Some(f.user.id));
    assert_eq!(taken.last_device_id, Some(f.device.id));

    f.service
        .return_key(f.device.id, 3, f.key.id, Some(&f.user.nfc_tag))
        .await
        .unwrap();

    let returned = keys.find_by_id(f.key.id).await.unwrap().unwrap();
    assert!(!returned.is_taken());
    assert_eq!(returned.key_slot_id, Some(f.slot.id));

    // Exactly two log entries, newest first.
    let operations: Arc<dyn OperationRepository> = f.store.clone();
    let log = operations.list(&OperationFilter::default()).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].kind, OperationType::Return);
    assert_eq!(log[1].kind, OperationType::Take);
    assert!(log.iter().all(|op| op.key_number.as_deref() == Some("K-101")));
}

#[tokio::test]
async fn second_take_of_same_key_is_denied() {
    let f = fixture().await;

    f.service
        .take_key(f.device.id, "K-101", &f.user.nfc_tag)
        .await
        .unwrap();
    let err = f
        .service
        .take_key(f.device.id, "K-101", &f.user.nfc_tag)
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::Conflict(Conflict::AlreadyTaken));
}

#[tokio::test]
async fn take_with_wrong_role_leaves_no_trace() {
    let f = fixture().await;
    let users: Arc<dyn UserRepository> = f.store.clone();
    let roles: Arc<dyn RoleRepository> = f.store.clone();

    let other_role = Role::new("Visitor");
    roles.save(&other_role).await.unwrap();
    let visitor = User::new("Bob", "04B193D821AB", Some(other_role.id));
    users.save(&visitor).await.unwrap();

    let err = f
        .service
        .take_key(f.device.id, "K-101", &visitor.nfc_tag)
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::Forbidden);

    // Denied access mutates nothing and logs nothing.
    let keys: Arc<dyn KeyRepository> = f.store.clone();
    let key = keys.find_by_id(f.key.id).await.unwrap().unwrap();
    assert!(!key.is_taken());
    let operations: Arc<dyn OperationRepository> = f.store.clone();
    assert!(operations
        .list(&OperationFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn take_with_unknown_tag_is_not_found() {
    let f = fixture().await;
    let err = f
        .service
        .take_key(f.device.id, "K-101", "FFFFFFFFFFFF")
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::NotFound(Resource::User));
}

#[tokio::test]
async fn concurrent_takes_resolve_to_one_winner() {
    let f = fixture().await;
    let users: Arc<dyn UserRepository> = f.store.clone();

    let rival = User::new("Carol", "04C5E2198D11", Some(f.role.id));
    users.save(&rival).await.unwrap();

    let a = {
        let service = f.service.clone();
        let device = f.device.id;
        let tag = f.user.nfc_tag.clone();
        tokio::spawn(async move { service.take_key(device, "K-101", &tag).await })
    };
    let b = {
        let service = f.service.clone();
        let device = f.device.id;
        let tag = rival.nfc_tag.clone();
        tokio::spawn(async move { service.take_key(device, "K-101", &tag).await })
    };

    let results: Vec<_> = futures::future::join_all([a, b])
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == CoreError::Conflict(Conflict::AlreadyTaken)));

    // Exactly one TAKE in the log.
    let operations: Arc<dyn OperationRepository> = f.store.clone();
    let log = operations.list(&OperationFilter::default()).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].kind, OperationType::Take);
}

#[tokio::test]
async fn allocator_picks_lowest_numbered_empty_slot() {
    let f = fixture().await;
    let slots: Arc<dyn SlotRepository> = f.store.clone();

    // Slots 1 and 2 are empty; 3 holds K-101.
    slots.save(&KeySlot::new(2, f.device.id)).await.unwrap();
    slots.save(&KeySlot::new(1, f.device.id)).await.unwrap();

    assert_eq!(f.service.find_empty_slot(f.device.id).await.unwrap(), 1);

    // Taking K-101 frees slot 3, but 1 still wins.
    f.service
        .take_key(f.device.id, "K-101", &f.user.nfc_tag)
        .await
        .unwrap();
    assert_eq!(f.service.find_empty_slot(f.device.id).await.unwrap(), 1);
}

#[tokio::test]
async fn allocator_with_no_empty_slot_is_not_found() {
    let f = fixture().await;
    let err = f.service.find_empty_slot(f.device.id).await.unwrap_err();
    assert_eq!(err, CoreError::NotFound(Resource::Slot));
}

#[tokio::test]
async fn return_into_occupied_slot_is_rejected() {
    let f = fixture().await;
    let slots: Arc<dyn SlotRepository> = f.store.clone();
    let keys: Arc<dyn KeyRepository> = f.store.clone();

    let other_slot = KeySlot::new(4, f.device.id);
    slots.save(&other_slot).await.unwrap();
    let other_key = Key::new("K-102", f.role.id, other_slot.id);
    keys.save(&other_key).await.unwrap();

    f.service
        .take_key(f.device.id, "K-101", &f.user.nfc_tag)
        .await
        .unwrap();

    // Slot 4 still holds K-102.
    let err = f
        .service
        .return_key(f.device.id, 4, f.key.id, None)
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::Conflict(Conflict::SlotOccupied));
}

#[tokio::test]
async fn return_into_unknown_slot_is_not_found() {
    let f = fixture().await;
    f.service
        .take_key(f.device.id, "K-101", &f.user.nfc_tag)
        .await
        .unwrap();
    let err = f
        .service
        .return_key(f.device.id, 99, f.key.id, None)
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::NotFound(Resource::Slot));
}

#[tokio::test]
async fn return_with_unknown_tag_keeps_taker_on_record() {
    let f = fixture().await;

    f.service
        .take_key(f.device.id, "K-101", &f.user.nfc_tag)
        .await
        .unwrap();
    // The returning tag does not resolve; the return still goes through.
    f.service
        .return_key(f.device.id, 3, f.key.id, Some("FFFFFFFFFFFF"))
        .await
        .unwrap();

    let keys: Arc<dyn KeyRepository> = f.store.clone();
    let key = keys.find_by_id(f.key.id).await.unwrap().unwrap();
    assert!(!key.is_taken());
    assert_eq!(key.last_user_id, Some(f.user.id));

    let operations: Arc<dyn OperationRepository> = f.store.clone();
    let log = operations.list(&OperationFilter::default()).await.unwrap();
    assert_eq!(log[0].kind, OperationType::Return);
    assert_eq!(log[0].user_id, Some(f.user.id));
}

#[tokio::test]
async fn return_of_stored_key_is_rejected() {
    let f = fixture().await;
    let err = f
        .service
        .return_key(f.device.id, 3, f.key.id, None)
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::Conflict(Conflict::AlreadyInStore));
}

#[tokio::test]
async fn history_filters_by_user_key_and_device() {
    let f = fixture().await;
    let users: Arc<dyn UserRepository> = f.store.clone();
    let slots: Arc<dyn SlotRepository> = f.store.clone();
    let keys: Arc<dyn KeyRepository> = f.store.clone();
    let operations: Arc<dyn OperationRepository> = f.store.clone();

    let other_slot = KeySlot::new(4, f.device.id);
    slots.save(&other_slot).await.unwrap();
    let other_key = Key::new("K-102", f.role.id, other_slot.id);
    keys.save(&other_key).await.unwrap();
    let rival = User::new("Carol", "04C5E2198D11", Some(f.role.id));
    users.save(&rival).await.unwrap();

    f.service
        .take_key(f.device.id, "K-101", &f.user.nfc_tag)
        .await
        .unwrap();
    f.service
        .take_key(f.device.id, "K-102", &rival.nfc_tag)
        .await
        .unwrap();

    let by_user = operations
        .list(&OperationFilter {
            user_id: Some(rival.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_user.len(), 1);
    assert_eq!(by_user[0].key_number.as_deref(), Some("K-102"));

    let by_key = operations
        .list(&OperationFilter {
            key_number: Some("K-101".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_key.len(), 1);
    assert_eq!(by_key[0].user_id, Some(f.user.id));

    let by_device = operations
        .list(&OperationFilter {
            device_id: Some(f.device.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_device.len(), 2);

    let by_other_device = operations
        .list(&OperationFilter {
            device_id: Some(DeviceId::new()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(by_other_device.is_empty());
}

#[tokio::test]
async fn validate_card_distinguishes_known_tags() {
    let f = fixture().await;
    assert!(f.service.validate_card(&f.user.nfc_tag).await.is_ok());
    assert_eq!(
        f.service.validate_card("FFFFFFFFFFFF").await.unwrap_err(),
        CoreError::NotFound(Resource::User)
    );
}
