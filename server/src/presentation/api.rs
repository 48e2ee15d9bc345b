// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! Router assembly.
//!
//! Trailing slashes on every route are part of the firmware contract.

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::application::custody::CustodyService;
use crate::application::directory::DirectoryService;
use crate::application::history::HistoryService;
use crate::application::inventory::InventoryService;
use crate::application::session::SessionGate;
use crate::presentation::{admin, device};

pub struct AppState {
    pub sessions: Arc<SessionGate>,
    pub custody: Arc<dyn CustodyService>,
    pub directory: Arc<DirectoryService>,
    pub inventory: Arc<InventoryService>,
    pub history: Arc<HistoryService>,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Device API
        .route("/device/init/", post(device::init))
        .route("/device/auth_card/", post(device::auth_card))
        .route("/device/get_key/", post(device::get_key))
        .route("/device/return_key/", post(device::return_key))
        .route("/device/get_empty_slot/", get(device::get_empty_slot))
        // Admin API
        .route("/admin/login/", post(admin::login))
        .route("/admin/operations/", get(admin::list_operations))
        .route("/admin/create_device/", post(admin::create_device))
        .route("/admin/update_device/{id}/", put(admin::update_device))
        .route("/admin/delete_device/{id}/", delete(admin::delete_device))
        .route("/admin/list_devices/", get(admin::list_devices))
        .route("/admin/create_slot/", post(admin::create_slot))
        .route("/admin/update_slot/{id}/", put(admin::update_slot))
        .route("/admin/delete_slot/{id}/", delete(admin::delete_slot))
        .route("/admin/slots/", get(admin::list_slots))
        .route("/admin/create_key/", post(admin::create_key))
        .route("/admin/update_key/{id}/", put(admin::update_key))
        .route("/admin/delete_key/{id}/", delete(admin::delete_key))
        .route("/admin/keys/", get(admin::list_keys))
        .route("/admin/create_user/", post(admin::create_user))
        .route("/admin/update_user/{id}/", put(admin::update_user))
        .route("/admin/delete_user/{id}/", delete(admin::delete_user))
        .route("/admin/users/", get(admin::list_users))
        .route("/admin/roles/", post(admin::create_role).get(admin::list_roles))
        .route(
            "/admin/roles/{id}/",
            put(admin::update_role).delete(admin::delete_role),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
