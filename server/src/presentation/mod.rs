// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! HTTP surface: the device-facing firmware API and the admin API.

pub mod admin;
pub mod api;
pub mod auth;
pub mod device;
pub mod error;

pub use api::{app, AppState};
