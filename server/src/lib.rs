// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! Smart Keybox backend.
//!
//! Manages a fleet of networked key-locker devices: NFC-authenticated key
//! custody (take/return), slot allocation, role-based access, and the
//! append-only operation audit log.

pub mod config;
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;
