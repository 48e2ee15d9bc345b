// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

pub mod access;
pub mod custody;
pub mod device;
pub mod error;
pub mod key;
pub mod operation;
pub mod repository;
pub mod role;
pub mod slot;
pub mod user;
