// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
