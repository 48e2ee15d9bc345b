// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! PostgreSQL repository implementations.
//!
//! One module per aggregate, each backed by a table defined in
//! `server/schema.sql`. The custody store is the only multi-table writer:
//! it wraps every transition in a transaction with `SELECT ... FOR UPDATE`
//! row locks so two devices racing on the same key or slot serialize.

pub mod custody;
pub mod devices;
pub mod keys;
pub mod operations;
pub mod roles;
pub mod slots;
pub mod users;

pub use custody::PostgresCustodyStore;
pub use devices::PostgresDeviceRepository;
pub use keys::PostgresKeyRepository;
pub use operations::PostgresOperationRepository;
pub use roles::PostgresRoleRepository;
pub use slots::PostgresSlotRepository;
pub use users::PostgresUserRepository;
