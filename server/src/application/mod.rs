// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

pub mod custody;
pub mod directory;
pub mod history;
pub mod inventory;
pub mod session;

pub use custody::{CustodyService, StandardCustodyService, TakeReceipt};
pub use session::SessionGate;
