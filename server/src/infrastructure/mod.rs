// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

pub mod db;
pub mod repositories;
