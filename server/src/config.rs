// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use std::env;

/// Explicitly constructed process configuration, read once in `main` and
/// passed into the components that need it. No global mutable state.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// HS256 secret for device session tokens.
    pub device_token_secret: String,
    /// HS256 secret for admin session tokens.
    pub admin_token_secret: String,
    pub admin_username: String,
    pub admin_password: String,
    pub store: StoreBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres,
}

impl AppConfig {
    /// Defaults mirror the containerized deployment; every value can be
    /// overridden through the environment.
    pub fn from_env() -> Self {
        let store = match env::var("KEYBOX_STORE").as_deref() {
            Ok("memory") => StoreBackend::InMemory,
            _ => StoreBackend::Postgres,
        };
        Self {
            database_url: env_or("DATABASE_URL", "postgresql://postgres:password@db:5432/keybox"),
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:5000"),
            device_token_secret: env_or("SECRET_KEY", "supersecret"),
            admin_token_secret: env_or("ADMIN_SECRET_KEY", "admin_supersecret"),
            admin_username: env_or("ADMIN_USERNAME", "admin"),
            admin_password: env_or("ADMIN_PASSWORD", "admin1234"),
            store,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
