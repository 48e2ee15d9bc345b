// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use keybox_server::application::custody::StandardCustodyService;
use keybox_server::application::directory::DirectoryService;
use keybox_server::application::history::HistoryService;
use keybox_server::application::inventory::InventoryService;
use keybox_server::application::session::SessionGate;
use keybox_server::config::{AppConfig, StoreBackend};
use keybox_server::domain::repository::{
    CustodyStore, DeviceRepository, KeyRepository, OperationRepository, RoleRepository,
    SlotRepository, UserRepository,
};
use keybox_server::infrastructure::db::Database;
use keybox_server::infrastructure::repositories::postgres::{
    PostgresCustodyStore, PostgresDeviceRepository, PostgresKeyRepository,
    PostgresOperationRepository, PostgresRoleRepository, PostgresSlotRepository,
    PostgresUserRepository,
};
use keybox_server::infrastructure::repositories::InMemoryStore;
use keybox_server::presentation::{app, AppState};

struct Repositories {
    roles: Arc<dyn RoleRepository>,
    users: Arc<dyn UserRepository>,
    devices: Arc<dyn DeviceRepository>,
    slots: Arc<dyn SlotRepository>,
    keys: Arc<dyn KeyRepository>,
    operations: Arc<dyn OperationRepository>,
    custody: Arc<dyn CustodyStore>,
}

fn wire(repos: Repositories, config: &AppConfig) -> Arc<AppState> {
    let sessions = Arc::new(SessionGate::new(repos.devices.clone(), config));
    let custody = Arc::new(StandardCustodyService::new(
        repos.users.clone(),
        repos.keys.clone(),
        repos.slots.clone(),
        repos.custody,
    ));
    let directory = Arc::new(DirectoryService::new(
        repos.roles.clone(),
        repos.users,
        repos.keys.clone(),
    ));
    let inventory = Arc::new(InventoryService::new(
        repos.devices,
        repos.slots,
        repos.keys,
        repos.roles,
    ));
    let history = Arc::new(HistoryService::new(repos.operations));

    Arc::new(AppState {
        sessions,
        custody,
        directory,
        inventory,
        history,
    })
}

fn init_logging() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config = AppConfig::from_env();

    let repos = match config.store {
        StoreBackend::InMemory => {
            info!("using in-memory store");
            let store = Arc::new(InMemoryStore::new());
            Repositories {
                roles: store.clone(),
                users: store.clone(),
                devices: store.clone(),
                slots: store.clone(),
                keys: store.clone(),
                operations: store.clone(),
                custody: store,
            }
        }
        StoreBackend::Postgres => {
            let db = Database::new(&config.database_url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            let pool = db.get_pool().clone();
            Repositories {
                roles: Arc::new(PostgresRoleRepository::new(pool.clone())),
                users: Arc::new(PostgresUserRepository::new(pool.clone())),
                devices: Arc::new(PostgresDeviceRepository::new(pool.clone())),
                slots: Arc::new(PostgresSlotRepository::new(pool.clone())),
                keys: Arc::new(PostgresKeyRepository::new(pool.clone())),
                operations: Arc::new(PostgresOperationRepository::new(pool.clone())),
                custody: Arc::new(PostgresCustodyStore::new(pool)),
            }
        }
    };

    let state = wire(repos, &config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
