// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::device::{Device, DeviceId};
use crate::domain::error::CoreError;
use crate::domain::repository::DeviceRepository;

pub struct PostgresDeviceRepository {
    pool: PgPool,
}

impl PostgresDeviceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn device_from_row(row: &PgRow) -> Device {
    Device {
        id: DeviceId(row.get("id")),
        ip_address: row.get("ip_address"),
        auth_token: row.get("auth_token"),
        timeout_seconds: row.get("timeout_seconds"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const DEVICE_COLUMNS: &str = "id, ip_address, auth_token, timeout_seconds, created_at, updated_at";

#[async_trait]
impl DeviceRepository for PostgresDeviceRepository {
    async fn save(&self, device: &Device) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO devices (id, ip_address, auth_token, timeout_seconds, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                ip_address = EXCLUDED.ip_address,
                auth_token = EXCLUDED.auth_token,
                timeout_seconds = EXCLUDED.timeout_seconds,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(device.id.0)
        .bind(&device.ip_address)
        .bind(&device.auth_token)
        .bind(device.timeout_seconds)
        .bind(device.created_at)
        .bind(device.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: DeviceId) -> Result<Option<Device>, CoreError> {
        let row = sqlx::query(&format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(device_from_row))
    }

    async fn find_by_credentials(
        &self,
        id: DeviceId,
        auth_token: &str,
    ) -> Result<Option<Device>, CoreError> {
        let row = sqlx::query(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE id = $1 AND auth_token = $2"
        ))
        .bind(id.0)
        .bind(auth_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(device_from_row))
    }

    async fn find_by_auth_token(&self, auth_token: &str) -> Result<Option<Device>, CoreError> {
        let row = sqlx::query(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE auth_token = $1"
        ))
        .bind(auth_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(device_from_row))
    }

    async fn list_all(&self) -> Result<Vec<Device>, CoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(device_from_row).collect())
    }

    async fn delete(&self, id: DeviceId) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
