// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::device::DeviceId;
use crate::domain::error::CoreError;
use crate::domain::key::{CustodyState, Key, KeyId};
use crate::domain::repository::KeyRepository;
use crate::domain::role::RoleId;
use crate::domain::slot::SlotId;
use crate::domain::user::UserId;

pub struct PostgresKeyRepository {
    pool: PgPool,
}

impl PostgresKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn key_from_row(row: &PgRow) -> Result<Key, CoreError> {
    let custody_str: String = row.get("custody");
    let custody = CustodyState::parse(&custody_str)
        .ok_or_else(|| CoreError::Internal(format!("unknown custody state: {custody_str}")))?;

    Ok(Key {
        id: KeyId(row.get("id")),
        key_number: row.get("key_number"),
        custody,
        key_slot_id: row.get::<Option<uuid::Uuid>, _>("key_slot_id").map(SlotId),
        assigned_role_id: RoleId(row.get("assigned_role_id")),
        last_user_id: row.get::<Option<uuid::Uuid>, _>("last_user_id").map(UserId),
        last_device_id: row
            .get::<Option<uuid::Uuid>, _>("last_device_id")
            .map(DeviceId),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const KEY_COLUMNS: &str = "id, key_number, custody, key_slot_id, assigned_role_id, \
                           last_user_id, last_device_id, created_at, updated_at";

#[async_trait]
impl KeyRepository for PostgresKeyRepository {
    async fn save(&self, key: &Key) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO keys (
                id, key_number, custody, key_slot_id, assigned_role_id,
                last_user_id, last_device_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                key_number = EXCLUDED.key_number,
                custody = EXCLUDED.custody,
                key_slot_id = EXCLUDED.key_slot_id,
                assigned_role_id = EXCLUDED.assigned_role_id,
                last_user_id = EXCLUDED.last_user_id,
                last_device_id = EXCLUDED.last_device_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(key.id.0)
        .bind(&key.key_number)
        .bind(key.custody.as_str())
        .bind(key.key_slot_id.map(|s| s.0))
        .bind(key.assigned_role_id.0)
        .bind(key.last_user_id.map(|u| u.0))
        .bind(key.last_device_id.map(|d| d.0))
        .bind(key.created_at)
        .bind(key.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: KeyId) -> Result<Option<Key>, CoreError> {
        let row = sqlx::query(&format!("SELECT {KEY_COLUMNS} FROM keys WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(key_from_row).transpose()
    }

    async fn find_by_number(&self, key_number: &str) -> Result<Option<Key>, CoreError> {
        let row = sqlx::query(&format!(
            "SELECT {KEY_COLUMNS} FROM keys WHERE key_number = $1"
        ))
        .bind(key_number)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(key_from_row).transpose()
    }

    async fn find_by_slot(&self, slot_id: SlotId) -> Result<Option<Key>, CoreError> {
        let row = sqlx::query(&format!(
            "SELECT {KEY_COLUMNS} FROM keys WHERE key_slot_id = $1"
        ))
        .bind(slot_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(key_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Key>, CoreError> {
        let rows = sqlx::query(&format!("SELECT {KEY_COLUMNS} FROM keys ORDER BY key_number"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(key_from_row).collect()
    }

    async fn delete(&self, id: KeyId) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM keys WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn count_assigned_to_role(&self, role_id: RoleId) -> Result<u64, CoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM keys WHERE assigned_role_id = $1")
            .bind(role_id.0)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("total") as u64)
    }
}
