// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::device::DeviceId;
use crate::domain::error::CoreError;
use crate::domain::repository::SlotRepository;
use crate::domain::slot::{KeySlot, SlotId};

pub struct PostgresSlotRepository {
    pool: PgPool,
}

impl PostgresSlotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn slot_from_row(row: &PgRow) -> KeySlot {
    KeySlot {
        id: SlotId(row.get("id")),
        number: row.get("number"),
        is_locked: row.get("is_locked"),
        device_id: DeviceId(row.get("device_id")),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SLOT_COLUMNS: &str = "id, number, is_locked, device_id, created_at, updated_at";

#[async_trait]
impl SlotRepository for PostgresSlotRepository {
    async fn save(&self, slot: &KeySlot) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO key_slots (id, number, is_locked, device_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                number = EXCLUDED.number,
                is_locked = EXCLUDED.is_locked,
                device_id = EXCLUDED.device_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(slot.id.0)
        .bind(slot.number)
        .bind(slot.is_locked)
        .bind(slot.device_id.0)
        .bind(slot.created_at)
        .bind(slot.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: SlotId) -> Result<Option<KeySlot>, CoreError> {
        let row = sqlx::query(&format!("SELECT {SLOT_COLUMNS} FROM key_slots WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(slot_from_row))
    }

    async fn find_by_number(
        &self,
        device_id: DeviceId,
        number: i32,
    ) -> Result<Option<KeySlot>, CoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SLOT_COLUMNS} FROM key_slots WHERE device_id = $1 AND number = $2"
        ))
        .bind(device_id.0)
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(slot_from_row))
    }

    async fn list_all(&self) -> Result<Vec<KeySlot>, CoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {SLOT_COLUMNS} FROM key_slots ORDER BY device_id, number"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(slot_from_row).collect())
    }

    async fn list_for_device(&self, device_id: DeviceId) -> Result<Vec<KeySlot>, CoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {SLOT_COLUMNS} FROM key_slots WHERE device_id = $1 ORDER BY number"
        ))
        .bind(device_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(slot_from_row).collect())
    }

    async fn first_empty(&self, device_id: DeviceId) -> Result<Option<KeySlot>, CoreError> {
        // A slot is empty when no key claims it.
        let row = sqlx::query(&format!(
            r#"
            SELECT {SLOT_COLUMNS} FROM key_slots s
            WHERE s.device_id = $1
              AND NOT EXISTS (SELECT 1 FROM keys k WHERE k.key_slot_id = s.id)
            ORDER BY s.number
            LIMIT 1
            "#
        ))
        .bind(device_id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(slot_from_row))
    }

    async fn count_occupied(&self, device_id: DeviceId) -> Result<u64, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM key_slots s
            JOIN keys k ON k.key_slot_id = s.id
            WHERE s.device_id = $1
            "#,
        )
        .bind(device_id.0)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("total") as u64)
    }

    async fn delete(&self, id: SlotId) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM key_slots WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
