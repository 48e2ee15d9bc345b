// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! Transactional custody transitions.
//!
//! Each commit opens a transaction, takes `SELECT ... FOR UPDATE` locks and
//! re-runs the state checks under them, then mutates the key and appends the
//! operation row before committing. An error return drops the transaction,
//! which rolls everything back.
//!
//! Lock order: TAKE locks only the key row; RETURN locks the slot row first,
//! then the key row. Neither path waits on a lock the other holds first, so
//! the two cannot deadlock each other.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::custody::{ReturnTransition, TakeOutcome, TakeTransition};
use crate::domain::error::{Conflict, CoreError, Resource};
use crate::domain::key::CustodyState;
use crate::domain::repository::CustodyStore;

pub struct PostgresCustodyStore {
    pool: PgPool,
}

impl PostgresCustodyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustodyStore for PostgresCustodyStore {
    async fn commit_take(&self, transition: &TakeTransition) -> Result<TakeOutcome, CoreError> {
        let mut tx = self.pool.begin().await?;

        let key_row = sqlx::query("SELECT custody, key_slot_id FROM keys WHERE id = $1 FOR UPDATE")
            .bind(transition.key_id.0)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound(Resource::Key))?;

        // Second TAKE of the same key blocks on the row lock above and
        // fails here once the first one commits.
        let custody: String = key_row.get("custody");
        if CustodyState::parse(&custody) != Some(CustodyState::InStore) {
            return Err(CoreError::Conflict(Conflict::AlreadyTaken));
        }

        let slot_id: Uuid = key_row
            .get::<Option<Uuid>, _>("key_slot_id")
            .ok_or_else(|| CoreError::Internal("key in store without a slot".to_string()))?;

        let slot_row = sqlx::query("SELECT number FROM key_slots WHERE id = $1")
            .bind(slot_id)
            .fetch_one(&mut *tx)
            .await?;
        let freed_slot_number: i32 = slot_row.get("number");

        sqlx::query(
            r#"
            UPDATE keys
            SET custody = 'taken', key_slot_id = NULL,
                last_user_id = $2, last_device_id = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(transition.key_id.0)
        .bind(transition.user_id.0)
        .bind(transition.device_id.0)
        .bind(transition.at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO operations (user_id, key_id, device_id, operation_type, timestamp)
            VALUES ($1, $2, $3, 'take', $4)
            "#,
        )
        .bind(transition.user_id.0)
        .bind(transition.key_id.0)
        .bind(transition.device_id.0)
        .bind(transition.at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(TakeOutcome {
            key_id: transition.key_id,
            freed_slot_number,
        })
    }

    async fn commit_return(&self, transition: &ReturnTransition) -> Result<(), CoreError> {
        let mut tx = self.pool.begin().await?;

        let slot_row = sqlx::query("SELECT is_locked FROM key_slots WHERE id = $1 FOR UPDATE")
            .bind(transition.slot_id.0)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound(Resource::Slot))?;

        if slot_row.get::<bool, _>("is_locked") {
            return Err(CoreError::Conflict(Conflict::SlotOccupied));
        }

        let key_row =
            sqlx::query("SELECT custody, last_user_id FROM keys WHERE id = $1 FOR UPDATE")
                .bind(transition.key_id.0)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(CoreError::NotFound(Resource::Key))?;

        let custody: String = key_row.get("custody");
        if CustodyState::parse(&custody) != Some(CustodyState::Taken) {
            return Err(CoreError::Conflict(Conflict::AlreadyInStore));
        }

        // Slot row is locked, so a racing return into the same slot has
        // already committed or is waiting behind us.
        let occupant = sqlx::query("SELECT id FROM keys WHERE key_slot_id = $1")
            .bind(transition.slot_id.0)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(row) = occupant {
            if row.get::<Uuid, _>("id") != transition.key_id.0 {
                return Err(CoreError::Conflict(Conflict::SlotOccupied));
            }
        }

        let logged_user = transition
            .returned_by
            .map(|u| u.0)
            .or_else(|| key_row.get::<Option<Uuid>, _>("last_user_id"));

        sqlx::query(
            r#"
            UPDATE keys
            SET custody = 'in_store', key_slot_id = $2,
                last_user_id = $3, last_device_id = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(transition.key_id.0)
        .bind(transition.slot_id.0)
        .bind(logged_user)
        .bind(transition.device_id.0)
        .bind(transition.at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO operations (user_id, key_id, device_id, operation_type, timestamp)
            VALUES ($1, $2, $3, 'return', $4)
            "#,
        )
        .bind(logged_user)
        .bind(transition.key_id.0)
        .bind(transition.device_id.0)
        .bind(transition.at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}
