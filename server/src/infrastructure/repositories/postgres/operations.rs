// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::device::DeviceId;
use crate::domain::error::CoreError;
use crate::domain::operation::{OperationFilter, OperationRecord, OperationType};
use crate::domain::repository::OperationRepository;
use crate::domain::user::UserId;

pub struct PostgresOperationRepository {
    pool: PgPool,
}

impl PostgresOperationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> Result<OperationRecord, CoreError> {
    let kind_str: String = row.get("operation_type");
    let kind = OperationType::parse(&kind_str)
        .ok_or_else(|| CoreError::Internal(format!("unknown operation type: {kind_str}")))?;

    Ok(OperationRecord {
        id: row.get("id"),
        user_id: row.get::<Option<uuid::Uuid>, _>("user_id").map(UserId),
        key_number: row.get("key_number"),
        device_id: DeviceId(row.get("device_id")),
        kind,
        timestamp: row.get("timestamp"),
    })
}

#[async_trait]
impl OperationRepository for PostgresOperationRepository {
    async fn list(&self, filter: &OperationFilter) -> Result<Vec<OperationRecord>, CoreError> {
        // Keys may be deleted after the fact; the LEFT JOIN keeps the log
        // row and blanks the display number.
        let rows = sqlx::query(
            r#"
            SELECT o.id, o.user_id, k.key_number, o.device_id, o.operation_type, o.timestamp
            FROM operations o
            LEFT JOIN keys k ON k.id = o.key_id
            WHERE ($1::uuid IS NULL OR o.user_id = $1)
              AND ($2::text IS NULL OR k.key_number = $2)
              AND ($3::uuid IS NULL OR o.device_id = $3)
            ORDER BY o.timestamp DESC, o.id DESC
            "#,
        )
        .bind(filter.user_id.map(|u| u.0))
        .bind(filter.key_number.as_deref())
        .bind(filter.device_id.map(|d| d.0))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }
}
