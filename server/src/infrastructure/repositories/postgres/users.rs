// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::error::CoreError;
use crate::domain::repository::UserRepository;
use crate::domain::role::RoleId;
use crate::domain::user::{User, UserId};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: UserId(row.get("id")),
        name: row.get("name"),
        nfc_tag: row.get("nfc_tag"),
        role_id: row.get::<Option<uuid::Uuid>, _>("role_id").map(RoleId),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const USER_COLUMNS: &str = "id, name, nfc_tag, role_id, created_at, updated_at";

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn save(&self, user: &User) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, nfc_tag, role_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                nfc_tag = EXCLUDED.nfc_tag,
                role_id = EXCLUDED.role_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id.0)
        .bind(&user.name)
        .bind(&user.nfc_tag)
        .bind(user.role_id.map(|r| r.0))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, CoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_nfc(&self, nfc_tag: &str) -> Result<Option<User>, CoreError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE nfc_tag = $1"
        ))
        .bind(nfc_tag)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn list_all(&self) -> Result<Vec<User>, CoreError> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn delete(&self, id: UserId) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn count_with_role(&self, role_id: RoleId) -> Result<u64, CoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM users WHERE role_id = $1")
            .bind(role_id.0)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("total") as u64)
    }
}
