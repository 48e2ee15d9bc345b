// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::error::CoreError;
use crate::domain::repository::RoleRepository;
use crate::domain::role::{Role, RoleId};

pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn role_from_row(row: &PgRow) -> Role {
    Role {
        id: RoleId(row.get("id")),
        name: row.get("name"),
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn save(&self, role: &Role) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO roles (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(role.id.0)
        .bind(&role.name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: RoleId) -> Result<Option<Role>, CoreError> {
        let row = sqlx::query("SELECT id, name FROM roles WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(role_from_row))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, CoreError> {
        let row = sqlx::query("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(role_from_row))
    }

    async fn list_all(&self) -> Result<Vec<Role>, CoreError> {
        let rows = sqlx::query("SELECT id, name FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(role_from_row).collect())
    }

    async fn delete(&self, id: RoleId) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
