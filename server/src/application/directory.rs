// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0
//! Admin CRUD for roles and users.
//!
//! Referential guards are explicit checks here, never cascades: a role
//! cannot be deleted while a user or key references it, and NFC tags stay
//! globally unique.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::domain::error::{Conflict, CoreError, Resource};
use crate::domain::repository::{KeyRepository, RoleRepository, UserRepository};
use crate::domain::role::{Role, RoleId};
use crate::domain::user::{User, UserId, UserUpdate};

/// A user joined with its role name for listings.
#[derive(Debug, Clone)]
pub struct UserListing {
    pub user: User,
    pub role_name: Option<String>,
}

pub struct DirectoryService {
    roles: Arc<dyn RoleRepository>,
    users: Arc<dyn UserRepository>,
    keys: Arc<dyn KeyRepository>,
}

impl DirectoryService {
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        users: Arc<dyn UserRepository>,
        keys: Arc<dyn KeyRepository>,
    ) -> Self {
        Self { roles, users, keys }
    }

    pub async fn create_role(&self, name: &str) -> Result<Role, CoreError> {
        if name.is_empty() {
            return Err(CoreError::BadRequest("name"));
        }
        if self.roles.find_by_name(name).await?.is_some() {
            return Err(CoreError::Conflict(Conflict::RoleAlreadyExists));
        }
        let role = Role::new(name);
        self.roles.save(&role).await?;
        info!(role = %role.id.0, name, "role created");
        Ok(role)
    }

    pub async fn rename_role(&self, id: RoleId, name: &str) -> Result<Role, CoreError> {
        if name.is_empty() {
            return Err(CoreError::BadRequest("name"));
        }
        let mut role = self
            .roles
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound(Resource::Role))?;
        if let Some(existing) = self.roles.find_by_name(name).await? {
            if existing.id != id {
                return Err(CoreError::Conflict(Conflict::RoleAlreadyExists));
            }
        }
        role.rename(name);
        self.roles.save(&role).await?;
        Ok(role)
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, CoreError> {
        self.roles.list_all().await
    }

    pub async fn delete_role(&self, id: RoleId) -> Result<(), CoreError> {
        self.roles
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound(Resource::Role))?;
        let referenced = self.users.count_with_role(id).await? > 0
            || self.keys.count_assigned_to_role(id).await? > 0;
        if referenced {
            return Err(CoreError::Conflict(Conflict::RoleInUse));
        }
        self.roles.delete(id).await?;
        info!(role = %id.0, "role deleted");
        Ok(())
    }

    pub async fn create_user(
        &self,
        name: &str,
        nfc_tag: &str,
        role_id: RoleId,
    ) -> Result<User, CoreError> {
        if name.is_empty() {
            return Err(CoreError::BadRequest("name"));
        }
        if nfc_tag.is_empty() {
            return Err(CoreError::BadRequest("nfc_tag"));
        }
        self.roles
            .find_by_id(role_id)
            .await?
            .ok_or(CoreError::NotFound(Resource::Role))?;
        if self.users.find_by_nfc(nfc_tag).await?.is_some() {
            return Err(CoreError::Conflict(Conflict::NfcTagAlreadyInUse));
        }
        let user = User::new(name, nfc_tag, Some(role_id));
        self.users.save(&user).await?;
        info!(user = %user.id.0, "user created");
        Ok(user)
    }

    pub async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, CoreError> {
        let mut user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound(Resource::User))?;
        if let Some(nfc_tag) = &update.nfc_tag {
            if let Some(existing) = self.users.find_by_nfc(nfc_tag).await? {
                if existing.id != id {
                    return Err(CoreError::Conflict(Conflict::NfcTagAlreadyInUse));
                }
            }
        }
        if let Some(role_id) = update.role_id {
            self.roles
                .find_by_id(role_id)
                .await?
                .ok_or(CoreError::NotFound(Resource::Role))?;
        }
        user.apply(update);
        self.users.save(&user).await?;
        Ok(user)
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), CoreError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound(Resource::User))?;
        self.users.delete(id).await?;
        info!(user = %id.0, "user deleted");
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<UserListing>, CoreError> {
        let role_names: HashMap<RoleId, String> = self
            .roles
            .list_all()
            .await?
            .into_iter()
            .map(|role| (role.id, role.name))
            .collect();
        Ok(self
            .users
            .list_all()
            .await?
            .into_iter()
            .map(|user| {
                let role_name = user.role_id.and_then(|id| role_names.get(&id).cloned());
                UserListing { user, role_name }
            })
            .collect())
    }

    pub async fn role_name(&self, id: RoleId) -> Result<Option<String>, CoreError> {
        Ok(self.roles.find_by_id(id).await?.map(|role| role.name))
    }
}
