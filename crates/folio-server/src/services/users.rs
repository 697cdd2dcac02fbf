// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Administrator accounts
//!
//! Passwords are stored as argon2 hashes and never leave this module.

use crate::auth::hash_password;
use crate::config::AdminAccount;
use crate::error::{ServerError, ServerResult};
use crate::services::single_field;
use folio_api_contract::{collections, CreateUserRequest, PublicUser, UpdateUserRequest, User};
use folio_local_db::{to_document, Collection, Database};
use serde_json::Value;
use tracing::info;
use validator::Validate;

const DEFAULT_PROFILE_PICTURE: &str = "/me.jpg";

pub struct UserService {
    users: Collection<User>,
}

impl UserService {
    pub fn new(db: &Database) -> Self {
        Self {
            users: db.typed(collections::USERS),
        }
    }

    fn not_found() -> ServerError {
        ServerError::not_found("User")
    }

    pub async fn list(&self) -> ServerResult<Vec<PublicUser>> {
        let users = self.users.find_all().await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    pub async fn get(&self, id: &str) -> ServerResult<PublicUser> {
        self.users
            .find_by_id(id)
            .await?
            .map(PublicUser::from)
            .ok_or_else(Self::not_found)
    }

    pub async fn find_by_email(&self, email: &str) -> ServerResult<Option<User>> {
        Ok(self.users.find_one(&single_field("email", email)).await?)
    }

    /// Create an account; optional profile fields get their defaults
    pub async fn create(&self, request: &CreateUserRequest) -> ServerResult<PublicUser> {
        request.validate()?;

        if self.find_by_email(&request.email).await?.is_some() {
            return Err(ServerError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let or_empty = |value: &Option<String>| value.clone().unwrap_or_default();
        let user = User {
            email: request.email.clone(),
            password: hash_password(&request.password)?,
            full_name: request.full_name.clone(),
            role: request.role.unwrap_or_default(),
            public_email: request
                .public_email
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| request.email.clone()),
            phone_number: or_empty(&request.phone_number),
            location: or_empty(&request.location),
            profile_picture: request
                .profile_picture
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_PROFILE_PICTURE.to_string()),
            bio: or_empty(&request.bio),
            github_url: or_empty(&request.github_url),
            linkedin_url: or_empty(&request.linkedin_url),
            x_url: or_empty(&request.x_url),
            ..Default::default()
        };

        let created = self.users.create(&user).await?;
        info!(user_id = %created.id, "User created");
        Ok(created.into())
    }

    /// Update an account; a non-empty new password is hashed first
    pub async fn update(&self, id: &str, request: &UpdateUserRequest) -> ServerResult<PublicUser> {
        let mut patch = to_document(request)?;
        match request.password.as_deref() {
            Some(password) if !password.is_empty() => {
                patch.insert("password".to_string(), Value::String(hash_password(password)?));
            }
            _ => {
                patch.remove("password");
            }
        }

        self.users
            .update_document(id, patch)
            .await?
            .map(PublicUser::from)
            .ok_or_else(Self::not_found)
    }

    pub async fn delete(&self, id: &str) -> ServerResult<String> {
        if !self.users.delete(id).await? {
            return Err(Self::not_found());
        }
        info!(user_id = %id, "User deleted");
        Ok("User deleted successfully".to_string())
    }

    /// Create the configured administrator unless an account with that email exists
    ///
    /// Returns the new account, or `None` when nothing was created.
    pub async fn ensure_admin(&self, admin: &AdminAccount) -> ServerResult<Option<PublicUser>> {
        if self.find_by_email(&admin.email).await?.is_some() {
            info!(email = %admin.email, "Admin user already exists");
            return Ok(None);
        }

        let created = self
            .create(&CreateUserRequest {
                email: admin.email.clone(),
                password: admin.password.clone(),
                full_name: admin.name.clone(),
                ..Default::default()
            })
            .await?;
        Ok(Some(created))
    }
}
