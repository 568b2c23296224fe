//! User management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, UpdateUser, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn create(&self, data: CreateUser) -> AppResult<User> {
        data.validate()?;

        if self.repository.users.email_taken(&data.email, None).await? {
            return Err(AppError::Conflict(format!("Email {} is already in use", data.email)));
        }

        let user = self.repository.users.create(&data).await?;
        tracing::info!("User {} created", user.id);
        Ok(user)
    }

    /// Partial update, absent fields keep their value
    pub async fn update(&self, id: i64, data: UpdateUser) -> AppResult<User> {
        data.validate()?;

        if !self.repository.users.exists(id).await? {
            return Err(AppError::UserNotFound(id));
        }
        if let Some(ref email) = data.email {
            if self.repository.users.email_taken(email, Some(id)).await? {
                return Err(AppError::Conflict(format!("Email {} is already in use", email)));
            }
        }

        self.repository
            .users
            .update(id, &data)
            .await?
            .ok_or(AppError::UserNotFound(id))
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        self.repository
            .users
            .get_by_id(id)
            .await?
            .ok_or(AppError::UserNotFound(id))
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    /// Delete a user nothing refers to any more
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.repository.users.delete(id).await? {
            return Err(AppError::UserNotFound(id));
        }
        tracing::info!("User {} deleted", id);
        Ok(())
    }
}
