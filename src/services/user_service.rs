use std::sync::Arc;

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    auth::Caller,
    errors::{AppError, AppResult},
    models::{
        domain::{User, UserRole},
        dto::{request::CreateUserRequest, response::UserDto},
    },
    repositories::UserRepository,
};

pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_user(
        &self,
        request: CreateUserRequest,
        now: DateTime<Utc>,
    ) -> AppResult<UserDto> {
        request.validate()?;

        if request.student_number.is_some() && request.role != UserRole::Student {
            return Err(AppError::ValidationError(
                "student_number is only allowed for students".to_string(),
            ));
        }

        if self
            .repository
            .find_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyExists(format!(
                "User with username '{}' already exists",
                request.username
            )));
        }

        let mut user = User::new(&request.name, &request.username, &request.email, request.role);
        user.student_number = request.student_number;
        user.created_at = Some(now);

        let created = self.repository.create(user).await.map_err(|e| match e {
            AppError::AlreadyExists(_) => AppError::AlreadyExists(format!(
                "User with username '{}' or the same student number already exists",
                request.username
            )),
            other => other,
        })?;

        log::info!(
            "Created {} user {} ({})",
            created.role.as_str(),
            created.username,
            created.id
        );
        Ok(UserDto::from(created))
    }

    pub async fn list_users(&self) -> AppResult<Vec<UserDto>> {
        let mut users = self.repository.find_all().await?;
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users.into_iter().map(UserDto::from).collect())
    }

    /// Re-loads the token subject; tokens of deleted or deactivated users stop working.
    pub async fn current_caller(&self, user_id: &str) -> AppResult<Caller> {
        let user = self.active_user(user_id).await?;
        Ok(Caller::from(&user))
    }

    pub async fn me(&self, user_id: &str) -> AppResult<UserDto> {
        self.active_user(user_id).await.map(UserDto::from)
    }

    async fn active_user(&self, user_id: &str) -> AppResult<User> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Unknown user".to_string()))?;

        if !user.is_active() {
            return Err(AppError::Forbidden("User account is inactive".to_string()));
        }
        Ok(user)
    }
}
