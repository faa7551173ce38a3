//! User storage

use async_trait::async_trait;

use super::{unique_violation_or, Repository};
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{NewUser, User, UserRow},
    },
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn users_get(&self, id: i32) -> AppResult<Option<User>>;

    /// Case-insensitive lookup
    async fn users_get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a user. A taken email is a `Conflict`.
    async fn users_create(&self, new: &NewUser) -> AppResult<User>;

    async fn users_list(&self) -> AppResult<Vec<User>>;

    /// Add a role unless the user already has it
    async fn users_add_role(&self, id: i32, role: Role) -> AppResult<Option<User>>;
}

#[async_trait]
impl UserStore for Repository {
    async fn users_get(&self, id: i32) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn users_get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn users_create(&self, new: &NewUser) -> AppResult<User> {
        let roles: Vec<&str> = new.roles.iter().map(|r| r.as_str()).collect();
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, full_name, profile_info, password_hash, roles)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&new.email)
        .bind(&new.full_name)
        .bind(&new.profile_info)
        .bind(&new.password_hash)
        .bind(&roles)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            unique_violation_or(e, AppError::Conflict("Email already registered".to_string()))
        })?;
        Ok(row.into())
    }

    async fn users_list(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn users_add_role(&self, id: i32, role: Role) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET roles = CASE WHEN $2 = ANY(roles) THEN roles ELSE array_append(roles, $2) END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }
}
