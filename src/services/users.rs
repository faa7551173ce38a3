//! Authentication and user management service

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{AssignRoleRequest, AuthResponse, Caller, LoginRequest, NewUser, RegisterRequest, User, UserClaims},
    },
    repository::UserStore,
};

#[derive(Clone)]
pub struct UsersService {
    store: Arc<dyn UserStore>,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(store: Arc<dyn UserStore>, config: AuthConfig) -> Self {
        Self { store, config }
    }

    /// Create a student account and sign it in
    pub async fn register(&self, request: &RegisterRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let user = self
            .store
            .users_create(&NewUser {
                email: request.email.trim().to_string(),
                full_name: request.full_name.clone(),
                profile_info: request.profile_info.clone(),
                password_hash: self.hash_password(&request.password)?,
                roles: vec![Role::Student],
            })
            .await?;

        tracing::info!("User {} registered", user.id);
        self.auth_response(&user)
    }

    /// Authenticate by email and password
    pub async fn login(&self, request: &LoginRequest) -> AppResult<AuthResponse> {
        let user = self
            .store
            .users_get_by_email(request.email.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&user, &request.password)? {
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        tracing::info!("User {} logged in", user.id);
        self.auth_response(&user)
    }

    pub async fn me(&self, caller: &Caller) -> AppResult<User> {
        self.fetch(caller.user_id).await
    }

    pub async fn list_users(&self, caller: &Caller) -> AppResult<Vec<User>> {
        caller.require_admin()?;
        self.store.users_list().await
    }

    /// Grant a role. Granting a role the user already has changes nothing.
    pub async fn assign_role(&self, caller: &Caller, request: &AssignRoleRequest) -> AppResult<User> {
        caller.require_admin()?;
        let user = self
            .store
            .users_add_role(request.user_id, request.role)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", request.user_id)))?;

        tracing::info!("Role {} assigned to user {} by {}", request.role, user.id, caller.user_id);
        Ok(user)
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        if user.password_hash.is_empty() {
            return Ok(false);
        }
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    fn auth_response(&self, user: &User) -> AppResult<AuthResponse> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            roles: user.roles.clone(),
            exp: now + (self.config.jwt_expiration_hours as i64 * 3600),
            iat: now,
        };
        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(AuthResponse {
            token,
            token_type: "Bearer".to_string(),
            user_id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            roles: user.roles.clone(),
        })
    }

    async fn fetch(&self, id: i32) -> AppResult<User> {
        self.store
            .users_get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }
}
