//! Authentication and user administration endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::user::{AssignRoleRequest, AuthResponse, LoginRequest, RegisterRequest, User},
    AppState,
};

use super::AuthenticatedUser;

/// Register a student account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let response = state.services.users.register(&request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let response = state.services.users.login(&request).await?;
    Ok(Json(response))
}

/// Get current user profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(State(state): State<AppState>, user: AuthenticatedUser) -> AppResult<Json<User>> {
    let profile = state.services.users.me(&user.caller()).await?;
    Ok(Json(profile))
}

/// List all users (admin)
#[utoipa::path(
    get,
    path = "/auth/users",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = Vec<User>),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(State(state): State<AppState>, user: AuthenticatedUser) -> AppResult<Json<Vec<User>>> {
    let users = state.services.users.list_users(&user.caller()).await?;
    Ok(Json(users))
}

/// Grant a role to a user (admin)
#[utoipa::path(
    post,
    path = "/auth/assign-role",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "Role assigned", body = User),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn assign_role(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<AssignRoleRequest>,
) -> AppResult<Json<User>> {
    let updated = state.services.users.assign_role(&user.caller(), &request).await?;
    Ok(Json(updated))
}
