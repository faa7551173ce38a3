//! API handlers for Equiplab REST endpoints

pub mod auth;
pub mod bookings;
pub mod equipment;
pub mod health;
pub mod notifications;
pub mod openapi;
pub mod reference;
pub mod slots;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::AppError,
    models::user::{Caller, UserClaims},
    AppState,
};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

impl AuthenticatedUser {
    pub fn caller(&self) -> Caller {
        self.0.caller()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication and users
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/users", get(auth::list_users))
        .route("/auth/assign-role", post(auth::assign_role))
        // Equipment
        .route("/equipment", get(equipment::list_equipment).post(equipment::create_equipment))
        .route("/equipment/types", get(equipment::list_types).post(equipment::create_type))
        .route(
            "/equipment/types/:id/next-inventory-number",
            get(equipment::next_inventory_number),
        )
        .route(
            "/equipment/:id",
            get(equipment::get_equipment)
                .put(equipment::update_equipment)
                .delete(equipment::delete_equipment),
        )
        // Reference data
        .route("/locations", get(reference::list_locations).post(reference::create_location))
        .route("/subjects", get(reference::list_subjects).post(reference::create_subject))
        // Slots
        .route("/slots", post(slots::create_slot))
        .route("/slots/bulk", post(slots::create_bulk_slots))
        .route("/slots/available", get(slots::list_available))
        .route("/slots/my-slots", get(slots::list_my_slots))
        .route("/slots/:id", axum::routing::delete(slots::delete_slot))
        // Bookings
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/my-bookings", get(bookings::list_my_bookings))
        .route("/bookings/:id/status", put(bookings::update_status))
        .route("/bookings/:id/cancel", put(bookings::cancel_booking))
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/:id/read", put(notifications::mark_read))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
