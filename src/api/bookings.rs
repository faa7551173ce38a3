//! Booking endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::booking::{BookingDetails, CreateBooking, UpdateBookingStatus},
    AppState,
};

use super::AuthenticatedUser;

/// The caller's bookings, newest first
#[utoipa::path(
    get,
    path = "/bookings/my-bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own bookings with their slots", body = Vec<BookingDetails>),
        (status = 403, description = "Student role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_my_bookings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<BookingDetails>>> {
    let bookings = state.services.bookings.list_my_bookings(&user.caller()).await?;
    Ok(Json(bookings))
}

/// Book part of a slot
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBooking,
    responses(
        (status = 201, description = "Booking created, pending approval", body = BookingDetails),
        (status = 400, description = "Out of bounds, overlapping or unavailable slot", body = crate::error::ErrorResponse),
        (status = 404, description = "Slot not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(data): Json<CreateBooking>,
) -> AppResult<(StatusCode, Json<BookingDetails>)> {
    let booking = state.services.bookings.create_booking(&user.caller(), &data).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Change a booking's status (staff of the slot, or admin)
#[utoipa::path(
    put,
    path = "/bookings/{id}/status",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    request_body = UpdateBookingStatus,
    responses(
        (status = 200, description = "Booking updated", body = BookingDetails),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateBookingStatus>,
) -> AppResult<Json<BookingDetails>> {
    let booking = state
        .services
        .bookings
        .update_status(&user.caller(), id, data.status)
        .await?;
    Ok(Json(booking))
}

/// Cancel one of the caller's bookings
#[utoipa::path(
    put,
    path = "/bookings/{id}/cancel",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingDetails),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookingDetails>> {
    let booking = state.services.bookings.cancel_own(&user.caller(), id).await?;
    Ok(Json(booking))
}
