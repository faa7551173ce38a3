//! Slot endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::slot::{CreateBulkSlots, CreateSlot, SlotDetails},
    AppState,
};

use super::AuthenticatedUser;

/// Upcoming available slots with their active bookings
#[utoipa::path(
    get,
    path = "/slots/available",
    tag = "slots",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Available slots ordered by start time", body = Vec<SlotDetails>)
    )
)]
pub async fn list_available(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<SlotDetails>>> {
    let slots = state.services.slots.list_available(&user.caller()).await?;
    Ok(Json(slots))
}

/// Slots created by the caller (all slots for admins), with every booking
#[utoipa::path(
    get,
    path = "/slots/my-slots",
    tag = "slots",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own slots", body = Vec<SlotDetails>),
        (status = 403, description = "Staff role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_my_slots(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<SlotDetails>>> {
    let slots = state.services.slots.list_mine(&user.caller()).await?;
    Ok(Json(slots))
}

/// Publish a slot; times are floored to the quarter hour
#[utoipa::path(
    post,
    path = "/slots",
    tag = "slots",
    security(("bearer_auth" = [])),
    request_body = CreateSlot,
    responses(
        (status = 201, description = "Slot created", body = SlotDetails),
        (status = 400, description = "Invalid range, not assigned or time conflict", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_slot(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(data): Json<CreateSlot>,
) -> AppResult<(StatusCode, Json<SlotDetails>)> {
    let slot = state.services.slots.create_slot(&user.caller(), &data).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

/// Publish the same slot on several pieces of equipment, skipping conflicts
#[utoipa::path(
    post,
    path = "/slots/bulk",
    tag = "slots",
    security(("bearer_auth" = [])),
    request_body = CreateBulkSlots,
    responses(
        (status = 201, description = "Slots created", body = Vec<SlotDetails>),
        (status = 400, description = "Nothing could be created", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_bulk_slots(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(data): Json<CreateBulkSlots>,
) -> AppResult<(StatusCode, Json<Vec<SlotDetails>>)> {
    let slots = state.services.slots.create_bulk_slots(&user.caller(), &data).await?;
    Ok((StatusCode::CREATED, Json(slots)))
}

/// Delete a slot without active bookings
#[utoipa::path(
    delete,
    path = "/slots/{id}",
    tag = "slots",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Slot ID")),
    responses(
        (status = 204, description = "Slot deleted"),
        (status = 400, description = "Slot has active bookings", body = crate::error::ErrorResponse),
        (status = 404, description = "Slot not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_slot(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.slots.delete_slot(&user.caller(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
