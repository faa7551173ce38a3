//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, bookings, equipment, health, notifications, reference, slots};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Equiplab API",
        version = "0.3.0",
        description = "University equipment booking REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        auth::list_users,
        auth::assign_role,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        equipment::list_types,
        equipment::create_type,
        equipment::next_inventory_number,
        // Reference data
        reference::list_locations,
        reference::create_location,
        reference::list_subjects,
        reference::create_subject,
        // Slots
        slots::list_available,
        slots::list_my_slots,
        slots::create_slot,
        slots::create_bulk_slots,
        slots::delete_slot,
        // Bookings
        bookings::list_my_bookings,
        bookings::create_booking,
        bookings::update_status,
        bookings::cancel_booking,
        // Notifications
        notifications::list_notifications,
        notifications::mark_read,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::User,
            crate::models::user::RegisterRequest,
            crate::models::user::LoginRequest,
            crate::models::user::AuthResponse,
            crate::models::user::AssignRoleRequest,
            crate::models::enums::Role,
            // Equipment
            crate::models::equipment::EquipmentDetails,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            crate::models::equipment::InventoryNumber,
            crate::models::enums::EquipmentStatus,
            crate::models::reference::EquipmentType,
            crate::models::reference::CreateEquipmentType,
            crate::models::reference::Location,
            crate::models::reference::Subject,
            crate::models::reference::CreateNamed,
            // Slots
            crate::models::slot::SlotDetails,
            crate::models::slot::CreateSlot,
            crate::models::slot::CreateBulkSlots,
            crate::models::enums::SlotStatus,
            // Bookings
            crate::models::booking::BookingDetails,
            crate::models::booking::CreateBooking,
            crate::models::booking::UpdateBookingStatus,
            crate::models::enums::BookingStatus,
            // Notifications
            crate::models::notification::Notification,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication and user administration"),
        (name = "equipment", description = "Equipment and equipment types"),
        (name = "reference", description = "Locations and subjects"),
        (name = "slots", description = "Bookable time slots"),
        (name = "bookings", description = "Reservations inside slots"),
        (name = "notifications", description = "Notification inbox")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
