//! Booking models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{enums::BookingStatus, slot::SlotDetails};
use crate::scheduling::time::TimeRange;

/// Booking record as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: i32,
    pub slot_id: i32,
    pub student_user_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn range(&self) -> TimeRange {
        TimeRange::from_normalized(self.start_time, self.end_time)
    }
}

/// Internal row structure for the booking join query
#[derive(Debug, Clone, FromRow)]
pub struct BookingDetailsRow {
    pub id: i32,
    pub slot_id: i32,
    pub student_user_id: i32,
    pub student_name: String,
    pub student_email: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingDetailsRow> for BookingDetails {
    fn from(row: BookingDetailsRow) -> Self {
        BookingDetails {
            id: row.id,
            slot_id: row.slot_id,
            student_user_id: row.student_user_id,
            student_name: row.student_name,
            student_email: row.student_email,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            slot: None,
        }
    }
}

/// Booking joined with its student and, when requested, its slot
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingDetails {
    pub id: i32,
    pub slot_id: i32,
    pub student_user_id: i32,
    pub student_name: String,
    pub student_email: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotDetails>,
}

/// Who may touch a booking in a status update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingScope {
    /// Admins: any booking
    Any,
    /// Staff: bookings on slots they created
    SlotOwner(i32),
    /// Students: their own bookings
    Student(i32),
}

/// Booking to insert after normalization
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub slot_id: i32,
    pub student_user_id: i32,
    pub range: TimeRange,
    pub created_at: DateTime<Utc>,
}

/// Create booking request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBooking {
    pub slot_id: i32,
    /// Start of the reservation inside the slot
    pub start_time: DateTime<Utc>,
    /// End of the reservation inside the slot
    pub end_time: DateTime<Utc>,
}

/// Status update request (staff)
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateBookingStatus {
    pub status: BookingStatus,
}
