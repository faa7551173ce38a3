//! Slot models (bookable equipment time windows)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{booking::BookingDetails, enums::SlotStatus};
use crate::scheduling::{projection, time::TimeRange};

/// Slot record as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Slot {
    pub id: i32,
    pub equipment_id: i32,
    pub created_by_staff_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
}

impl Slot {
    pub fn range(&self) -> TimeRange {
        TimeRange::from_normalized(self.start_time, self.end_time)
    }
}

/// Internal row structure for the slot join query
#[derive(Debug, Clone, FromRow)]
pub struct SlotDetailsRow {
    pub id: i32,
    pub equipment_id: i32,
    pub equipment_type_name: String,
    pub inventory_number: String,
    pub location_name: String,
    pub created_by_staff_id: i32,
    pub created_by_staff_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
}

impl From<SlotDetailsRow> for SlotDetails {
    fn from(row: SlotDetailsRow) -> Self {
        SlotDetails {
            id: row.id,
            equipment_id: row.equipment_id,
            equipment_type_name: row.equipment_type_name,
            inventory_number: row.inventory_number,
            location_name: row.location_name,
            created_by_staff_id: row.created_by_staff_id,
            created_by_staff_name: row.created_by_staff_name,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
            bookings: Vec::new(),
        }
    }
}

/// Slot joined with equipment, location and creator, plus its bookings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SlotDetails {
    pub id: i32,
    pub equipment_id: i32,
    pub equipment_type_name: String,
    pub inventory_number: String,
    pub location_name: String,
    pub created_by_staff_id: i32,
    pub created_by_staff_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
    pub bookings: Vec<BookingDetails>,
}

impl SlotDetails {
    /// Replace the stored status with the display status at `now`
    pub fn with_display_status(mut self, now: DateTime<Utc>) -> Self {
        self.status = projection::display_status(self.status, self.end_time, now);
        self
    }
}

/// Which slots to list
#[derive(Debug, Clone, Default)]
pub struct SlotFilter {
    pub status: Option<SlotStatus>,
    /// Only slots ending strictly after this instant
    pub ends_after: Option<DateTime<Utc>>,
    pub created_by: Option<i32>,
    pub ids: Option<Vec<i32>>,
}

/// Slot to insert after normalization and authorization
#[derive(Debug, Clone)]
pub struct NewSlot {
    pub equipment_id: i32,
    pub created_by_staff_id: i32,
    pub range: TimeRange,
}

/// Create slot request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateSlot {
    pub equipment_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Create the same slot for several pieces of equipment
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBulkSlots {
    pub equipment_ids: Vec<i32>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}
