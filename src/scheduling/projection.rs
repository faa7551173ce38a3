//! Display-only status derivation

use chrono::{DateTime, Utc};

use crate::models::enums::SlotStatus;

/// An available slot whose end has passed is shown as expired. The stored
/// status is left untouched.
pub fn display_status(stored: SlotStatus, end_time: DateTime<Utc>, now: DateTime<Utc>) -> SlotStatus {
    if stored == SlotStatus::Available && end_time < now {
        SlotStatus::Expired
    } else {
        stored
    }
}
