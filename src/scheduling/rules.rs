//! Admission rules for slots and bookings

use chrono::{DateTime, Utc};

use super::{projection, time::TimeRange};
use crate::{
    error::SchedulingError,
    models::{
        booking::{Booking, BookingScope},
        enums::{BookingStatus, SlotStatus},
        slot::Slot,
    },
};

/// Reject a new slot that overlaps an available slot of the same equipment,
/// or that starts at the same instant as any slot of that equipment.
pub fn ensure_no_slot_conflict(range: &TimeRange, existing: &[Slot]) -> Result<(), SchedulingError> {
    let conflict = existing.iter().any(|slot| {
        slot.start_time == range.start
            || (slot.status == SlotStatus::Available && slot.range().overlaps(range))
    });

    if conflict {
        Err(SchedulingError::TimeConflict)
    } else {
        Ok(())
    }
}

/// Check a requested booking against its slot and the slot's bookings.
///
/// Only active bookings in `bookings` are considered for overlap.
pub fn ensure_bookable(
    slot: &Slot,
    range: &TimeRange,
    bookings: &[Booking],
    now: DateTime<Utc>,
) -> Result<(), SchedulingError> {
    if projection::display_status(slot.status, slot.end_time, now) != SlotStatus::Available {
        return Err(SchedulingError::SlotUnavailable);
    }

    if !slot.range().contains(range) {
        return Err(SchedulingError::OutOfBounds);
    }

    let overlap = bookings
        .iter()
        .filter(|b| b.status.is_active())
        .any(|b| b.range().overlaps(range));

    if overlap {
        return Err(SchedulingError::BookingConflict);
    }

    Ok(())
}

/// A slot can only be removed once none of its bookings is active
pub fn ensure_deletable(bookings: &[Booking]) -> Result<(), SchedulingError> {
    if bookings.iter().any(|b| b.status.is_active()) {
        Err(SchedulingError::HasActiveBookings)
    } else {
        Ok(())
    }
}

/// Moving a booking from an inactive status back into an active one must not
/// break the non-overlap invariant among the slot's active bookings.
pub fn ensure_reactivation_allowed(
    booking: &Booking,
    new_status: BookingStatus,
    siblings: &[Booking],
) -> Result<(), SchedulingError> {
    if booking.status.is_active() || !new_status.is_active() {
        return Ok(());
    }

    let range = booking.range();
    let overlap = siblings
        .iter()
        .filter(|b| b.id != booking.id && b.status.is_active())
        .any(|b| b.range().overlaps(&range));

    if overlap {
        Err(SchedulingError::BookingConflict)
    } else {
        Ok(())
    }
}

/// Whether a status update leaves the booking as it is. A student cancelling
/// a booking that is already cancelled keeps the first cancellation.
pub fn is_settled(booking: &Booking, scope: BookingScope) -> bool {
    matches!(scope, BookingScope::Student(_)) && booking.status.is_cancelled()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    fn early() -> DateTime<Utc> {
        at(7, 0)
    }

    fn slot(id: i32, start: DateTime<Utc>, end: DateTime<Utc>, status: SlotStatus) -> Slot {
        Slot {
            id,
            equipment_id: 5,
            created_by_staff_id: 2,
            start_time: start,
            end_time: end,
            status,
        }
    }

    fn booking(id: i32, start: DateTime<Utc>, end: DateTime<Utc>, status: BookingStatus) -> Booking {
        Booking {
            id,
            slot_id: 1,
            student_user_id: 10,
            start_time: start,
            end_time: end,
            status,
            created_at: early(),
            updated_at: early(),
        }
    }

    fn range(s: DateTime<Utc>, e: DateTime<Utc>) -> TimeRange {
        TimeRange::from_normalized(s, e)
    }

    #[test]
    fn test_slot_conflict_with_available_slot() {
        let existing = vec![slot(1, at(9, 0), at(10, 0), SlotStatus::Available)];

        // start inside, end inside, covering
        assert_eq!(
            ensure_no_slot_conflict(&range(at(9, 30), at(10, 30)), &existing),
            Err(SchedulingError::TimeConflict)
        );
        assert_eq!(
            ensure_no_slot_conflict(&range(at(8, 30), at(9, 15)), &existing),
            Err(SchedulingError::TimeConflict)
        );
        assert_eq!(
            ensure_no_slot_conflict(&range(at(8, 0), at(11, 0)), &existing),
            Err(SchedulingError::TimeConflict)
        );
        // touching is fine
        assert!(ensure_no_slot_conflict(&range(at(10, 0), at(11, 0)), &existing).is_ok());
        assert!(ensure_no_slot_conflict(&range(at(8, 0), at(9, 0)), &existing).is_ok());
    }

    #[test]
    fn test_withdrawn_slots_only_block_same_start() {
        let existing = vec![slot(1, at(9, 0), at(10, 0), SlotStatus::Withdrawn)];
        assert!(ensure_no_slot_conflict(&range(at(9, 15), at(9, 45)), &existing).is_ok());
        assert_eq!(
            ensure_no_slot_conflict(&range(at(9, 0), at(9, 30)), &existing),
            Err(SchedulingError::TimeConflict)
        );
    }

    #[test]
    fn test_booking_conflict_and_touching() {
        let s = slot(1, at(9, 0), at(10, 0), SlotStatus::Available);
        let existing = vec![booking(1, at(9, 0), at(9, 30), BookingStatus::Confirmed)];

        assert_eq!(
            ensure_bookable(&s, &range(at(9, 15), at(9, 45)), &existing, early()),
            Err(SchedulingError::BookingConflict)
        );
        assert!(ensure_bookable(&s, &range(at(9, 30), at(10, 0)), &existing, early()).is_ok());
    }

    #[test]
    fn test_cancelled_bookings_free_their_time() {
        let s = slot(1, at(9, 0), at(10, 0), SlotStatus::Available);
        let existing = vec![
            booking(1, at(9, 0), at(9, 30), BookingStatus::CancelledByStudent),
            booking(2, at(9, 30), at(10, 0), BookingStatus::CancelledByStaff),
        ];
        assert!(ensure_bookable(&s, &range(at(9, 0), at(10, 0)), &existing, early()).is_ok());
    }

    #[test]
    fn test_booking_out_of_bounds() {
        let s = slot(1, at(9, 0), at(10, 0), SlotStatus::Available);
        assert_eq!(
            ensure_bookable(&s, &range(at(8, 45), at(9, 30)), &[], early()),
            Err(SchedulingError::OutOfBounds)
        );
        assert_eq!(
            ensure_bookable(&s, &range(at(9, 45), at(10, 15)), &[], early()),
            Err(SchedulingError::OutOfBounds)
        );
    }

    #[test]
    fn test_unavailable_or_expired_slot() {
        let withdrawn = slot(1, at(9, 0), at(10, 0), SlotStatus::Withdrawn);
        assert_eq!(
            ensure_bookable(&withdrawn, &range(at(9, 0), at(9, 30)), &[], early()),
            Err(SchedulingError::SlotUnavailable)
        );

        let available = slot(1, at(9, 0), at(10, 0), SlotStatus::Available);
        let later = at(10, 0) + Duration::minutes(5);
        assert_eq!(
            ensure_bookable(&available, &range(at(9, 0), at(9, 30)), &[], later),
            Err(SchedulingError::SlotUnavailable)
        );
    }

    #[test]
    fn test_deletable() {
        let confirmed = vec![booking(1, at(9, 0), at(9, 30), BookingStatus::Confirmed)];
        assert_eq!(ensure_deletable(&confirmed), Err(SchedulingError::HasActiveBookings));

        let cancelled = vec![booking(1, at(9, 0), at(9, 30), BookingStatus::CancelledByStaff)];
        assert!(ensure_deletable(&cancelled).is_ok());
        assert!(ensure_deletable(&[]).is_ok());
    }

    #[test]
    fn test_reactivation_checks_overlap() {
        let cancelled = booking(1, at(9, 0), at(9, 30), BookingStatus::CancelledByStudent);
        let taken = booking(2, at(9, 15), at(9, 45), BookingStatus::PendingApproval);
        let siblings = vec![cancelled.clone(), taken];

        assert_eq!(
            ensure_reactivation_allowed(&cancelled, BookingStatus::Confirmed, &siblings),
            Err(SchedulingError::BookingConflict)
        );
        // staying inactive never conflicts
        assert!(ensure_reactivation_allowed(&cancelled, BookingStatus::CancelledByStaff, &siblings).is_ok());

        let pending = booking(3, at(9, 0), at(9, 15), BookingStatus::PendingApproval);
        assert!(ensure_reactivation_allowed(&pending, BookingStatus::Confirmed, &siblings).is_ok());
    }

    #[test]
    fn test_student_cancel_keeps_first_cancellation() {
        let by_staff = booking(1, at(9, 0), at(9, 30), BookingStatus::CancelledByStaff);
        assert!(is_settled(&by_staff, BookingScope::Student(7)));
        assert!(!is_settled(&by_staff, BookingScope::Any));
        assert!(!is_settled(&by_staff, BookingScope::SlotOwner(3)));

        let pending = booking(2, at(9, 30), at(10, 0), BookingStatus::PendingApproval);
        assert!(!is_settled(&pending, BookingScope::Student(7)));
    }
}
