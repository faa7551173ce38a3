//! Booking storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Repository, ACTIVE_BOOKING_FILTER, BOOKING_DETAILS_SELECT};
use crate::{
    error::{AppResult, SchedulingError},
    models::{
        booking::{Booking, BookingDetails, BookingDetailsRow, BookingScope, NewBooking},
        enums::BookingStatus,
        slot::Slot,
    },
    scheduling::rules,
};

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Atomically validate the booking against its slot and the slot's active
    /// bookings, then insert it as `pending_approval`
    async fn bookings_create(&self, new: &NewBooking) -> AppResult<Booking>;

    /// Atomically change a booking's status. Bookings outside `scope` are
    /// reported as not found. A student's update to an already cancelled
    /// booking returns it unchanged.
    async fn bookings_set_status(
        &self,
        id: i32,
        scope: BookingScope,
        status: BookingStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Booking>;

    /// Joined booking (student name and email), without its slot
    async fn bookings_get_details(&self, id: i32) -> AppResult<Option<BookingDetails>>;

    /// A student's bookings, newest first
    async fn bookings_list_for_student(&self, student_id: i32) -> AppResult<Vec<BookingDetails>>;
}

#[async_trait]
impl BookingStore for Repository {
    async fn bookings_create(&self, new: &NewBooking) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        // The slot row lock serializes every booking decision for this slot
        let slot = sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = $1 FOR UPDATE")
            .bind(new.slot_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(SchedulingError::NotFound("Slot"))?;

        let active = sqlx::query_as::<_, Booking>(&format!(
            "SELECT * FROM bookings WHERE slot_id = $1 AND {}",
            ACTIVE_BOOKING_FILTER
        ))
        .bind(slot.id)
        .fetch_all(&mut *tx)
        .await?;

        rules::ensure_bookable(&slot, &new.range, &active, new.created_at)?;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (slot_id, student_user_id, start_time, end_time, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(slot.id)
        .bind(new.student_user_id)
        .bind(new.range.start)
        .bind(new.range.end)
        .bind(BookingStatus::PendingApproval)
        .bind(new.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(booking)
    }

    async fn bookings_set_status(
        &self,
        id: i32,
        scope: BookingScope,
        status: BookingStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        let (query, scope_id) = match scope {
            BookingScope::Any => ("SELECT b.slot_id FROM bookings b WHERE b.id = $1 AND $2::INTEGER IS NULL", None),
            BookingScope::SlotOwner(staff_id) => (
                "SELECT b.slot_id FROM bookings b JOIN slots s ON s.id = b.slot_id \
                 WHERE b.id = $1 AND s.created_by_staff_id = $2",
                Some(staff_id),
            ),
            BookingScope::Student(student_id) => (
                "SELECT b.slot_id FROM bookings b WHERE b.id = $1 AND b.student_user_id = $2",
                Some(student_id),
            ),
        };

        let slot_id: i32 = sqlx::query_scalar(query)
            .bind(id)
            .bind(scope_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(SchedulingError::NotFound("Booking"))?;

        sqlx::query("SELECT id FROM slots WHERE id = $1 FOR UPDATE")
            .bind(slot_id)
            .execute(&mut *tx)
            .await?;

        let siblings = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE slot_id = $1")
            .bind(slot_id)
            .fetch_all(&mut *tx)
            .await?;

        let booking = siblings
            .iter()
            .find(|b| b.id == id)
            .ok_or(SchedulingError::NotFound("Booking"))?;

        if rules::is_settled(booking, scope) {
            let booking = booking.clone();
            tx.commit().await?;
            return Ok(booking);
        }

        rules::ensure_reactivation_allowed(booking, status, &siblings)?;

        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(status)
        .bind(now)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn bookings_get_details(&self, id: i32) -> AppResult<Option<BookingDetails>> {
        let query = format!("{} WHERE b.id = $1", BOOKING_DETAILS_SELECT);
        let row = sqlx::query_as::<_, BookingDetailsRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(BookingDetails::from))
    }

    async fn bookings_list_for_student(&self, student_id: i32) -> AppResult<Vec<BookingDetails>> {
        let query = format!(
            "{} WHERE b.student_user_id = $1 ORDER BY b.created_at DESC, b.id DESC",
            BOOKING_DETAILS_SELECT
        );
        let rows = sqlx::query_as::<_, BookingDetailsRow>(&query)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(BookingDetails::from).collect())
    }
}
