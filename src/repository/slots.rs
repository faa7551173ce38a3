//! Slot storage

use async_trait::async_trait;

use super::{
    unique_violation_or, Repository, ACTIVE_BOOKING_FILTER, BOOKING_DETAILS_SELECT,
    SLOT_DETAILS_SELECT,
};
use crate::{
    error::{AppResult, SchedulingError},
    models::{
        booking::{Booking, BookingDetails, BookingDetailsRow},
        enums::SlotStatus,
        slot::{NewSlot, Slot, SlotDetails, SlotDetailsRow, SlotFilter},
    },
    scheduling::rules,
};

#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Filter `equipment_ids` down to existing equipment, restricted to
    /// equipment assigned to `staff_scope` when given
    async fn slots_accessible_equipment(
        &self,
        equipment_ids: &[i32],
        staff_scope: Option<i32>,
    ) -> AppResult<Vec<i32>>;

    /// Atomically check the equipment's slots for conflicts and insert
    async fn slots_create(&self, new: &NewSlot) -> AppResult<Slot>;

    async fn slots_get(&self, id: i32) -> AppResult<Option<Slot>>;

    /// Atomically check for active bookings and delete. `owner` restricts the
    /// lookup to slots created by that staff member.
    async fn slots_delete(&self, id: i32, owner: Option<i32>) -> AppResult<()>;

    /// Joined slot rows ordered by start time, without bookings
    async fn slots_list(&self, filter: &SlotFilter) -> AppResult<Vec<SlotDetails>>;

    /// Joined bookings of the given slots ordered by start time
    async fn slots_bookings(&self, slot_ids: &[i32], active_only: bool) -> AppResult<Vec<BookingDetails>>;
}

#[async_trait]
impl SlotStore for Repository {
    async fn slots_accessible_equipment(
        &self,
        equipment_ids: &[i32],
        staff_scope: Option<i32>,
    ) -> AppResult<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT id FROM equipment
            WHERE id = ANY($1)
              AND ($2::INTEGER IS NULL OR assigned_staff_id = $2)
            ORDER BY id
            "#,
        )
        .bind(equipment_ids)
        .bind(staff_scope)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn slots_create(&self, new: &NewSlot) -> AppResult<Slot> {
        let mut tx = self.pool.begin().await?;

        // Serialize slot creation per equipment
        let locked: Option<i32> =
            sqlx::query_scalar("SELECT id FROM equipment WHERE id = $1 FOR UPDATE")
                .bind(new.equipment_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(SchedulingError::NotAssigned.into());
        }

        let existing = sqlx::query_as::<_, Slot>(
            r#"
            SELECT * FROM slots
            WHERE equipment_id = $1
              AND ((start_time < $3 AND end_time > $2) OR start_time = $2)
            "#,
        )
        .bind(new.equipment_id)
        .bind(new.range.start)
        .bind(new.range.end)
        .fetch_all(&mut *tx)
        .await?;

        rules::ensure_no_slot_conflict(&new.range, &existing)?;

        let slot = sqlx::query_as::<_, Slot>(
            r#"
            INSERT INTO slots (equipment_id, created_by_staff_id, start_time, end_time, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.equipment_id)
        .bind(new.created_by_staff_id)
        .bind(new.range.start)
        .bind(new.range.end)
        .bind(SlotStatus::Available)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation_or(e, SchedulingError::TimeConflict))?;

        tx.commit().await?;
        Ok(slot)
    }

    async fn slots_get(&self, id: i32) -> AppResult<Option<Slot>> {
        let slot = sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(slot)
    }

    async fn slots_delete(&self, id: i32, owner: Option<i32>) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let slot = sqlx::query_as::<_, Slot>(
            r#"
            SELECT * FROM slots
            WHERE id = $1 AND ($2::INTEGER IS NULL OR created_by_staff_id = $2)
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(SchedulingError::NotFound("Slot"))?;

        let bookings = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE slot_id = $1")
            .bind(slot.id)
            .fetch_all(&mut *tx)
            .await?;

        rules::ensure_deletable(&bookings)?;

        sqlx::query("DELETE FROM slots WHERE id = $1")
            .bind(slot.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn slots_list(&self, filter: &SlotFilter) -> AppResult<Vec<SlotDetails>> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if filter.status.is_some() {
            conditions.push(format!("s.status = ${}", idx));
            idx += 1;
        }
        if filter.ends_after.is_some() {
            conditions.push(format!("s.end_time > ${}", idx));
            idx += 1;
        }
        if filter.created_by.is_some() {
            conditions.push(format!("s.created_by_staff_id = ${}", idx));
            idx += 1;
        }
        if filter.ids.is_some() {
            conditions.push(format!("s.id = ANY(${})", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!("{} {} ORDER BY s.start_time, s.id", SLOT_DETAILS_SELECT, where_clause);

        let mut builder = sqlx::query_as::<_, SlotDetailsRow>(&query);
        if let Some(status) = filter.status { builder = builder.bind(status); }
        if let Some(ends_after) = filter.ends_after { builder = builder.bind(ends_after); }
        if let Some(created_by) = filter.created_by { builder = builder.bind(created_by); }
        if let Some(ref ids) = filter.ids { builder = builder.bind(ids); }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(SlotDetails::from).collect())
    }

    async fn slots_bookings(&self, slot_ids: &[i32], active_only: bool) -> AppResult<Vec<BookingDetails>> {
        let status_clause = if active_only {
            format!("AND b.{}", ACTIVE_BOOKING_FILTER)
        } else {
            String::new()
        };

        let query = format!(
            "{} WHERE b.slot_id = ANY($1) {} ORDER BY b.start_time, b.id",
            BOOKING_DETAILS_SELECT, status_clause
        );

        let rows = sqlx::query_as::<_, BookingDetailsRow>(&query)
            .bind(slot_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(BookingDetails::from).collect())
    }
}
