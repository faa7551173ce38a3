//! Booking manager: reservations inside published slots

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    error::{AppResult, SchedulingError},
    models::{
        booking::{BookingDetails, BookingScope, CreateBooking, NewBooking},
        enums::{BookingStatus, Role},
        slot::SlotDetails,
        user::Caller,
    },
    repository::BookingStore,
    scheduling::{Clock, TimeRange},
};

use super::{notifications::NotificationsService, slots::SlotsService};

const DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

#[derive(Clone)]
pub struct BookingsService {
    store: Arc<dyn BookingStore>,
    slots: SlotsService,
    notifications: NotificationsService,
    clock: Arc<dyn Clock>,
}

impl BookingsService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        slots: SlotsService,
        notifications: NotificationsService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            slots,
            notifications,
            clock,
        }
    }

    /// Reserve part of a slot. The new booking waits for staff approval and
    /// the slot's creator is notified.
    pub async fn create_booking(&self, caller: &Caller, data: &CreateBooking) -> AppResult<BookingDetails> {
        caller.require_any(&[Role::Student, Role::Admin])?;
        let range = TimeRange::normalized(data.start_time, data.end_time)?;

        let booking = self
            .store
            .bookings_create(&NewBooking {
                slot_id: data.slot_id,
                student_user_id: caller.user_id,
                range,
                created_at: self.clock.now(),
            })
            .await?;

        tracing::info!(
            "Booking {} created on slot {} by user {}",
            booking.id,
            booking.slot_id,
            caller.user_id
        );

        let slot = self.slots.details(booking.slot_id, false).await?;
        let message = format!(
            "New booking of {} ({}) on {}",
            slot.equipment_type_name,
            slot.inventory_number,
            slot.start_time.format(DATE_FORMAT)
        );
        self.notifications
            .notify_best_effort(slot.created_by_staff_id, &message)
            .await;

        self.details(booking.id, slot).await
    }

    /// Set a booking's status on behalf of staff. Staff may only act on
    /// bookings in slots they created.
    pub async fn update_status(
        &self,
        caller: &Caller,
        id: i32,
        status: BookingStatus,
    ) -> AppResult<BookingDetails> {
        caller.require_staff()?;
        let scope = if caller.is_admin() {
            BookingScope::Any
        } else {
            BookingScope::SlotOwner(caller.user_id)
        };

        let booking = self
            .store
            .bookings_set_status(id, scope, status, self.clock.now())
            .await?;

        tracing::info!("Booking {} set to {} by user {}", id, status, caller.user_id);

        let slot = self.slots.details(booking.slot_id, false).await?;
        let message = match status {
            BookingStatus::CancelledByStaff => Some(format!(
                "Your booking of {} on {} was cancelled",
                slot.equipment_type_name,
                slot.start_time.format(DATE_FORMAT)
            )),
            BookingStatus::Confirmed => Some("Your booking has been confirmed".to_string()),
            _ => None,
        };
        if let Some(message) = message {
            self.notifications
                .notify_best_effort(booking.student_user_id, &message)
                .await;
        }

        self.details(booking.id, slot).await
    }

    /// Cancel one of the caller's own bookings. Cancelling an already
    /// cancelled booking leaves it as it is.
    pub async fn cancel_own(&self, caller: &Caller, id: i32) -> AppResult<BookingDetails> {
        caller.require_any(&[Role::Student])?;

        let booking = self
            .store
            .bookings_set_status(
                id,
                BookingScope::Student(caller.user_id),
                BookingStatus::CancelledByStudent,
                self.clock.now(),
            )
            .await?;

        tracing::info!("Booking {} cancelled by student {}", id, caller.user_id);

        let slot = self.slots.details(booking.slot_id, false).await?;
        self.details(booking.id, slot).await
    }

    /// The caller's bookings, newest first, each with its slot
    pub async fn list_my_bookings(&self, caller: &Caller) -> AppResult<Vec<BookingDetails>> {
        caller.require_any(&[Role::Student])?;

        let mut bookings = self.store.bookings_list_for_student(caller.user_id).await?;

        let mut slot_ids: Vec<i32> = bookings.iter().map(|b| b.slot_id).collect();
        slot_ids.sort_unstable();
        slot_ids.dedup();

        let slots: HashMap<i32, SlotDetails> = self
            .slots
            .summaries(slot_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        for booking in &mut bookings {
            booking.slot = slots.get(&booking.slot_id).cloned();
        }

        tracing::debug!("User {} has {} bookings", caller.user_id, bookings.len());
        Ok(bookings)
    }

    /// Re-read a booking through the joins, nesting its slot without the
    /// slot's own bookings
    async fn details(&self, id: i32, mut slot: SlotDetails) -> AppResult<BookingDetails> {
        let mut booking = self
            .store
            .bookings_get_details(id)
            .await?
            .ok_or(SchedulingError::NotFound("Booking"))?;
        slot.bookings.clear();
        booking.slot = Some(slot.with_display_status(self.clock.now()));
        Ok(booking)
    }
}
