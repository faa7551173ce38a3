//! Slot manager: publishing and withdrawing bookable time windows

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult, SchedulingError},
    models::{
        enums::{Role, SlotStatus},
        slot::{CreateBulkSlots, CreateSlot, NewSlot, SlotDetails, SlotFilter},
        user::Caller,
    },
    repository::SlotStore,
    scheduling::{Clock, TimeRange},
};

#[derive(Clone)]
pub struct SlotsService {
    store: Arc<dyn SlotStore>,
    clock: Arc<dyn Clock>,
}

impl SlotsService {
    pub fn new(store: Arc<dyn SlotStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create a slot on one piece of equipment. Staff may only use equipment
    /// assigned to them.
    pub async fn create_slot(&self, caller: &Caller, data: &CreateSlot) -> AppResult<SlotDetails> {
        caller.require_staff()?;
        let range = TimeRange::normalized(data.start_time, data.end_time)?;

        let accessible = self
            .store
            .slots_accessible_equipment(&[data.equipment_id], caller.staff_scope())
            .await?;
        if accessible.is_empty() {
            return Err(SchedulingError::NotAssigned.into());
        }

        let slot = self
            .store
            .slots_create(&NewSlot {
                equipment_id: data.equipment_id,
                created_by_staff_id: caller.user_id,
                range,
            })
            .await?;

        tracing::info!(
            "Slot {} created on equipment {} by user {} ({} - {})",
            slot.id,
            slot.equipment_id,
            caller.user_id,
            slot.start_time,
            slot.end_time
        );

        self.details(slot.id, false).await
    }

    /// Create the same slot on several pieces of equipment.
    ///
    /// Equipment the caller may not use is dropped, and equipment whose slots
    /// conflict is skipped. Fails only when nothing is left to create.
    pub async fn create_bulk_slots(&self, caller: &Caller, data: &CreateBulkSlots) -> AppResult<Vec<SlotDetails>> {
        caller.require_staff()?;
        if data.equipment_ids.is_empty() {
            return Err(AppError::Validation("At least one equipment id is required".to_string()));
        }
        let range = TimeRange::normalized(data.start_time, data.end_time)?;

        let accessible = self
            .store
            .slots_accessible_equipment(&data.equipment_ids, caller.staff_scope())
            .await?;
        if accessible.is_empty() {
            return Err(SchedulingError::NotAssigned.into());
        }

        let mut created = Vec::new();
        for equipment_id in accessible {
            let new = NewSlot {
                equipment_id,
                created_by_staff_id: caller.user_id,
                range,
            };
            match self.store.slots_create(&new).await {
                Ok(slot) => created.push(slot.id),
                Err(AppError::Scheduling(SchedulingError::TimeConflict | SchedulingError::NotAssigned)) => {
                    tracing::debug!("Bulk slot skipped for equipment {}", equipment_id);
                }
                Err(e) => return Err(e),
            }
        }

        if created.is_empty() {
            return Err(SchedulingError::TimeConflict.into());
        }

        tracing::info!("Bulk created {} slots by user {}", created.len(), caller.user_id);

        let slots = self
            .store
            .slots_list(&SlotFilter {
                ids: Some(created),
                ..Default::default()
            })
            .await?;
        self.with_bookings(slots, false).await
    }

    /// Delete a slot that has no active bookings. Staff may only delete their
    /// own slots; anything else reads as not found.
    pub async fn delete_slot(&self, caller: &Caller, id: i32) -> AppResult<()> {
        caller.require_staff()?;
        self.store.slots_delete(id, caller.staff_scope()).await?;
        tracing::info!("Slot {} deleted by user {}", id, caller.user_id);
        Ok(())
    }

    /// Available slots that have not ended, with their active bookings
    pub async fn list_available(&self, caller: &Caller) -> AppResult<Vec<SlotDetails>> {
        caller.require_any(&[Role::Student, Role::Staff, Role::Admin])?;
        let slots = self
            .store
            .slots_list(&SlotFilter {
                status: Some(SlotStatus::Available),
                ends_after: Some(self.clock.now()),
                ..Default::default()
            })
            .await?;
        tracing::debug!("Listing {} available slots", slots.len());
        self.with_bookings(slots, true).await
    }

    /// The caller's slots (every slot for admins) with display status and all
    /// bookings
    pub async fn list_mine(&self, caller: &Caller) -> AppResult<Vec<SlotDetails>> {
        caller.require_staff()?;
        let slots = self
            .store
            .slots_list(&SlotFilter {
                created_by: caller.staff_scope(),
                ..Default::default()
            })
            .await?;

        let now = self.clock.now();
        let slots = self.with_bookings(slots, false).await?;
        Ok(slots.into_iter().map(|s| s.with_display_status(now)).collect())
    }

    /// One joined slot with its bookings
    pub(crate) async fn details(&self, id: i32, active_only: bool) -> AppResult<SlotDetails> {
        let slots = self
            .store
            .slots_list(&SlotFilter {
                ids: Some(vec![id]),
                ..Default::default()
            })
            .await?;
        self.with_bookings(slots, active_only)
            .await?
            .pop()
            .ok_or_else(|| SchedulingError::NotFound("Slot").into())
    }

    /// Joined slots without bookings, display status applied
    pub(crate) async fn summaries(&self, ids: Vec<i32>) -> AppResult<Vec<SlotDetails>> {
        let now = self.clock.now();
        let slots = self
            .store
            .slots_list(&SlotFilter {
                ids: Some(ids),
                ..Default::default()
            })
            .await?;
        Ok(slots.into_iter().map(|s| s.with_display_status(now)).collect())
    }

    async fn with_bookings(&self, mut slots: Vec<SlotDetails>, active_only: bool) -> AppResult<Vec<SlotDetails>> {
        if slots.is_empty() {
            return Ok(slots);
        }

        let ids: Vec<i32> = slots.iter().map(|s| s.id).collect();
        let mut by_slot: HashMap<i32, Vec<_>> = HashMap::new();
        for booking in self.store.slots_bookings(&ids, active_only).await? {
            by_slot.entry(booking.slot_id).or_default().push(booking);
        }

        for slot in &mut slots {
            slot.bookings = by_slot.remove(&slot.id).unwrap_or_default();
        }
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::booking::CreateBooking,
        models::enums::BookingStatus,
        services::testing::{at, fixture},
    };
    use chrono::{DateTime, Utc};

    fn request(equipment_id: i32, start: DateTime<Utc>, end: DateTime<Utc>) -> CreateSlot {
        CreateSlot {
            equipment_id,
            start_time: start,
            end_time: end,
        }
    }

    #[tokio::test]
    async fn test_create_slot_normalizes_times() {
        let fx = fixture().await;
        let slot = fx
            .services
            .slots
            .create_slot(&fx.staff, &request(fx.equipment_id, at(9, 7), at(10, 2)))
            .await
            .unwrap();

        assert_eq!(slot.start_time, at(9, 0));
        assert_eq!(slot.end_time, at(10, 0));
        assert_eq!(slot.status, SlotStatus::Available);
        assert_eq!(slot.inventory_number, "PRO-0001");
        assert_eq!(slot.created_by_staff_name, "Irina Staff");
        assert!(slot.bookings.is_empty());
    }

    #[tokio::test]
    async fn test_create_slot_range_errors() {
        let fx = fixture().await;
        let slots = &fx.services.slots;

        let err = slots
            .create_slot(&fx.staff, &request(fx.equipment_id, at(9, 0), at(9, 10)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Scheduling(SchedulingError::TooShort)));

        let err = slots
            .create_slot(&fx.staff, &request(fx.equipment_id, at(10, 0), at(9, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Scheduling(SchedulingError::InvalidRange)));

        // both ends land on the same quarter hour
        let err = slots
            .create_slot(&fx.staff, &request(fx.equipment_id, at(9, 1), at(9, 14)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Scheduling(SchedulingError::TooShort)));
    }

    #[tokio::test]
    async fn test_create_slot_requires_assignment() {
        let fx = fixture().await;
        let slots = &fx.services.slots;

        let err = slots
            .create_slot(&fx.staff, &request(fx.foreign_equipment_id, at(9, 0), at(10, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Scheduling(SchedulingError::NotAssigned)));

        let err = slots
            .create_slot(&fx.staff, &request(9999, at(9, 0), at(10, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Scheduling(SchedulingError::NotAssigned)));

        // admins may use any equipment
        assert!(slots
            .create_slot(&fx.admin, &request(fx.foreign_equipment_id, at(9, 0), at(10, 0)))
            .await
            .is_ok());

        let err = slots
            .create_slot(&fx.student, &request(fx.equipment_id, at(9, 0), at(10, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_create_slot_conflicts() {
        let fx = fixture().await;
        let slots = &fx.services.slots;
        slots
            .create_slot(&fx.staff, &request(fx.equipment_id, at(9, 0), at(10, 0)))
            .await
            .unwrap();

        let err = slots
            .create_slot(&fx.staff, &request(fx.equipment_id, at(9, 30), at(10, 30)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Scheduling(SchedulingError::TimeConflict)));

        // touching the end is fine, and other equipment is unaffected
        assert!(slots
            .create_slot(&fx.staff, &request(fx.equipment_id, at(10, 0), at(11, 0)))
            .await
            .is_ok());
        assert!(slots
            .create_slot(&fx.admin, &request(fx.foreign_equipment_id, at(9, 30), at(10, 30)))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_bulk_create_skips_conflicts() {
        let fx = fixture().await;
        let slots = &fx.services.slots;
        slots
            .create_slot(&fx.admin, &request(fx.equipment_id, at(9, 0), at(10, 0)))
            .await
            .unwrap();

        let created = slots
            .create_bulk_slots(
                &fx.admin,
                &CreateBulkSlots {
                    equipment_ids: vec![fx.equipment_id, fx.foreign_equipment_id, 9999],
                    start_time: at(9, 0),
                    end_time: at(10, 0),
                },
            )
            .await
            .unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].equipment_id, fx.foreign_equipment_id);

        let err = slots
            .create_bulk_slots(
                &fx.admin,
                &CreateBulkSlots {
                    equipment_ids: vec![fx.equipment_id, fx.foreign_equipment_id],
                    start_time: at(9, 15),
                    end_time: at(9, 45),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Scheduling(SchedulingError::TimeConflict)));
    }

    #[tokio::test]
    async fn test_bulk_create_filters_foreign_equipment() {
        let fx = fixture().await;
        let slots = &fx.services.slots;

        let created = slots
            .create_bulk_slots(
                &fx.staff,
                &CreateBulkSlots {
                    equipment_ids: vec![fx.equipment_id, fx.foreign_equipment_id],
                    start_time: at(9, 0),
                    end_time: at(10, 0),
                },
            )
            .await
            .unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].equipment_id, fx.equipment_id);

        let err = slots
            .create_bulk_slots(
                &fx.staff,
                &CreateBulkSlots {
                    equipment_ids: vec![fx.foreign_equipment_id],
                    start_time: at(11, 0),
                    end_time: at(12, 0),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Scheduling(SchedulingError::NotAssigned)));

        let err = slots
            .create_bulk_slots(
                &fx.staff,
                &CreateBulkSlots {
                    equipment_ids: vec![],
                    start_time: at(11, 0),
                    end_time: at(12, 0),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_slot_with_active_booking() {
        let fx = fixture().await;
        let slot = fx
            .services
            .slots
            .create_slot(&fx.staff, &request(fx.equipment_id, at(9, 0), at(10, 0)))
            .await
            .unwrap();
        let booking = fx
            .services
            .bookings
            .create_booking(
                &fx.student,
                &CreateBooking {
                    slot_id: slot.id,
                    start_time: at(9, 0),
                    end_time: at(9, 30),
                },
            )
            .await
            .unwrap();
        fx.services
            .bookings
            .update_status(&fx.staff, booking.id, BookingStatus::Confirmed)
            .await
            .unwrap();

        let err = fx.services.slots.delete_slot(&fx.staff, slot.id).await.unwrap_err();
        assert!(matches!(err, AppError::Scheduling(SchedulingError::HasActiveBookings)));

        fx.services
            .bookings
            .update_status(&fx.staff, booking.id, BookingStatus::CancelledByStaff)
            .await
            .unwrap();
        fx.services.slots.delete_slot(&fx.staff, slot.id).await.unwrap();

        let err = fx.services.slots.delete_slot(&fx.staff, slot.id).await.unwrap_err();
        assert!(matches!(err, AppError::Scheduling(SchedulingError::NotFound("Slot"))));
    }

    #[tokio::test]
    async fn test_delete_foreign_slot_is_not_found() {
        let fx = fixture().await;
        let slot = fx
            .services
            .slots
            .create_slot(&fx.staff, &request(fx.equipment_id, at(9, 0), at(10, 0)))
            .await
            .unwrap();

        let err = fx.services.slots.delete_slot(&fx.other_staff, slot.id).await.unwrap_err();
        assert!(matches!(err, AppError::Scheduling(SchedulingError::NotFound(_))));
        fx.services.slots.delete_slot(&fx.admin, slot.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_listings_and_expiry() {
        let fx = fixture().await;
        let slots = &fx.services.slots;
        let early = slots
            .create_slot(&fx.staff, &request(fx.equipment_id, at(9, 0), at(10, 0)))
            .await
            .unwrap();
        let late = slots
            .create_slot(&fx.staff, &request(fx.equipment_id, at(12, 0), at(13, 0)))
            .await
            .unwrap();
        slots
            .create_slot(&fx.admin, &request(fx.foreign_equipment_id, at(8, 0), at(9, 0)))
            .await
            .unwrap();

        let booking = fx
            .services
            .bookings
            .create_booking(
                &fx.student,
                &CreateBooking {
                    slot_id: late.id,
                    start_time: at(12, 0),
                    end_time: at(12, 30),
                },
            )
            .await
            .unwrap();
        fx.services
            .bookings
            .cancel_own(&fx.student, booking.id)
            .await
            .unwrap();

        let available = slots.list_available(&fx.student).await.unwrap();
        assert_eq!(available.len(), 3);
        assert_eq!(available[0].start_time, at(8, 0));
        assert!(available.iter().all(|s| s.bookings.is_empty()));

        // at 11:00 the first slot is over
        let later = fx.services_at(at(11, 0));
        let available = later.slots.list_available(&fx.student).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, late.id);

        let mine = later.slots.list_mine(&fx.staff).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, early.id);
        assert_eq!(mine[0].status, SlotStatus::Expired);
        assert_eq!(mine[1].status, SlotStatus::Available);
        assert_eq!(mine[1].bookings.len(), 1);
        assert_eq!(mine[1].bookings[0].status, BookingStatus::CancelledByStudent);

        assert_eq!(later.slots.list_mine(&fx.admin).await.unwrap().len(), 3);
        assert!(later.slots.list_mine(&fx.student).await.is_err());

        // expiry is display-only
        let stored = fx.store.slots_get(early.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SlotStatus::Available);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_overlapping_slots_admit_one() {
        let fx = fixture().await;

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let slots = fx.services.slots.clone();
                let staff = fx.staff.clone();
                let start = at(9, 0) + chrono::Duration::minutes(15 * i);
                let data = request(fx.equipment_id, start, at(14, 0));
                tokio::spawn(async move { slots.create_slot(&staff, &data).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert!(matches!(err, AppError::Scheduling(SchedulingError::TimeConflict))),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(fx.services.slots.list_mine(&fx.staff).await.unwrap().len(), 1);
    }
}
