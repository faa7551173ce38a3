//! In-process store guarded by a Tokio mutex.
//!
//! Mirrors the PostgreSQL repository's semantics (joins, cascades, unique
//! constraints) closely enough for service and router tests. Every
//! check-then-act operation runs under one lock acquisition.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{BookingStore, EquipmentStore, NotificationStore, ReferenceStore, SlotStore, UserStore};
use crate::{
    error::{AppError, AppResult, SchedulingError},
    models::{
        booking::{Booking, BookingDetails, BookingScope, NewBooking},
        enums::{BookingStatus, EquipmentStatus, Role, SlotStatus},
        equipment::{CreateEquipment, Equipment, EquipmentChanges, EquipmentDetails},
        notification::Notification,
        reference::{CreateEquipmentType, CreateNamed, EquipmentType, Location, Subject},
        slot::{NewSlot, Slot, SlotDetails, SlotFilter},
        user::{NewUser, User},
    },
    scheduling::{inventory, rules},
};

#[derive(Debug, Default)]
struct InnerState {
    next_id: i32,
    users: BTreeMap<i32, User>,
    subjects: BTreeMap<i32, Subject>,
    locations: BTreeMap<i32, Location>,
    equipment_types: BTreeMap<i32, EquipmentType>,
    equipment: BTreeMap<i32, Equipment>,
    slots: BTreeMap<i32, Slot>,
    bookings: BTreeMap<i32, Booking>,
    notifications: BTreeMap<i32, Notification>,
}

impl InnerState {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn equipment_details(&self, e: &Equipment) -> Option<EquipmentDetails> {
        let equipment_type = self.equipment_types.get(&e.type_id)?;
        let location = self.locations.get(&e.location_id)?;
        let staff = e.assigned_staff_id.and_then(|id| self.users.get(&id));
        Some(EquipmentDetails {
            id: e.id,
            type_id: e.type_id,
            type_name: equipment_type.name.clone(),
            subject_name: equipment_type.subject_name.clone(),
            inventory_number: e.inventory_number.clone(),
            location_id: e.location_id,
            location_name: location.name.clone(),
            assigned_staff_id: e.assigned_staff_id,
            assigned_staff_name: staff.map(|u| u.full_name.clone()),
            status: e.status,
        })
    }

    fn slot_details(&self, s: &Slot) -> Option<SlotDetails> {
        let equipment = self.equipment.get(&s.equipment_id)?;
        let equipment_type = self.equipment_types.get(&equipment.type_id)?;
        let location = self.locations.get(&equipment.location_id)?;
        let staff = self.users.get(&s.created_by_staff_id)?;
        Some(SlotDetails {
            id: s.id,
            equipment_id: s.equipment_id,
            equipment_type_name: equipment_type.name.clone(),
            inventory_number: equipment.inventory_number.clone(),
            location_name: location.name.clone(),
            created_by_staff_id: s.created_by_staff_id,
            created_by_staff_name: staff.full_name.clone(),
            start_time: s.start_time,
            end_time: s.end_time,
            status: s.status,
            bookings: Vec::new(),
        })
    }

    fn booking_details(&self, b: &Booking) -> Option<BookingDetails> {
        let student = self.users.get(&b.student_user_id)?;
        Some(BookingDetails {
            id: b.id,
            slot_id: b.slot_id,
            student_user_id: b.student_user_id,
            student_name: student.full_name.clone(),
            student_email: student.email.clone(),
            start_time: b.start_time,
            end_time: b.end_time,
            status: b.status,
            created_at: b.created_at,
            updated_at: b.updated_at,
            slot: None,
        })
    }

    fn slot_bookings(&self, slot_id: i32) -> Vec<Booking> {
        self.bookings
            .values()
            .filter(|b| b.slot_id == slot_id)
            .cloned()
            .collect()
    }

    fn count_of_type(&self, type_id: i32, except: Option<i32>) -> i64 {
        self.equipment
            .values()
            .filter(|e| e.type_id == type_id && Some(e.id) != except)
            .count() as i64
    }

    fn inventory_number_taken(&self, number: &str, except: Option<i32>) -> bool {
        self.equipment
            .values()
            .any(|e| e.inventory_number == number && Some(e.id) != except)
    }
}

/// Store keeping every table in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate_inventory_number() -> AppError {
    AppError::Conflict("Inventory number already in use, retry the request".to_string())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn users_get(&self, id: i32) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn users_get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn users_create(&self, new: &NewUser) -> AppResult<User> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email.eq_ignore_ascii_case(&new.email)) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        let user = User {
            id: state.allocate_id(),
            email: new.email.clone(),
            full_name: new.full_name.clone(),
            profile_info: new.profile_info.clone(),
            password_hash: new.password_hash.clone(),
            roles: new.roles.clone(),
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn users_list(&self) -> AppResult<Vec<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().cloned().collect())
    }

    async fn users_add_role(&self, id: i32, role: Role) -> AppResult<Option<User>> {
        let mut state = self.state.lock().await;
        Ok(state.users.get_mut(&id).map(|user| {
            if !user.roles.contains(&role) {
                user.roles.push(role);
            }
            user.clone()
        }))
    }
}

#[async_trait]
impl ReferenceStore for MemoryStore {
    async fn subjects_list(&self) -> AppResult<Vec<Subject>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Subject> = state.subjects.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn subjects_get(&self, id: i32) -> AppResult<Option<Subject>> {
        let state = self.state.lock().await;
        Ok(state.subjects.get(&id).cloned())
    }

    async fn subjects_create(&self, data: &CreateNamed) -> AppResult<Subject> {
        let mut state = self.state.lock().await;
        let subject = Subject {
            id: state.allocate_id(),
            name: data.name.clone(),
            description: data.description.clone(),
        };
        state.subjects.insert(subject.id, subject.clone());
        Ok(subject)
    }

    async fn locations_list(&self) -> AppResult<Vec<Location>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Location> = state.locations.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn locations_get(&self, id: i32) -> AppResult<Option<Location>> {
        let state = self.state.lock().await;
        Ok(state.locations.get(&id).cloned())
    }

    async fn locations_create(&self, data: &CreateNamed) -> AppResult<Location> {
        let mut state = self.state.lock().await;
        let location = Location {
            id: state.allocate_id(),
            name: data.name.clone(),
            description: data.description.clone(),
        };
        state.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn equipment_types_list(&self) -> AppResult<Vec<EquipmentType>> {
        let state = self.state.lock().await;
        let mut rows: Vec<EquipmentType> = state.equipment_types.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn equipment_types_get(&self, id: i32) -> AppResult<Option<EquipmentType>> {
        let state = self.state.lock().await;
        Ok(state.equipment_types.get(&id).cloned())
    }

    async fn equipment_types_create(&self, data: &CreateEquipmentType) -> AppResult<EquipmentType> {
        let mut state = self.state.lock().await;
        let subject_name = state
            .subjects
            .get(&data.subject_id)
            .map(|s| s.name.clone())
            .ok_or_else(|| AppError::NotFound(format!("Subject {} not found", data.subject_id)))?;
        let equipment_type = EquipmentType {
            id: state.allocate_id(),
            name: data.name.clone(),
            description: data.description.clone(),
            subject_id: data.subject_id,
            subject_name,
        };
        state.equipment_types.insert(equipment_type.id, equipment_type.clone());
        Ok(equipment_type)
    }
}

#[async_trait]
impl EquipmentStore for MemoryStore {
    async fn equipment_list(&self) -> AppResult<Vec<EquipmentDetails>> {
        let state = self.state.lock().await;
        let mut rows: Vec<EquipmentDetails> = state
            .equipment
            .values()
            .filter_map(|e| state.equipment_details(e))
            .collect();
        rows.sort_by(|a, b| a.inventory_number.cmp(&b.inventory_number));
        Ok(rows)
    }

    async fn equipment_get(&self, id: i32) -> AppResult<Option<EquipmentDetails>> {
        let state = self.state.lock().await;
        Ok(state.equipment.get(&id).and_then(|e| state.equipment_details(e)))
    }

    async fn equipment_count_by_type(&self, type_id: i32) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state.count_of_type(type_id, None))
    }

    async fn equipment_create(&self, data: &CreateEquipment, prefix: &str) -> AppResult<Equipment> {
        let mut state = self.state.lock().await;
        let number = inventory::next_number(prefix, state.count_of_type(data.type_id, None));
        if state.inventory_number_taken(&number, None) {
            return Err(duplicate_inventory_number());
        }
        let equipment = Equipment {
            id: state.allocate_id(),
            type_id: data.type_id,
            inventory_number: number,
            location_id: data.location_id,
            assigned_staff_id: Some(data.assigned_staff_id),
            status: EquipmentStatus::Available,
        };
        state.equipment.insert(equipment.id, equipment.clone());
        Ok(equipment)
    }

    async fn equipment_update(&self, id: i32, changes: &EquipmentChanges) -> AppResult<Equipment> {
        let mut state = self.state.lock().await;
        if !state.equipment.contains_key(&id) {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }

        let number = match changes.renumber_prefix {
            Some(ref prefix) => {
                let number =
                    inventory::next_number(prefix, state.count_of_type(changes.type_id, Some(id)));
                if state.inventory_number_taken(&number, Some(id)) {
                    return Err(duplicate_inventory_number());
                }
                Some(number)
            }
            None => None,
        };

        let equipment = state
            .equipment
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))?;
        equipment.type_id = changes.type_id;
        equipment.location_id = changes.location_id;
        equipment.assigned_staff_id = Some(changes.assigned_staff_id);
        if let Some(status) = changes.status {
            equipment.status = status;
        }
        if let Some(number) = number {
            equipment.inventory_number = number;
        }
        Ok(equipment.clone())
    }

    async fn equipment_delete(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.equipment.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }
        // Cascade to slots and their bookings
        let slot_ids: Vec<i32> = state
            .slots
            .values()
            .filter(|s| s.equipment_id == id)
            .map(|s| s.id)
            .collect();
        state.slots.retain(|_, s| s.equipment_id != id);
        state.bookings.retain(|_, b| !slot_ids.contains(&b.slot_id));
        Ok(())
    }
}

#[async_trait]
impl SlotStore for MemoryStore {
    async fn slots_accessible_equipment(
        &self,
        equipment_ids: &[i32],
        staff_scope: Option<i32>,
    ) -> AppResult<Vec<i32>> {
        let state = self.state.lock().await;
        Ok(state
            .equipment
            .values()
            .filter(|e| equipment_ids.contains(&e.id))
            .filter(|e| staff_scope.map_or(true, |staff| e.assigned_staff_id == Some(staff)))
            .map(|e| e.id)
            .collect())
    }

    async fn slots_create(&self, new: &NewSlot) -> AppResult<Slot> {
        let mut state = self.state.lock().await;
        if !state.equipment.contains_key(&new.equipment_id) {
            return Err(SchedulingError::NotAssigned.into());
        }

        let existing: Vec<Slot> = state
            .slots
            .values()
            .filter(|s| s.equipment_id == new.equipment_id)
            .cloned()
            .collect();
        rules::ensure_no_slot_conflict(&new.range, &existing)?;

        let slot = Slot {
            id: state.allocate_id(),
            equipment_id: new.equipment_id,
            created_by_staff_id: new.created_by_staff_id,
            start_time: new.range.start,
            end_time: new.range.end,
            status: SlotStatus::Available,
        };
        state.slots.insert(slot.id, slot.clone());
        Ok(slot)
    }

    async fn slots_get(&self, id: i32) -> AppResult<Option<Slot>> {
        let state = self.state.lock().await;
        Ok(state.slots.get(&id).cloned())
    }

    async fn slots_delete(&self, id: i32, owner: Option<i32>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let slot = state
            .slots
            .get(&id)
            .filter(|s| owner.map_or(true, |staff| s.created_by_staff_id == staff))
            .cloned()
            .ok_or(SchedulingError::NotFound("Slot"))?;

        rules::ensure_deletable(&state.slot_bookings(slot.id))?;

        state.slots.remove(&slot.id);
        state.bookings.retain(|_, b| b.slot_id != slot.id);
        Ok(())
    }

    async fn slots_list(&self, filter: &SlotFilter) -> AppResult<Vec<SlotDetails>> {
        let state = self.state.lock().await;
        let mut slots: Vec<&Slot> = state
            .slots
            .values()
            .filter(|s| filter.status.map_or(true, |status| s.status == status))
            .filter(|s| filter.ends_after.map_or(true, |after| s.end_time > after))
            .filter(|s| filter.created_by.map_or(true, |staff| s.created_by_staff_id == staff))
            .filter(|s| filter.ids.as_ref().map_or(true, |ids| ids.contains(&s.id)))
            .collect();
        slots.sort_by_key(|s| (s.start_time, s.id));
        Ok(slots.into_iter().filter_map(|s| state.slot_details(s)).collect())
    }

    async fn slots_bookings(&self, slot_ids: &[i32], active_only: bool) -> AppResult<Vec<BookingDetails>> {
        let state = self.state.lock().await;
        let mut bookings: Vec<&Booking> = state
            .bookings
            .values()
            .filter(|b| slot_ids.contains(&b.slot_id))
            .filter(|b| !active_only || b.status.is_active())
            .collect();
        bookings.sort_by_key(|b| (b.start_time, b.id));
        Ok(bookings
            .into_iter()
            .filter_map(|b| state.booking_details(b))
            .collect())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn bookings_create(&self, new: &NewBooking) -> AppResult<Booking> {
        let mut state = self.state.lock().await;
        let slot = state
            .slots
            .get(&new.slot_id)
            .cloned()
            .ok_or(SchedulingError::NotFound("Slot"))?;

        rules::ensure_bookable(&slot, &new.range, &state.slot_bookings(slot.id), new.created_at)?;

        let booking = Booking {
            id: state.allocate_id(),
            slot_id: slot.id,
            student_user_id: new.student_user_id,
            start_time: new.range.start,
            end_time: new.range.end,
            status: BookingStatus::PendingApproval,
            created_at: new.created_at,
            updated_at: new.created_at,
        };
        state.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn bookings_set_status(
        &self,
        id: i32,
        scope: BookingScope,
        status: BookingStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        let mut state = self.state.lock().await;
        let booking = state
            .bookings
            .get(&id)
            .cloned()
            .ok_or(SchedulingError::NotFound("Booking"))?;

        let in_scope = match scope {
            BookingScope::Any => true,
            BookingScope::SlotOwner(staff_id) => state
                .slots
                .get(&booking.slot_id)
                .is_some_and(|s| s.created_by_staff_id == staff_id),
            BookingScope::Student(student_id) => booking.student_user_id == student_id,
        };
        if !in_scope {
            return Err(SchedulingError::NotFound("Booking").into());
        }
        if rules::is_settled(&booking, scope) {
            return Ok(booking);
        }

        rules::ensure_reactivation_allowed(&booking, status, &state.slot_bookings(booking.slot_id))?;

        let stored = state
            .bookings
            .get_mut(&id)
            .ok_or(SchedulingError::NotFound("Booking"))?;
        stored.status = status;
        stored.updated_at = now;
        Ok(stored.clone())
    }

    async fn bookings_get_details(&self, id: i32) -> AppResult<Option<BookingDetails>> {
        let state = self.state.lock().await;
        Ok(state.bookings.get(&id).and_then(|b| state.booking_details(b)))
    }

    async fn bookings_list_for_student(&self, student_id: i32) -> AppResult<Vec<BookingDetails>> {
        let state = self.state.lock().await;
        let mut bookings: Vec<&Booking> = state
            .bookings
            .values()
            .filter(|b| b.student_user_id == student_id)
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(bookings
            .into_iter()
            .filter_map(|b| state.booking_details(b))
            .collect())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn notifications_insert(
        &self,
        user_id: i32,
        message: &str,
        created_at: DateTime<Utc>,
    ) -> AppResult<Notification> {
        let mut state = self.state.lock().await;
        let notification = Notification {
            id: state.allocate_id(),
            user_id,
            message: message.to_string(),
            is_read: false,
            created_at,
        };
        state.notifications.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn notifications_list(&self, user_id: i32) -> AppResult<Vec<Notification>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Notification> = state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn notifications_mark_read(&self, id: i32, user_id: i32) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.notifications.get_mut(&id) {
            Some(n) if n.user_id == user_id => {
                n.is_read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
