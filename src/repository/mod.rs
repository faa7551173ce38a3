//! Repository layer for database operations
//!
//! Services talk to storage through the store traits declared in each
//! submodule. [`Repository`] implements them on PostgreSQL; [`MemoryStore`]
//! implements them in process.

pub mod bookings;
pub mod equipment;
pub mod memory;
pub mod notifications;
pub mod reference;
pub mod slots;
pub mod users;

use sqlx::{Pool, Postgres};

use crate::error::AppError;

pub use bookings::BookingStore;
pub use equipment::EquipmentStore;
pub use memory::MemoryStore;
pub use notifications::NotificationStore;
pub use reference::ReferenceStore;
pub use slots::SlotStore;
pub use users::UserStore;

/// Every store the services need, implemented by one backend
pub trait Store:
    BookingStore + EquipmentStore + NotificationStore + ReferenceStore + SlotStore + UserStore + 'static
{
}

impl<T> Store for T where
    T: BookingStore + EquipmentStore + NotificationStore + ReferenceStore + SlotStore + UserStore + 'static
{
}

/// PostgreSQL repository holding the connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map a unique-constraint violation to `on_conflict`, anything else to a
/// database error
pub(crate) fn unique_violation_or(err: sqlx::Error, on_conflict: impl Into<AppError>) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => on_conflict.into(),
        _ => AppError::Database(err),
    }
}

/// Joined slot projection used by every slot listing
pub(crate) const SLOT_DETAILS_SELECT: &str = r#"
    SELECT s.id, s.equipment_id, t.name AS equipment_type_name, e.inventory_number,
           l.name AS location_name, s.created_by_staff_id,
           u.full_name AS created_by_staff_name, s.start_time, s.end_time, s.status
    FROM slots s
    JOIN equipment e ON e.id = s.equipment_id
    JOIN equipment_types t ON t.id = e.type_id
    JOIN locations l ON l.id = e.location_id
    JOIN users u ON u.id = s.created_by_staff_id
"#;

/// Joined booking projection (with student name and email)
pub(crate) const BOOKING_DETAILS_SELECT: &str = r#"
    SELECT b.id, b.slot_id, b.student_user_id, u.full_name AS student_name,
           u.email AS student_email, b.start_time, b.end_time, b.status,
           b.created_at, b.updated_at
    FROM bookings b
    JOIN users u ON u.id = b.student_user_id
"#;

/// SQL filter matching the active booking statuses
pub(crate) const ACTIVE_BOOKING_FILTER: &str = "status IN ('pending_approval', 'confirmed')";
