//! Data models for Equiplab

pub mod booking;
pub mod enums;
pub mod equipment;
pub mod notification;
pub mod reference;
pub mod slot;
pub mod user;

// Re-export commonly used types
pub use booking::{Booking, BookingDetails};
pub use enums::{BookingStatus, EquipmentStatus, Role, SlotStatus};
pub use equipment::{Equipment, EquipmentDetails};
pub use notification::Notification;
pub use reference::{EquipmentType, Location, Subject};
pub use slot::{Slot, SlotDetails};
pub use user::{Caller, User, UserClaims};
