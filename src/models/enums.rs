//! Closed status vocabularies persisted as plain TEXT columns

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

/// Implements string conversion and TEXT column mapping for a unit-variant enum.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: &str = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// EquipmentStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Available,
    InMaintenance,
    Retired,
}

text_enum!(EquipmentStatus {
    Available => "available",
    InMaintenance => "in_maintenance",
    Retired => "retired",
});

// ---------------------------------------------------------------------------
// SlotStatus
// ---------------------------------------------------------------------------

/// Slot status. `Expired` is only ever derived for display, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Expired,
    Withdrawn,
}

text_enum!(SlotStatus {
    Available => "available",
    Expired => "expired",
    Withdrawn => "withdrawn",
});

// ---------------------------------------------------------------------------
// BookingStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingApproval,
    Confirmed,
    CancelledByStaff,
    CancelledByStudent,
}

text_enum!(BookingStatus {
    PendingApproval => "pending_approval",
    Confirmed => "confirmed",
    CancelledByStaff => "cancelled_by_staff",
    CancelledByStudent => "cancelled_by_student",
});

impl BookingStatus {
    /// Statuses that hold time inside a slot
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::PendingApproval, BookingStatus::Confirmed];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BookingStatus::CancelledByStaff | BookingStatus::CancelledByStudent)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Student,
    Staff,
    Admin,
}

text_enum!(Role {
    Student => "Student",
    Staff => "Staff",
    Admin => "Admin",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_status_round_trip() {
        for status in [
            BookingStatus::PendingApproval,
            BookingStatus::Confirmed,
            BookingStatus::CancelledByStaff,
            BookingStatus::CancelledByStudent,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>(), Ok(status));
        }
        assert!("booked".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_active_statuses() {
        assert!(BookingStatus::PendingApproval.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(!BookingStatus::CancelledByStaff.is_active());
        assert!(BookingStatus::CancelledByStudent.is_cancelled());
    }

    #[test]
    fn test_serde_names_match_storage() {
        let json = serde_json::to_string(&BookingStatus::CancelledByStudent).unwrap();
        assert_eq!(json, "\"cancelled_by_student\"");
        let json = serde_json::to_string(&EquipmentStatus::InMaintenance).unwrap();
        assert_eq!(json, "\"in_maintenance\"");
        let role: Role = serde_json::from_str("\"Staff\"").unwrap();
        assert_eq!(role, Role::Staff);
    }
}
