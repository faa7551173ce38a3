//! Equipment model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::EquipmentStatus;

/// Equipment record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: i32,
    pub type_id: i32,
    /// Generated inventory code, e.g. "PRO-0001"
    pub inventory_number: String,
    pub location_id: i32,
    /// Staff member responsible for the equipment and its slots
    pub assigned_staff_id: Option<i32>,
    pub status: EquipmentStatus,
}

/// Equipment joined with its type, subject, location and staff names
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EquipmentDetails {
    pub id: i32,
    pub type_id: i32,
    pub type_name: String,
    pub subject_name: String,
    pub inventory_number: String,
    pub location_id: i32,
    pub location_name: String,
    pub assigned_staff_id: Option<i32>,
    pub assigned_staff_name: Option<String>,
    pub status: EquipmentStatus,
}

/// Create equipment request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateEquipment {
    pub type_id: i32,
    pub location_id: i32,
    pub assigned_staff_id: i32,
}

/// Update equipment request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateEquipment {
    pub type_id: i32,
    pub location_id: i32,
    pub assigned_staff_id: i32,
    pub status: Option<EquipmentStatus>,
}

/// Fully resolved equipment values handed to the store
#[derive(Debug, Clone)]
pub struct EquipmentChanges {
    pub type_id: i32,
    pub location_id: i32,
    pub assigned_staff_id: i32,
    pub status: Option<EquipmentStatus>,
    /// New inventory prefix when the type changed
    pub renumber_prefix: Option<String>,
}

/// Inventory number the next equipment of a type would receive
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryNumber {
    pub inventory_number: String,
}
