//! Equipment service and reference data

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Role,
        equipment::{CreateEquipment, EquipmentChanges, EquipmentDetails, InventoryNumber, UpdateEquipment},
        reference::{CreateEquipmentType, CreateNamed, EquipmentType, Location, Subject},
        user::Caller,
    },
    repository::{EquipmentStore, ReferenceStore, UserStore},
    scheduling::inventory,
};

const ANY_ROLE: [Role; 3] = [Role::Student, Role::Staff, Role::Admin];

#[derive(Clone)]
pub struct EquipmentService {
    equipment: Arc<dyn EquipmentStore>,
    reference: Arc<dyn ReferenceStore>,
    users: Arc<dyn UserStore>,
}

impl EquipmentService {
    pub fn new(
        equipment: Arc<dyn EquipmentStore>,
        reference: Arc<dyn ReferenceStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            equipment,
            reference,
            users,
        }
    }

    pub async fn list(&self, caller: &Caller) -> AppResult<Vec<EquipmentDetails>> {
        caller.require_any(&ANY_ROLE)?;
        self.equipment.equipment_list().await
    }

    pub async fn get(&self, caller: &Caller, id: i32) -> AppResult<EquipmentDetails> {
        caller.require_any(&ANY_ROLE)?;
        self.fetch(id).await
    }

    /// Register equipment under the next inventory number of its type
    pub async fn create(&self, caller: &Caller, data: &CreateEquipment) -> AppResult<EquipmentDetails> {
        caller.require_admin()?;
        let equipment_type = self.check_references(data.type_id, data.location_id, data.assigned_staff_id).await?;

        let prefix = inventory::prefix(&equipment_type.name);
        let equipment = self.equipment.equipment_create(data, &prefix).await?;

        tracing::info!(
            "Equipment {} created as {} by user {}",
            equipment.id,
            equipment.inventory_number,
            caller.user_id
        );
        self.fetch(equipment.id).await
    }

    /// Update equipment. Changing its type assigns a new inventory number.
    pub async fn update(&self, caller: &Caller, id: i32, data: &UpdateEquipment) -> AppResult<EquipmentDetails> {
        caller.require_admin()?;
        let current = self.fetch(id).await?;
        let equipment_type = self.check_references(data.type_id, data.location_id, data.assigned_staff_id).await?;

        let renumber_prefix = if current.type_id != data.type_id {
            Some(inventory::prefix(&equipment_type.name))
        } else {
            None
        };

        let changes = EquipmentChanges {
            type_id: data.type_id,
            location_id: data.location_id,
            assigned_staff_id: data.assigned_staff_id,
            status: data.status,
            renumber_prefix,
        };
        let equipment = self.equipment.equipment_update(id, &changes).await?;

        tracing::info!(
            "Equipment {} updated by user {} ({})",
            id,
            caller.user_id,
            equipment.inventory_number
        );
        self.fetch(id).await
    }

    pub async fn delete(&self, caller: &Caller, id: i32) -> AppResult<()> {
        caller.require_admin()?;
        self.equipment.equipment_delete(id).await?;
        tracing::info!("Equipment {} deleted by user {}", id, caller.user_id);
        Ok(())
    }

    /// Next inventory number for a type: prefix from the type name, sequence
    /// from the number of existing equipment of that type
    pub async fn generate_inventory_number(&self, type_id: i32, type_name: &str) -> AppResult<String> {
        let count = self.equipment.equipment_count_by_type(type_id).await?;
        Ok(inventory::next_number(&inventory::prefix(type_name), count))
    }

    /// The number the next equipment of a type would receive. Creation
    /// allocates under a lock, so a concurrent create may take it first.
    pub async fn preview_inventory_number(&self, caller: &Caller, type_id: i32) -> AppResult<InventoryNumber> {
        caller.require_admin()?;
        let equipment_type = self
            .reference
            .equipment_types_get(type_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment type {} not found", type_id)))?;

        let inventory_number = self.generate_inventory_number(type_id, &equipment_type.name).await?;
        Ok(InventoryNumber { inventory_number })
    }

    pub async fn list_subjects(&self, caller: &Caller) -> AppResult<Vec<Subject>> {
        caller.require_any(&ANY_ROLE)?;
        self.reference.subjects_list().await
    }

    pub async fn create_subject(&self, caller: &Caller, data: &CreateNamed) -> AppResult<Subject> {
        caller.require_admin()?;
        data.validate()?;
        self.reference.subjects_create(data).await
    }

    pub async fn list_locations(&self, caller: &Caller) -> AppResult<Vec<Location>> {
        caller.require_any(&ANY_ROLE)?;
        self.reference.locations_list().await
    }

    pub async fn create_location(&self, caller: &Caller, data: &CreateNamed) -> AppResult<Location> {
        caller.require_admin()?;
        data.validate()?;
        self.reference.locations_create(data).await
    }

    pub async fn list_types(&self, caller: &Caller) -> AppResult<Vec<EquipmentType>> {
        caller.require_any(&ANY_ROLE)?;
        self.reference.equipment_types_list().await
    }

    pub async fn create_type(&self, caller: &Caller, data: &CreateEquipmentType) -> AppResult<EquipmentType> {
        caller.require_admin()?;
        data.validate()?;
        if self.reference.subjects_get(data.subject_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Subject {} not found", data.subject_id)));
        }
        self.reference.equipment_types_create(data).await
    }

    async fn fetch(&self, id: i32) -> AppResult<EquipmentDetails> {
        self.equipment
            .equipment_get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Resolve the type and make sure the location and staff member exist
    async fn check_references(&self, type_id: i32, location_id: i32, staff_id: i32) -> AppResult<EquipmentType> {
        let equipment_type = self
            .reference
            .equipment_types_get(type_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment type {} not found", type_id)))?;

        if self.reference.locations_get(location_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Location {} not found", location_id)));
        }
        if self.users.users_get(staff_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", staff_id)));
        }
        Ok(equipment_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::enums::EquipmentStatus,
        services::testing::fixture,
    };

    #[tokio::test]
    async fn test_generate_inventory_number() {
        let fx = fixture().await;
        let equipment = &fx.services.equipment;

        let subject = equipment
            .create_subject(&fx.admin, &CreateNamed { name: "Optics".to_string(), description: None })
            .await
            .unwrap();
        let microscope = equipment
            .create_type(
                &fx.admin,
                &CreateEquipmentType {
                    name: "Микроскоп".to_string(),
                    description: None,
                    subject_id: subject.id,
                },
            )
            .await
            .unwrap();

        assert_eq!(
            equipment.generate_inventory_number(microscope.id, "Проектор").await.unwrap(),
            "PRO-0001"
        );
        // two projectors exist in the fixture
        assert_eq!(
            equipment.generate_inventory_number(fx.type_id, "Проектор").await.unwrap(),
            "PRO-0003"
        );
        assert_eq!(
            equipment.generate_inventory_number(microscope.id, "").await.unwrap(),
            "EQP-0001"
        );
    }

    #[tokio::test]
    async fn test_preview_matches_created_number() {
        let fx = fixture().await;
        let equipment = &fx.services.equipment;

        let preview = equipment.preview_inventory_number(&fx.admin, fx.type_id).await.unwrap();
        assert_eq!(preview.inventory_number, "PRO-0003");

        let created = equipment
            .create(
                &fx.admin,
                &CreateEquipment {
                    type_id: fx.type_id,
                    location_id: fx.location_id,
                    assigned_staff_id: fx.staff.user_id,
                },
            )
            .await
            .unwrap();
        assert_eq!(created.inventory_number, preview.inventory_number);

        assert!(matches!(
            equipment.preview_inventory_number(&fx.staff, fx.type_id).await,
            Err(AppError::Authorization(_))
        ));
        assert!(matches!(
            equipment.preview_inventory_number(&fx.admin, 4242).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_and_renumber() {
        let fx = fixture().await;
        let equipment = &fx.services.equipment;

        let created = equipment
            .create(
                &fx.admin,
                &CreateEquipment {
                    type_id: fx.type_id,
                    location_id: fx.location_id,
                    assigned_staff_id: fx.staff.user_id,
                },
            )
            .await
            .unwrap();
        assert_eq!(created.inventory_number, "PRO-0003");
        assert_eq!(created.status, EquipmentStatus::Available);
        assert_eq!(created.assigned_staff_name.as_deref(), Some("Irina Staff"));

        let subject = equipment.list_subjects(&fx.student).await.unwrap().remove(0);
        let laptop = equipment
            .create_type(
                &fx.admin,
                &CreateEquipmentType {
                    name: "Laptop".to_string(),
                    description: None,
                    subject_id: subject.id,
                },
            )
            .await
            .unwrap();

        let update = UpdateEquipment {
            type_id: laptop.id,
            location_id: fx.location_id,
            assigned_staff_id: fx.other_staff.user_id,
            status: Some(EquipmentStatus::InMaintenance),
        };
        let updated = equipment.update(&fx.admin, created.id, &update).await.unwrap();
        assert_eq!(updated.inventory_number, "LAP-0001");
        assert_eq!(updated.type_name, "Laptop");
        assert_eq!(updated.status, EquipmentStatus::InMaintenance);

        // same type keeps the number
        let again = equipment.update(&fx.admin, created.id, &update).await.unwrap();
        assert_eq!(again.inventory_number, "LAP-0001");
    }

    #[tokio::test]
    async fn test_admin_only_writes() {
        let fx = fixture().await;
        let equipment = &fx.services.equipment;
        let data = CreateEquipment {
            type_id: fx.type_id,
            location_id: fx.location_id,
            assigned_staff_id: fx.staff.user_id,
        };

        assert!(matches!(equipment.create(&fx.staff, &data).await, Err(AppError::Authorization(_))));
        assert!(matches!(
            equipment.delete(&fx.staff, fx.equipment_id).await,
            Err(AppError::Authorization(_))
        ));
        assert_eq!(equipment.list(&fx.student).await.unwrap().len(), 2);

        let missing_staff = CreateEquipment {
            assigned_staff_id: 9999,
            ..data
        };
        assert!(matches!(
            equipment.create(&fx.admin, &missing_staff).await,
            Err(AppError::NotFound(_))
        ));

        equipment.delete(&fx.admin, fx.equipment_id).await.unwrap();
        assert!(matches!(
            equipment.get(&fx.student, fx.equipment_id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            equipment.delete(&fx.admin, fx.equipment_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reference_validation() {
        let fx = fixture().await;
        let equipment = &fx.services.equipment;

        let blank = CreateNamed { name: String::new(), description: None };
        assert!(matches!(
            equipment.create_location(&fx.admin, &blank).await,
            Err(AppError::Validation(_))
        ));

        let orphan = CreateEquipmentType {
            name: "Oscilloscope".to_string(),
            description: None,
            subject_id: 9999,
        };
        assert!(matches!(
            equipment.create_type(&fx.admin, &orphan).await,
            Err(AppError::NotFound(_))
        ));

        let location = equipment
            .create_location(&fx.admin, &CreateNamed { name: "Annex".to_string(), description: None })
            .await
            .unwrap();
        let names: Vec<String> = equipment
            .list_locations(&fx.staff)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Annex".to_string(), "Lab 101".to_string()]);
        assert!(location.id > 0);
    }
}
