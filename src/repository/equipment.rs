//! Equipment storage

use async_trait::async_trait;

use super::{unique_violation_or, Repository};
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::EquipmentStatus,
        equipment::{CreateEquipment, Equipment, EquipmentChanges, EquipmentDetails},
    },
    scheduling::inventory,
};

#[async_trait]
pub trait EquipmentStore: Send + Sync {
    async fn equipment_list(&self) -> AppResult<Vec<EquipmentDetails>>;

    async fn equipment_get(&self, id: i32) -> AppResult<Option<EquipmentDetails>>;

    /// Number of equipment rows of a type
    async fn equipment_count_by_type(&self, type_id: i32) -> AppResult<i64>;

    /// Insert equipment numbered `{prefix}-{count + 1}` for its type. Counting
    /// and inserting happen under one per-type lock.
    async fn equipment_create(&self, data: &CreateEquipment, prefix: &str) -> AppResult<Equipment>;

    /// Apply resolved changes, renumbering when `renumber_prefix` is set
    async fn equipment_update(&self, id: i32, changes: &EquipmentChanges) -> AppResult<Equipment>;

    async fn equipment_delete(&self, id: i32) -> AppResult<()>;
}

const EQUIPMENT_DETAILS_SELECT: &str = r#"
    SELECT e.id, e.type_id, t.name AS type_name, sub.name AS subject_name,
           e.inventory_number, e.location_id, l.name AS location_name,
           e.assigned_staff_id, u.full_name AS assigned_staff_name, e.status
    FROM equipment e
    JOIN equipment_types t ON t.id = e.type_id
    JOIN subjects sub ON sub.id = t.subject_id
    JOIN locations l ON l.id = e.location_id
    LEFT JOIN users u ON u.id = e.assigned_staff_id
"#;

fn duplicate_inventory_number() -> AppError {
    AppError::Conflict("Inventory number already in use, retry the request".to_string())
}

#[async_trait]
impl EquipmentStore for Repository {
    async fn equipment_list(&self) -> AppResult<Vec<EquipmentDetails>> {
        let query = format!("{} ORDER BY e.inventory_number", EQUIPMENT_DETAILS_SELECT);
        let rows = sqlx::query_as::<_, EquipmentDetails>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn equipment_get(&self, id: i32) -> AppResult<Option<EquipmentDetails>> {
        let query = format!("{} WHERE e.id = $1", EQUIPMENT_DETAILS_SELECT);
        let row = sqlx::query_as::<_, EquipmentDetails>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn equipment_count_by_type(&self, type_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment WHERE type_id = $1")
            .bind(type_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn equipment_create(&self, data: &CreateEquipment, prefix: &str) -> AppResult<Equipment> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(data.type_id as i64)
            .execute(&mut *tx)
            .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment WHERE type_id = $1")
            .bind(data.type_id)
            .fetch_one(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (type_id, inventory_number, location_id, assigned_staff_id, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.type_id)
        .bind(inventory::next_number(prefix, count))
        .bind(data.location_id)
        .bind(data.assigned_staff_id)
        .bind(EquipmentStatus::Available)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation_or(e, duplicate_inventory_number()))?;

        tx.commit().await?;
        Ok(row)
    }

    async fn equipment_update(&self, id: i32, changes: &EquipmentChanges) -> AppResult<Equipment> {
        let mut tx = self.pool.begin().await?;

        let inventory_number = match changes.renumber_prefix {
            Some(ref prefix) => {
                sqlx::query("SELECT pg_advisory_xact_lock($1)")
                    .bind(changes.type_id as i64)
                    .execute(&mut *tx)
                    .await?;
                let count: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM equipment WHERE type_id = $1 AND id <> $2",
                )
                .bind(changes.type_id)
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
                Some(inventory::next_number(prefix, count))
            }
            None => None,
        };

        let row = sqlx::query_as::<_, Equipment>(
            r#"
            UPDATE equipment
            SET type_id = $1,
                location_id = $2,
                assigned_staff_id = $3,
                status = COALESCE($4, status),
                inventory_number = COALESCE($5, inventory_number)
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(changes.type_id)
        .bind(changes.location_id)
        .bind(changes.assigned_staff_id)
        .bind(changes.status)
        .bind(inventory_number)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| unique_violation_or(e, duplicate_inventory_number()))?
        .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))?;

        tx.commit().await?;
        Ok(row)
    }

    async fn equipment_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }
        Ok(())
    }
}
