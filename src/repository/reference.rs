//! Reference data storage: subjects, locations, equipment types

use async_trait::async_trait;

use super::Repository;
use crate::{
    error::AppResult,
    models::reference::{CreateEquipmentType, CreateNamed, EquipmentType, Location, Subject},
};

#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn subjects_list(&self) -> AppResult<Vec<Subject>>;
    async fn subjects_get(&self, id: i32) -> AppResult<Option<Subject>>;
    async fn subjects_create(&self, data: &CreateNamed) -> AppResult<Subject>;

    async fn locations_list(&self) -> AppResult<Vec<Location>>;
    async fn locations_get(&self, id: i32) -> AppResult<Option<Location>>;
    async fn locations_create(&self, data: &CreateNamed) -> AppResult<Location>;

    async fn equipment_types_list(&self) -> AppResult<Vec<EquipmentType>>;
    async fn equipment_types_get(&self, id: i32) -> AppResult<Option<EquipmentType>>;
    async fn equipment_types_create(&self, data: &CreateEquipmentType) -> AppResult<EquipmentType>;
}

const EQUIPMENT_TYPE_SELECT: &str = r#"
    SELECT t.id, t.name, t.description, t.subject_id, s.name AS subject_name
    FROM equipment_types t
    JOIN subjects s ON s.id = t.subject_id
"#;

#[async_trait]
impl ReferenceStore for Repository {
    async fn subjects_list(&self) -> AppResult<Vec<Subject>> {
        let rows = sqlx::query_as::<_, Subject>("SELECT * FROM subjects ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn subjects_get(&self, id: i32) -> AppResult<Option<Subject>> {
        let row = sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn subjects_create(&self, data: &CreateNamed) -> AppResult<Subject> {
        let row = sqlx::query_as::<_, Subject>(
            "INSERT INTO subjects (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(&data.name)
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn locations_list(&self) -> AppResult<Vec<Location>> {
        let rows = sqlx::query_as::<_, Location>("SELECT * FROM locations ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn locations_get(&self, id: i32) -> AppResult<Option<Location>> {
        let row = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn locations_create(&self, data: &CreateNamed) -> AppResult<Location> {
        let row = sqlx::query_as::<_, Location>(
            "INSERT INTO locations (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(&data.name)
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn equipment_types_list(&self) -> AppResult<Vec<EquipmentType>> {
        let query = format!("{} ORDER BY t.name", EQUIPMENT_TYPE_SELECT);
        let rows = sqlx::query_as::<_, EquipmentType>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn equipment_types_get(&self, id: i32) -> AppResult<Option<EquipmentType>> {
        let query = format!("{} WHERE t.id = $1", EQUIPMENT_TYPE_SELECT);
        let row = sqlx::query_as::<_, EquipmentType>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn equipment_types_create(&self, data: &CreateEquipmentType) -> AppResult<EquipmentType> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO equipment_types (name, description, subject_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.subject_id)
        .fetch_one(&self.pool)
        .await?;

        let query = format!("{} WHERE t.id = $1", EQUIPMENT_TYPE_SELECT);
        let row = sqlx::query_as::<_, EquipmentType>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }
}
