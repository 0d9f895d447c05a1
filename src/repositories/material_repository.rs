use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::Material,
};

#[async_trait]
pub trait MaterialRepository: Send + Sync {
    async fn create(&self, material: Material) -> AppResult<Material>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Material>>;
    async fn update(&self, material: Material) -> AppResult<Material>;
    async fn delete(&self, id: &str) -> AppResult<bool>;
    /// Materials of a section, oldest first.
    async fn list_by_section(&self, section_id: &str) -> AppResult<Vec<Material>>;
    async fn list_by_sections(&self, section_ids: &[String]) -> AppResult<Vec<Material>>;
    async fn delete_by_sections(&self, section_ids: &[String]) -> AppResult<u64>;
}

pub struct MongoMaterialRepository {
    collection: Collection<Material>,
}

impl MongoMaterialRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("materials");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for materials collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let section_index = IndexModel::builder()
            .keys(doc! { "section_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("section_id".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(section_index).await?;

        log::info!("Successfully created indexes for materials collection");
        Ok(())
    }
}

#[async_trait]
impl MaterialRepository for MongoMaterialRepository {
    async fn create(&self, material: Material) -> AppResult<Material> {
        self.collection.insert_one(&material).await?;
        Ok(material)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Material>> {
        let material = self.collection.find_one(doc! { "id": id }).await?;
        Ok(material)
    }

    async fn update(&self, material: Material) -> AppResult<Material> {
        let result = self
            .collection
            .replace_one(doc! { "id": &material.id }, &material)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Material with id '{}' not found",
                material.id
            )));
        }

        Ok(material)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count == 1)
    }

    async fn list_by_section(&self, section_id: &str) -> AppResult<Vec<Material>> {
        let mut materials: Vec<Material> = self
            .collection
            .find(doc! { "section_id": section_id })
            .await?
            .try_collect()
            .await?;
        materials.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(materials)
    }

    async fn list_by_sections(&self, section_ids: &[String]) -> AppResult<Vec<Material>> {
        if section_ids.is_empty() {
            return Ok(Vec::new());
        }
        let materials = self
            .collection
            .find(doc! { "section_id": { "$in": section_ids.to_vec() } })
            .await?
            .try_collect()
            .await?;
        Ok(materials)
    }

    async fn delete_by_sections(&self, section_ids: &[String]) -> AppResult<u64> {
        if section_ids.is_empty() {
            return Ok(0);
        }
        let result = self
            .collection
            .delete_many(doc! { "section_id": { "$in": section_ids.to_vec() } })
            .await?;
        Ok(result.deleted_count)
    }
}
