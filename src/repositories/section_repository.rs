use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::Section,
};

#[async_trait]
pub trait SectionRepository: Send + Sync {
    async fn create(&self, section: Section) -> AppResult<Section>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Section>>;
    /// Replaces a stored section. A clash on (offering, order) is `AlreadyExists`.
    async fn update(&self, section: Section) -> AppResult<Section>;
    async fn delete(&self, id: &str) -> AppResult<bool>;
    async fn find_by_order(&self, course_offering_id: &str, order: i32)
        -> AppResult<Option<Section>>;
    async fn max_order(&self, course_offering_id: &str) -> AppResult<Option<i32>>;
    /// Sections of an offering in ascending `order`.
    async fn list_by_offering(&self, course_offering_id: &str) -> AppResult<Vec<Section>>;
    async fn delete_by_offering(&self, course_offering_id: &str) -> AppResult<u64>;
}

pub struct MongoSectionRepository {
    collection: Collection<Section>,
}

impl MongoSectionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("sections");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for sections collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let order_index = IndexModel::builder()
            .keys(doc! { "course_offering_id": 1, "order": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("offering_order_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(order_index).await?;

        log::info!("Successfully created indexes for sections collection");
        Ok(())
    }
}

#[async_trait]
impl SectionRepository for MongoSectionRepository {
    async fn create(&self, section: Section) -> AppResult<Section> {
        self.collection.insert_one(&section).await?;
        Ok(section)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Section>> {
        let section = self.collection.find_one(doc! { "id": id }).await?;
        Ok(section)
    }

    async fn update(&self, section: Section) -> AppResult<Section> {
        let result = self
            .collection
            .replace_one(doc! { "id": &section.id }, &section)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Section with id '{}' not found",
                section.id
            )));
        }

        Ok(section)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count == 1)
    }

    async fn find_by_order(
        &self,
        course_offering_id: &str,
        order: i32,
    ) -> AppResult<Option<Section>> {
        let section = self
            .collection
            .find_one(doc! { "course_offering_id": course_offering_id, "order": order })
            .await?;
        Ok(section)
    }

    async fn max_order(&self, course_offering_id: &str) -> AppResult<Option<i32>> {
        let section = self
            .collection
            .find_one(doc! { "course_offering_id": course_offering_id })
            .sort(doc! { "order": -1 })
            .await?;
        Ok(section.map(|s| s.order))
    }

    async fn list_by_offering(&self, course_offering_id: &str) -> AppResult<Vec<Section>> {
        let sections = self
            .collection
            .find(doc! { "course_offering_id": course_offering_id })
            .sort(doc! { "order": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(sections)
    }

    async fn delete_by_offering(&self, course_offering_id: &str) -> AppResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "course_offering_id": course_offering_id })
            .await?;
        Ok(result.deleted_count)
    }
}
