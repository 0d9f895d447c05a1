use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::Assignment,
};

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn create(&self, assignment: Assignment) -> AppResult<Assignment>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Assignment>>;
    async fn update(&self, assignment: Assignment) -> AppResult<Assignment>;
    async fn delete(&self, id: &str) -> AppResult<bool>;
    async fn list_by_section(&self, section_id: &str) -> AppResult<Vec<Assignment>>;
    async fn list_by_sections(&self, section_ids: &[String]) -> AppResult<Vec<Assignment>>;
    async fn delete_by_sections(&self, section_ids: &[String]) -> AppResult<u64>;
}

pub struct MongoAssignmentRepository {
    collection: Collection<Assignment>,
}

impl MongoAssignmentRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("assignments");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for assignments collection");

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

        log::info!("Successfully created indexes for assignments collection");
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for MongoAssignmentRepository {
    async fn create(&self, assignment: Assignment) -> AppResult<Assignment> {
        self.collection.insert_one(&assignment).await?;
        Ok(assignment)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Assignment>> {
        let assignment = self.collection.find_one(doc! { "id": id }).await?;
        Ok(assignment)
    }

    async fn update(&self, assignment: Assignment) -> AppResult<Assignment> {
        let result = self
            .collection
            .replace_one(doc! { "id": &assignment.id }, &assignment)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Assignment with id '{}' not found",
                assignment.id
            )));
        }

        Ok(assignment)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count == 1)
    }

    async fn list_by_section(&self, section_id: &str) -> AppResult<Vec<Assignment>> {
        let mut assignments: Vec<Assignment> = self
            .collection
            .find(doc! { "section_id": section_id })
            .await?
            .try_collect()
            .await?;
        assignments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(assignments)
    }

    async fn list_by_sections(&self, section_ids: &[String]) -> AppResult<Vec<Assignment>> {
        if section_ids.is_empty() {
            return Ok(Vec::new());
        }
        let assignments = self
            .collection
            .find(doc! { "section_id": { "$in": section_ids.to_vec() } })
            .await?
            .try_collect()
            .await?;
        Ok(assignments)
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
