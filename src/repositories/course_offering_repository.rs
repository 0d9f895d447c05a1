use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson},
    options::{IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::{
        domain::{CourseOffering, OfferingStatus},
        dto::request::OfferingFilter,
    },
};

#[async_trait]
pub trait CourseOfferingRepository: Send + Sync {
    async fn create(&self, offering: CourseOffering) -> AppResult<CourseOffering>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<CourseOffering>>;
    async fn list(&self, filter: &OfferingFilter) -> AppResult<Vec<CourseOffering>>;
    async fn list_by_instructor(
        &self,
        instructor_id: &str,
        status: Option<OfferingStatus>,
    ) -> AppResult<Vec<CourseOffering>>;
    /// Replaces the stored offering as a whole.
    async fn update(&self, offering: CourseOffering) -> AppResult<CourseOffering>;
    async fn update_status(
        &self,
        id: &str,
        status: OfferingStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<CourseOffering>>;
    async fn delete(&self, id: &str) -> AppResult<bool>;
}

pub struct MongoCourseOfferingRepository {
    collection: Collection<CourseOffering>,
}

impl MongoCourseOfferingRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("course_offerings");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for course_offerings collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let instructor_index = IndexModel::builder()
            .keys(doc! { "instructor_id": 1, "status": 1 })
            .options(
                IndexOptions::builder()
                    .name("instructor_status".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(instructor_index).await?;

        log::info!("Successfully created indexes for course_offerings collection");
        Ok(())
    }
}

#[async_trait]
impl CourseOfferingRepository for MongoCourseOfferingRepository {
    async fn create(&self, offering: CourseOffering) -> AppResult<CourseOffering> {
        self.collection.insert_one(&offering).await?;
        Ok(offering)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<CourseOffering>> {
        let offering = self.collection.find_one(doc! { "id": id }).await?;
        Ok(offering)
    }

    async fn list(&self, filter: &OfferingFilter) -> AppResult<Vec<CourseOffering>> {
        let mut query = doc! {};
        if let Some(term) = &filter.term {
            query.insert("term", term.as_str());
        }
        if let Some(status) = filter.status {
            query.insert("status", status.as_str());
        }

        let offerings = self
            .collection
            .find(query)
            .sort(doc! { "term": -1, "class_name": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(offerings)
    }

    async fn list_by_instructor(
        &self,
        instructor_id: &str,
        status: Option<OfferingStatus>,
    ) -> AppResult<Vec<CourseOffering>> {
        let mut query = doc! { "instructor_id": instructor_id };
        if let Some(status) = status {
            query.insert("status", status.as_str());
        }

        let offerings = self
            .collection
            .find(query)
            .sort(doc! { "term": -1, "class_name": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(offerings)
    }

    async fn update(&self, offering: CourseOffering) -> AppResult<CourseOffering> {
        let result = self
            .collection
            .replace_one(doc! { "id": &offering.id }, &offering)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Course offering with id '{}' not found",
                offering.id
            )));
        }

        Ok(offering)
    }

    async fn update_status(
        &self,
        id: &str,
        status: OfferingStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<CourseOffering>> {
        let offering = self
            .collection
            .find_one_and_update(
                doc! { "id": id },
                doc! { "$set": { "status": status.as_str(), "modified_at": to_bson(&now)? } },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(offering)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
