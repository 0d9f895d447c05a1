use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{Enrollment, EnrollmentStatus},
};

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn create(&self, enrollment: Enrollment) -> AppResult<Enrollment>;
    async fn find(&self, course_offering_id: &str, student_id: &str)
        -> AppResult<Option<Enrollment>>;
    async fn find_active(
        &self,
        course_offering_id: &str,
        student_id: &str,
    ) -> AppResult<Option<Enrollment>>;
    async fn update(&self, enrollment: Enrollment) -> AppResult<Enrollment>;
    async fn list_by_offering(&self, course_offering_id: &str) -> AppResult<Vec<Enrollment>>;
    async fn list_active_by_offering(&self, course_offering_id: &str)
        -> AppResult<Vec<Enrollment>>;
    async fn count_active(&self, course_offering_id: &str) -> AppResult<u64>;
    async fn delete_by_offering(&self, course_offering_id: &str) -> AppResult<u64>;
}

pub struct MongoEnrollmentRepository {
    collection: Collection<Enrollment>,
}

impl MongoEnrollmentRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("enrollments");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for enrollments collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let membership_index = IndexModel::builder()
            .keys(doc! { "course_offering_id": 1, "student_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("offering_student_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(membership_index).await?;

        log::info!("Successfully created indexes for enrollments collection");
        Ok(())
    }
}

#[async_trait]
impl EnrollmentRepository for MongoEnrollmentRepository {
    async fn create(&self, enrollment: Enrollment) -> AppResult<Enrollment> {
        self.collection.insert_one(&enrollment).await?;
        Ok(enrollment)
    }

    async fn find(
        &self,
        course_offering_id: &str,
        student_id: &str,
    ) -> AppResult<Option<Enrollment>> {
        let enrollment = self
            .collection
            .find_one(doc! {
                "course_offering_id": course_offering_id,
                "student_id": student_id
            })
            .await?;
        Ok(enrollment)
    }

    async fn find_active(
        &self,
        course_offering_id: &str,
        student_id: &str,
    ) -> AppResult<Option<Enrollment>> {
        let enrollment = self
            .collection
            .find_one(doc! {
                "course_offering_id": course_offering_id,
                "student_id": student_id,
                "status": EnrollmentStatus::Active.as_str()
            })
            .await?;
        Ok(enrollment)
    }

    async fn update(&self, enrollment: Enrollment) -> AppResult<Enrollment> {
        let result = self
            .collection
            .replace_one(doc! { "id": &enrollment.id }, &enrollment)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Enrollment with id '{}' not found",
                enrollment.id
            )));
        }

        Ok(enrollment)
    }

    async fn list_by_offering(&self, course_offering_id: &str) -> AppResult<Vec<Enrollment>> {
        let enrollments = self
            .collection
            .find(doc! { "course_offering_id": course_offering_id })
            .await?
            .try_collect()
            .await?;
        Ok(enrollments)
    }

    async fn list_active_by_offering(
        &self,
        course_offering_id: &str,
    ) -> AppResult<Vec<Enrollment>> {
        let enrollments = self
            .collection
            .find(doc! {
                "course_offering_id": course_offering_id,
                "status": EnrollmentStatus::Active.as_str()
            })
            .await?
            .try_collect()
            .await?;
        Ok(enrollments)
    }

    async fn count_active(&self, course_offering_id: &str) -> AppResult<u64> {
        let count = self
            .collection
            .count_documents(doc! {
                "course_offering_id": course_offering_id,
                "status": EnrollmentStatus::Active.as_str()
            })
            .await?;
        Ok(count)
    }

    async fn delete_by_offering(&self, course_offering_id: &str) -> AppResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "course_offering_id": course_offering_id })
            .await?;
        Ok(result.deleted_count)
    }
}
