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
    errors::AppResult,
    models::domain::AssignmentSubmission,
};

#[derive(Debug, Clone)]
pub struct GradeRecord {
    pub score: i32,
    pub feedback: Option<String>,
    pub graded_by: String,
    pub graded_at: DateTime<Utc>,
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn create(&self, submission: AssignmentSubmission) -> AppResult<AssignmentSubmission>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<AssignmentSubmission>>;
    async fn find_for_student(
        &self,
        assignment_id: &str,
        student_id: &str,
    ) -> AppResult<Option<AssignmentSubmission>>;
    /// Writes the artifact fields and `submitted_at` only if the stored `submitted_at` still
    /// equals `expected_submitted_at`. Returns false when another write got there first.
    async fn replace_artifact_if_unchanged(
        &self,
        submission: &AssignmentSubmission,
        expected_submitted_at: DateTime<Utc>,
    ) -> AppResult<bool>;
    async fn record_grade(
        &self,
        id: &str,
        grade: GradeRecord,
    ) -> AppResult<Option<AssignmentSubmission>>;
    async fn list_by_assignment(&self, assignment_id: &str)
        -> AppResult<Vec<AssignmentSubmission>>;
    async fn list_by_assignments(
        &self,
        assignment_ids: &[String],
    ) -> AppResult<Vec<AssignmentSubmission>>;
    async fn delete_by_assignments(&self, assignment_ids: &[String]) -> AppResult<u64>;
}

pub struct MongoSubmissionRepository {
    collection: Collection<AssignmentSubmission>,
}

impl MongoSubmissionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("assignment_submissions");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for assignment_submissions collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let assignment_student_index = IndexModel::builder()
            .keys(doc! { "assignment_id": 1, "student_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("assignment_student_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(assignment_student_index).await?;

        log::info!("Successfully created indexes for assignment_submissions collection");
        Ok(())
    }
}

#[async_trait]
impl SubmissionRepository for MongoSubmissionRepository {
    async fn create(&self, submission: AssignmentSubmission) -> AppResult<AssignmentSubmission> {
        self.collection.insert_one(&submission).await?;
        Ok(submission)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<AssignmentSubmission>> {
        let submission = self.collection.find_one(doc! { "id": id }).await?;
        Ok(submission)
    }

    async fn find_for_student(
        &self,
        assignment_id: &str,
        student_id: &str,
    ) -> AppResult<Option<AssignmentSubmission>> {
        let submission = self
            .collection
            .find_one(doc! { "assignment_id": assignment_id, "student_id": student_id })
            .await?;
        Ok(submission)
    }

    async fn replace_artifact_if_unchanged(
        &self,
        submission: &AssignmentSubmission,
        expected_submitted_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! {
                    "id": &submission.id,
                    "submitted_at": to_bson(&expected_submitted_at)?
                },
                doc! {
                    "$set": {
                        "file_path": to_bson(&submission.file_path)?,
                        "url": to_bson(&submission.url)?,
                        "submitted_at": to_bson(&submission.submitted_at)?
                    }
                },
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn record_grade(
        &self,
        id: &str,
        grade: GradeRecord,
    ) -> AppResult<Option<AssignmentSubmission>> {
        let submission = self
            .collection
            .find_one_and_update(
                doc! { "id": id },
                doc! {
                    "$set": {
                        "score": grade.score,
                        "feedback": to_bson(&grade.feedback)?,
                        "graded_by": grade.graded_by,
                        "graded_at": to_bson(&grade.graded_at)?
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(submission)
    }

    async fn list_by_assignment(
        &self,
        assignment_id: &str,
    ) -> AppResult<Vec<AssignmentSubmission>> {
        let mut submissions: Vec<AssignmentSubmission> = self
            .collection
            .find(doc! { "assignment_id": assignment_id })
            .await?
            .try_collect()
            .await?;
        submissions.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(submissions)
    }

    async fn list_by_assignments(
        &self,
        assignment_ids: &[String],
    ) -> AppResult<Vec<AssignmentSubmission>> {
        if assignment_ids.is_empty() {
            return Ok(Vec::new());
        }
        let submissions = self
            .collection
            .find(doc! { "assignment_id": { "$in": assignment_ids.to_vec() } })
            .await?
            .try_collect()
            .await?;
        Ok(submissions)
    }

    async fn delete_by_assignments(&self, assignment_ids: &[String]) -> AppResult<u64> {
        if assignment_ids.is_empty() {
            return Ok(0);
        }
        let result = self
            .collection
            .delete_many(doc! { "assignment_id": { "$in": assignment_ids.to_vec() } })
            .await?;
        Ok(result.deleted_count)
    }
}
