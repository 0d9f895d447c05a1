use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Bson},
    options::{IndexOptions, ReturnDocument},
    Collection, IndexModel,
};
use serde_json::Value;

use crate::{db::Database, errors::AppResult, models::domain::quiz_attempt::QuizAttempt};

#[async_trait]
pub trait QuizAttemptRepository: Send + Sync {
    /// Inserts a new attempt. A clash on (quiz, student, attempt number) is `AlreadyExists`.
    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>>;
    async fn find_unfinished(&self, quiz_id: &str, student_id: &str)
        -> AppResult<Option<QuizAttempt>>;
    async fn max_attempt_number(&self, quiz_id: &str, student_id: &str) -> AppResult<Option<i32>>;
    /// Attempts of one student for one quiz, highest attempt number first.
    async fn list_for_student(&self, quiz_id: &str, student_id: &str)
        -> AppResult<Vec<QuizAttempt>>;
    async fn list_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<QuizAttempt>>;
    async fn list_by_quizzes(&self, quiz_ids: &[String]) -> AppResult<Vec<QuizAttempt>>;
    /// Finishes the attempt only while `finished_at` is still null. `None` means the
    /// attempt was already finished (or does not exist).
    async fn finish_if_unfinished(
        &self,
        id: &str,
        answers: Vec<Value>,
        score: i32,
        finished_at: DateTime<Utc>,
    ) -> AppResult<Option<QuizAttempt>>;
    async fn delete_by_quizzes(&self, quiz_ids: &[String]) -> AppResult<u64>;
}

pub struct MongoQuizAttemptRepository {
    collection: Collection<QuizAttempt>,
}

impl MongoQuizAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("quiz_attempts");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quiz_attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let attempt_number_index = IndexModel::builder()
            .keys(doc! { "quiz_id": 1, "student_id": 1, "attempt_number": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("quiz_student_attempt_unique".to_string())
                    .build(),
            )
            .build();

        let student_index = IndexModel::builder()
            .keys(doc! { "student_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("student_id".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(attempt_number_index).await?;
        self.collection.create_index(student_index).await?;

        log::info!("Successfully created indexes for quiz_attempts collection");
        Ok(())
    }
}

#[async_trait]
impl QuizAttemptRepository for MongoQuizAttemptRepository {
    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        self.collection.insert_one(&attempt).await?;
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn find_unfinished(
        &self,
        quiz_id: &str,
        student_id: &str,
    ) -> AppResult<Option<QuizAttempt>> {
        let attempt = self
            .collection
            .find_one(doc! {
                "quiz_id": quiz_id,
                "student_id": student_id,
                "finished_at": Bson::Null
            })
            .await?;
        Ok(attempt)
    }

    async fn max_attempt_number(&self, quiz_id: &str, student_id: &str) -> AppResult<Option<i32>> {
        let attempt = self
            .collection
            .find_one(doc! { "quiz_id": quiz_id, "student_id": student_id })
            .sort(doc! { "attempt_number": -1 })
            .await?;
        Ok(attempt.map(|a| a.attempt_number))
    }

    async fn list_for_student(
        &self,
        quiz_id: &str,
        student_id: &str,
    ) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self
            .collection
            .find(doc! { "quiz_id": quiz_id, "student_id": student_id })
            .sort(doc! { "attempt_number": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn list_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self
            .collection
            .find(doc! { "quiz_id": quiz_id })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn list_by_quizzes(&self, quiz_ids: &[String]) -> AppResult<Vec<QuizAttempt>> {
        if quiz_ids.is_empty() {
            return Ok(Vec::new());
        }
        let attempts = self
            .collection
            .find(doc! { "quiz_id": { "$in": quiz_ids.to_vec() } })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn finish_if_unfinished(
        &self,
        id: &str,
        answers: Vec<Value>,
        score: i32,
        finished_at: DateTime<Utc>,
    ) -> AppResult<Option<QuizAttempt>> {
        let attempt = self
            .collection
            .find_one_and_update(
                doc! { "id": id, "finished_at": Bson::Null },
                doc! {
                    "$set": {
                        "answers": to_bson(&answers)?,
                        "score": score,
                        "finished_at": to_bson(&finished_at)?
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(attempt)
    }

    async fn delete_by_quizzes(&self, quiz_ids: &[String]) -> AppResult<u64> {
        if quiz_ids.is_empty() {
            return Ok(0);
        }
        let result = self
            .collection
            .delete_many(doc! { "quiz_id": { "$in": quiz_ids.to_vec() } })
            .await?;
        Ok(result.deleted_count)
    }
}
