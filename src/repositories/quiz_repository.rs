use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::Quiz,
};

#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>>;
    async fn update(&self, quiz: Quiz) -> AppResult<Quiz>;
    async fn delete(&self, id: &str) -> AppResult<bool>;
    async fn list_by_section(&self, section_id: &str) -> AppResult<Vec<Quiz>>;
    async fn list_by_sections(&self, section_ids: &[String]) -> AppResult<Vec<Quiz>>;
    async fn delete_by_sections(&self, section_ids: &[String]) -> AppResult<u64>;
}

pub struct MongoQuizRepository {
    collection: Collection<Quiz>,
}

impl MongoQuizRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("quizzes");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quizzes collection");

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

        log::info!("Successfully created indexes for quizzes collection");
        Ok(())
    }
}

#[async_trait]
impl QuizRepository for MongoQuizRepository {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.collection.insert_one(&quiz).await?;
        Ok(quiz)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        let quiz = self.collection.find_one(doc! { "id": id }).await?;
        Ok(quiz)
    }

    async fn update(&self, quiz: Quiz) -> AppResult<Quiz> {
        let result = self
            .collection
            .replace_one(doc! { "id": &quiz.id }, &quiz)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Quiz with id '{}' not found",
                quiz.id
            )));
        }

        Ok(quiz)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count == 1)
    }

    async fn list_by_section(&self, section_id: &str) -> AppResult<Vec<Quiz>> {
        let mut quizzes: Vec<Quiz> = self
            .collection
            .find(doc! { "section_id": section_id })
            .await?
            .try_collect()
            .await?;
        quizzes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(quizzes)
    }

    async fn list_by_sections(&self, section_ids: &[String]) -> AppResult<Vec<Quiz>> {
        if section_ids.is_empty() {
            return Ok(Vec::new());
        }
        let quizzes = self
            .collection
            .find(doc! { "section_id": { "$in": section_ids.to_vec() } })
            .await?
            .try_collect()
            .await?;
        Ok(quizzes)
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
