use std::sync::Arc;

use crate::{
    errors::AppResult,
    models::domain::{Assignment, Material, Quiz},
    repositories::{
        AssignmentRepository, MaterialRepository, QuizAttemptRepository, QuizRepository,
        SubmissionRepository,
    },
    storage::{delete_quietly, FileStorage},
};

/// How many rows a cleanup removed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RemovedContent {
    pub assignments: u64,
    pub quizzes: u64,
    pub materials: u64,
    pub submissions: u64,
    pub attempts: u64,
}

/// Deletes course content together with the submissions, attempts and stored files that
/// hang off it. Records go first; files are removed afterwards and failures only logged.
pub struct ContentCleanup {
    assignment_repository: Arc<dyn AssignmentRepository>,
    quiz_repository: Arc<dyn QuizRepository>,
    material_repository: Arc<dyn MaterialRepository>,
    submission_repository: Arc<dyn SubmissionRepository>,
    attempt_repository: Arc<dyn QuizAttemptRepository>,
    storage: Arc<dyn FileStorage>,
}

impl ContentCleanup {
    pub fn new(
        assignment_repository: Arc<dyn AssignmentRepository>,
        quiz_repository: Arc<dyn QuizRepository>,
        material_repository: Arc<dyn MaterialRepository>,
        submission_repository: Arc<dyn SubmissionRepository>,
        attempt_repository: Arc<dyn QuizAttemptRepository>,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            assignment_repository,
            quiz_repository,
            material_repository,
            submission_repository,
            attempt_repository,
            storage,
        }
    }

    async fn delete_files(&self, paths: &[String]) {
        for path in paths {
            delete_quietly(self.storage.as_ref(), path).await;
        }
    }

    async fn submission_files(&self, assignment_ids: &[String]) -> AppResult<Vec<String>> {
        Ok(self
            .submission_repository
            .list_by_assignments(assignment_ids)
            .await?
            .into_iter()
            .filter_map(|s| s.file_path)
            .collect())
    }

    /// Everything inside the given sections. The sections themselves are left alone.
    pub async fn remove_section_content(&self, section_ids: &[String]) -> AppResult<RemovedContent> {
        let assignment_ids: Vec<String> = self
            .assignment_repository
            .list_by_sections(section_ids)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();
        let quiz_ids: Vec<String> = self
            .quiz_repository
            .list_by_sections(section_ids)
            .await?
            .into_iter()
            .map(|q| q.id)
            .collect();

        let mut stored_files = self.submission_files(&assignment_ids).await?;
        stored_files.extend(
            self.material_repository
                .list_by_sections(section_ids)
                .await?
                .into_iter()
                .filter_map(|m| m.file_path),
        );

        let removed = RemovedContent {
            submissions: self
                .submission_repository
                .delete_by_assignments(&assignment_ids)
                .await?,
            assignments: self
                .assignment_repository
                .delete_by_sections(section_ids)
                .await?,
            attempts: self.attempt_repository.delete_by_quizzes(&quiz_ids).await?,
            quizzes: self.quiz_repository.delete_by_sections(section_ids).await?,
            materials: self
                .material_repository
                .delete_by_sections(section_ids)
                .await?,
        };

        self.delete_files(&stored_files).await;
        Ok(removed)
    }

    /// Deletes an assignment and its submissions. Returns the number of submissions removed.
    pub async fn remove_assignment(&self, assignment: &Assignment) -> AppResult<u64> {
        let ids = [assignment.id.clone()];
        let stored_files = self.submission_files(&ids).await?;

        let submissions = self.submission_repository.delete_by_assignments(&ids).await?;
        self.assignment_repository.delete(&assignment.id).await?;

        self.delete_files(&stored_files).await;
        Ok(submissions)
    }

    /// Deletes a quiz and its attempts. Returns the number of attempts removed.
    pub async fn remove_quiz(&self, quiz: &Quiz) -> AppResult<u64> {
        let attempts = self
            .attempt_repository
            .delete_by_quizzes(&[quiz.id.clone()])
            .await?;
        self.quiz_repository.delete(&quiz.id).await?;
        Ok(attempts)
    }

    pub async fn remove_material(&self, material: &Material) -> AppResult<()> {
        self.material_repository.delete(&material.id).await?;
        if let Some(path) = &material.file_path {
            delete_quietly(self.storage.as_ref(), path).await;
        }
        Ok(())
    }
}
