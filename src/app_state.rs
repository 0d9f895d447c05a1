use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        AssignmentRepository, CourseOfferingRepository, EnrollmentRepository,
        MaterialRepository, MongoAssignmentRepository, MongoCourseOfferingRepository,
        MongoEnrollmentRepository, MongoMaterialRepository, MongoQuizAttemptRepository,
        MongoQuizRepository, MongoSectionRepository, MongoSubmissionRepository,
        MongoUserRepository, QuizAttemptRepository, QuizRepository, SectionRepository,
        SubmissionRepository, UserRepository,
    },
    services::{
        content_cleanup::ContentCleanup, content_service::ContentService,
        course_context::CourseContextResolver,
        course_service::CourseService, enrollment_guard::EnrollmentGuard,
        grade_service::GradeService, quiz_attempt_service::QuizAttemptService,
        submission_service::SubmissionService, user_service::UserService,
    },
    storage::{FileStorage, LocalFileStorage},
};

/// Persistence handles every service is built from.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub offerings: Arc<dyn CourseOfferingRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub sections: Arc<dyn SectionRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub materials: Arc<dyn MaterialRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub attempts: Arc<dyn QuizAttemptRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub course_service: Arc<CourseService>,
    pub content_service: Arc<ContentService>,
    pub submission_service: Arc<SubmissionService>,
    pub quiz_attempt_service: Arc<QuizAttemptService>,
    pub grade_service: Arc<GradeService>,
    pub db: Option<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let users = Arc::new(MongoUserRepository::new(&db));
        users.ensure_indexes().await?;
        let offerings = Arc::new(MongoCourseOfferingRepository::new(&db));
        offerings.ensure_indexes().await?;
        let enrollments = Arc::new(MongoEnrollmentRepository::new(&db));
        enrollments.ensure_indexes().await?;
        let sections = Arc::new(MongoSectionRepository::new(&db));
        sections.ensure_indexes().await?;
        let assignments = Arc::new(MongoAssignmentRepository::new(&db));
        assignments.ensure_indexes().await?;
        let quizzes = Arc::new(MongoQuizRepository::new(&db));
        quizzes.ensure_indexes().await?;
        let materials = Arc::new(MongoMaterialRepository::new(&db));
        materials.ensure_indexes().await?;
        let submissions = Arc::new(MongoSubmissionRepository::new(&db));
        submissions.ensure_indexes().await?;
        let attempts = Arc::new(MongoQuizAttemptRepository::new(&db));
        attempts.ensure_indexes().await?;

        let repositories = Repositories {
            users,
            offerings,
            enrollments,
            sections,
            assignments,
            quizzes,
            materials,
            submissions,
            attempts,
        };
        let storage = Arc::new(LocalFileStorage::from_config(&config));

        let mut state = Self::from_parts(config, repositories, storage);
        state.db = Some(db);
        Ok(state)
    }

    /// Wires the services over the given repositories and storage.
    pub fn from_parts(
        config: Config,
        repositories: Repositories,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        let Repositories {
            users,
            offerings,
            enrollments,
            sections,
            assignments,
            quizzes,
            materials,
            submissions,
            attempts,
        } = repositories;

        let contexts = Arc::new(CourseContextResolver::new(
            offerings.clone(),
            sections.clone(),
        ));
        let enrollment_guard = Arc::new(EnrollmentGuard::new(enrollments.clone()));

        let cleanup = Arc::new(ContentCleanup::new(
            assignments.clone(),
            quizzes.clone(),
            materials.clone(),
            submissions.clone(),
            attempts.clone(),
            storage.clone(),
        ));

        let user_service = Arc::new(UserService::new(users.clone()));
        let course_service = Arc::new(CourseService::new(
            offerings.clone(),
            enrollments.clone(),
            sections.clone(),
            users.clone(),
            cleanup.clone(),
        ));
        let content_service = Arc::new(ContentService::new(
            sections.clone(),
            assignments.clone(),
            quizzes.clone(),
            materials,
            contexts.clone(),
            enrollment_guard.clone(),
            cleanup,
            storage.clone(),
            config.max_upload_bytes,
        ));
        let submission_service = Arc::new(SubmissionService::new(
            assignments.clone(),
            submissions.clone(),
            users.clone(),
            contexts.clone(),
            enrollment_guard.clone(),
            storage,
            config.max_upload_bytes,
        ));
        let quiz_attempt_service = Arc::new(QuizAttemptService::new(
            quizzes.clone(),
            attempts.clone(),
            users.clone(),
            contexts,
            enrollment_guard.clone(),
        ));
        let grade_service = Arc::new(GradeService::new(
            offerings,
            enrollments,
            sections,
            assignments,
            quizzes,
            submissions,
            attempts,
            users,
            enrollment_guard,
        ));

        Self {
            user_service,
            course_service,
            content_service,
            submission_service,
            quiz_attempt_service,
            grade_service,
            db: None,
            config: Arc::new(config),
        }
    }
}
