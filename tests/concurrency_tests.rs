mod common;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use classroom_server::{
    app_state::{AppState, Repositories},
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{AssignmentSubmission, QuizAttempt, SubmissionKind, UserRole},
    repositories::{GradeRecord, QuizAttemptRepository, SubmissionRepository},
    services::submission_service::SubmissionPayload,
};
use common::{
    caller, mcq_and_essay, InMemoryQuizAttemptRepository, InMemorySubmissionRepository, TestApp,
};

/// What another request manages to do just before our write lands.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Interference {
    FinishFirst,
    StartFirst,
}

/// Lets one competing write through ahead of the first matching call.
struct InterferingAttempts {
    inner: Arc<InMemoryQuizAttemptRepository>,
    interference: Interference,
    armed: AtomicBool,
}

impl InterferingAttempts {
    fn new(inner: Arc<InMemoryQuizAttemptRepository>, interference: Interference) -> Self {
        Self {
            inner,
            interference,
            armed: AtomicBool::new(true),
        }
    }

    fn fire(&self, wanted: Interference) -> bool {
        self.interference == wanted && self.armed.swap(false, Ordering::SeqCst)
    }
}

#[async_trait]
impl QuizAttemptRepository for InterferingAttempts {
    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        if self.fire(Interference::StartFirst) {
            self.inner
                .create(QuizAttempt::start(
                    &attempt.quiz_id,
                    &attempt.student_id,
                    attempt.attempt_number,
                    attempt.started_at,
                ))
                .await?;
        }
        self.inner.create(attempt).await
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
        self.inner.find_by_id(id).await
    }

    async fn find_unfinished(
        &self,
        quiz_id: &str,
        student_id: &str,
    ) -> AppResult<Option<QuizAttempt>> {
        self.inner.find_unfinished(quiz_id, student_id).await
    }

    async fn max_attempt_number(&self, quiz_id: &str, student_id: &str) -> AppResult<Option<i32>> {
        self.inner.max_attempt_number(quiz_id, student_id).await
    }

    async fn list_for_student(
        &self,
        quiz_id: &str,
        student_id: &str,
    ) -> AppResult<Vec<QuizAttempt>> {
        self.inner.list_for_student(quiz_id, student_id).await
    }

    async fn list_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<QuizAttempt>> {
        self.inner.list_by_quiz(quiz_id).await
    }

    async fn list_by_quizzes(&self, quiz_ids: &[String]) -> AppResult<Vec<QuizAttempt>> {
        self.inner.list_by_quizzes(quiz_ids).await
    }

    async fn finish_if_unfinished(
        &self,
        id: &str,
        answers: Vec<Value>,
        score: i32,
        finished_at: DateTime<Utc>,
    ) -> AppResult<Option<QuizAttempt>> {
        if self.fire(Interference::FinishFirst) {
            self.inner
                .finish_if_unfinished(
                    id,
                    vec![json!({ "question_id": "q1", "answer": "B" })],
                    5,
                    finished_at,
                )
                .await?;
        }
        self.inner
            .finish_if_unfinished(id, answers, score, finished_at)
            .await
    }

    async fn delete_by_quizzes(&self, quiz_ids: &[String]) -> AppResult<u64> {
        self.inner.delete_by_quizzes(quiz_ids).await
    }
}

/// Resubmits on the student's behalf right before the first conditional replace.
struct InterferingSubmissions {
    inner: Arc<InMemorySubmissionRepository>,
    armed: AtomicBool,
}

#[async_trait]
impl SubmissionRepository for InterferingSubmissions {
    async fn create(&self, submission: AssignmentSubmission) -> AppResult<AssignmentSubmission> {
        self.inner.create(submission).await
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<AssignmentSubmission>> {
        self.inner.find_by_id(id).await
    }

    async fn find_for_student(
        &self,
        assignment_id: &str,
        student_id: &str,
    ) -> AppResult<Option<AssignmentSubmission>> {
        self.inner.find_for_student(assignment_id, student_id).await
    }

    async fn replace_artifact_if_unchanged(
        &self,
        submission: &AssignmentSubmission,
        expected_submitted_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        if self.armed.swap(false, Ordering::SeqCst) {
            if let Some(mut stored) = self.inner.find_by_id(&submission.id).await? {
                stored.submitted_at = expected_submitted_at + Duration::seconds(1);
                self.inner
                    .replace_artifact_if_unchanged(&stored, expected_submitted_at)
                    .await?;
            }
        }
        self.inner
            .replace_artifact_if_unchanged(submission, expected_submitted_at)
            .await
    }

    async fn record_grade(
        &self,
        id: &str,
        grade: GradeRecord,
    ) -> AppResult<Option<AssignmentSubmission>> {
        self.inner.record_grade(id, grade).await
    }

    async fn list_by_assignment(
        &self,
        assignment_id: &str,
    ) -> AppResult<Vec<AssignmentSubmission>> {
        self.inner.list_by_assignment(assignment_id).await
    }

    async fn list_by_assignments(
        &self,
        assignment_ids: &[String],
    ) -> AppResult<Vec<AssignmentSubmission>> {
        self.inner.list_by_assignments(assignment_ids).await
    }

    async fn delete_by_assignments(&self, assignment_ids: &[String]) -> AppResult<u64> {
        self.inner.delete_by_assignments(assignment_ids).await
    }
}

/// Services over the stores of `app`, with attempts and submissions swapped out.
fn state_over(
    app: &TestApp,
    attempts: Arc<dyn QuizAttemptRepository>,
    submissions: Arc<dyn SubmissionRepository>,
) -> AppState {
    let repositories = Repositories {
        users: app.users.clone(),
        offerings: app.offerings.clone(),
        enrollments: app.enrollments.clone(),
        sections: app.sections.clone(),
        assignments: app.assignments.clone(),
        quizzes: app.quizzes.clone(),
        materials: app.materials.clone(),
        submissions,
        attempts,
    };
    let mut config = Config::from_env();
    config.max_upload_bytes = 1024;
    AppState::from_parts(config, repositories, app.files.clone())
}

#[tokio::test]
async fn a_finish_that_loses_the_race_keeps_the_winning_score() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let quiz = app.quiz(&section, mcq_and_essay()).await;
    let state = state_over(
        &app,
        Arc::new(InterferingAttempts::new(
            app.attempts.clone(),
            Interference::FinishFirst,
        )),
        app.submissions.clone(),
    );
    let now = Utc::now();

    let started = state
        .quiz_attempt_service
        .start(&quiz.id, &caller(&student), now)
        .await
        .unwrap();
    let result = state
        .quiz_attempt_service
        .submit(
            &started.attempt_id,
            &caller(&student),
            Some(json!([{ "question_id": "q1", "answer": "A" }])),
            now,
        )
        .await;
    assert!(matches!(result, Err(AppError::UnprocessableState(_))));

    let stored = app
        .attempts
        .find_by_id(&started.attempt_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.score, Some(5));
    assert!(stored.is_finished());
}

#[tokio::test]
async fn a_start_that_loses_the_race_resumes_the_winner() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let quiz = app.quiz(&section, mcq_and_essay()).await;
    let state = state_over(
        &app,
        Arc::new(InterferingAttempts::new(
            app.attempts.clone(),
            Interference::StartFirst,
        )),
        app.submissions.clone(),
    );

    let started = state
        .quiz_attempt_service
        .start(&quiz.id, &caller(&student), Utc::now())
        .await
        .unwrap();
    assert!(started.resumed);
    assert_eq!(started.attempt_number, 1);

    let stored = app
        .attempts
        .list_for_student(&quiz.id, &student.id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, started.attempt_id);
}

#[tokio::test]
async fn a_resubmission_that_loses_the_race_discards_its_file() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let assignment = app
        .assignment(&section, SubmissionKind::File, None, false)
        .await;
    let state = state_over(
        &app,
        app.attempts.clone(),
        Arc::new(InterferingSubmissions {
            inner: app.submissions.clone(),
            armed: AtomicBool::new(true),
        }),
    );
    let now = Utc::now();

    let first = state
        .submission_service
        .submit(
            &assignment.id,
            &caller(&student),
            SubmissionPayload::file("v1.pdf", b"first"),
            now,
        )
        .await
        .unwrap();
    let first_path = first.submission.file_path.unwrap();

    let second = state
        .submission_service
        .submit(
            &assignment.id,
            &caller(&student),
            SubmissionPayload::file("v2.pdf", b"second"),
            now + Duration::minutes(1),
        )
        .await;
    assert!(matches!(second, Err(AppError::UnprocessableState(_))));

    assert_eq!(app.files.len().await, 1);
    assert!(app.files.contains(&first_path).await);
    let stored = app
        .submissions
        .find_for_student(&assignment.id, &student.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.file_path.as_deref(), Some(first_path.as_str()));
}

#[tokio::test]
async fn simultaneous_starts_share_one_attempt() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let quiz = app.quiz(&section, mcq_and_essay()).await;
    let attempts = &app.state.quiz_attempt_service;
    let who = caller(&student);
    let now = Utc::now();

    let (a, b) = tokio::join!(
        attempts.start(&quiz.id, &who, now),
        attempts.start(&quiz.id, &who, now)
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.attempt_id, b.attempt_id);
    assert!(a.resumed != b.resumed);
    assert_eq!(
        app.attempts
            .list_for_student(&quiz.id, &student.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn simultaneous_finishes_score_once() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let quiz = app.quiz(&section, mcq_and_essay()).await;
    let attempts = &app.state.quiz_attempt_service;
    let who = caller(&student);
    let now = Utc::now();

    let started = attempts.start(&quiz.id, &who, now).await.unwrap();
    let (a, b) = tokio::join!(
        attempts.submit(
            &started.attempt_id,
            &who,
            Some(json!([{ "question_id": "q1", "answer": "B" }])),
            now
        ),
        attempts.submit(
            &started.attempt_id,
            &who,
            Some(json!([{ "question_id": "q1", "answer": "A" }])),
            now
        )
    );
    let finished = [a, b];
    assert_eq!(finished.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(finished
        .iter()
        .any(|r| matches!(r, Err(AppError::UnprocessableState(_)))));
}

#[tokio::test]
async fn simultaneous_first_submissions_leave_one_row_and_one_file() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let assignment = app
        .assignment(&section, SubmissionKind::File, None, false)
        .await;
    let submissions = &app.state.submission_service;
    let who = caller(&student);
    let now = Utc::now();

    let (a, b) = tokio::join!(
        submissions.submit(
            &assignment.id,
            &who,
            SubmissionPayload::file("a.pdf", b"a"),
            now
        ),
        submissions.submit(
            &assignment.id,
            &who,
            SubmissionPayload::file("b.pdf", b"b"),
            now + Duration::seconds(1)
        )
    );
    assert!(a.is_ok() || b.is_ok());

    let rows = app
        .submissions
        .list_by_assignment(&assignment.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(app.files.len().await, 1);
    let kept = rows[0].file_path.clone().unwrap();
    assert!(app.files.contains(&kept).await);
}
