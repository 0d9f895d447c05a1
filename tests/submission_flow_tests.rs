mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use mockall::mock;

use classroom_server::{
    errors::{AppError, AppResult},
    models::domain::{AssignmentSubmission, SubmissionArtifact, SubmissionKind, UserRole},
    repositories::SubmissionRepository,
    services::submission_service::SubmissionPayload,
    storage::FileStorage,
};
use common::{caller, InMemoryFileStorage, TestApp};

mock! {
    pub Storage {}

    #[async_trait]
    impl FileStorage for Storage {
        async fn store(&self, dir: &str, filename: &str, bytes: &[u8]) -> AppResult<String>;
        async fn delete(&self, path: &str) -> AppResult<()>;
        async fn exists(&self, path: &str) -> AppResult<bool>;
        fn url_for(&self, path: &str) -> String;
    }
}

fn file(name: &str, bytes: &[u8]) -> SubmissionPayload {
    SubmissionPayload::file(name, bytes)
}

fn link(url: &str) -> SubmissionPayload {
    SubmissionPayload::link(url)
}

#[tokio::test]
async fn file_resubmission_replaces_artifact_and_deletes_old_file() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let assignment = app
        .assignment(&section, SubmissionKind::File, None, false)
        .await;
    let service = &app.state.submission_service;
    let now = Utc::now();

    let first = service
        .submit(&assignment.id, &caller(&student), file("essay v1.pdf", b"one"), now)
        .await
        .unwrap();
    assert!(first.created);
    let old_path = first.submission.file_path.clone().unwrap();
    assert!(app.files.contains(&old_path).await);

    // A stale url on the stored row must not survive a file resubmission.
    let mut stored = app
        .submissions
        .find_by_id(&first.submission.id)
        .await
        .unwrap()
        .unwrap();
    stored.url = Some("https://example.com/old".to_string());
    assert!(app
        .submissions
        .replace_artifact_if_unchanged(&stored, stored.submitted_at)
        .await
        .unwrap());

    let second = service
        .submit(
            &assignment.id,
            &caller(&student),
            file("essay v2.pdf", b"two"),
            now + Duration::minutes(1),
        )
        .await
        .unwrap();

    assert!(!second.created);
    assert_eq!(second.submission.id, first.submission.id);
    assert_eq!(second.submission.url, None);
    let new_path = second.submission.file_path.clone().unwrap();
    assert_ne!(new_path, old_path);
    assert!(!app.files.contains(&old_path).await);
    assert!(app.files.contains(&new_path).await);
    assert_eq!(app.files.len().await, 1);
    assert_eq!(second.submission.submitted_at, now + Duration::minutes(1));
}

#[tokio::test]
async fn late_submission_is_flagged_when_allowed() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let now = Utc::now();
    let assignment = app
        .assignment(
            &section,
            SubmissionKind::Link,
            Some(now - Duration::hours(1)),
            true,
        )
        .await;

    let receipt = app
        .state
        .submission_service
        .submit(
            &assignment.id,
            &caller(&student),
            link("https://github.com/sam/lab"),
            now,
        )
        .await
        .unwrap();

    assert!(receipt.submission.is_late);
    assert_eq!(
        receipt.submission.url.as_deref(),
        Some("https://github.com/sam/lab")
    );
}

#[tokio::test]
async fn submission_after_deadline_is_rejected_without_late_allowance() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let now = Utc::now();
    let assignment = app
        .assignment(&section, SubmissionKind::File, Some(now), false)
        .await;
    let service = &app.state.submission_service;

    // The deadline instant itself is still on time.
    let on_time = service
        .submit(&assignment.id, &caller(&student), file("a.txt", b"a"), now)
        .await
        .unwrap();
    assert!(!on_time.submission.is_late);

    let late = service
        .submit(
            &assignment.id,
            &caller(&student),
            file("b.txt", b"b"),
            now + Duration::seconds(1),
        )
        .await;
    assert!(matches!(late, Err(AppError::UnprocessableState(_))));
    assert_eq!(app.files.len().await, 1);
}

#[tokio::test]
async fn invalid_payloads_are_validation_errors() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let file_assignment = app
        .assignment(&section, SubmissionKind::File, None, false)
        .await;
    let link_assignment = app
        .assignment(&section, SubmissionKind::Link, None, false)
        .await;
    let service = &app.state.submission_service;
    let now = Utc::now();

    let cases = vec![
        (&file_assignment, link("https://example.com")),
        (&file_assignment, file("empty.txt", b"")),
        (&file_assignment, file("big.bin", &[0u8; 2048])),
        (&link_assignment, file("a.txt", b"a")),
        (&link_assignment, link("not a url")),
    ];

    for (assignment, payload) in cases {
        let result = service
            .submit(&assignment.id, &caller(&student), payload, now)
            .await;
        assert!(
            matches!(result, Err(AppError::ValidationError(_))),
            "expected a validation error, got {:?}",
            result.map(|r| r.submission.id)
        );
    }
    assert_eq!(app.files.len().await, 0);
}

#[tokio::test]
async fn the_part_the_assignment_does_not_use_is_ignored() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let link_assignment = app
        .assignment(&section, SubmissionKind::Link, None, false)
        .await;
    let file_assignment = app
        .assignment(&section, SubmissionKind::File, None, false)
        .await;
    let service = &app.state.submission_service;
    let now = Utc::now();

    let mut both = link("https://example.com/repo");
    both.file = file("stray.bin", b"stray").file;

    let receipt = service
        .submit(&link_assignment.id, &caller(&student), both.clone(), now)
        .await
        .unwrap();
    assert_eq!(receipt.submission.url.as_deref(), Some("https://example.com/repo"));
    assert!(receipt.submission.file_path.is_none());
    assert_eq!(app.files.len().await, 0);

    let receipt = service
        .submit(&file_assignment.id, &caller(&student), both, now)
        .await
        .unwrap();
    assert!(receipt.submission.url.is_none());
    assert!(receipt
        .submission
        .file_path
        .as_deref()
        .is_some_and(|p| p.ends_with("stray.bin")));
}

#[tokio::test]
async fn prepare_checks_enrollment_and_deadline_without_a_payload() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let outsider = app.user("Olly Outsider", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let now = Utc::now();
    let closed = app
        .assignment(&section, SubmissionKind::File, Some(now - Duration::hours(1)), false)
        .await;
    let open = app
        .assignment(&section, SubmissionKind::File, None, false)
        .await;
    let service = &app.state.submission_service;

    assert!(matches!(
        service.prepare(&open.id, &caller(&outsider), now).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        service.prepare(&closed.id, &caller(&student), now).await,
        Err(AppError::UnprocessableState(_))
    ));
    assert!(matches!(
        service.prepare("missing", &caller(&student), now).await,
        Err(AppError::NotFound(_))
    ));
    let prepared = service.prepare(&open.id, &caller(&student), now).await.unwrap();
    assert_eq!(prepared.kind, SubmissionKind::File);
}

#[tokio::test]
async fn students_outside_the_offering_cannot_submit() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    let section = app.section(&offering, 1).await;
    let assignment = app
        .assignment(&section, SubmissionKind::Link, None, false)
        .await;

    let result = app
        .state
        .submission_service
        .submit(
            &assignment.id,
            &caller(&student),
            link("https://example.com"),
            Utc::now(),
        )
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn grading_is_limited_to_the_instructor_and_the_score_range() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let other_teacher = app.user("Olga Other", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let assignment = app
        .assignment(&section, SubmissionKind::Link, None, false)
        .await;
    let submissions = &app.state.submission_service;
    let now = Utc::now();

    let receipt = submissions
        .submit(
            &assignment.id,
            &caller(&student),
            link("https://example.com/work"),
            now,
        )
        .await
        .unwrap();
    let id = receipt.submission.id;

    assert!(matches!(
        submissions.grade(&id, &caller(&other_teacher), 50, None, now).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        submissions.grade(&id, &caller(&teacher), 101, None, now).await,
        Err(AppError::ValidationError(_))
    ));
    assert!(matches!(
        submissions.grade(&id, &caller(&teacher), -1, None, now).await,
        Err(AppError::ValidationError(_))
    ));

    submissions
        .grade(&id, &caller(&teacher), 70, Some("ok".to_string()), now)
        .await
        .unwrap();
    let regraded = submissions
        .grade(&id, &caller(&teacher), 85, None, now + Duration::minutes(1))
        .await
        .unwrap();

    assert_eq!(regraded.score, Some(85));
    assert_eq!(regraded.feedback, None);
    assert_eq!(regraded.graded_by.as_deref(), Some(teacher.id.as_str()));
    assert_eq!(
        regraded.student.as_ref().map(|s| s.id.clone()),
        Some(student.id.clone())
    );

    // Resubmitting keeps the grade.
    let resubmitted = submissions
        .submit(
            &assignment.id,
            &caller(&student),
            link("https://example.com/work-v2"),
            now + Duration::minutes(2),
        )
        .await
        .unwrap();
    assert_eq!(resubmitted.submission.score, Some(85));
}

#[tokio::test]
async fn listing_only_links_files_that_still_exist() {
    let app = TestApp::new();
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let ana = app.user("Ana", UserRole::Student).await;
    let bo = app.user("Bo", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &ana).await;
    app.enroll(&offering, &bo).await;
    let section = app.section(&offering, 1).await;
    let assignment = app
        .assignment(&section, SubmissionKind::File, None, false)
        .await;
    let now = Utc::now();

    app.state
        .submission_service
        .submit(&assignment.id, &caller(&ana), file("a.pdf", b"a"), now)
        .await
        .unwrap();
    app.submissions
        .create(AssignmentSubmission::new(
            &assignment.id,
            &bo.id,
            SubmissionArtifact::File("assignments/gone.pdf".to_string()),
            now + Duration::minutes(1),
        ))
        .await
        .unwrap();

    let listing = app
        .state
        .submission_service
        .list_for_assignment(&assignment.id, &caller(&teacher))
        .await
        .unwrap();

    assert_eq!(listing.submissions.len(), 2);
    assert!(listing.submissions[0].file_url.is_some());
    assert!(listing.submissions[1].file_url.is_none());
    assert_eq!(
        listing.submissions[1].file_path.as_deref(),
        Some("assignments/gone.pdf")
    );
}

#[tokio::test]
async fn storage_failure_leaves_no_submission_behind() {
    let mut storage = MockStorage::new();
    storage
        .expect_store()
        .returning(|_, _, _| Err(AppError::InternalError("disk full".to_string())));
    storage.expect_delete().never();

    let app = TestApp::with_storage(Arc::new(InMemoryFileStorage::default()), Arc::new(storage));
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let assignment = app
        .assignment(&section, SubmissionKind::File, None, false)
        .await;

    let result = app
        .state
        .submission_service
        .submit(&assignment.id, &caller(&student), file("a.pdf", b"a"), Utc::now())
        .await;

    assert!(matches!(result, Err(AppError::InternalError(_))));
    assert!(app
        .submissions
        .find_for_student(&assignment.id, &student.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn failed_cleanup_of_the_old_file_is_swallowed() {
    let mut storage = MockStorage::new();
    storage
        .expect_store()
        .returning(|dir, filename, _| Ok(format!("{}/{}", dir, filename)));
    storage
        .expect_delete()
        .times(1)
        .returning(|_| Err(AppError::InternalError("permission denied".to_string())));
    storage
        .expect_url_for()
        .returning(|path| format!("http://files.test/{}", path));

    let app = TestApp::with_storage(Arc::new(InMemoryFileStorage::default()), Arc::new(storage));
    let teacher = app.user("Tess Teacher", UserRole::Teacher).await;
    let student = app.user("Sam Student", UserRole::Student).await;
    let offering = app.offering(&teacher).await;
    app.enroll(&offering, &student).await;
    let section = app.section(&offering, 1).await;
    let assignment = app
        .assignment(&section, SubmissionKind::File, None, false)
        .await;
    let service = &app.state.submission_service;
    let now = Utc::now();

    service
        .submit(&assignment.id, &caller(&student), file("v1.pdf", b"1"), now)
        .await
        .unwrap();
    let second = service
        .submit(
            &assignment.id,
            &caller(&student),
            file("v2.pdf", b"2"),
            now + Duration::minutes(1),
        )
        .await
        .unwrap();

    assert!(second
        .submission
        .file_path
        .as_deref()
        .is_some_and(|p| p.ends_with("v2.pdf")));
}
