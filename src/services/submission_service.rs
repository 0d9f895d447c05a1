use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use validator::ValidateUrl;

use crate::{
    auth::{require_instructor, Caller},
    errors::{AppError, AppResult},
    models::{
        domain::{
            Assignment, AssignmentSubmission, SubmissionArtifact, SubmissionKind,
        },
        dto::response::{AssignmentSubmissionsDto, SubmissionDto, SubmissionReceiptDto},
    },
    repositories::{AssignmentRepository, GradeRecord, SubmissionRepository, UserRepository},
    services::{
        course_context::CourseContextResolver,
        enrollment_guard::EnrollmentGuard,
        time_window::{deadline_status, is_late},
    },
    storage::{delete_quietly, FileStorage, UploadedFile},
};

pub const MAX_URL_LEN: usize = 2048;

/// Parts of a submission form. Only the part the assignment's kind asks for is read;
/// the other one is ignored.
#[derive(Debug, Clone, Default)]
pub struct SubmissionPayload {
    pub file: Option<UploadedFile>,
    pub url: Option<String>,
}

impl SubmissionPayload {
    pub fn file(filename: &str, bytes: &[u8]) -> Self {
        SubmissionPayload {
            file: Some(UploadedFile {
                filename: filename.to_string(),
                bytes: bytes.to_vec(),
            }),
            url: None,
        }
    }

    pub fn link(url: &str) -> Self {
        SubmissionPayload {
            file: None,
            url: Some(url.to_string()),
        }
    }
}

enum SubmissionPart {
    File(UploadedFile),
    Link(String),
}

/// Checks a link the way submissions and materials accept it: a valid URL of bounded length.
pub fn validate_link(url: &str) -> AppResult<()> {
    if url.len() > MAX_URL_LEN || !url.validate_url() {
        return Err(AppError::ValidationError(format!(
            "url must be a valid URL of at most {} characters",
            MAX_URL_LEN
        )));
    }
    Ok(())
}

pub struct SubmissionService {
    assignment_repository: Arc<dyn AssignmentRepository>,
    submission_repository: Arc<dyn SubmissionRepository>,
    user_repository: Arc<dyn UserRepository>,
    contexts: Arc<CourseContextResolver>,
    enrollment_guard: Arc<EnrollmentGuard>,
    storage: Arc<dyn FileStorage>,
    max_upload_bytes: usize,
}

impl SubmissionService {
    pub fn new(
        assignment_repository: Arc<dyn AssignmentRepository>,
        submission_repository: Arc<dyn SubmissionRepository>,
        user_repository: Arc<dyn UserRepository>,
        contexts: Arc<CourseContextResolver>,
        enrollment_guard: Arc<EnrollmentGuard>,
        storage: Arc<dyn FileStorage>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            assignment_repository,
            submission_repository,
            user_repository,
            contexts,
            enrollment_guard,
            storage,
            max_upload_bytes,
        }
    }

    async fn load_assignment(&self, assignment_id: &str) -> AppResult<Assignment> {
        self.assignment_repository
            .find_by_id(assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Assignment with id '{}' not found", assignment_id))
            })
    }

    /// Picks the part the assignment's kind uses and validates it.
    fn take_part(
        &self,
        kind: SubmissionKind,
        payload: SubmissionPayload,
    ) -> AppResult<SubmissionPart> {
        match kind {
            SubmissionKind::File => {
                let file = payload.file.ok_or_else(|| {
                    AppError::ValidationError(
                        "This assignment requires a file upload".to_string(),
                    )
                })?;
                if file.bytes.is_empty() {
                    return Err(AppError::ValidationError(
                        "Uploaded file is empty".to_string(),
                    ));
                }
                if file.bytes.len() > self.max_upload_bytes {
                    return Err(AppError::ValidationError(format!(
                        "Uploaded file exceeds the limit of {} bytes",
                        self.max_upload_bytes
                    )));
                }
                Ok(SubmissionPart::File(file))
            }
            SubmissionKind::Link => {
                let url = payload
                    .url
                    .map(|url| url.trim().to_string())
                    .filter(|url| !url.is_empty())
                    .ok_or_else(|| {
                        AppError::ValidationError("This assignment requires a url".to_string())
                    })?;
                validate_link(&url)?;
                Ok(SubmissionPart::Link(url))
            }
        }
    }

    async fn file_url(&self, file_path: Option<&str>) -> Option<String> {
        let path = file_path?;
        match self.storage.exists(path).await {
            Ok(true) => Some(self.storage.url_for(path)),
            Ok(false) => None,
            Err(e) => {
                log::warn!("Could not check stored file '{}': {}", path, e);
                None
            }
        }
    }

    async fn discard_new_file(&self, artifact: &SubmissionArtifact) {
        if let SubmissionArtifact::File(path) = artifact {
            delete_quietly(self.storage.as_ref(), path).await;
        }
    }

    /// Checks that the caller may submit to the assignment right now, before any upload
    /// is read: the assignment exists, the caller is actively enrolled and the deadline
    /// still allows it.
    pub async fn prepare(
        &self,
        assignment_id: &str,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> AppResult<Assignment> {
        let assignment = self.load_assignment(assignment_id).await?;
        let context = self.contexts.for_assignment(&assignment).await?;
        self.enrollment_guard
            .require_active(&context.course_offering_id, &caller.id)
            .await?;

        let status = deadline_status(assignment.deadline, assignment.allow_late, now);
        if !status.can_submit_now {
            return Err(AppError::UnprocessableState(
                "The deadline has passed and late submissions are not accepted".to_string(),
            ));
        }
        Ok(assignment)
    }

    /// Creates or overwrites the caller's submission for an assignment.
    pub async fn submit(
        &self,
        assignment_id: &str,
        caller: &Caller,
        payload: SubmissionPayload,
        now: DateTime<Utc>,
    ) -> AppResult<SubmissionReceiptDto> {
        let assignment = self.prepare(assignment_id, caller, now).await?;
        let part = self.take_part(assignment.kind, payload)?;

        let existing = self
            .submission_repository
            .find_for_student(&assignment.id, &caller.id)
            .await?;

        let artifact = match part {
            SubmissionPart::File(file) => {
                let dir = format!("assignments/{}/student-{}", assignment.id, caller.id);
                SubmissionArtifact::File(
                    self.storage
                        .store(&dir, &file.filename, &file.bytes)
                        .await?,
                )
            }
            SubmissionPart::Link(url) => SubmissionArtifact::Link(url),
        };

        let (submission, created) = match existing {
            None => {
                let submission =
                    AssignmentSubmission::new(&assignment.id, &caller.id, artifact.clone(), now);
                match self.submission_repository.create(submission).await {
                    Ok(created) => (created, true),
                    Err(e) => {
                        self.discard_new_file(&artifact).await;
                        return Err(match e {
                            AppError::AlreadyExists(_) => AppError::UnprocessableState(
                                "Another submission was saved at the same time, please retry"
                                    .to_string(),
                            ),
                            other => other,
                        });
                    }
                }
            }
            Some(mut submission) => {
                let previous_file = submission.file_path.clone();
                let expected_submitted_at = submission.submitted_at;
                submission.replace_artifact(artifact.clone(), now);

                let replaced = match self
                    .submission_repository
                    .replace_artifact_if_unchanged(&submission, expected_submitted_at)
                    .await
                {
                    Ok(replaced) => replaced,
                    Err(e) => {
                        self.discard_new_file(&artifact).await;
                        return Err(e);
                    }
                };

                if !replaced {
                    self.discard_new_file(&artifact).await;
                    return Err(AppError::UnprocessableState(
                        "Another submission was saved at the same time, please retry".to_string(),
                    ));
                }

                if let Some(old) = previous_file {
                    if submission.file_path.as_deref() != Some(old.as_str()) {
                        delete_quietly(self.storage.as_ref(), &old).await;
                    }
                }
                (submission, false)
            }
        };

        log::info!(
            "Stored submission {} for assignment {} by student {} ({})",
            submission.id,
            assignment.id,
            caller.id,
            if created { "created" } else { "updated" }
        );

        let late = is_late(submission.submitted_at, assignment.deadline);
        let file_url = submission
            .file_path
            .as_deref()
            .map(|path| self.storage.url_for(path));

        Ok(SubmissionReceiptDto {
            created,
            submission: SubmissionDto::new(submission, late, file_url),
        })
    }

    /// Records a grade; only the assigned instructor may grade. Regrading overwrites.
    pub async fn grade(
        &self,
        submission_id: &str,
        caller: &Caller,
        score: i32,
        feedback: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<SubmissionDto> {
        let submission = self
            .submission_repository
            .find_by_id(submission_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Submission with id '{}' not found", submission_id))
            })?;
        let assignment = self.load_assignment(&submission.assignment_id).await?;
        let context = self.contexts.for_assignment(&assignment).await?;
        require_instructor(caller, &context)?;

        if score < 0 || score > assignment.max_score {
            return Err(AppError::ValidationError(format!(
                "score must be between 0 and {}",
                assignment.max_score
            )));
        }

        let graded = self
            .submission_repository
            .record_grade(
                &submission.id,
                GradeRecord {
                    score,
                    feedback,
                    graded_by: caller.id.clone(),
                    graded_at: now,
                },
            )
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Submission with id '{}' not found", submission_id))
            })?;

        log::info!(
            "Graded submission {} of assignment {} with {} by {}",
            graded.id,
            assignment.id,
            score,
            caller.id
        );

        let late = is_late(graded.submitted_at, assignment.deadline);
        let file_url = self.file_url(graded.file_path.as_deref()).await;
        let student = self.user_repository.find_by_id(&graded.student_id).await?;
        Ok(SubmissionDto::new(graded, late, file_url).with_student(student.as_ref()))
    }

    pub async fn list_for_assignment(
        &self,
        assignment_id: &str,
        caller: &Caller,
    ) -> AppResult<AssignmentSubmissionsDto> {
        let assignment = self.load_assignment(assignment_id).await?;
        let context = self.contexts.for_assignment(&assignment).await?;
        require_instructor(caller, &context)?;

        let submissions = self
            .submission_repository
            .list_by_assignment(&assignment.id)
            .await?;

        let student_ids: Vec<String> = submissions.iter().map(|s| s.student_id.clone()).collect();
        let students: HashMap<String, _> = self
            .user_repository
            .find_by_ids(&student_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let mut rows = Vec::with_capacity(submissions.len());
        for submission in submissions {
            let late = is_late(submission.submitted_at, assignment.deadline);
            let file_url = self.file_url(submission.file_path.as_deref()).await;
            let student = students.get(&submission.student_id);
            rows.push(SubmissionDto::new(submission, late, file_url).with_student(student));
        }

        Ok(AssignmentSubmissionsDto {
            assignment,
            submissions: rows,
        })
    }
}
