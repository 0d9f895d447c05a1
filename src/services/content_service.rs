use std::sync::Arc;

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    auth::{require_admin_or_instructor, Caller},
    errors::{AppError, AppResult},
    models::{
        domain::{
            assignment::DEFAULT_MAX_SCORE, quiz::DEFAULT_QUIZ_MAX_SCORE, Assignment, Material,
            MaterialKind, Quiz, QuizQuestion, Section, UserRole,
        },
        dto::{
            request::{
                CreateAssignmentRequest, CreateQuizRequest, CreateSectionRequest,
                UpdateAssignmentRequest, UpdateQuizRequest, UpdateSectionRequest,
                MAX_QUIZ_DURATION_MINUTES,
            },
            response::{AssignmentView, MaterialFileUrlDto, QuizView},
        },
    },
    repositories::{AssignmentRepository, MaterialRepository, QuizRepository, SectionRepository},
    services::{
        content_cleanup::{ContentCleanup, RemovedContent},
        course_context::{CourseContext, CourseContextResolver},
        enrollment_guard::EnrollmentGuard,
        submission_service::validate_link,
        time_window::{deadline_status, window_status},
    },
    storage::{delete_quietly, FileStorage, UploadedFile},
};

const MAX_SUBJECT_LEN: usize = 100;
const MAX_TITLE_LEN: usize = 255;

/// Material fields as sent by a create or update form. On update, `None` leaves a field as
/// it is and `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct MaterialInput {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub kind: Option<MaterialKind>,
    pub subject: Option<Option<String>>,
    pub url: Option<String>,
    pub file: Option<UploadedFile>,
}

fn check_title(title: &str) -> AppResult<()> {
    let len = title.chars().count();
    if len == 0 || len > MAX_TITLE_LEN {
        return Err(AppError::ValidationError(format!(
            "title must be between 1 and {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

fn check_subject(subject: &Option<Option<String>>) -> AppResult<()> {
    if let Some(Some(subject)) = subject {
        if subject.chars().count() > MAX_SUBJECT_LEN {
            return Err(AppError::ValidationError(format!(
                "subject must be at most {} characters",
                MAX_SUBJECT_LEN
            )));
        }
    }
    Ok(())
}

fn check_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> AppResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::ValidationError(
                "end_time must not be earlier than start_time".to_string(),
            ));
        }
    }
    Ok(())
}

/// Parses authored questions, rejecting untyped ones and duplicate ids.
pub fn parse_questions(raw: Vec<serde_json::Value>) -> AppResult<Vec<QuizQuestion>> {
    let mut questions: Vec<QuizQuestion> = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        let question: QuizQuestion = serde_json::from_value(value).map_err(|e| {
            AppError::ValidationError(format!("questions[{}] is invalid: {}", index, e))
        })?;
        if questions.iter().any(|q| q.id() == question.id()) {
            return Err(AppError::ValidationError(format!(
                "questions[{}] repeats question id '{}'",
                index,
                question.id()
            )));
        }
        questions.push(question);
    }
    Ok(questions)
}

pub struct ContentService {
    section_repository: Arc<dyn SectionRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    quiz_repository: Arc<dyn QuizRepository>,
    material_repository: Arc<dyn MaterialRepository>,
    contexts: Arc<CourseContextResolver>,
    enrollment_guard: Arc<EnrollmentGuard>,
    cleanup: Arc<ContentCleanup>,
    storage: Arc<dyn FileStorage>,
    max_upload_bytes: usize,
}

impl ContentService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        section_repository: Arc<dyn SectionRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
        quiz_repository: Arc<dyn QuizRepository>,
        material_repository: Arc<dyn MaterialRepository>,
        contexts: Arc<CourseContextResolver>,
        enrollment_guard: Arc<EnrollmentGuard>,
        cleanup: Arc<ContentCleanup>,
        storage: Arc<dyn FileStorage>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            section_repository,
            assignment_repository,
            quiz_repository,
            material_repository,
            contexts,
            enrollment_guard,
            cleanup,
            storage,
            max_upload_bytes,
        }
    }

    async fn authorized_section(&self, section_id: &str, caller: &Caller) -> AppResult<Section> {
        let (section, context) = self.contexts.for_section_id(section_id).await?;
        require_admin_or_instructor(caller, &context)?;
        Ok(section)
    }

    async fn authorized_assignment(
        &self,
        assignment_id: &str,
        caller: &Caller,
    ) -> AppResult<Assignment> {
        let assignment = self
            .assignment_repository
            .find_by_id(assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Assignment with id '{}' not found", assignment_id))
            })?;
        let context = self.contexts.for_assignment(&assignment).await?;
        require_admin_or_instructor(caller, &context)?;
        Ok(assignment)
    }

    async fn authorized_quiz(&self, quiz_id: &str, caller: &Caller) -> AppResult<Quiz> {
        let quiz = self
            .quiz_repository
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))?;
        let context = self.contexts.for_quiz(&quiz).await?;
        require_admin_or_instructor(caller, &context)?;
        Ok(quiz)
    }

    async fn load_material(&self, material_id: &str) -> AppResult<(Material, CourseContext)> {
        let material = self
            .material_repository
            .find_by_id(material_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Material with id '{}' not found", material_id))
            })?;
        let (_, context) = self.contexts.for_section_id(&material.section_id).await?;
        Ok((material, context))
    }

    async fn authorized_material(&self, material_id: &str, caller: &Caller) -> AppResult<Material> {
        let (material, context) = self.load_material(material_id).await?;
        require_admin_or_instructor(caller, &context)?;
        Ok(material)
    }

    fn check_upload(&self, file: &UploadedFile) -> AppResult<()> {
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
        Ok(())
    }

    async fn section_order_taken(
        &self,
        course_offering_id: &str,
        order: i32,
        except_section_id: Option<&str>,
    ) -> AppResult<bool> {
        let taken = self
            .section_repository
            .find_by_order(course_offering_id, order)
            .await?;
        Ok(taken.is_some_and(|s| Some(s.id.as_str()) != except_section_id))
    }

    pub async fn list_sections(
        &self,
        course_offering_id: &str,
        caller: &Caller,
    ) -> AppResult<Vec<Section>> {
        let context = self.contexts.for_offering(course_offering_id).await?;
        require_admin_or_instructor(caller, &context)?;
        self.section_repository
            .list_by_offering(&context.course_offering_id)
            .await
    }

    /// Creates a section. Without an explicit order it goes after the current last one.
    pub async fn create_section(
        &self,
        course_offering_id: &str,
        caller: &Caller,
        request: CreateSectionRequest,
        now: DateTime<Utc>,
    ) -> AppResult<Section> {
        request.validate()?;
        let context = self.contexts.for_offering(course_offering_id).await?;
        require_admin_or_instructor(caller, &context)?;

        let order = match request.order {
            Some(order) => {
                if self
                    .section_order_taken(&context.course_offering_id, order, None)
                    .await?
                {
                    return Err(AppError::UnprocessableState(format!(
                        "A section with order {} already exists in this course offering",
                        order
                    )));
                }
                order
            }
            None => {
                self.section_repository
                    .max_order(&context.course_offering_id)
                    .await?
                    .unwrap_or(0)
                    + 1
            }
        };

        let mut section = Section::new(&context.course_offering_id, &request.title, order);
        section.created_at = Some(now);

        let created = self
            .section_repository
            .create(section)
            .await
            .map_err(|e| match e {
                AppError::AlreadyExists(_) => AppError::UnprocessableState(format!(
                    "A section with order {} already exists in this course offering",
                    order
                )),
                other => other,
            })?;

        log::info!(
            "Created section {} (order {}) in course offering {}",
            created.id,
            created.order,
            created.course_offering_id
        );
        Ok(created)
    }

    /// Renames or reorders a section. An explicit null order moves it after the last one.
    pub async fn update_section(
        &self,
        section_id: &str,
        caller: &Caller,
        request: UpdateSectionRequest,
    ) -> AppResult<Section> {
        request.validate()?;
        let mut section = self.authorized_section(section_id, caller).await?;

        match request.order {
            Some(Some(order)) if order < 0 => {
                return Err(AppError::ValidationError(
                    "order must not be negative".to_string(),
                ));
            }
            Some(Some(order)) => {
                if self
                    .section_order_taken(&section.course_offering_id, order, Some(&section.id))
                    .await?
                {
                    return Err(AppError::UnprocessableState(format!(
                        "A section with order {} already exists in this course offering",
                        order
                    )));
                }
                section.order = order;
            }
            Some(None) => {
                let others_max = self
                    .section_repository
                    .list_by_offering(&section.course_offering_id)
                    .await?
                    .into_iter()
                    .filter(|s| s.id != section.id)
                    .map(|s| s.order)
                    .max();
                section.order = others_max.unwrap_or(0) + 1;
            }
            None => {}
        }
        if let Some(title) = request.title {
            section.title = title;
        }

        let order = section.order;
        let updated = self
            .section_repository
            .update(section)
            .await
            .map_err(|e| match e {
                AppError::AlreadyExists(_) => AppError::UnprocessableState(format!(
                    "A section with order {} already exists in this course offering",
                    order
                )),
                other => other,
            })?;

        log::info!("Updated section {} (order {})", updated.id, updated.order);
        Ok(updated)
    }

    /// Deletes a section with its assignments, quizzes and materials, including the
    /// submissions, attempts and stored files that belong to them.
    pub async fn delete_section(
        &self,
        section_id: &str,
        caller: &Caller,
    ) -> AppResult<RemovedContent> {
        let section = self.authorized_section(section_id, caller).await?;

        let removed = self
            .cleanup
            .remove_section_content(&[section.id.clone()])
            .await?;
        self.section_repository.delete(&section.id).await?;

        log::info!(
            "Deleted section {} with {} assignments, {} quizzes, {} materials",
            section.id,
            removed.assignments,
            removed.quizzes,
            removed.materials
        );
        Ok(removed)
    }

    pub async fn list_assignments(
        &self,
        section_id: &str,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<AssignmentView>> {
        let section = self.authorized_section(section_id, caller).await?;
        let assignments = self.assignment_repository.list_by_section(&section.id).await?;
        Ok(assignments
            .into_iter()
            .map(|assignment| AssignmentView {
                deadline_status: deadline_status(assignment.deadline, assignment.allow_late, now),
                assignment,
            })
            .collect())
    }

    pub async fn create_assignment(
        &self,
        section_id: &str,
        caller: &Caller,
        request: CreateAssignmentRequest,
        now: DateTime<Utc>,
    ) -> AppResult<AssignmentView> {
        request.validate()?;
        let section = self.authorized_section(section_id, caller).await?;

        let mut assignment = Assignment::new(&section.id, &request.title, request.kind);
        assignment.description = request.description;
        assignment.instructions = request.instructions;
        assignment.deadline = request.deadline;
        assignment.max_score = request.max_score.unwrap_or(DEFAULT_MAX_SCORE);
        assignment.allow_late = request.allow_late.unwrap_or(false);
        assignment.created_at = Some(now);

        let created = self.assignment_repository.create(assignment).await?;
        log::info!("Created assignment {} in section {}", created.id, section.id);

        Ok(AssignmentView {
            deadline_status: deadline_status(created.deadline, created.allow_late, now),
            assignment: created,
        })
    }

    pub async fn get_assignment(
        &self,
        assignment_id: &str,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> AppResult<AssignmentView> {
        let assignment = self.authorized_assignment(assignment_id, caller).await?;

        Ok(AssignmentView {
            deadline_status: deadline_status(assignment.deadline, assignment.allow_late, now),
            assignment,
        })
    }

    /// Partial edit. Submissions already made are kept as they are.
    pub async fn update_assignment(
        &self,
        assignment_id: &str,
        caller: &Caller,
        request: UpdateAssignmentRequest,
        now: DateTime<Utc>,
    ) -> AppResult<AssignmentView> {
        request.validate()?;
        if let Some(Some(max_score)) = request.max_score {
            if max_score < 1 {
                return Err(AppError::ValidationError(
                    "max_score must be at least 1".to_string(),
                ));
            }
        }
        let mut assignment = self.authorized_assignment(assignment_id, caller).await?;

        if let Some(title) = request.title {
            assignment.title = title;
        }
        if let Some(kind) = request.kind {
            assignment.kind = kind;
        }
        if let Some(description) = request.description {
            assignment.description = description;
        }
        if let Some(instructions) = request.instructions {
            assignment.instructions = instructions;
        }
        if let Some(deadline) = request.deadline {
            assignment.deadline = deadline;
        }
        if let Some(max_score) = request.max_score {
            assignment.max_score = max_score.unwrap_or(DEFAULT_MAX_SCORE);
        }
        if let Some(allow_late) = request.allow_late {
            assignment.allow_late = allow_late.unwrap_or(false);
        }

        let updated = self.assignment_repository.update(assignment).await?;
        log::info!("Updated assignment {}", updated.id);

        Ok(AssignmentView {
            deadline_status: deadline_status(updated.deadline, updated.allow_late, now),
            assignment: updated,
        })
    }

    /// Deletes an assignment with its submissions and their stored files.
    pub async fn delete_assignment(&self, assignment_id: &str, caller: &Caller) -> AppResult<u64> {
        let assignment = self.authorized_assignment(assignment_id, caller).await?;
        let submissions = self.cleanup.remove_assignment(&assignment).await?;
        log::info!(
            "Deleted assignment {} with {} submissions",
            assignment.id,
            submissions
        );
        Ok(submissions)
    }

    pub async fn list_quizzes(
        &self,
        section_id: &str,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<QuizView>> {
        let section = self.authorized_section(section_id, caller).await?;
        let quizzes = self.quiz_repository.list_by_section(&section.id).await?;
        Ok(quizzes
            .into_iter()
            .map(|quiz| QuizView {
                time_status: window_status(quiz.start_time, quiz.end_time, now),
                quiz,
            })
            .collect())
    }

    pub async fn create_quiz(
        &self,
        section_id: &str,
        caller: &Caller,
        request: CreateQuizRequest,
        now: DateTime<Utc>,
    ) -> AppResult<QuizView> {
        request.validate()?;
        check_window(request.start_time, request.end_time)?;
        let questions = parse_questions(request.questions)?;

        let section = self.authorized_section(section_id, caller).await?;

        let mut quiz = Quiz::new(&section.id, &request.title, questions);
        quiz.description = request.description;
        quiz.start_time = request.start_time;
        quiz.end_time = request.end_time;
        quiz.duration_minutes = request.duration_minutes;
        quiz.max_score = Some(request.max_score.unwrap_or(DEFAULT_QUIZ_MAX_SCORE));
        quiz.created_at = Some(now);

        let created = self.quiz_repository.create(quiz).await?;
        log::info!(
            "Created quiz {} with {} questions in section {}",
            created.id,
            created.questions.len(),
            section.id
        );

        Ok(QuizView {
            time_status: window_status(created.start_time, created.end_time, now),
            quiz: created,
        })
    }

    pub async fn get_quiz(
        &self,
        quiz_id: &str,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> AppResult<QuizView> {
        let quiz = self.authorized_quiz(quiz_id, caller).await?;

        Ok(QuizView {
            time_status: window_status(quiz.start_time, quiz.end_time, now),
            quiz,
        })
    }

    /// Partial edit. The window is checked on the merged start and end; `questions`, when
    /// sent, replaces the list. Finished attempts keep the score they were given.
    pub async fn update_quiz(
        &self,
        quiz_id: &str,
        caller: &Caller,
        request: UpdateQuizRequest,
        now: DateTime<Utc>,
    ) -> AppResult<QuizView> {
        request.validate()?;
        if let Some(Some(minutes)) = request.duration_minutes {
            if !(1..=MAX_QUIZ_DURATION_MINUTES).contains(&minutes) {
                return Err(AppError::ValidationError(format!(
                    "duration_minutes must be between 1 and {}",
                    MAX_QUIZ_DURATION_MINUTES
                )));
            }
        }
        if let Some(Some(max_score)) = request.max_score {
            if max_score < 1 {
                return Err(AppError::ValidationError(
                    "max_score must be at least 1".to_string(),
                ));
            }
        }
        let questions = request.questions.map(parse_questions).transpose()?;

        let mut quiz = self.authorized_quiz(quiz_id, caller).await?;

        let start_time = request.start_time.unwrap_or(quiz.start_time);
        let end_time = request.end_time.unwrap_or(quiz.end_time);
        check_window(start_time, end_time)?;

        if let Some(title) = request.title {
            quiz.title = title;
        }
        if let Some(description) = request.description {
            quiz.description = description;
        }
        quiz.start_time = start_time;
        quiz.end_time = end_time;
        if let Some(duration_minutes) = request.duration_minutes {
            quiz.duration_minutes = duration_minutes;
        }
        if let Some(max_score) = request.max_score {
            quiz.max_score = Some(max_score.unwrap_or(DEFAULT_QUIZ_MAX_SCORE));
        }
        if let Some(questions) = questions {
            quiz.questions = questions;
        }

        let updated = self.quiz_repository.update(quiz).await?;
        log::info!(
            "Updated quiz {} ({} questions)",
            updated.id,
            updated.questions.len()
        );

        Ok(QuizView {
            time_status: window_status(updated.start_time, updated.end_time, now),
            quiz: updated,
        })
    }

    /// Deletes a quiz with all of its attempts.
    pub async fn delete_quiz(&self, quiz_id: &str, caller: &Caller) -> AppResult<u64> {
        let quiz = self.authorized_quiz(quiz_id, caller).await?;
        let attempts = self.cleanup.remove_quiz(&quiz).await?;
        log::info!("Deleted quiz {} with {} attempts", quiz.id, attempts);
        Ok(attempts)
    }

    pub async fn list_materials(
        &self,
        section_id: &str,
        caller: &Caller,
    ) -> AppResult<Vec<Material>> {
        let section = self.authorized_section(section_id, caller).await?;
        self.material_repository.list_by_section(&section.id).await
    }

    /// Creates a file or link material. A file material needs an uploaded file, a link
    /// material needs a url.
    pub async fn create_material(
        &self,
        section_id: &str,
        caller: &Caller,
        input: MaterialInput,
        now: DateTime<Utc>,
    ) -> AppResult<Material> {
        let title = input
            .title
            .ok_or_else(|| AppError::ValidationError("title is required".to_string()))?;
        check_title(&title)?;
        let kind = input
            .kind
            .ok_or_else(|| AppError::ValidationError("type must be file or link".to_string()))?;
        check_subject(&input.subject)?;
        if let Some(url) = &input.url {
            validate_link(url)?;
        }

        let section = self.authorized_section(section_id, caller).await?;

        let mut material = Material::new(&section.id, &title, kind);
        material.description = input.description.flatten();
        material.subject = input.subject.flatten();
        material.created_at = Some(now);
        material.modified_at = Some(now);

        match kind {
            MaterialKind::File => {
                let file = input.file.ok_or_else(|| {
                    AppError::UnprocessableState(
                        "A file must be uploaded for a file material".to_string(),
                    )
                })?;
                self.check_upload(&file)?;
                let dir = format!(
                    "materials/{}/section-{}",
                    section.course_offering_id, section.id
                );
                material.file_path =
                    Some(self.storage.store(&dir, &file.filename, &file.bytes).await?);
            }
            MaterialKind::Link => {
                let url = input.url.ok_or_else(|| {
                    AppError::UnprocessableState("A url is required for a link material".to_string())
                })?;
                material.url = Some(url);
            }
        }

        let new_file = material.file_path.clone();
        let created = match self.material_repository.create(material).await {
            Ok(created) => created,
            Err(e) => {
                if let Some(path) = &new_file {
                    delete_quietly(self.storage.as_ref(), path).await;
                }
                return Err(e);
            }
        };

        log::info!(
            "Created {:?} material {} in section {}",
            created.kind,
            created.id,
            section.id
        );
        Ok(created)
    }

    pub async fn get_material(&self, material_id: &str, caller: &Caller) -> AppResult<Material> {
        self.authorized_material(material_id, caller).await
    }

    /// Partial edit. Switching to a link drops the stored file; uploading a new file replaces
    /// the old one, which is removed once the row is saved.
    pub async fn update_material(
        &self,
        material_id: &str,
        caller: &Caller,
        input: MaterialInput,
        now: DateTime<Utc>,
    ) -> AppResult<Material> {
        if let Some(title) = &input.title {
            check_title(title)?;
        }
        check_subject(&input.subject)?;
        if let Some(url) = &input.url {
            validate_link(url)?;
        }

        let mut material = self.authorized_material(material_id, caller).await?;
        let previous_file = material.file_path.clone();

        if let Some(title) = input.title {
            material.title = title;
        }
        if let Some(description) = input.description {
            material.description = description;
        }
        if let Some(subject) = input.subject {
            material.subject = subject;
        }

        let kind = input.kind.unwrap_or(material.kind);
        let mut new_file = None;
        match kind {
            MaterialKind::File => {
                if let Some(file) = input.file {
                    self.check_upload(&file)?;
                    let (section, _) = self.contexts.for_section_id(&material.section_id).await?;
                    let dir = format!(
                        "materials/{}/section-{}",
                        section.course_offering_id, section.id
                    );
                    let path = self.storage.store(&dir, &file.filename, &file.bytes).await?;
                    new_file = Some(path.clone());
                    material.file_path = Some(path);
                } else if material.file_path.is_none() {
                    return Err(AppError::UnprocessableState(
                        "A file must be uploaded for a file material".to_string(),
                    ));
                }
                material.url = None;
            }
            MaterialKind::Link => {
                let url = input.url.or_else(|| material.url.clone()).ok_or_else(|| {
                    AppError::UnprocessableState("A url is required for a link material".to_string())
                })?;
                material.url = Some(url);
                material.file_path = None;
            }
        }
        material.kind = kind;
        material.modified_at = Some(now);

        let updated = match self.material_repository.update(material).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Some(path) = &new_file {
                    delete_quietly(self.storage.as_ref(), path).await;
                }
                return Err(e);
            }
        };

        if let Some(old) = previous_file {
            if updated.file_path.as_deref() != Some(old.as_str()) {
                delete_quietly(self.storage.as_ref(), &old).await;
            }
        }

        log::info!("Updated material {}", updated.id);
        Ok(updated)
    }

    pub async fn delete_material(&self, material_id: &str, caller: &Caller) -> AppResult<()> {
        let material = self.authorized_material(material_id, caller).await?;
        self.cleanup.remove_material(&material).await?;
        log::info!("Deleted material {}", material.id);
        Ok(())
    }

    /// Download link of a file material, for the admin, the instructor or an actively
    /// enrolled student.
    pub async fn material_file_url(
        &self,
        material_id: &str,
        caller: &Caller,
    ) -> AppResult<MaterialFileUrlDto> {
        let (material, context) = self.load_material(material_id).await?;
        if caller.role == UserRole::Student {
            self.enrollment_guard
                .require_active(&context.course_offering_id, &caller.id)
                .await?;
        } else {
            require_admin_or_instructor(caller, &context)?;
        }

        let path = match (material.kind, &material.file_path) {
            (MaterialKind::File, Some(path)) => path,
            _ => {
                return Err(AppError::UnprocessableState(
                    "This material has no stored file".to_string(),
                ))
            }
        };
        if !self.storage.exists(path).await? {
            return Err(AppError::NotFound(
                "The material's file is missing from storage".to_string(),
            ));
        }

        Ok(MaterialFileUrlDto {
            material_id: material.id.clone(),
            download_url: self.storage.url_for(path),
        })
    }
}
