use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    auth::Caller,
    errors::{AppError, AppResult},
    models::{
        domain::{CourseOffering, Enrollment, OfferingStatus, User, UserRole},
        dto::{
            request::{
                AddStudentRequest, CreateCourseOfferingRequest, OfferingFilter,
                UpdateCourseOfferingRequest,
            },
            response::{CourseOfferingDto, EnrollmentDto},
        },
    },
    repositories::{
        CourseOfferingRepository, EnrollmentRepository, SectionRepository, UserRepository,
    },
    services::content_cleanup::ContentCleanup,
};

/// Outcome of an enrollment change, so callers can word their response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentChange {
    Created,
    Reactivated,
    Dropped,
    AlreadyDropped,
}

impl EnrollmentChange {
    pub fn message(&self) -> &'static str {
        match self {
            EnrollmentChange::Created => "Student enrolled",
            EnrollmentChange::Reactivated => "Student re-enrolled",
            EnrollmentChange::Dropped => "Student dropped",
            EnrollmentChange::AlreadyDropped => "Student was already dropped",
        }
    }
}

pub struct CourseService {
    offering_repository: Arc<dyn CourseOfferingRepository>,
    enrollment_repository: Arc<dyn EnrollmentRepository>,
    section_repository: Arc<dyn SectionRepository>,
    user_repository: Arc<dyn UserRepository>,
    cleanup: Arc<ContentCleanup>,
}

impl CourseService {
    pub fn new(
        offering_repository: Arc<dyn CourseOfferingRepository>,
        enrollment_repository: Arc<dyn EnrollmentRepository>,
        section_repository: Arc<dyn SectionRepository>,
        user_repository: Arc<dyn UserRepository>,
        cleanup: Arc<ContentCleanup>,
    ) -> Self {
        Self {
            offering_repository,
            enrollment_repository,
            section_repository,
            user_repository,
            cleanup,
        }
    }

    async fn find_teacher(&self, user_id: &str) -> AppResult<User> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .filter(|u| u.role == UserRole::Teacher)
            .ok_or_else(|| {
                AppError::UnprocessableState(
                    "The selected instructor is not a teacher".to_string(),
                )
            })
    }

    async fn load_offering(&self, id: &str) -> AppResult<CourseOffering> {
        self.offering_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course offering with id '{}' not found", id)))
    }

    async fn to_dto(&self, offering: CourseOffering) -> AppResult<CourseOfferingDto> {
        let instructor = match &offering.instructor_id {
            Some(id) => self.user_repository.find_by_id(id).await?,
            None => None,
        };
        let count = self.enrollment_repository.count_active(&offering.id).await?;
        Ok(CourseOfferingDto::from_offering(offering, instructor.as_ref()).with_student_count(count))
    }

    async fn to_dtos(&self, offerings: Vec<CourseOffering>) -> AppResult<Vec<CourseOfferingDto>> {
        let mut dtos = Vec::with_capacity(offerings.len());
        for offering in offerings {
            dtos.push(self.to_dto(offering).await?);
        }
        Ok(dtos)
    }

    pub async fn create_offering(
        &self,
        request: CreateCourseOfferingRequest,
        now: DateTime<Utc>,
    ) -> AppResult<CourseOfferingDto> {
        request.validate()?;

        if let (Some(start), Some(end)) = (request.start_date, request.end_date) {
            if end < start {
                return Err(AppError::ValidationError(
                    "end_date must be on or after start_date".to_string(),
                ));
            }
        }

        let instructor = self.find_teacher(&request.instructor_id).await?;

        let mut offering = CourseOffering::new_draft(
            &request.template_id,
            &request.class_name,
            &request.term,
            &instructor.id,
        );
        offering.start_date = request.start_date;
        offering.end_date = request.end_date;
        offering.notes = request.notes;
        offering.created_at = Some(now);
        offering.modified_at = Some(now);

        let created = self.offering_repository.create(offering).await?;
        log::info!(
            "Created course offering {} ({} {}) taught by {}",
            created.id,
            created.class_name,
            created.term,
            instructor.id
        );

        Ok(CourseOfferingDto::from_offering(created, Some(&instructor)).with_student_count(0))
    }

    /// Admin edit of an offering's details. Only the fields present in the request change;
    /// the status is never touched here.
    pub async fn update_offering(
        &self,
        id: &str,
        request: UpdateCourseOfferingRequest,
        now: DateTime<Utc>,
    ) -> AppResult<CourseOfferingDto> {
        request.validate()?;
        if let Some(Some(notes)) = &request.notes {
            if notes.chars().count() > 2000 {
                return Err(AppError::ValidationError(
                    "notes must be at most 2000 characters".to_string(),
                ));
            }
        }

        let mut offering = self.load_offering(id).await?;

        let start_date = request.start_date.unwrap_or(offering.start_date);
        let end_date = request.end_date.unwrap_or(offering.end_date);
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                return Err(AppError::ValidationError(
                    "end_date must be on or after start_date".to_string(),
                ));
            }
        }

        if let Some(instructor_id) = &request.instructor_id {
            let instructor = self.find_teacher(instructor_id).await?;
            offering.instructor_id = Some(instructor.id);
        }
        if let Some(template_id) = request.template_id {
            offering.template_id = template_id;
        }
        if let Some(class_name) = request.class_name {
            offering.class_name = class_name;
        }
        if let Some(term) = request.term {
            offering.term = term;
        }
        if let Some(notes) = request.notes {
            offering.notes = notes;
        }
        offering.start_date = start_date;
        offering.end_date = end_date;
        offering.modified_at = Some(now);

        let updated = self.offering_repository.update(offering).await?;
        log::info!(
            "Updated course offering {} ({} {})",
            updated.id,
            updated.class_name,
            updated.term
        );
        self.to_dto(updated).await
    }

    pub async fn list_offerings(&self, filter: &OfferingFilter) -> AppResult<Vec<CourseOfferingDto>> {
        let offerings = self.offering_repository.list(filter).await?;
        self.to_dtos(offerings).await
    }

    pub async fn get_offering(&self, id: &str) -> AppResult<CourseOfferingDto> {
        let offering = self.load_offering(id).await?;
        self.to_dto(offering).await
    }

    /// Admin status change; any of the three statuses may be set.
    pub async fn set_status(
        &self,
        id: &str,
        status: OfferingStatus,
        now: DateTime<Utc>,
    ) -> AppResult<CourseOfferingDto> {
        let updated = self
            .offering_repository
            .update_status(id, status, now)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course offering with id '{}' not found", id)))?;

        log::info!("Course offering {} is now {}", updated.id, status.as_str());
        self.to_dto(updated).await
    }

    /// Deletes an offering and everything hanging off it. Stored files are removed once their
    /// rows are gone, best-effort.
    pub async fn delete_offering(&self, id: &str) -> AppResult<()> {
        let offering = self.load_offering(id).await?;

        let section_ids: Vec<String> = self
            .section_repository
            .list_by_offering(&offering.id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();

        let removed = self.cleanup.remove_section_content(&section_ids).await?;
        self.section_repository.delete_by_offering(&offering.id).await?;
        let enrollments = self
            .enrollment_repository
            .delete_by_offering(&offering.id)
            .await?;
        self.offering_repository.delete(&offering.id).await?;

        log::info!(
            "Deleted course offering {} with {} sections, {} submissions, {} attempts, {} materials, {} enrollments",
            offering.id,
            section_ids.len(),
            removed.submissions,
            removed.attempts,
            removed.materials,
            enrollments
        );
        Ok(())
    }

    /// All enrollments of an offering, dropped ones included.
    pub async fn list_enrollments(&self, course_offering_id: &str) -> AppResult<Vec<EnrollmentDto>> {
        let offering = self.load_offering(course_offering_id).await?;
        let enrollments = self.enrollment_repository.list_by_offering(&offering.id).await?;

        let student_ids: Vec<String> = enrollments.iter().map(|e| e.student_id.clone()).collect();
        let students: HashMap<String, User> = self
            .user_repository
            .find_by_ids(&student_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let mut rows: Vec<EnrollmentDto> = enrollments
            .into_iter()
            .map(|e| {
                let student = students.get(&e.student_id);
                EnrollmentDto::from_enrollment(e, student)
            })
            .collect();
        rows.sort_by(|a, b| {
            let name = |row: &EnrollmentDto| row.student.as_ref().map(|s| s.name.clone());
            name(a).cmp(&name(b))
        });
        Ok(rows)
    }

    async fn find_student(&self, request: &AddStudentRequest) -> AppResult<User> {
        let user = match (&request.student_id, &request.identifier) {
            (Some(id), _) => self.user_repository.find_by_id(id).await?,
            (None, Some(identifier)) => {
                self.user_repository.find_by_identifier(identifier).await?
            }
            (None, None) => {
                return Err(AppError::ValidationError(
                    "Either student_id or identifier is required".to_string(),
                ))
            }
        };

        user.filter(|u| u.role == UserRole::Student)
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))
    }

    /// Enrolls a student, reactivating a dropped enrollment instead of adding a second row.
    pub async fn add_student(
        &self,
        course_offering_id: &str,
        request: AddStudentRequest,
        now: DateTime<Utc>,
    ) -> AppResult<(EnrollmentDto, EnrollmentChange)> {
        request.validate()?;
        let offering = self.load_offering(course_offering_id).await?;
        let student = self.find_student(&request).await?;

        let existing = self
            .enrollment_repository
            .find(&offering.id, &student.id)
            .await?;

        let (enrollment, change) = match existing {
            Some(enrollment) if enrollment.is_active() => {
                return Err(AppError::UnprocessableState(
                    "Student is already actively enrolled in this course offering".to_string(),
                ));
            }
            Some(mut enrollment) => {
                enrollment.reactivate(now);
                let updated = self.enrollment_repository.update(enrollment).await?;
                (updated, EnrollmentChange::Reactivated)
            }
            None => {
                let enrollment = Enrollment::new_active(&offering.id, &student.id, now);
                let created = self
                    .enrollment_repository
                    .create(enrollment)
                    .await
                    .map_err(|e| match e {
                        AppError::AlreadyExists(_) => AppError::UnprocessableState(
                            "Student is already enrolled in this course offering".to_string(),
                        ),
                        other => other,
                    })?;
                (created, EnrollmentChange::Created)
            }
        };

        log::info!(
            "Student {} enrolled in course offering {} ({:?})",
            student.id,
            offering.id,
            change
        );
        Ok((EnrollmentDto::from_enrollment(enrollment, Some(&student)), change))
    }

    pub async fn drop_student(
        &self,
        course_offering_id: &str,
        student_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<(EnrollmentDto, EnrollmentChange)> {
        let offering = self.load_offering(course_offering_id).await?;
        let mut enrollment = self
            .enrollment_repository
            .find(&offering.id, student_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Student is not enrolled in this course offering".to_string())
            })?;
        let student = self.user_repository.find_by_id(student_id).await?;

        if !enrollment.is_active() {
            return Ok((
                EnrollmentDto::from_enrollment(enrollment, student.as_ref()),
                EnrollmentChange::AlreadyDropped,
            ));
        }

        enrollment.drop_out(now);
        let updated = self.enrollment_repository.update(enrollment).await?;
        log::info!(
            "Student {} dropped from course offering {}",
            student_id,
            offering.id
        );

        Ok((
            EnrollmentDto::from_enrollment(updated, student.as_ref()),
            EnrollmentChange::Dropped,
        ))
    }

    pub async fn list_teaching(
        &self,
        caller: &Caller,
        status: Option<OfferingStatus>,
    ) -> AppResult<Vec<CourseOfferingDto>> {
        let offerings = self
            .offering_repository
            .list_by_instructor(&caller.id, status)
            .await?;
        self.to_dtos(offerings).await
    }

    /// Instructor status change, limited to moving between draft and active.
    pub async fn set_status_as_instructor(
        &self,
        id: &str,
        caller: &Caller,
        status: OfferingStatus,
        now: DateTime<Utc>,
    ) -> AppResult<CourseOfferingDto> {
        if status == OfferingStatus::Finished {
            return Err(AppError::ValidationError(
                "Instructors may only set status to draft or active".to_string(),
            ));
        }

        let offering = self
            .offering_repository
            .find_by_id(id)
            .await?
            .filter(|o| o.is_taught_by(&caller.id))
            .ok_or_else(|| AppError::NotFound(format!("Course offering with id '{}' not found", id)))?;

        if offering.status == OfferingStatus::Finished {
            return Err(AppError::UnprocessableState(
                "A finished course offering can no longer be changed".to_string(),
            ));
        }

        if offering.status == status {
            return self.to_dto(offering).await;
        }

        self.set_status(&offering.id, status, now).await
    }
}
