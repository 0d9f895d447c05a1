use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::{
    models::domain::{
        Assignment, AssignmentSubmission, CourseOffering, Enrollment, EnrollmentStatus,
        OfferingStatus, Quiz, QuizAttempt, User, UserRole, UserStatus,
    },
    services::time_window::{DeadlineStatus, WindowStatus},
};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub student_number: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            student_number: user.student_number,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

/// Compact view of a user embedded in other responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonSummaryDto {
    pub id: String,
    pub name: String,
    pub username: String,
    pub student_number: Option<String>,
}

impl From<&User> for PersonSummaryDto {
    fn from(user: &User) -> Self {
        PersonSummaryDto {
            id: user.id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            student_number: user.student_number.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseOfferingDto {
    pub id: String,
    pub template_id: String,
    pub class_name: String,
    pub term: String,
    pub status: OfferingStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub instructor: Option<PersonSummaryDto>,
    pub active_student_count: Option<u64>,
}

impl CourseOfferingDto {
    pub fn from_offering(offering: CourseOffering, instructor: Option<&User>) -> Self {
        CourseOfferingDto {
            id: offering.id,
            template_id: offering.template_id,
            class_name: offering.class_name,
            term: offering.term,
            status: offering.status,
            start_date: offering.start_date,
            end_date: offering.end_date,
            notes: offering.notes,
            instructor: instructor.map(PersonSummaryDto::from),
            active_student_count: None,
        }
    }

    pub fn with_student_count(mut self, count: u64) -> Self {
        self.active_student_count = Some(count);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentDto {
    pub id: String,
    pub course_offering_id: String,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub dropped_at: Option<DateTime<Utc>>,
    pub student: Option<PersonSummaryDto>,
}

impl EnrollmentDto {
    pub fn from_enrollment(enrollment: Enrollment, student: Option<&User>) -> Self {
        EnrollmentDto {
            id: enrollment.id,
            course_offering_id: enrollment.course_offering_id,
            status: enrollment.status,
            enrolled_at: enrollment.enrolled_at,
            dropped_at: enrollment.dropped_at,
            student: student.map(PersonSummaryDto::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentView {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub deadline_status: DeadlineStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizView {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub time_status: WindowStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptStartedDto {
    pub attempt_id: String,
    pub quiz_id: String,
    pub student_id: String,
    pub attempt_number: i32,
    pub started_at: DateTime<Utc>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub resumed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptResultDto {
    pub attempt_id: String,
    pub quiz_id: String,
    pub student_id: String,
    pub attempt_number: i32,
    pub score: Option<i32>,
    pub max_score: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl AttemptResultDto {
    pub fn from_attempt(attempt: QuizAttempt, max_score: Option<i32>) -> Self {
        AttemptResultDto {
            attempt_id: attempt.id,
            quiz_id: attempt.quiz_id,
            student_id: attempt.student_id,
            attempt_number: attempt.attempt_number,
            score: attempt.score,
            max_score,
            started_at: attempt.started_at,
            finished_at: attempt.finished_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptSummaryDto {
    pub id: String,
    pub attempt_number: i32,
    pub score: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<PersonSummaryDto>,
}

impl From<QuizAttempt> for AttemptSummaryDto {
    fn from(attempt: QuizAttempt) -> Self {
        AttemptSummaryDto {
            id: attempt.id,
            attempt_number: attempt.attempt_number,
            score: attempt.score,
            started_at: attempt.started_at,
            finished_at: attempt.finished_at,
            student: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizSummaryDto {
    pub id: String,
    pub title: String,
    pub max_score: Option<i32>,
}

impl From<&Quiz> for QuizSummaryDto {
    fn from(quiz: &Quiz) -> Self {
        QuizSummaryDto {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            max_score: quiz.max_score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizAttemptsDto {
    pub quiz: QuizSummaryDto,
    pub attempts: Vec<AttemptSummaryDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionDto {
    pub id: String,
    pub assignment_id: String,
    pub student_id: String,
    pub file_path: Option<String>,
    pub file_url: Option<String>,
    pub url: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub is_late: bool,
    pub score: Option<i32>,
    pub feedback: Option<String>,
    pub graded_by: Option<String>,
    pub graded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<PersonSummaryDto>,
}

impl SubmissionDto {
    pub fn new(submission: AssignmentSubmission, is_late: bool, file_url: Option<String>) -> Self {
        SubmissionDto {
            id: submission.id,
            assignment_id: submission.assignment_id,
            student_id: submission.student_id,
            file_path: submission.file_path,
            file_url,
            url: submission.url,
            submitted_at: submission.submitted_at,
            is_late,
            score: submission.score,
            feedback: submission.feedback,
            graded_by: submission.graded_by,
            graded_at: submission.graded_at,
            student: None,
        }
    }

    pub fn with_student(mut self, student: Option<&User>) -> Self {
        self.student = student.map(PersonSummaryDto::from);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialFileUrlDto {
    pub material_id: String,
    pub download_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceiptDto {
    pub created: bool,
    pub submission: SubmissionDto,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentSubmissionsDto {
    pub assignment: Assignment,
    pub submissions: Vec<SubmissionDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentGradeRow {
    pub id: String,
    pub title: String,
    pub max_score: i32,
    pub score: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizGradeRow {
    pub id: String,
    pub title: String,
    pub max_score: Option<i32>,
    pub best_score: Option<i32>,
    pub attempt_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentGradesDto {
    pub student: PersonSummaryDto,
    pub assignments: Vec<AssignmentGradeRow>,
    pub quizzes: Vec<QuizGradeRow>,
    pub total_assignment_score: i64,
    pub total_quiz_score: i64,
    pub total_score: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseSummaryDto {
    pub id: String,
    pub class_name: String,
    pub term: String,
    pub status: OfferingStatus,
}

impl From<&CourseOffering> for CourseSummaryDto {
    fn from(offering: &CourseOffering) -> Self {
        CourseSummaryDto {
            id: offering.id.clone(),
            class_name: offering.class_name.clone(),
            term: offering.term.clone(),
            status: offering.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseGradesDto {
    pub course: CourseSummaryDto,
    pub students: Vec<StudentGradesDto>,
}
