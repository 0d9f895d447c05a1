use std::{collections::HashMap, sync::Arc};

use crate::{
    auth::{require_instructor, Caller},
    errors::{AppError, AppResult},
    models::{
        domain::{Assignment, AssignmentSubmission, CourseOffering, Quiz, QuizAttempt, User},
        dto::response::{
            AssignmentGradeRow, CourseGradesDto, CourseSummaryDto, PersonSummaryDto,
            QuizGradeRow, StudentGradesDto,
        },
    },
    repositories::{
        AssignmentRepository, CourseOfferingRepository, EnrollmentRepository,
        QuizAttemptRepository, QuizRepository, SectionRepository, SubmissionRepository,
        UserRepository,
    },
    services::{
        course_context::CourseContext, enrollment_guard::EnrollmentGuard,
        quiz_attempt_service::best_score,
    },
};

/// Everything the aggregation reads for one offering.
#[derive(Debug, Default)]
pub struct GradeInputs {
    pub assignments: Vec<Assignment>,
    pub quizzes: Vec<Quiz>,
    pub submissions: Vec<AssignmentSubmission>,
    pub attempts: Vec<QuizAttempt>,
}

/// Builds one grade row per student. Missing scores are reported as `None` and count as 0.
pub fn build_report(students: &[User], inputs: &GradeInputs) -> Vec<StudentGradesDto> {
    let submission_scores: HashMap<(&str, &str), Option<i32>> = inputs
        .submissions
        .iter()
        .map(|s| ((s.assignment_id.as_str(), s.student_id.as_str()), s.score))
        .collect();

    let mut attempts_by_key: HashMap<(&str, &str), Vec<QuizAttempt>> = HashMap::new();
    for attempt in &inputs.attempts {
        attempts_by_key
            .entry((attempt.quiz_id.as_str(), attempt.student_id.as_str()))
            .or_default()
            .push(attempt.clone());
    }

    students
        .iter()
        .map(|student| {
            let assignments: Vec<AssignmentGradeRow> = inputs
                .assignments
                .iter()
                .map(|assignment| AssignmentGradeRow {
                    id: assignment.id.clone(),
                    title: assignment.title.clone(),
                    max_score: assignment.max_score,
                    score: submission_scores
                        .get(&(assignment.id.as_str(), student.id.as_str()))
                        .copied()
                        .flatten(),
                })
                .collect();

            let quizzes: Vec<QuizGradeRow> = inputs
                .quizzes
                .iter()
                .map(|quiz| {
                    let attempts = attempts_by_key
                        .get(&(quiz.id.as_str(), student.id.as_str()))
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    QuizGradeRow {
                        id: quiz.id.clone(),
                        title: quiz.title.clone(),
                        max_score: quiz.max_score,
                        best_score: best_score(attempts),
                        attempt_count: attempts.len(),
                    }
                })
                .collect();

            let total_assignment_score: i64 = assignments
                .iter()
                .map(|row| i64::from(row.score.unwrap_or(0)))
                .sum();
            let total_quiz_score: i64 = quizzes
                .iter()
                .map(|row| i64::from(row.best_score.unwrap_or(0)))
                .sum();

            StudentGradesDto {
                student: PersonSummaryDto::from(student),
                assignments,
                quizzes,
                total_assignment_score,
                total_quiz_score,
                total_score: total_assignment_score + total_quiz_score,
            }
        })
        .collect()
}

pub struct GradeService {
    offering_repository: Arc<dyn CourseOfferingRepository>,
    enrollment_repository: Arc<dyn EnrollmentRepository>,
    section_repository: Arc<dyn SectionRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    quiz_repository: Arc<dyn QuizRepository>,
    submission_repository: Arc<dyn SubmissionRepository>,
    attempt_repository: Arc<dyn QuizAttemptRepository>,
    user_repository: Arc<dyn UserRepository>,
    enrollment_guard: Arc<EnrollmentGuard>,
}

impl GradeService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        offering_repository: Arc<dyn CourseOfferingRepository>,
        enrollment_repository: Arc<dyn EnrollmentRepository>,
        section_repository: Arc<dyn SectionRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
        quiz_repository: Arc<dyn QuizRepository>,
        submission_repository: Arc<dyn SubmissionRepository>,
        attempt_repository: Arc<dyn QuizAttemptRepository>,
        user_repository: Arc<dyn UserRepository>,
        enrollment_guard: Arc<EnrollmentGuard>,
    ) -> Self {
        Self {
            offering_repository,
            enrollment_repository,
            section_repository,
            assignment_repository,
            quiz_repository,
            submission_repository,
            attempt_repository,
            user_repository,
            enrollment_guard,
        }
    }

    async fn load_offering(&self, course_offering_id: &str) -> AppResult<CourseOffering> {
        self.offering_repository
            .find_by_id(course_offering_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Course offering with id '{}' not found",
                    course_offering_id
                ))
            })
    }

    /// Loads every assignment and quiz of the offering in section order.
    async fn load_inputs(&self, course_offering_id: &str) -> AppResult<GradeInputs> {
        let sections = self
            .section_repository
            .list_by_offering(course_offering_id)
            .await?;
        let section_rank: HashMap<&str, usize> = sections
            .iter()
            .enumerate()
            .map(|(rank, s)| (s.id.as_str(), rank))
            .collect();
        let section_ids: Vec<String> = sections.iter().map(|s| s.id.clone()).collect();

        let mut assignments = self
            .assignment_repository
            .list_by_sections(&section_ids)
            .await?;
        assignments.sort_by_key(|a| {
            (
                section_rank.get(a.section_id.as_str()).copied(),
                a.created_at,
            )
        });

        let mut quizzes = self.quiz_repository.list_by_sections(&section_ids).await?;
        quizzes.sort_by_key(|q| {
            (
                section_rank.get(q.section_id.as_str()).copied(),
                q.created_at,
            )
        });

        let assignment_ids: Vec<String> = assignments.iter().map(|a| a.id.clone()).collect();
        let quiz_ids: Vec<String> = quizzes.iter().map(|q| q.id.clone()).collect();

        let submissions = self
            .submission_repository
            .list_by_assignments(&assignment_ids)
            .await?;
        let attempts = self.attempt_repository.list_by_quizzes(&quiz_ids).await?;

        Ok(GradeInputs {
            assignments,
            quizzes,
            submissions,
            attempts,
        })
    }

    /// Grades of every actively enrolled student, for the offering's instructor.
    pub async fn course_grades_for_instructor(
        &self,
        course_offering_id: &str,
        caller: &Caller,
    ) -> AppResult<CourseGradesDto> {
        let offering = self.load_offering(course_offering_id).await?;
        require_instructor(caller, &CourseContext::from(&offering))?;

        let student_ids: Vec<String> = self
            .enrollment_repository
            .list_active_by_offering(&offering.id)
            .await?
            .into_iter()
            .map(|e| e.student_id)
            .collect();
        let mut students = self.user_repository.find_by_ids(&student_ids).await?;
        students.sort_by(|a, b| a.name.cmp(&b.name));

        let inputs = self.load_inputs(&offering.id).await?;

        Ok(CourseGradesDto {
            course: CourseSummaryDto::from(&offering),
            students: build_report(&students, &inputs),
        })
    }

    /// The caller's own grades in an offering they are actively enrolled in.
    pub async fn course_grades_for_student(
        &self,
        course_offering_id: &str,
        caller: &Caller,
    ) -> AppResult<CourseGradesDto> {
        let offering = self.load_offering(course_offering_id).await?;
        self.enrollment_guard
            .require_active(&offering.id, &caller.id)
            .await?;

        let student = self
            .user_repository
            .find_by_id(&caller.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id '{}' not found", caller.id)))?;

        let inputs = self.load_inputs(&offering.id).await?;

        Ok(CourseGradesDto {
            course: CourseSummaryDto::from(&offering),
            students: build_report(std::slice::from_ref(&student), &inputs),
        })
    }
}
