use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    auth::{require_instructor, Caller},
    errors::{AppError, AppResult},
    models::{
        domain::{
            quiz_question::question_id_from_value, Quiz, QuizAttempt, QuizQuestion,
        },
        dto::response::{
            AttemptResultDto, AttemptStartedDto, AttemptSummaryDto, PersonSummaryDto,
            QuizAttemptsDto, QuizSummaryDto,
        },
    },
    repositories::{QuizAttemptRepository, QuizRepository, UserRepository},
    services::{
        course_context::CourseContextResolver,
        enrollment_guard::EnrollmentGuard,
        time_window::{attempt_deadline, window_status},
    },
};

/// Turns a raw answers array into `question id -> answer`. Items without a usable
/// `question_id` are ignored; a repeated id keeps the last answer.
pub fn normalize_answers(answers: &[Value]) -> HashMap<String, Value> {
    let mut by_question = HashMap::new();
    for item in answers {
        let Value::Object(fields) = item else {
            continue;
        };
        let Some(question_id) = fields.get("question_id").and_then(question_id_from_value) else {
            continue;
        };
        let answer = fields.get("answer").cloned().unwrap_or(Value::Null);
        by_question.insert(question_id, answer);
    }
    by_question
}

/// Auto-scores multiple choice questions and clamps the total to `[0, max_score]`.
pub fn score_answers(
    questions: &[QuizQuestion],
    answers: &HashMap<String, Value>,
    max_score: Option<i32>,
) -> i32 {
    let mut total: i64 = 0;

    for question in questions {
        let QuizQuestion::MultipleChoice {
            id,
            answer: Some(correct),
            ..
        } = question
        else {
            continue;
        };

        match answers.get(id) {
            Some(given) if !given.is_null() && given == correct => {
                total += i64::from(question.whole_points());
            }
            _ => {}
        }
    }

    let mut total = total.max(0);
    if let Some(max) = max_score {
        total = total.min(i64::from(max.max(0)));
    }
    i32::try_from(total).unwrap_or(i32::MAX)
}

/// Highest score among finished attempts, ignoring attempts without one.
pub fn best_score(attempts: &[QuizAttempt]) -> Option<i32> {
    attempts.iter().filter_map(|a| a.score).max()
}

pub struct QuizAttemptService {
    quiz_repository: Arc<dyn QuizRepository>,
    attempt_repository: Arc<dyn QuizAttemptRepository>,
    user_repository: Arc<dyn UserRepository>,
    contexts: Arc<CourseContextResolver>,
    enrollment_guard: Arc<EnrollmentGuard>,
}

impl QuizAttemptService {
    pub fn new(
        quiz_repository: Arc<dyn QuizRepository>,
        attempt_repository: Arc<dyn QuizAttemptRepository>,
        user_repository: Arc<dyn UserRepository>,
        contexts: Arc<CourseContextResolver>,
        enrollment_guard: Arc<EnrollmentGuard>,
    ) -> Self {
        Self {
            quiz_repository,
            attempt_repository,
            user_repository,
            contexts,
            enrollment_guard,
        }
    }

    async fn load_quiz(&self, quiz_id: &str) -> AppResult<Quiz> {
        self.quiz_repository
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))
    }

    async fn require_enrolled(&self, quiz: &Quiz, caller: &Caller) -> AppResult<()> {
        let context = self.contexts.for_quiz(quiz).await?;
        self.enrollment_guard
            .require_active(&context.course_offering_id, &caller.id)
            .await
    }

    fn started(quiz: &Quiz, attempt: QuizAttempt, resumed: bool) -> AttemptStartedDto {
        AttemptStartedDto {
            deadline_at: attempt_deadline(attempt.started_at, quiz.duration_minutes),
            attempt_id: attempt.id,
            quiz_id: attempt.quiz_id,
            student_id: attempt.student_id,
            attempt_number: attempt.attempt_number,
            started_at: attempt.started_at,
            resumed,
        }
    }

    /// Starts a new attempt, or returns the caller's unfinished one unchanged.
    pub async fn start(
        &self,
        quiz_id: &str,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptStartedDto> {
        let quiz = self.load_quiz(quiz_id).await?;
        self.require_enrolled(&quiz, caller).await?;
        window_status(quiz.start_time, quiz.end_time, now).ensure_open()?;

        if let Some(existing) = self
            .attempt_repository
            .find_unfinished(&quiz.id, &caller.id)
            .await?
        {
            log::info!(
                "Resuming attempt {} (#{}) of quiz {} for student {}",
                existing.id,
                existing.attempt_number,
                quiz.id,
                caller.id
            );
            return Ok(Self::started(&quiz, existing, true));
        }

        let next_number = self
            .attempt_repository
            .max_attempt_number(&quiz.id, &caller.id)
            .await?
            .unwrap_or(0)
            + 1;

        let attempt = QuizAttempt::start(&quiz.id, &caller.id, next_number, now);
        match self.attempt_repository.create(attempt).await {
            Ok(created) => {
                log::info!(
                    "Started attempt {} (#{}) of quiz {} for student {}",
                    created.id,
                    created.attempt_number,
                    quiz.id,
                    caller.id
                );
                Ok(Self::started(&quiz, created, false))
            }
            // A concurrent start claimed this attempt number first; resume that one.
            Err(AppError::AlreadyExists(_)) => {
                let existing = self
                    .attempt_repository
                    .find_unfinished(&quiz.id, &caller.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::UnprocessableState(
                            "Another attempt was started at the same time, please retry"
                                .to_string(),
                        )
                    })?;
                Ok(Self::started(&quiz, existing, true))
            }
            Err(e) => Err(e),
        }
    }

    /// Scores and finishes an attempt. An attempt is finished exactly once.
    pub async fn submit(
        &self,
        attempt_id: &str,
        caller: &Caller,
        answers: Option<Value>,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptResultDto> {
        let attempt = self
            .attempt_repository
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Quiz attempt with id '{}' not found", attempt_id))
            })?;

        if attempt.student_id != caller.id {
            return Err(AppError::Forbidden(
                "This attempt does not belong to you".to_string(),
            ));
        }

        let quiz = self.load_quiz(&attempt.quiz_id).await?;
        self.require_enrolled(&quiz, caller).await?;

        if attempt.is_finished() {
            return Err(AppError::UnprocessableState(
                "This attempt has already been submitted".to_string(),
            ));
        }

        let answers = match answers {
            Some(Value::Array(items)) if !items.is_empty() => items,
            _ => {
                return Err(AppError::ValidationError(
                    "answers must be a non-empty array".to_string(),
                ))
            }
        };

        window_status(quiz.start_time, quiz.end_time, now).ensure_open()?;

        if let Some(deadline) = attempt_deadline(attempt.started_at, quiz.duration_minutes) {
            if now > deadline {
                return Err(AppError::UnprocessableState(
                    "Time for this attempt has run out".to_string(),
                ));
            }
        }

        let by_question = normalize_answers(&answers);
        let score = score_answers(&quiz.questions, &by_question, quiz.max_score);

        let finished = self
            .attempt_repository
            .finish_if_unfinished(&attempt.id, answers, score, now)
            .await?
            .ok_or_else(|| {
                AppError::UnprocessableState(
                    "This attempt has already been submitted".to_string(),
                )
            })?;

        log::info!(
            "Finished attempt {} of quiz {} for student {} with score {}",
            finished.id,
            quiz.id,
            caller.id,
            score
        );

        Ok(AttemptResultDto::from_attempt(finished, quiz.max_score))
    }

    pub async fn list_own_attempts(
        &self,
        quiz_id: &str,
        caller: &Caller,
    ) -> AppResult<QuizAttemptsDto> {
        let quiz = self.load_quiz(quiz_id).await?;
        self.require_enrolled(&quiz, caller).await?;

        let attempts = self
            .attempt_repository
            .list_for_student(&quiz.id, &caller.id)
            .await?;

        Ok(QuizAttemptsDto {
            quiz: QuizSummaryDto::from(&quiz),
            attempts: attempts.into_iter().map(AttemptSummaryDto::from).collect(),
        })
    }

    /// Every attempt of a quiz, oldest start first, for the offering's instructor.
    pub async fn list_for_instructor(
        &self,
        quiz_id: &str,
        caller: &Caller,
    ) -> AppResult<QuizAttemptsDto> {
        let quiz = self.load_quiz(quiz_id).await?;
        let context = self.contexts.for_quiz(&quiz).await?;
        require_instructor(caller, &context)?;

        let mut attempts = self.attempt_repository.list_by_quiz(&quiz.id).await?;
        attempts.sort_by(|a, b| a.started_at.cmp(&b.started_at));

        let mut student_ids: Vec<String> = attempts.iter().map(|a| a.student_id.clone()).collect();
        student_ids.sort();
        student_ids.dedup();
        let students: HashMap<String, PersonSummaryDto> = self
            .user_repository
            .find_by_ids(&student_ids)
            .await?
            .iter()
            .map(|u| (u.id.clone(), PersonSummaryDto::from(u)))
            .collect();

        let attempts = attempts
            .into_iter()
            .map(|attempt| {
                let student = students.get(&attempt.student_id).cloned();
                AttemptSummaryDto {
                    student,
                    ..AttemptSummaryDto::from(attempt)
                }
            })
            .collect();

        Ok(QuizAttemptsDto {
            quiz: QuizSummaryDto::from(&quiz),
            attempts,
        })
    }
}
