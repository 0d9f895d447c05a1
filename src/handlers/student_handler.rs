use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use chrono::Utc;

use crate::{
    app_state::AppState,
    auth::{require_student, AuthenticatedUser},
    errors::AppError,
    handlers::{current_caller, multipart::read_upload_form},
    middleware::get_request_id,
    models::{domain::SubmissionKind, dto::request::SubmitQuizAttemptRequest},
    services::submission_service::SubmissionPayload,
};

#[post("/assignments/{id}/submit")]
pub async fn submit_assignment(
    req: HttpRequest,
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    mut payload: Multipart,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    require_student(&caller)?;

    // Enrollment and deadline are settled before any of the body is buffered.
    let assignment = state
        .submission_service
        .prepare(&id, &caller, Utc::now())
        .await?;

    let wants_file = assignment.kind == SubmissionKind::File;
    let text_fields: &[&str] = if wants_file { &[] } else { &["url"] };
    let mut form = read_upload_form(
        &mut payload,
        wants_file,
        text_fields,
        state.config.max_upload_bytes,
    )
    .await?;
    let submission = SubmissionPayload {
        file: form.file.take(),
        url: form.fields.remove("url"),
    };

    let receipt = state
        .submission_service
        .submit(&id, &caller, submission, Utc::now())
        .await?;

    log::debug!(
        "[{}] submission receipt for assignment {}",
        get_request_id(&req).unwrap_or_default(),
        id
    );

    Ok(if receipt.created {
        HttpResponse::Created().json(receipt)
    } else {
        HttpResponse::Ok().json(receipt)
    })
}

#[post("/quizzes/{id}/start")]
pub async fn start_quiz(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    require_student(&caller)?;

    let started = state
        .quiz_attempt_service
        .start(&id, &caller, Utc::now())
        .await?;

    Ok(if started.resumed {
        HttpResponse::Ok().json(started)
    } else {
        HttpResponse::Created().json(started)
    })
}

#[post("/quiz-attempts/{id}/submit")]
pub async fn submit_attempt(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    request: web::Json<SubmitQuizAttemptRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    require_student(&caller)?;

    let result = state
        .quiz_attempt_service
        .submit(&id, &caller, request.into_inner().answers, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

#[get("/quizzes/{id}/attempts")]
pub async fn list_attempts(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    require_student(&caller)?;

    let attempts = state
        .quiz_attempt_service
        .list_own_attempts(&id, &caller)
        .await?;
    Ok(HttpResponse::Ok().json(attempts))
}

#[get("/course-offerings/{id}/grades")]
pub async fn course_grades(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    require_student(&caller)?;

    let grades = state
        .grade_service
        .course_grades_for_student(&id, &caller)
        .await?;
    Ok(HttpResponse::Ok().json(grades))
}
