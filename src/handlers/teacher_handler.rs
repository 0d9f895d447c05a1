use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{require_teacher, AuthenticatedUser},
    errors::AppError,
    handlers::current_caller,
    models::{
        domain::OfferingStatus,
        dto::request::{GradeSubmissionRequest, UpdateOfferingStatusRequest},
    },
};

#[derive(Debug, Deserialize)]
pub struct TeachingQuery {
    pub status: Option<OfferingStatus>,
}

#[get("/course-offerings")]
pub async fn list_teaching(
    state: web::Data<Arc<AppState>>,
    query: web::Query<TeachingQuery>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    require_teacher(&caller)?;

    let offerings = state
        .course_service
        .list_teaching(&caller, query.status)
        .await?;
    Ok(HttpResponse::Ok().json(offerings))
}

#[post("/course-offerings/{id}/status")]
pub async fn set_offering_status(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    request: web::Json<UpdateOfferingStatusRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    require_teacher(&caller)?;

    let offering = state
        .course_service
        .set_status_as_instructor(&id, &caller, request.status, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(offering))
}

#[get("/assignments/{id}/submissions")]
pub async fn list_submissions(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    require_teacher(&caller)?;

    let submissions = state
        .submission_service
        .list_for_assignment(&id, &caller)
        .await?;
    Ok(HttpResponse::Ok().json(submissions))
}

#[post("/assignment-submissions/{id}/grade")]
pub async fn grade_submission(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    request: web::Json<GradeSubmissionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    require_teacher(&caller)?;

    let request = request.into_inner();
    request.validate()?;

    let graded = state
        .submission_service
        .grade(&id, &caller, request.score, request.feedback, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(graded))
}

#[get("/quizzes/{id}/attempts")]
pub async fn list_quiz_attempts(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    require_teacher(&caller)?;

    let attempts = state
        .quiz_attempt_service
        .list_for_instructor(&id, &caller)
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
    require_teacher(&caller)?;

    let grades = state
        .grade_service
        .course_grades_for_instructor(&id, &caller)
        .await?;
    Ok(HttpResponse::Ok().json(grades))
}
