use std::sync::Arc;

use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;

use crate::{
    app_state::AppState,
    auth::{require_admin, AuthenticatedUser},
    errors::AppError,
    handlers::current_caller,
    models::dto::{
        request::{
            AddStudentRequest, CreateCourseOfferingRequest, CreateUserRequest, OfferingFilter,
            UpdateCourseOfferingRequest, UpdateOfferingStatusRequest,
        },
        response::ApiResponse,
    },
    services::course_service::EnrollmentChange,
};

#[post("/users")]
pub async fn create_user(
    state: web::Data<Arc<AppState>>,
    request: web::Json<CreateUserRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&current_caller(&state, &auth).await?)?;

    let user = state
        .user_service
        .create_user(request.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(user))
}

#[get("/users")]
pub async fn list_users(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&current_caller(&state, &auth).await?)?;

    let users = state.user_service.list_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

#[post("/course-offerings")]
pub async fn create_offering(
    state: web::Data<Arc<AppState>>,
    request: web::Json<CreateCourseOfferingRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&current_caller(&state, &auth).await?)?;

    let offering = state
        .course_service
        .create_offering(request.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(offering))
}

#[get("/course-offerings")]
pub async fn list_offerings(
    state: web::Data<Arc<AppState>>,
    query: web::Query<OfferingFilter>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&current_caller(&state, &auth).await?)?;

    let offerings = state.course_service.list_offerings(&query).await?;
    Ok(HttpResponse::Ok().json(offerings))
}

#[get("/course-offerings/{id}")]
pub async fn get_offering(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&current_caller(&state, &auth).await?)?;

    let offering = state.course_service.get_offering(&id).await?;
    Ok(HttpResponse::Ok().json(offering))
}

#[put("/course-offerings/{id}")]
pub async fn update_offering(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    request: web::Json<UpdateCourseOfferingRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&current_caller(&state, &auth).await?)?;

    let offering = state
        .course_service
        .update_offering(&id, request.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(offering))
}

#[post("/course-offerings/{id}/status")]
pub async fn set_offering_status(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    request: web::Json<UpdateOfferingStatusRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&current_caller(&state, &auth).await?)?;

    let offering = state
        .course_service
        .set_status(&id, request.status, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(offering))
}

#[delete("/course-offerings/{id}")]
pub async fn delete_offering(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&current_caller(&state, &auth).await?)?;

    state.course_service.delete_offering(&id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        serde_json::json!({ "id": id.into_inner() }),
        "Course offering deleted",
    )))
}

#[get("/course-offerings/{id}/students")]
pub async fn list_enrollments(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&current_caller(&state, &auth).await?)?;

    let enrollments = state.course_service.list_enrollments(&id).await?;
    Ok(HttpResponse::Ok().json(enrollments))
}

#[post("/course-offerings/{id}/students")]
pub async fn add_student(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    request: web::Json<AddStudentRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&current_caller(&state, &auth).await?)?;

    let (enrollment, change) = state
        .course_service
        .add_student(&id, request.into_inner(), Utc::now())
        .await?;

    let body = ApiResponse::new(enrollment, change.message());
    Ok(match change {
        EnrollmentChange::Created => HttpResponse::Created().json(body),
        _ => HttpResponse::Ok().json(body),
    })
}

#[delete("/course-offerings/{id}/students/{student_id}")]
pub async fn drop_student(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&current_caller(&state, &auth).await?)?;

    let (offering_id, student_id) = path.into_inner();
    let (enrollment, change) = state
        .course_service
        .drop_student(&offering_id, &student_id, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(enrollment, change.message())))
}
