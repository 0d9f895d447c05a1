use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::{AppError, AppResult},
    handlers::{
        current_caller,
        multipart::{read_upload_form, UploadForm},
    },
    models::{
        domain::MaterialKind,
        dto::{
            request::{
                CreateAssignmentRequest, CreateQuizRequest, CreateSectionRequest,
                UpdateAssignmentRequest, UpdateQuizRequest, UpdateSectionRequest,
            },
            response::ApiResponse,
        },
    },
    services::content_service::MaterialInput,
};

const MATERIAL_TEXT_FIELDS: &[&str] = &["title", "description", "type", "subject", "url"];

/// Maps a material form onto `MaterialInput`. A sent but blank description or subject
/// clears it.
fn material_input(mut form: UploadForm) -> AppResult<MaterialInput> {
    let kind = match form.text("type") {
        Some(value) => Some(MaterialKind::parse(&value).ok_or_else(|| {
            AppError::ValidationError("type must be file or link".to_string())
        })?),
        None => None,
    };
    let optional = |form: &UploadForm, name: &str| form.has(name).then(|| form.text(name));

    Ok(MaterialInput {
        title: form.text("title"),
        description: optional(&form, "description"),
        kind,
        subject: optional(&form, "subject"),
        url: form.text("url"),
        file: form.file.take(),
    })
}

// Role and ownership checks live in ContentService: admin or the assigned instructor.

#[get("/course-offerings/{id}/sections")]
pub async fn list_sections(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let sections = state.content_service.list_sections(&id, &caller).await?;
    Ok(HttpResponse::Ok().json(sections))
}

#[post("/course-offerings/{id}/sections")]
pub async fn create_section(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    request: web::Json<CreateSectionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let section = state
        .content_service
        .create_section(&id, &caller, request.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(section))
}

#[put("/sections/{id}")]
pub async fn update_section(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    request: web::Json<UpdateSectionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let section = state
        .content_service
        .update_section(&id, &caller, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(section))
}

#[delete("/sections/{id}")]
pub async fn delete_section(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let removed = state.content_service.delete_section(&id, &caller).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        serde_json::json!({
            "id": id.into_inner(),
            "assignments": removed.assignments,
            "quizzes": removed.quizzes,
            "materials": removed.materials,
        }),
        "Section deleted",
    )))
}

#[get("/sections/{id}/assignments")]
pub async fn list_assignments(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let assignments = state
        .content_service
        .list_assignments(&id, &caller, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(assignments))
}

#[post("/sections/{id}/assignments")]
pub async fn create_assignment(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    request: web::Json<CreateAssignmentRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let assignment = state
        .content_service
        .create_assignment(&id, &caller, request.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(assignment))
}

#[get("/assignments/{id}")]
pub async fn get_assignment(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let assignment = state
        .content_service
        .get_assignment(&id, &caller, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(assignment))
}

#[put("/assignments/{id}")]
pub async fn update_assignment(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    request: web::Json<UpdateAssignmentRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let assignment = state
        .content_service
        .update_assignment(&id, &caller, request.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(assignment))
}

#[delete("/assignments/{id}")]
pub async fn delete_assignment(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let submissions = state.content_service.delete_assignment(&id, &caller).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        serde_json::json!({ "id": id.into_inner(), "submissions": submissions }),
        "Assignment deleted",
    )))
}

#[get("/sections/{id}/quizzes")]
pub async fn list_quizzes(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let quizzes = state
        .content_service
        .list_quizzes(&id, &caller, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(quizzes))
}

#[post("/sections/{id}/quizzes")]
pub async fn create_quiz(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    request: web::Json<CreateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let quiz = state
        .content_service
        .create_quiz(&id, &caller, request.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(quiz))
}

#[get("/quizzes/{id}")]
pub async fn get_quiz(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let quiz = state.content_service.get_quiz(&id, &caller, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(quiz))
}

#[put("/quizzes/{id}")]
pub async fn update_quiz(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    request: web::Json<UpdateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let quiz = state
        .content_service
        .update_quiz(&id, &caller, request.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(quiz))
}

#[delete("/quizzes/{id}")]
pub async fn delete_quiz(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let attempts = state.content_service.delete_quiz(&id, &caller).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        serde_json::json!({ "id": id.into_inner(), "attempts": attempts }),
        "Quiz deleted",
    )))
}

#[get("/sections/{id}/materials")]
pub async fn list_materials(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let materials = state.content_service.list_materials(&id, &caller).await?;
    Ok(HttpResponse::Ok().json(materials))
}

#[post("/sections/{id}/materials")]
pub async fn create_material(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    mut payload: Multipart,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let form = read_upload_form(
        &mut payload,
        true,
        MATERIAL_TEXT_FIELDS,
        state.config.max_upload_bytes,
    )
    .await?;
    let material = state
        .content_service
        .create_material(&id, &caller, material_input(form)?, Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(material))
}

#[get("/materials/{id}")]
pub async fn get_material(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let material = state.content_service.get_material(&id, &caller).await?;
    Ok(HttpResponse::Ok().json(material))
}

#[put("/materials/{id}")]
pub async fn update_material(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    mut payload: Multipart,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let form = read_upload_form(
        &mut payload,
        true,
        MATERIAL_TEXT_FIELDS,
        state.config.max_upload_bytes,
    )
    .await?;
    let material = state
        .content_service
        .update_material(&id, &caller, material_input(form)?, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(material))
}

#[delete("/materials/{id}")]
pub async fn delete_material(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    state.content_service.delete_material(&id, &caller).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        serde_json::json!({ "id": id.into_inner() }),
        "Material deleted",
    )))
}

#[get("/materials/{id}/file-url")]
pub async fn material_file_url(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&state, &auth).await?;
    let link = state.content_service.material_file_url(&id, &caller).await?;
    Ok(HttpResponse::Ok().json(link))
}
