pub mod admin_handler;
pub mod auth_handler;
pub mod content_handler;
pub mod health_handler;
pub mod multipart;
pub mod student_handler;
pub mod teacher_handler;

use actix_web::web;

use crate::{
    app_state::AppState,
    auth::{AuthenticatedUser, Caller},
    errors::AppResult,
};

pub use health_handler::{health_check, health_check_live, health_check_ready};

/// Turns the token subject into an active caller.
pub async fn current_caller(state: &AppState, auth: &AuthenticatedUser) -> AppResult<Caller> {
    state.user_service.current_caller(&auth.0.sub).await
}

/// Routes mounted under `/api`, behind `AuthMiddleware`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(auth_handler::me)
        .service(
            web::scope("/admin")
                .service(admin_handler::create_user)
                .service(admin_handler::list_users)
                .service(admin_handler::create_offering)
                .service(admin_handler::list_offerings)
                .service(admin_handler::get_offering)
                .service(admin_handler::update_offering)
                .service(admin_handler::set_offering_status)
                .service(admin_handler::delete_offering)
                .service(admin_handler::list_enrollments)
                .service(admin_handler::add_student)
                .service(admin_handler::drop_student),
        )
        .service(
            web::scope("/teacher")
                .service(teacher_handler::list_teaching)
                .service(teacher_handler::set_offering_status)
                .service(teacher_handler::list_submissions)
                .service(teacher_handler::grade_submission)
                .service(teacher_handler::list_quiz_attempts)
                .service(teacher_handler::course_grades),
        )
        .service(
            web::scope("/student")
                .service(student_handler::submit_assignment)
                .service(student_handler::start_quiz)
                .service(student_handler::submit_attempt)
                .service(student_handler::list_attempts)
                .service(student_handler::course_grades),
        )
        .service(content_handler::list_sections)
        .service(content_handler::create_section)
        .service(content_handler::update_section)
        .service(content_handler::delete_section)
        .service(content_handler::list_assignments)
        .service(content_handler::create_assignment)
        .service(content_handler::get_assignment)
        .service(content_handler::update_assignment)
        .service(content_handler::delete_assignment)
        .service(content_handler::list_quizzes)
        .service(content_handler::create_quiz)
        .service(content_handler::get_quiz)
        .service(content_handler::update_quiz)
        .service(content_handler::delete_quiz)
        .service(content_handler::list_materials)
        .service(content_handler::create_material)
        .service(content_handler::material_file_url)
        .service(content_handler::get_material)
        .service(content_handler::update_material)
        .service(content_handler::delete_material);
}
