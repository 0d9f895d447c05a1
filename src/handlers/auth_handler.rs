use std::sync::Arc;

use actix_web::{get, web, HttpResponse};

use crate::{app_state::AppState, auth::AuthenticatedUser, errors::AppError};

#[get("/auth/me")]
pub async fn me(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = state.user_service.me(&auth.0.sub).await?;
    Ok(HttpResponse::Ok().json(user))
}
