use crate::{
    errors::{AppError, AppResult},
    models::domain::user::{User, UserRole},
    services::course_context::CourseContext,
};

/// The authenticated, active user a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub role: UserRole,
}

impl Caller {
    pub fn new(id: &str, role: UserRole) -> Self {
        Self {
            id: id.to_string(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Caller::new(&user.id, user.role)
    }
}

pub fn require_role(caller: &Caller, role: UserRole) -> AppResult<()> {
    if caller.role != role {
        return Err(AppError::Forbidden(format!(
            "This action requires the {} role",
            role.as_str()
        )));
    }
    Ok(())
}

pub fn require_admin(caller: &Caller) -> AppResult<()> {
    require_role(caller, UserRole::Admin)
}

pub fn require_teacher(caller: &Caller) -> AppResult<()> {
    require_role(caller, UserRole::Teacher)
}

pub fn require_student(caller: &Caller) -> AppResult<()> {
    require_role(caller, UserRole::Student)
}

/// Only the teacher assigned to the offering passes.
pub fn require_instructor(caller: &Caller, context: &CourseContext) -> AppResult<()> {
    if caller.role == UserRole::Teacher && context.is_instructor(&caller.id) {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "You are not the instructor of this course offering".to_string(),
    ))
}

pub fn require_admin_or_instructor(caller: &Caller, context: &CourseContext) -> AppResult<()> {
    if caller.is_admin() {
        return Ok(());
    }
    require_instructor(caller, context)
}
