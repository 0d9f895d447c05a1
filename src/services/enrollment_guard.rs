use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    repositories::EnrollmentRepository,
};

pub struct EnrollmentGuard {
    enrollment_repository: Arc<dyn EnrollmentRepository>,
}

impl EnrollmentGuard {
    pub fn new(enrollment_repository: Arc<dyn EnrollmentRepository>) -> Self {
        Self {
            enrollment_repository,
        }
    }

    pub async fn is_actively_enrolled(
        &self,
        course_offering_id: &str,
        student_id: &str,
    ) -> AppResult<bool> {
        let enrollment = self
            .enrollment_repository
            .find_active(course_offering_id, student_id)
            .await?;
        Ok(enrollment.is_some())
    }

    pub async fn require_active(&self, course_offering_id: &str, student_id: &str) -> AppResult<()> {
        if !self.is_actively_enrolled(course_offering_id, student_id).await? {
            return Err(AppError::Forbidden(
                "You are not an active student of this course offering".to_string(),
            ));
        }
        Ok(())
    }
}
