use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Assignment, CourseOffering, Quiz, Section},
    repositories::{CourseOfferingRepository, SectionRepository},
};

/// The slice of a course offering that authorization decisions need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseContext {
    pub course_offering_id: String,
    pub instructor_id: Option<String>,
}

impl CourseContext {
    pub fn is_instructor(&self, user_id: &str) -> bool {
        self.instructor_id.as_deref() == Some(user_id)
    }
}

impl From<&CourseOffering> for CourseContext {
    fn from(offering: &CourseOffering) -> Self {
        CourseContext {
            course_offering_id: offering.id.clone(),
            instructor_id: offering.instructor_id.clone(),
        }
    }
}

/// Walks content up to its owning course offering.
pub struct CourseContextResolver {
    offering_repository: Arc<dyn CourseOfferingRepository>,
    section_repository: Arc<dyn SectionRepository>,
}

impl CourseContextResolver {
    pub fn new(
        offering_repository: Arc<dyn CourseOfferingRepository>,
        section_repository: Arc<dyn SectionRepository>,
    ) -> Self {
        Self {
            offering_repository,
            section_repository,
        }
    }

    pub async fn for_offering(&self, course_offering_id: &str) -> AppResult<CourseContext> {
        let offering = self
            .offering_repository
            .find_by_id(course_offering_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Course offering with id '{}' not found",
                    course_offering_id
                ))
            })?;
        Ok(CourseContext::from(&offering))
    }

    pub async fn for_section(&self, section: &Section) -> AppResult<CourseContext> {
        self.for_offering(&section.course_offering_id).await
    }

    pub async fn for_section_id(&self, section_id: &str) -> AppResult<(Section, CourseContext)> {
        let section = self
            .section_repository
            .find_by_id(section_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Section with id '{}' not found", section_id))
            })?;
        let context = self.for_section(&section).await?;
        Ok((section, context))
    }

    pub async fn for_assignment(&self, assignment: &Assignment) -> AppResult<CourseContext> {
        let (_, context) = self.for_section_id(&assignment.section_id).await?;
        Ok(context)
    }

    pub async fn for_quiz(&self, quiz: &Quiz) -> AppResult<CourseContext> {
        let (_, context) = self.for_section_id(&quiz.section_id).await?;
        Ok(context)
    }
}
