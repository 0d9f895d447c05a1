#[cfg(test)]
pub mod fixtures {
    use crate::models::domain::{CourseOffering, User, UserRole};

    /// Creates a user whose username and email derive from `name`.
    pub fn user(name: &str, role: UserRole) -> User {
        let username = name.to_lowercase().replace(' ', ".");
        User::new(name, &username, &format!("{}@example.com", username), role)
    }

    pub fn admin() -> User {
        user("Ada Admin", UserRole::Admin)
    }

    pub fn teacher(name: &str) -> User {
        user(name, UserRole::Teacher)
    }

    pub fn student(name: &str) -> User {
        let mut student = user(name, UserRole::Student);
        student.student_number = Some(format!("S-{}", student.username));
        student
    }

    /// A draft offering taught by `instructor`.
    pub fn offering_taught_by(instructor: &User) -> CourseOffering {
        CourseOffering::new_draft("template-1", "A", "2026/2027-1", &instructor.id)
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::models::domain::UserRole;

    #[test]
    fn test_fixtures_student_has_student_number() {
        let s = student("Sam Lee");
        assert_eq!(s.username, "sam.lee");
        assert_eq!(s.email, "sam.lee@example.com");
        assert_eq!(s.role, UserRole::Student);
        assert_eq!(s.student_number.as_deref(), Some("S-sam.lee"));
    }

    #[test]
    fn test_fixtures_offering_is_taught_by_teacher() {
        let t = teacher("Tess");
        let offering = offering_taught_by(&t);
        assert!(offering.is_taught_by(&t.id));
        assert!(!offering.is_taught_by(&admin().id));
    }
}
