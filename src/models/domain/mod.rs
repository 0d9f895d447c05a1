pub mod assignment;
pub mod assignment_submission;
pub mod course_offering;
pub mod enrollment;
pub mod material;
pub mod quiz;
pub mod quiz_attempt;
pub mod quiz_question;
pub mod section;
pub mod user;

pub use assignment::{Assignment, SubmissionKind};
pub use assignment_submission::{AssignmentSubmission, SubmissionArtifact};
pub use course_offering::{CourseOffering, OfferingStatus};
pub use enrollment::{Enrollment, EnrollmentStatus};
pub use material::{Material, MaterialKind};
pub use quiz::Quiz;
pub use quiz_attempt::QuizAttempt;
pub use quiz_question::QuizQuestion;
pub use section::Section;
pub use user::{User, UserRole, UserStatus};
