pub mod assignment_repository;
pub mod course_offering_repository;
pub mod enrollment_repository;
pub mod material_repository;
pub mod quiz_attempt_repository;
pub mod quiz_repository;
pub mod section_repository;
pub mod submission_repository;
pub mod user_repository;

pub use assignment_repository::{AssignmentRepository, MongoAssignmentRepository};
pub use course_offering_repository::{CourseOfferingRepository, MongoCourseOfferingRepository};
pub use enrollment_repository::{EnrollmentRepository, MongoEnrollmentRepository};
pub use material_repository::{MaterialRepository, MongoMaterialRepository};
pub use quiz_attempt_repository::{MongoQuizAttemptRepository, QuizAttemptRepository};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};
pub use section_repository::{MongoSectionRepository, SectionRepository};
pub use submission_repository::{GradeRecord, MongoSubmissionRepository, SubmissionRepository};
pub use user_repository::{MongoUserRepository, UserRepository};
