pub mod content_cleanup;
pub mod content_service;
pub mod course_context;
pub mod course_service;
pub mod enrollment_guard;
pub mod grade_service;
pub mod quiz_attempt_service;
pub mod submission_service;
pub mod time_window;
pub mod user_service;
