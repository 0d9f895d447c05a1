use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The stored artifact of a submission. Exactly one of `file_path` / `url` is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionArtifact {
    File(String),
    Link(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssignmentSubmission {
    pub id: String,
    pub assignment_id: String,
    pub student_id: String,
    pub file_path: Option<String>,
    pub url: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub score: Option<i32>,
    pub feedback: Option<String>,
    pub graded_by: Option<String>,
    pub graded_at: Option<DateTime<Utc>>,
}

impl AssignmentSubmission {
    pub fn new(
        assignment_id: &str,
        student_id: &str,
        artifact: SubmissionArtifact,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        let mut submission = AssignmentSubmission {
            id: Uuid::new_v4().to_string(),
            assignment_id: assignment_id.to_string(),
            student_id: student_id.to_string(),
            file_path: None,
            url: None,
            submitted_at,
            score: None,
            feedback: None,
            graded_by: None,
            graded_at: None,
        };
        submission.replace_artifact(artifact, submitted_at);
        submission
    }

    /// Overwrites the artifact and submission time. Grading fields are left as they are.
    pub fn replace_artifact(&mut self, artifact: SubmissionArtifact, submitted_at: DateTime<Utc>) {
        match artifact {
            SubmissionArtifact::File(path) => {
                self.file_path = Some(path);
                self.url = None;
            }
            SubmissionArtifact::Link(url) => {
                self.url = Some(url);
                self.file_path = None;
            }
        }
        self.submitted_at = submitted_at;
    }

    pub fn is_graded(&self) -> bool {
        self.score.is_some()
    }
}
