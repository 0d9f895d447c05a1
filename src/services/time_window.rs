use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::errors::{AppError, AppResult};

/// Submission state of something with an optional deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeadlineStatus {
    pub is_past_deadline: bool,
    pub can_submit_now: bool,
}

/// Position of `now` relative to an optional `[start, end]` window. Exactly one of
/// `is_future`, `is_ongoing`, `is_finished` is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowStatus {
    pub is_future: bool,
    pub is_ongoing: bool,
    pub is_finished: bool,
    pub can_attempt_now: bool,
}

impl WindowStatus {
    /// Fails with `UnprocessableState` unless the window is currently open.
    pub fn ensure_open(&self) -> AppResult<()> {
        if self.is_future {
            return Err(AppError::UnprocessableState(
                "Quiz is not yet open".to_string(),
            ));
        }
        if self.is_finished {
            return Err(AppError::UnprocessableState(
                "Quiz is already closed".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn deadline_status(
    deadline: Option<DateTime<Utc>>,
    allow_late: bool,
    now: DateTime<Utc>,
) -> DeadlineStatus {
    match deadline {
        None => DeadlineStatus {
            is_past_deadline: false,
            can_submit_now: true,
        },
        Some(deadline) => {
            let is_past_deadline = now > deadline;
            DeadlineStatus {
                is_past_deadline,
                can_submit_now: !is_past_deadline || allow_late,
            }
        }
    }
}

pub fn window_status(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> WindowStatus {
    let is_future = start.is_some_and(|start| now < start);
    let is_finished = end.is_some_and(|end| now > end);
    let is_ongoing = !is_future && !is_finished;

    WindowStatus {
        is_future,
        is_ongoing,
        is_finished,
        can_attempt_now: is_ongoing,
    }
}

/// Latest instant an attempt may be submitted, if the quiz is timed. A duration that
/// runs past the representable range yields no deadline.
pub fn attempt_deadline(
    started_at: DateTime<Utc>,
    duration_minutes: Option<i64>,
) -> Option<DateTime<Utc>> {
    duration_minutes
        .filter(|minutes| *minutes > 0)
        .and_then(Duration::try_minutes)
        .and_then(|duration| started_at.checked_add_signed(duration))
}

pub fn is_late(submitted_at: DateTime<Utc>, deadline: Option<DateTime<Utc>>) -> bool {
    deadline.is_some_and(|deadline| submitted_at > deadline)
}
