use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Teacher,
    Student,
}

/// Lifecycle of a quiz session. Transitions are linear:
/// scheduled -> active -> completed, with cancelled reachable from
/// scheduled and active.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "session_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    Active,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn can_activate(&self) -> bool {
        matches!(self, SessionStatus::Scheduled)
    }

    pub fn can_complete(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, SessionStatus::Scheduled | SessionStatus::Active)
    }

    /// A session can only be edited or deleted before it starts running.
    pub fn can_edit(&self) -> bool {
        matches!(self, SessionStatus::Scheduled)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "result_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    InProgress,
    Submitted,
    Graded,
    Published,
}

impl ResultStatus {
    /// Human label used in rendered reports.
    pub fn label(&self) -> &'static str {
        match self {
            ResultStatus::InProgress => "In progress",
            ResultStatus::Submitted => "Submitted",
            ResultStatus::Graded => "Graded",
            ResultStatus::Published => "Published",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_transitions() {
        assert!(SessionStatus::Scheduled.can_activate());
        assert!(!SessionStatus::Active.can_activate());
        assert!(SessionStatus::Active.can_complete());
        assert!(!SessionStatus::Completed.can_complete());
        assert!(SessionStatus::Active.can_cancel());
        assert!(!SessionStatus::Completed.can_cancel());
    }

    #[test]
    fn only_scheduled_sessions_are_editable() {
        assert!(SessionStatus::Scheduled.can_edit());
        assert!(!SessionStatus::Active.can_edit());
        assert!(!SessionStatus::Completed.can_edit());
        assert!(!SessionStatus::Cancelled.can_edit());
    }

    #[test]
    fn result_labels() {
        assert_eq!(ResultStatus::Published.label(), "Published");
        assert_eq!(ResultStatus::InProgress.label(), "In progress");
    }
}
