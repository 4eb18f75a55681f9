//! Core types for the task board backend.

use serde::{Deserialize, Serialize};

use crate::error::{TaskError, TaskResult};

/// Maximum title length accepted by create/update.
pub const MAX_TITLE_LEN: usize = 150;
/// Maximum description length accepted by create/update.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Task priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Moderate,
    #[default]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Moderate => "MODERATE",
            Priority::Low => "LOW",
        }
    }

    /// Parse a case-insensitive priority string.
    pub fn parse(value: &str) -> TaskResult<Self> {
        match value.to_uppercase().as_str() {
            "HIGH" => Ok(Priority::High),
            "MODERATE" => Ok(Priority::Moderate),
            "LOW" => Ok(Priority::Low),
            _ => Err(TaskError::invalid_enum(
                "priority",
                value,
                "HIGH, MODERATE, LOW",
            )),
        }
    }
}

/// Kanban column status.
///
/// Legacy API values PENDING and COMPLETED map to TODO and DONE; the
/// aliasing lives entirely in [`Status::parse`] so stored rows and incoming
/// payloads are normalized at every read boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "TODO",
            Status::InProgress => "IN_PROGRESS",
            Status::Done => "DONE",
        }
    }

    /// Parse a case-insensitive status string, normalizing legacy aliases.
    pub fn parse(value: &str) -> TaskResult<Self> {
        match value.to_uppercase().as_str() {
            "TODO" | "PENDING" => Ok(Status::Todo),
            "IN_PROGRESS" => Ok(Status::InProgress),
            "DONE" | "COMPLETED" => Ok(Status::Done),
            _ => Err(TaskError::invalid_enum(
                "status",
                value,
                "TODO, IN_PROGRESS, DONE",
            )),
        }
    }
}

/// Recurrence granularity for repeating tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurrenceType {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl RecurrenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceType::None => "NONE",
            RecurrenceType::Daily => "DAILY",
            RecurrenceType::Weekly => "WEEKLY",
            RecurrenceType::Monthly => "MONTHLY",
        }
    }

    /// Parse a case-insensitive recurrence type string.
    pub fn parse(value: &str) -> TaskResult<Self> {
        match value.to_uppercase().as_str() {
            "NONE" => Ok(RecurrenceType::None),
            "DAILY" => Ok(RecurrenceType::Daily),
            "WEEKLY" => Ok(RecurrenceType::Weekly),
            "MONTHLY" => Ok(RecurrenceType::Monthly),
            _ => Err(TaskError::invalid_enum(
                "recurrenceType",
                value,
                "NONE, DAILY, WEEKLY, MONTHLY",
            )),
        }
    }
}

/// Parse an optional priority string; blank input clears the field.
pub fn parse_priority_opt(value: Option<&str>) -> TaskResult<Option<Priority>> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => Priority::parse(s).map(Some),
    }
}

/// Parse an optional status string; blank input clears the field.
pub fn parse_status_opt(value: Option<&str>) -> TaskResult<Option<Status>> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => Status::parse(s).map(Some),
    }
}

/// Parse an optional recurrence type string; blank input means NONE.
pub fn parse_recurrence_opt(value: Option<&str>) -> TaskResult<Option<RecurrenceType>> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(Some(RecurrenceType::None)),
        Some(s) => RecurrenceType::parse(s).map(Some),
    }
}

/// A task on the board.
///
/// Timestamps are epoch milliseconds. `board_order` is a rank within the
/// task's status column, meaningful only relative to other active tasks in
/// the same column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    pub board_order: Option<i64>,
    pub deadline: Option<i64>,
    pub date_created: i64,
    pub recurrence_type: RecurrenceType,
    pub recurrence_interval: i64,
    pub recurrence_end_at: Option<i64>,
    pub recurrence_group_id: Option<String>,
    pub deleted: bool,
}

impl Task {
    /// Fill in lifecycle defaults before the first persist.
    ///
    /// Sets `date_created` if unset, clamps the recurrence interval to >= 1
    /// and clears the soft-delete flag. Enum fields default at parse time.
    pub fn apply_creation_defaults(&mut self, now: i64) {
        if self.date_created == 0 {
            self.date_created = now;
        }
        if self.recurrence_interval < 1 {
            self.recurrence_interval = 1;
        }
        self.deleted = false;
    }

    /// Transition into DONE. The explicit complete action is the only
    /// sanctioned entry into DONE.
    pub fn mark_completed(&mut self) -> TaskResult<()> {
        if self.status == Status::Done {
            return Err(TaskError::already_completed(self.id));
        }
        self.status = Status::Done;
        Ok(())
    }

    /// Set or clear the deadline.
    ///
    /// A non-null deadline must not be in the past and must not precede
    /// `date_created` (only enforced once `date_created` is populated).
    pub fn update_deadline(&mut self, new_deadline: Option<i64>, now: i64) -> TaskResult<()> {
        let Some(deadline) = new_deadline else {
            self.deadline = None;
            return Ok(());
        };
        if deadline < now {
            return Err(TaskError::invalid_deadline(
                "deadline must not be in the past",
            ));
        }
        if self.date_created > 0 && deadline < self.date_created {
            return Err(TaskError::invalid_deadline(
                "deadline must not precede the creation date",
            ));
        }
        self.deadline = Some(deadline);
        Ok(())
    }

    /// Validate the recurrence fields against each other and the deadline.
    pub fn validate_recurrence(&self) -> TaskResult<()> {
        if self.recurrence_interval < 1 {
            return Err(TaskError::invalid_recurrence(
                "recurrence interval must be at least 1",
            ));
        }
        if self.recurrence_type != RecurrenceType::None {
            let Some(deadline) = self.deadline else {
                return Err(TaskError::invalid_recurrence(
                    "recurring tasks must have a deadline",
                ));
            };
            if let Some(end_at) = self.recurrence_end_at {
                if end_at < deadline {
                    return Err(TaskError::invalid_recurrence(
                        "recurrence end date must not precede the deadline",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Flip the soft-delete flag. Idempotent at the entity level; the
    /// re-deletion guard lives in the lifecycle service.
    pub fn soft_delete(&mut self) {
        self.deleted = true;
    }
}

/// One page of a task listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub items: Vec<Task>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
}

/// Validate title and description bounds shared by create and update.
pub fn validate_text_fields(title: &str, description: Option<&str>) -> TaskResult<()> {
    if title.trim().is_empty() {
        return Err(TaskError::invalid_field("title", "title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(TaskError::invalid_field(
            "title",
            format!("title must be at most {} characters", MAX_TITLE_LEN),
        ));
    }
    if let Some(desc) = description {
        if desc.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(TaskError::invalid_field(
                "description",
                format!(
                    "description must be at most {} characters",
                    MAX_DESCRIPTION_LEN
                ),
            ));
        }
    }
    Ok(())
}

/// Create/update payload accepted by the lifecycle service.
///
/// All fields optional; create requires a title. `deadline` and
/// `recurrence_end_at` are assigned from the payload unconditionally on
/// update (absent clears), the remaining fields update only when present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub deadline: Option<i64>,
    pub board_order: Option<i64>,
    pub recurrence_type: Option<String>,
    pub recurrence_interval: Option<i64>,
    pub recurrence_end_at: Option<i64>,
    pub recurrence_group_id: Option<String>,
}

/// Status update payload for single-task board movement.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: String,
    #[serde(default)]
    pub board_order: Option<i64>,
}

/// Reorder payload for one Kanban column.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardReorder {
    pub status: String,
    pub ordered_task_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn blank_task() -> Task {
        Task {
            id: 0,
            title: "write report".to_string(),
            description: None,
            priority: Priority::default(),
            status: Status::default(),
            board_order: None,
            deadline: None,
            date_created: 0,
            recurrence_type: RecurrenceType::default(),
            recurrence_interval: 0,
            recurrence_end_at: None,
            recurrence_group_id: None,
            deleted: true,
        }
    }

    #[test]
    fn creation_defaults_populate_unset_fields() {
        let mut task = blank_task();
        task.apply_creation_defaults(1_000);

        assert_eq!(task.date_created, 1_000);
        assert_eq!(task.status, Status::Todo);
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.recurrence_type, RecurrenceType::None);
        assert_eq!(task.recurrence_interval, 1);
        assert!(!task.deleted);
    }

    #[test]
    fn creation_defaults_keep_existing_date_created() {
        let mut task = blank_task();
        task.date_created = 42;
        task.apply_creation_defaults(1_000);
        assert_eq!(task.date_created, 42);
    }

    #[test]
    fn status_parse_normalizes_legacy_aliases() {
        assert_eq!(Status::parse("pending").unwrap(), Status::Todo);
        assert_eq!(Status::parse("COMPLETED").unwrap(), Status::Done);
        assert_eq!(Status::parse("in_progress").unwrap(), Status::InProgress);
    }

    #[test]
    fn status_parse_rejects_unknown_values() {
        let err = Status::parse("archived").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidEnumValue);
        assert_eq!(err.field.as_deref(), Some("status"));
    }

    #[test]
    fn blank_enum_input_clears_field() {
        assert_eq!(parse_priority_opt(Some("  ")).unwrap(), None);
        assert_eq!(parse_status_opt(None).unwrap(), None);
        assert_eq!(
            parse_recurrence_opt(Some("")).unwrap(),
            Some(RecurrenceType::None)
        );
    }

    #[test]
    fn mark_completed_fails_on_done_task() {
        let mut task = blank_task();
        task.status = Status::Done;
        let err = task.mark_completed().unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyCompleted);
        assert_eq!(task.status, Status::Done);
    }

    #[test]
    fn mark_completed_transitions_from_any_active_state() {
        for status in [Status::Todo, Status::InProgress] {
            let mut task = blank_task();
            task.status = status;
            task.mark_completed().unwrap();
            assert_eq!(task.status, Status::Done);
        }
    }

    #[test]
    fn update_deadline_rejects_past_values() {
        let mut task = blank_task();
        task.date_created = 500;
        let err = task.update_deadline(Some(900), 1_000).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDeadline);
        assert_eq!(task.deadline, None);
    }

    #[test]
    fn update_deadline_rejects_values_before_creation() {
        let mut task = blank_task();
        task.date_created = 2_000;
        let err = task.update_deadline(Some(1_500), 1_000).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDeadline);
    }

    #[test]
    fn update_deadline_accepts_future_values_and_clears_on_none() {
        let mut task = blank_task();
        task.date_created = 500;
        task.update_deadline(Some(5_000), 1_000).unwrap();
        assert_eq!(task.deadline, Some(5_000));

        task.update_deadline(None, 1_000).unwrap();
        assert_eq!(task.deadline, None);
    }

    #[test]
    fn recurrence_validation_requires_deadline() {
        let mut task = blank_task();
        task.apply_creation_defaults(1_000);
        task.recurrence_type = RecurrenceType::Daily;
        let err = task.validate_recurrence().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRecurrence);
    }

    #[test]
    fn recurrence_validation_rejects_end_before_deadline() {
        let mut task = blank_task();
        task.apply_creation_defaults(1_000);
        task.recurrence_type = RecurrenceType::Weekly;
        task.deadline = Some(10_000);
        task.recurrence_end_at = Some(9_000);
        let err = task.validate_recurrence().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRecurrence);
    }

    #[test]
    fn text_validation_enforces_bounds() {
        assert!(validate_text_fields("ok", None).is_ok());
        assert!(validate_text_fields("   ", None).is_err());
        let long_title = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(validate_text_fields(&long_title, None).is_err());
        let long_desc = "y".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(validate_text_fields("ok", Some(&long_desc)).is_err());
    }
}
