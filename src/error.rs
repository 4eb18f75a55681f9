//! Structured error types for API responses.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Not found / lifecycle errors
    NotFound,
    AlreadyDeleted,
    NotDeleted,
    AlreadyCompleted,
    StatusLocked,

    // Validation errors
    InvalidEnumValue,
    InvalidDeadline,
    InvalidRecurrence,
    InvalidField,

    // Board reorder errors
    EmptyReorderList,
    DuplicateIds,
    UnknownIds,
    ColumnMismatch,

    // Internal errors
    DatabaseError,
    InternalError,
}

/// Structured error carried through the service and HTTP layers.
#[derive(Debug, Serialize)]
pub struct TaskError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl TaskError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn not_found(task_id: i64) -> Self {
        Self::new(ErrorCode::NotFound, format!("Task not found: {}", task_id))
    }

    pub fn already_deleted(task_id: i64) -> Self {
        Self::new(
            ErrorCode::AlreadyDeleted,
            format!("Task {} is already deleted", task_id),
        )
    }

    pub fn not_deleted(task_id: i64) -> Self {
        Self::new(
            ErrorCode::NotDeleted,
            format!("Task {} is not deleted", task_id),
        )
    }

    pub fn already_completed(task_id: i64) -> Self {
        Self::new(
            ErrorCode::AlreadyCompleted,
            format!("Task {} is already completed", task_id),
        )
    }

    pub fn status_locked(task_id: i64) -> Self {
        Self::new(
            ErrorCode::StatusLocked,
            format!("Task {} is completed and its status is locked", task_id),
        )
    }

    pub fn invalid_enum(field: &str, value: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidEnumValue,
            format!("Invalid {}: {} (expected one of {})", field, value, expected),
        )
        .with_field(field)
    }

    pub fn invalid_deadline(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidDeadline, reason).with_field("deadline")
    }

    pub fn invalid_recurrence(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRecurrence, reason)
    }

    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidField, reason).with_field(field)
    }

    pub fn empty_reorder_list() -> Self {
        Self::new(
            ErrorCode::EmptyReorderList,
            "Reorder request contains no task ids",
        )
    }

    pub fn duplicate_ids() -> Self {
        Self::new(
            ErrorCode::DuplicateIds,
            "Reorder request contains duplicate task ids",
        )
    }

    pub fn unknown_ids(missing: &[i64]) -> Self {
        let ids: Vec<String> = missing.iter().map(|id| id.to_string()).collect();
        Self::new(
            ErrorCode::UnknownIds,
            format!("Unknown or deleted task ids: {}", ids.join(", ")),
        )
    }

    pub fn column_mismatch(task_id: i64, expected: &str, actual: &str) -> Self {
        Self::new(
            ErrorCode::ColumnMismatch,
            format!(
                "Task {} is in column {} but the reorder targets {}",
                task_id, actual, expected
            ),
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskError {}

impl From<rusqlite::Error> for TaskError {
    fn from(err: rusqlite::Error) -> Self {
        TaskError::database(err)
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        // Try to downcast to TaskError first
        match err.downcast::<TaskError>() {
            Ok(task_err) => task_err,
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(sql_err) => TaskError::database(sql_err),
                Err(err) => TaskError::internal(err),
            },
        }
    }
}

/// Result type for task operations.
pub type TaskResult<T> = std::result::Result<T, TaskError>;
