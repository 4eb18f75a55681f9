//! Task lifecycle service: orchestration over the store, board engine and
//! recurrence engine.

use rusqlite::Connection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::board;
use crate::db::{now_ms, tasks, Database};
use crate::error::{ErrorCode, TaskError, TaskResult};
use crate::recurrence::{can_create_next, compute_next_deadline};
use crate::types::{
    parse_priority_opt, parse_recurrence_opt, parse_status_opt, validate_text_fields,
    BoardReorder, Status, StatusUpdate, Task, TaskInput, TaskPage,
};

/// Largest page size a listing will serve.
const MAX_PAGE_SIZE: i64 = 100;

fn clamp_paging(page: i64, size: i64) -> (i64, i64) {
    (page.max(0), size.clamp(1, MAX_PAGE_SIZE))
}

/// Service facade owning the database handle. Cheap to clone.
#[derive(Clone)]
pub struct TaskService {
    db: Database,
}

impl TaskService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a task from a request payload and persist it.
    pub fn create_task(&self, input: TaskInput) -> TaskResult<Task> {
        self.db
            .with_conn(|conn| {
                let title = input.title.as_deref().unwrap_or("");
                validate_text_fields(title, input.description.as_deref())?;

                let now = now_ms();
                let mut task = Task {
                    id: 0,
                    title: title.trim().to_string(),
                    description: input.description.clone(),
                    priority: parse_priority_opt(input.priority.as_deref())?.unwrap_or_default(),
                    status: parse_status_opt(input.status.as_deref())?.unwrap_or_default(),
                    board_order: input.board_order,
                    deadline: input.deadline,
                    date_created: 0,
                    recurrence_type: parse_recurrence_opt(input.recurrence_type.as_deref())?
                        .unwrap_or_default(),
                    recurrence_interval: input.recurrence_interval.unwrap_or(1),
                    recurrence_end_at: input.recurrence_end_at,
                    recurrence_group_id: input.recurrence_group_id.clone(),
                    deleted: false,
                };
                task.apply_creation_defaults(now);
                task.validate_recurrence()?;

                if task.board_order.is_none() {
                    task.board_order = Some(board::next_order(conn, task.status)?);
                }
                task.update_deadline(input.deadline, now)?;

                task.id = tasks::insert_task(conn, &task)?;
                info!(task_id = task.id, status = task.status.as_str(), "task created");
                Ok(task)
            })
            .map_err(TaskError::from)
    }

    /// Fetch a single active task.
    pub fn get_task(&self, task_id: i64) -> TaskResult<Task> {
        self.db
            .with_conn(|conn| Ok(fetch_active(conn, task_id)?))
            .map_err(TaskError::from)
    }

    /// Paged listing of active tasks.
    pub fn list_tasks(
        &self,
        page: i64,
        size: i64,
        sort_by: Option<&str>,
        sort_dir: Option<&str>,
    ) -> TaskResult<TaskPage> {
        let (page, size) = clamp_paging(page, size);
        self.db
            .with_conn(|conn| {
                let items = tasks::list_active(conn, page, size, sort_by, sort_dir)?;
                let total = tasks::count_active(conn)?;
                Ok(TaskPage {
                    items,
                    total,
                    page,
                    size,
                })
            })
            .map_err(TaskError::from)
    }

    /// Partial update of an active task.
    ///
    /// `deadline` and `recurrence_end_at` are taken from the payload
    /// unconditionally (absent clears them); every other field changes only
    /// when present.
    pub fn update_task(&self, task_id: i64, input: TaskInput) -> TaskResult<Task> {
        self.db
            .with_conn(|conn| {
                let mut task = fetch_active(conn, task_id)?;
                let prev_status = task.status;
                let now = now_ms();

                if let Some(title) = input.title.as_deref() {
                    validate_text_fields(title, input.description.as_deref())?;
                    task.title = title.trim().to_string();
                } else {
                    validate_text_fields(&task.title, input.description.as_deref())?;
                }
                if input.description.is_some() {
                    task.description = input.description.clone();
                }
                if let Some(priority) = parse_priority_opt(input.priority.as_deref())? {
                    task.priority = priority;
                }

                let new_status = parse_status_opt(input.status.as_deref())?;
                if let Some(new_status) = new_status {
                    if prev_status == Status::Done && new_status != Status::Done {
                        return Err(TaskError::status_locked(task.id).into());
                    }
                    task.status = new_status;
                }

                if input.board_order.is_some() {
                    task.board_order = input.board_order;
                }
                if let Some(rtype) = parse_recurrence_opt(input.recurrence_type.as_deref())? {
                    task.recurrence_type = rtype;
                }
                if let Some(interval) = input.recurrence_interval {
                    task.recurrence_interval = interval.max(1);
                }
                if input.recurrence_group_id.is_some() {
                    task.recurrence_group_id = input.recurrence_group_id.clone();
                }
                task.recurrence_end_at = input.recurrence_end_at;
                task.deadline = input.deadline;

                task.validate_recurrence()?;

                if task.status != prev_status && input.board_order.is_none() {
                    task.board_order = Some(board::next_order(conn, task.status)?);
                }
                task.update_deadline(input.deadline, now)?;

                tasks::update_task(conn, &task)?;
                debug!(task_id = task.id, "task updated");
                Ok(task)
            })
            .map_err(TaskError::from)
    }

    /// Move a task to another column, optionally at an explicit rank.
    pub fn update_status(&self, task_id: i64, update: StatusUpdate) -> TaskResult<Task> {
        self.db
            .with_conn(|conn| {
                if update.status.trim().is_empty() {
                    return Err(TaskError::new(ErrorCode::InvalidEnumValue, "status is required")
                    .with_field("status")
                    .into());
                }

                let mut task = fetch_active(conn, task_id)?;
                let new_status = Status::parse(&update.status)?;
                if task.status == Status::Done && new_status != Status::Done {
                    return Err(TaskError::status_locked(task.id).into());
                }
                task.status = new_status;

                task.board_order = match update.board_order.filter(|order| *order > 0) {
                    Some(order) => Some(order),
                    None => Some(board::next_order(conn, new_status)?),
                };

                tasks::update_task(conn, &task)?;
                debug!(task_id = task.id, status = new_status.as_str(), "status updated");
                Ok(task)
            })
            .map_err(TaskError::from)
    }

    /// Atomically renumber one column to a client-supplied sequence.
    pub fn reorder_board(&self, request: BoardReorder) -> TaskResult<Vec<Task>> {
        self.db
            .with_conn_mut(|conn| {
                let reordered =
                    board::reorder_column(conn, &request.status, &request.ordered_task_ids)?;
                info!(
                    status = request.status.as_str(),
                    count = reordered.len(),
                    "board column reordered"
                );
                Ok(reordered)
            })
            .map_err(TaskError::from)
    }

    /// Soft-delete a task. Fails on already-deleted tasks.
    pub fn delete_task(&self, task_id: i64) -> TaskResult<()> {
        self.db
            .with_conn(|conn| {
                let mut task = tasks::get_task(conn, task_id)?
                    .ok_or_else(|| TaskError::not_found(task_id))?;
                if task.deleted {
                    return Err(TaskError::already_deleted(task_id).into());
                }
                task.soft_delete();
                tasks::update_task(conn, &task)?;
                info!(task_id, "task soft-deleted");
                Ok(())
            })
            .map_err(TaskError::from)
    }

    /// Bring a soft-deleted task back onto the board.
    ///
    /// The restored task lands at the bottom of its column when it carries
    /// no rank.
    pub fn restore_task(&self, task_id: i64) -> TaskResult<Task> {
        self.db
            .with_conn(|conn| {
                let mut task = tasks::get_task(conn, task_id)?
                    .ok_or_else(|| TaskError::not_found(task_id))?;
                if !task.deleted {
                    return Err(TaskError::not_deleted(task_id).into());
                }
                task.deleted = false;
                if task.board_order.is_none() {
                    task.board_order = Some(board::next_order(conn, task.status)?);
                }
                tasks::update_task(conn, &task)?;
                info!(task_id, "task restored");
                Ok(task)
            })
            .map_err(TaskError::from)
    }

    /// Complete a task, spawning at most one follow-up occurrence when the
    /// task recurs. The follow-up never cascades into further occurrences.
    pub fn mark_completed(&self, task_id: i64) -> TaskResult<Task> {
        self.db
            .with_conn_mut(|conn| {
                let mut task = fetch_active(conn, task_id)?;
                task.mark_completed()?;

                let tx = conn.transaction()?;
                tasks::update_task(&tx, &task)?;
                let follow_up = maybe_create_next(&tx, &mut task)?;
                tx.commit()?;

                info!(task_id, follow_up = follow_up.is_some(), "task completed");
                Ok(task)
            })
            .map_err(TaskError::from)
    }

    /// Paged listing of soft-deleted tasks.
    pub fn list_deleted(&self, page: i64, size: i64) -> TaskResult<TaskPage> {
        let (page, size) = clamp_paging(page, size);
        self.db
            .with_conn(|conn| {
                let items = tasks::list_deleted(conn, page, size)?;
                let total = tasks::count_deleted(conn)?;
                Ok(TaskPage {
                    items,
                    total,
                    page,
                    size,
                })
            })
            .map_err(TaskError::from)
    }
}

fn fetch_active(conn: &Connection, task_id: i64) -> anyhow::Result<Task> {
    tasks::get_active_task(conn, task_id)?
        .ok_or_else(|| TaskError::not_found(task_id).into())
}

/// Spawn the next occurrence of a recurring task, if one is due.
///
/// Assigns the recurrence group id lazily, persisting it onto the completed
/// task the first time a follow-up is created.
fn maybe_create_next(conn: &Connection, completed: &mut Task) -> anyhow::Result<Option<Task>> {
    let next_deadline = compute_next_deadline(
        completed.deadline,
        completed.recurrence_type,
        completed.recurrence_interval,
    );
    if !can_create_next(completed, next_deadline) {
        return Ok(None);
    }

    if completed.recurrence_group_id.is_none() {
        completed.recurrence_group_id = Some(format!("rec-{}", Uuid::new_v4()));
        tasks::update_task(conn, completed)?;
    }

    let now = now_ms();
    let mut next = Task {
        id: 0,
        title: completed.title.clone(),
        description: completed.description.clone(),
        priority: completed.priority,
        status: Status::Todo,
        board_order: Some(board::next_order(conn, Status::Todo)?),
        deadline: None,
        date_created: now,
        recurrence_type: completed.recurrence_type,
        recurrence_interval: completed.recurrence_interval,
        recurrence_end_at: completed.recurrence_end_at,
        recurrence_group_id: completed.recurrence_group_id.clone(),
        deleted: false,
    };
    // The computed deadline goes through the same guard as user input; a
    // next occurrence already in the past fails the completion.
    next.update_deadline(next_deadline, now)?;

    next.id = tasks::insert_task(conn, &next)?;
    info!(
        task_id = completed.id,
        next_id = next.id,
        group = next.recurrence_group_id.as_deref().unwrap_or(""),
        "recurring follow-up created"
    );
    Ok(Some(next))
}
