//! Task row persistence: CRUD, column scans and paged listings.

use crate::error::TaskError;
use crate::types::{Status, Task};
use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection, Row};

/// Build an ORDER BY clause from sortBy and sortDir parameters.
/// Returns a safe SQL ORDER BY expression.
fn build_order_clause(sort_by: Option<&str>, sort_dir: Option<&str>) -> String {
    let field = match sort_by {
        Some("deadline") => "deadline",
        Some("priority") => "priority",
        Some("status") => "status",
        _ => "date_created", // default, also the fallback for unknown fields
    };

    let dir = match sort_dir {
        Some("asc") => "ASC",
        _ => "DESC",
    };

    format!("{} {}", field, dir)
}

fn text_conv_err(err: TaskError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
}

/// Map a full `tasks` row onto the entity, normalizing legacy status strings.
pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let priority: String = row.get("priority")?;
    let status: String = row.get("status")?;
    let recurrence_type: String = row.get("recurrence_type")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        priority: crate::types::Priority::parse(&priority).map_err(text_conv_err)?,
        status: Status::parse(&status).map_err(text_conv_err)?,
        board_order: row.get("board_order")?,
        deadline: row.get("deadline")?,
        date_created: row.get("date_created")?,
        recurrence_type: crate::types::RecurrenceType::parse(&recurrence_type)
            .map_err(text_conv_err)?,
        recurrence_interval: row.get("recurrence_interval")?,
        recurrence_end_at: row.get("recurrence_end_at")?,
        recurrence_group_id: row.get("recurrence_group_id")?,
        deleted: row.get::<_, i64>("deleted")? != 0,
    })
}

/// Fetch a task by id, including soft-deleted rows.
pub fn get_task(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    match stmt.query_row(params![task_id], parse_task_row) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Fetch a task by id, excluding soft-deleted rows.
pub fn get_active_task(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1 AND deleted = 0")?;

    match stmt.query_row(params![task_id], parse_task_row) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Insert a new task row and return the assigned id.
pub fn insert_task(conn: &Connection, task: &Task) -> Result<i64> {
    conn.execute(
        "INSERT INTO tasks (title, description, priority, status, board_order, deadline,
                            date_created, recurrence_type, recurrence_interval,
                            recurrence_end_at, recurrence_group_id, deleted)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            task.title,
            task.description,
            task.priority.as_str(),
            task.status.as_str(),
            task.board_order,
            task.deadline,
            task.date_created,
            task.recurrence_type.as_str(),
            task.recurrence_interval,
            task.recurrence_end_at,
            task.recurrence_group_id,
            task.deleted as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Persist every mutable field of an existing task row.
pub fn update_task(conn: &Connection, task: &Task) -> Result<()> {
    let updated = conn.execute(
        "UPDATE tasks SET title = ?1, description = ?2, priority = ?3, status = ?4,
                          board_order = ?5, deadline = ?6, recurrence_type = ?7,
                          recurrence_interval = ?8, recurrence_end_at = ?9,
                          recurrence_group_id = ?10, deleted = ?11
         WHERE id = ?12",
        params![
            task.title,
            task.description,
            task.priority.as_str(),
            task.status.as_str(),
            task.board_order,
            task.deadline,
            task.recurrence_type.as_str(),
            task.recurrence_interval,
            task.recurrence_end_at,
            task.recurrence_group_id,
            task.deleted as i64,
            task.id,
        ],
    )?;
    if updated == 0 {
        anyhow::bail!("no task row with id {}", task.id);
    }
    Ok(())
}

/// Persist a batch of tasks. Callers wrap this in a transaction when the
/// batch must land atomically.
pub fn save_all(conn: &Connection, tasks: &[Task]) -> Result<()> {
    for task in tasks {
        update_task(conn, task)?;
    }
    Ok(())
}

/// Highest board order among active tasks in a column, if any.
pub fn max_board_order(conn: &Connection, status: Status) -> Result<Option<i64>> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(board_order) FROM tasks WHERE status = ?1 AND deleted = 0",
        params![status.as_str()],
        |row| row.get(0),
    )?;
    Ok(max)
}

/// Fetch the active tasks matching an id set. Rows come back in id order;
/// absent or deleted ids are simply missing from the result.
pub fn get_active_by_ids(conn: &Connection, ids: &[i64]) -> Result<Vec<Task>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT * FROM tasks WHERE deleted = 0 AND id IN ({}) ORDER BY id",
        placeholders
    );
    let mut stmt = conn.prepare(&sql)?;
    let tasks = stmt
        .query_map(params_from_iter(ids.iter()), parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

/// Paged listing of active tasks ordered by an allow-listed sort field.
pub fn list_active(
    conn: &Connection,
    page: i64,
    size: i64,
    sort_by: Option<&str>,
    sort_dir: Option<&str>,
) -> Result<Vec<Task>> {
    let order_clause = build_order_clause(sort_by, sort_dir);
    let sql = format!(
        "SELECT * FROM tasks WHERE deleted = 0 ORDER BY {} LIMIT ?1 OFFSET ?2",
        order_clause
    );
    let mut stmt = conn.prepare(&sql)?;
    let tasks = stmt
        .query_map(params![size, page.saturating_mul(size)], parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

/// Count of active tasks.
pub fn count_active(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE deleted = 0",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Paged listing of soft-deleted tasks, most recently created first.
pub fn list_deleted(conn: &Connection, page: i64, size: i64) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM tasks WHERE deleted = 1 ORDER BY date_created DESC LIMIT ?1 OFFSET ?2",
    )?;
    let tasks = stmt
        .query_map(params![size, page.saturating_mul(size)], parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

/// Count of soft-deleted tasks.
pub fn count_deleted(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE deleted = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_clause_allows_only_known_fields() {
        assert_eq!(
            build_order_clause(Some("deadline"), Some("asc")),
            "deadline ASC"
        );
        assert_eq!(
            build_order_clause(Some("priority"), Some("desc")),
            "priority DESC"
        );
        assert_eq!(build_order_clause(Some("status"), None), "status DESC");
        assert_eq!(
            build_order_clause(Some("dateCreated"), None),
            "date_created DESC"
        );
    }

    #[test]
    fn order_clause_falls_back_on_unknown_input() {
        assert_eq!(
            build_order_clause(Some("id; DROP TABLE tasks"), Some("sideways")),
            "date_created DESC"
        );
        assert_eq!(build_order_clause(None, None), "date_created DESC");
    }
}
