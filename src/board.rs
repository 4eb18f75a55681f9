//! Board ordering engine: column ranks and atomic column reordering.

use std::collections::{HashMap, HashSet};

use rusqlite::Connection;

use crate::db::tasks;
use crate::error::{TaskError, TaskResult};
use crate::types::{Status, Task};

/// Next free rank at the bottom of a column (1 when the column is empty).
pub fn next_order(conn: &Connection, status: Status) -> TaskResult<i64> {
    Ok(tasks::max_board_order(conn, status)?.unwrap_or(0) + 1)
}

/// Reorder one column to match the client-supplied id sequence.
///
/// Validates the whole request before touching any row, then renumbers the
/// listed tasks 1..n in a single transaction. Active tasks in the column
/// that are not listed keep their old ranks; the listed sequence is
/// authoritative only for its own members.
pub fn reorder_column(
    conn: &mut Connection,
    status_raw: &str,
    ordered_ids: &[i64],
) -> TaskResult<Vec<Task>> {
    if ordered_ids.is_empty() {
        return Err(TaskError::empty_reorder_list());
    }

    let mut seen = HashSet::new();
    for id in ordered_ids {
        if !seen.insert(*id) {
            return Err(TaskError::duplicate_ids());
        }
    }

    let status = Status::parse(status_raw)?;

    let fetched = tasks::get_active_by_ids(conn, ordered_ids)?;
    if fetched.len() != ordered_ids.len() {
        let found: HashSet<i64> = fetched.iter().map(|t| t.id).collect();
        let missing: Vec<i64> = ordered_ids
            .iter()
            .copied()
            .filter(|id| !found.contains(id))
            .collect();
        return Err(TaskError::unknown_ids(&missing));
    }

    let mut by_id: HashMap<i64, Task> = fetched.into_iter().map(|t| (t.id, t)).collect();
    for task in by_id.values() {
        if task.status != status {
            return Err(TaskError::column_mismatch(
                task.id,
                status.as_str(),
                task.status.as_str(),
            ));
        }
    }

    let mut reordered = Vec::with_capacity(ordered_ids.len());
    for (position, id) in ordered_ids.iter().enumerate() {
        // by_id is guaranteed complete after the size check above
        let mut task = by_id.remove(id).ok_or_else(|| TaskError::unknown_ids(&[*id]))?;
        task.board_order = Some(position as i64 + 1);
        reordered.push(task);
    }

    let tx = conn.transaction().map_err(TaskError::database)?;
    tasks::save_all(&tx, &reordered)?;
    tx.commit().map_err(TaskError::database)?;

    Ok(reordered)
}
