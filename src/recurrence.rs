//! Recurrence engine: next-deadline computation and follow-up eligibility.
//!
//! Pure calendar arithmetic, no store access. Month arithmetic clamps to the
//! last day of shorter months (Jan 31 + 1 month = Feb 29 in a leap year).

use chrono::{DateTime, Days, Months, Utc};

use crate::types::{RecurrenceType, Task};

/// Compute the deadline of the next occurrence.
///
/// Returns `None` when the task has no deadline, does not recur, or the
/// calendar step overflows the representable range. The interval is clamped
/// to at least 1.
pub fn compute_next_deadline(
    deadline: Option<i64>,
    recurrence_type: RecurrenceType,
    interval: i64,
) -> Option<i64> {
    let deadline = deadline?;
    if recurrence_type == RecurrenceType::None {
        return None;
    }
    let interval = interval.max(1);
    let current = DateTime::<Utc>::from_timestamp_millis(deadline)?;
    // Checked arithmetic throughout: an interval too large to step yields
    // None rather than wrapping.
    let next = match recurrence_type {
        RecurrenceType::None => return None,
        RecurrenceType::Daily => {
            let days = u64::try_from(interval).ok()?;
            current.checked_add_days(Days::new(days))?
        }
        RecurrenceType::Weekly => {
            let days = u64::try_from(interval).ok()?.checked_mul(7)?;
            current.checked_add_days(Days::new(days))?
        }
        RecurrenceType::Monthly => {
            let months = u32::try_from(interval).ok()?;
            current.checked_add_months(Months::new(months))?
        }
    };
    Some(next.timestamp_millis())
}

/// Decide whether a follow-up occurrence should be created.
///
/// True when the task recurs, a next deadline exists, and that deadline does
/// not pass the recurrence end (inclusive). A task with no end recurs
/// indefinitely.
pub fn can_create_next(task: &Task, next_deadline: Option<i64>) -> bool {
    let Some(next_deadline) = next_deadline else {
        return false;
    };
    if task.recurrence_type == RecurrenceType::None {
        return false;
    }
    match task.recurrence_end_at {
        None => true,
        Some(end_at) => next_deadline <= end_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Priority, Status};
    use chrono::TimeZone;

    fn ms(y: i32, mo: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, 12, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn recurring_task(rtype: RecurrenceType, deadline: i64, end_at: Option<i64>) -> Task {
        Task {
            id: 1,
            title: "recurring".to_string(),
            description: None,
            priority: Priority::Low,
            status: Status::Todo,
            board_order: Some(1),
            deadline: Some(deadline),
            date_created: 0,
            recurrence_type: rtype,
            recurrence_interval: 1,
            recurrence_end_at: end_at,
            recurrence_group_id: None,
            deleted: false,
        }
    }

    #[test]
    fn daily_adds_interval_days() {
        let next = compute_next_deadline(Some(ms(2024, 3, 1)), RecurrenceType::Daily, 3);
        assert_eq!(next, Some(ms(2024, 3, 4)));
    }

    #[test]
    fn weekly_adds_interval_weeks() {
        let next = compute_next_deadline(Some(ms(2024, 3, 1)), RecurrenceType::Weekly, 2);
        assert_eq!(next, Some(ms(2024, 3, 15)));
    }

    #[test]
    fn monthly_clamps_to_month_end() {
        let next = compute_next_deadline(Some(ms(2024, 1, 31)), RecurrenceType::Monthly, 1);
        assert_eq!(next, Some(ms(2024, 2, 29)));
    }

    #[test]
    fn interval_below_one_is_clamped() {
        let next = compute_next_deadline(Some(ms(2024, 3, 1)), RecurrenceType::Daily, 0);
        assert_eq!(next, Some(ms(2024, 3, 2)));
    }

    #[test]
    fn oversized_intervals_yield_none_instead_of_wrapping() {
        let deadline = Some(ms(2024, 3, 1));
        assert_eq!(
            compute_next_deadline(deadline, RecurrenceType::Daily, i64::MAX),
            None
        );
        assert_eq!(
            compute_next_deadline(deadline, RecurrenceType::Weekly, i64::MAX),
            None
        );
        assert_eq!(
            compute_next_deadline(deadline, RecurrenceType::Monthly, i64::from(u32::MAX) + 1),
            None
        );
    }

    #[test]
    fn no_deadline_or_no_recurrence_yields_none() {
        assert_eq!(compute_next_deadline(None, RecurrenceType::Daily, 1), None);
        assert_eq!(
            compute_next_deadline(Some(ms(2024, 3, 1)), RecurrenceType::None, 1),
            None
        );
    }

    #[test]
    fn can_create_next_without_end_date() {
        let task = recurring_task(RecurrenceType::Daily, ms(2024, 3, 1), None);
        assert!(can_create_next(&task, Some(ms(2024, 3, 2))));
    }

    #[test]
    fn can_create_next_end_date_is_inclusive() {
        let end = ms(2024, 3, 2);
        let task = recurring_task(RecurrenceType::Daily, ms(2024, 3, 1), Some(end));
        assert!(can_create_next(&task, Some(end)));
        assert!(!can_create_next(&task, Some(end + 1)));
    }

    #[test]
    fn can_create_next_rejects_non_recurring() {
        let task = recurring_task(RecurrenceType::None, ms(2024, 3, 1), None);
        assert!(!can_create_next(&task, Some(ms(2024, 3, 2))));
        let task = recurring_task(RecurrenceType::Daily, ms(2024, 3, 1), None);
        assert!(!can_create_next(&task, None));
    }
}
