//! Derived queries over a task collection.
//!
//! Stateless functions over a borrowed task slice; nothing here mutates its
//! input or touches the store. Functions that depend on the current instant
//! take it as an explicit parameter so they stay deterministic under test —
//! callers pass `Utc::now()` / `Local::now().date_naive()`.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::fields::{format_category, format_priority};
use crate::task::Task;

/// Tasks whose due date falls within `[start, end]`, inclusive on both ends.
pub fn tasks_by_date_range<'a>(
    tasks: &'a [Task],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.due_date.is_some_and(|d| d >= start && d <= end))
        .collect()
}

/// Incomplete tasks due within the next seven days of `now`, inclusive.
pub fn upcoming_tasks<'a>(tasks: &'a [Task], now: DateTime<Utc>) -> Vec<&'a Task> {
    let horizon = now + Duration::days(7);
    tasks
        .iter()
        .filter(|t| !t.completed && t.due_date.is_some_and(|d| d >= now && d <= horizon))
        .collect()
}

/// Incomplete tasks whose due date, truncated to the day, is strictly
/// before `today`. A task due earlier on the same day is not overdue.
pub fn overdue_tasks<'a>(tasks: &'a [Task], today: NaiveDate) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| !t.completed && t.due_date.is_some_and(|d| d.date_naive() < today))
        .collect()
}

/// Percentage of subtasks completed, rounded to the nearest integer. A task
/// without subtasks is all-or-nothing on its own completion flag.
pub fn completion_percentage(task: &Task) -> u32 {
    if task.subtasks.is_empty() {
        return if task.completed { 100 } else { 0 };
    }
    let done = task.subtasks.iter().filter(|s| s.completed).count();
    ((done * 100) as f64 / task.subtasks.len() as f64).round() as u32
}

/// Stable priority ordering: incomplete before completed, then high before
/// medium before low within each group.
pub fn sort_tasks_by_priority<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Vec<&'a Task> {
    let mut sorted: Vec<&Task> = tasks.into_iter().collect();
    sorted.sort_by_key(|t| (t.completed, t.priority.rank()));
    sorted
}

/// Stable ascending due-date ordering; tasks without a due date sort after
/// every dated task, keeping their relative input order.
pub fn sort_tasks_by_due_date<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Vec<&'a Task> {
    let mut sorted: Vec<&Task> = tasks.into_iter().collect();
    sorted.sort_by_key(|t| t.due_date.unwrap_or(DateTime::<Utc>::MAX_UTC));
    sorted
}

/// Bucket tasks due in the given month (1-based) and year by day, keyed by
/// the ISO `YYYY-MM-DD` date string.
pub fn tasks_for_calendar<'a>(
    tasks: &'a [Task],
    month: u32,
    year: i32,
) -> BTreeMap<String, Vec<&'a Task>> {
    let mut buckets: BTreeMap<String, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        let Some(due) = task.due_date else { continue };
        let day = due.date_naive();
        if day.month() == month && day.year() == year {
            buckets.entry(day.to_string()).or_default().push(task);
        }
    }
    buckets
}

/// Relative classification of a task's due date against `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    NoDate,
    Overdue,
    Today,
    Tomorrow,
    /// Due within the next three days.
    Soon,
    Upcoming,
}

impl DueStatus {
    pub fn label(self) -> &'static str {
        match self {
            DueStatus::NoDate => "no date",
            DueStatus::Overdue => "overdue",
            DueStatus::Today => "today",
            DueStatus::Tomorrow => "tomorrow",
            DueStatus::Soon => "soon",
            DueStatus::Upcoming => "upcoming",
        }
    }
}

pub fn due_date_status(task: &Task, today: NaiveDate) -> DueStatus {
    let Some(due) = task.due_date else {
        return DueStatus::NoDate;
    };
    let days = (due.date_naive() - today).num_days();
    match days {
        i64::MIN..=-1 => DueStatus::Overdue,
        0 => DueStatus::Today,
        1 => DueStatus::Tomorrow,
        2..=3 => DueStatus::Soon,
        _ => DueStatus::Upcoming,
    }
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d",
/// "2d late").
pub fn format_due_relative(due: Option<DateTime<Utc>>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let days = (d.date_naive() - today).num_days();
            match days {
                0 => "today".into(),
                1 => "tomorrow".into(),
                _ if days > 1 => format!("in {days}d"),
                _ => format!("{}d late", -days),
            }
        }
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task], today: NaiveDate) {
    println!(
        "{:<10} {:<5} {:<8} {:<10} {:<10} {:<5} {}",
        "ID", "Done", "Pri", "Due", "Category", "Sub%", "Title [tags]"
    );
    for t in tasks {
        let tags = if t.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags.join(","))
        };
        println!(
            "{:<10} {:<5} {:<8} {:<10} {:<10} {:<5} {}{}",
            truncate(&t.id, 10),
            if t.completed { "x" } else { "-" },
            format_priority(t.priority),
            format_due_relative(t.due_date, today),
            format_category(t.category),
            completion_percentage(t),
            t.title,
            tags
        );
    }
}

/// Truncate a string to a maximum width, adding an ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}
