//! Task data structures.
//!
//! This module defines the core `Task` struct representing a single work
//! item with scheduling, priority, and completion metadata, plus the
//! `TaskDraft`/`TaskPatch` input types consumed by the store's add and
//! update operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date;
use crate::fields::{Category, Priority, Recurrence};

/// A child checklist item owned by exactly one task.
///
/// Subtask ids are unique within their parent's list only; generated ids
/// take the form `{task_id}-{index}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

/// A unit of work tracked by the store.
///
/// Date fields are canonical `DateTime<Utc>` in memory and ISO-8601 strings
/// on disk; the serde adapters in [`crate::date`] handle the conversion and
/// default missing timestamps to "now" on rehydration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(
        default,
        with = "date::iso_datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default = "Utc::now", with = "date::iso_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", with = "date::iso_datetime")]
    pub updated_at: DateTime<Utc>,
    /// Ids of tasks this one is blocked by. Weak references: a listed id may
    /// point at a task that no longer exists, and consumers treat such an id
    /// as matching nothing.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Task {
    /// True when every subtask is completed. Vacuously false for a task
    /// with no subtasks.
    pub fn all_subtasks_done(&self) -> bool {
        !self.subtasks.is_empty() && self.subtasks.iter().all(|s| s.completed)
    }
}

/// A subtask as supplied to add/update, possibly without an id yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtaskDraft {
    pub id: Option<String>,
    pub title: String,
    pub completed: bool,
}

impl SubtaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        SubtaskDraft {
            id: None,
            title: title.into(),
            completed: false,
        }
    }

    /// Materialise, deriving the positional id when none was supplied.
    pub fn into_subtask(self, task_id: &str, index: usize) -> Subtask {
        Subtask {
            id: self.id.unwrap_or_else(|| format!("{task_id}-{index}")),
            title: self.title,
            completed: self.completed,
        }
    }
}

/// Input to `add_task`: a task minus the generated fields (id, timestamps).
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub recurrence: Option<Recurrence>,
    pub subtasks: Vec<SubtaskDraft>,
    pub tags: Vec<String>,
    pub category: Option<Category>,
    pub dependencies: Vec<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            ..TaskDraft::default()
        }
    }
}

/// Explicit partial update for `update_task`.
///
/// Every field is optional; a field left `None` keeps the task's current
/// value. Clearable fields are double-`Option` so "not mentioned" and
/// "explicitly cleared" stay distinct (`Some(None)` clears).
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub recurrence: Option<Option<Recurrence>>,
    /// Replaces the whole subtask list; entries without an id get one
    /// backfilled positionally.
    pub subtasks: Option<Vec<SubtaskDraft>>,
    pub tags: Option<Vec<String>>,
    pub category: Option<Option<Category>>,
    pub dependencies: Option<Vec<String>>,
}
