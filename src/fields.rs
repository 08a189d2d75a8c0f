//! Enumerations and field types for task management.
//!
//! This module defines the structured vocabulary used to categorise tasks:
//! priority levels, recurrence cadences, coarse category labels, and the
//! list-view filter modes.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Priority classification for task importance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Sort rank: high before medium before low.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

/// Recurrence cadence. Purely descriptive: no scheduler materialises
/// recurring instances, the label is carried for display only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Coarse grouping label, independent of completion state and priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Today,
    Secondary,
    Upcoming,
    Completed,
}

/// List-view filter modes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// No restriction.
    #[default]
    All,
    /// High-priority tasks that are not yet completed.
    Focused,
    /// Tasks with at least one dependency.
    Shared,
    /// Completed tasks.
    Archives,
    /// Tasks carrying the "today" category label.
    Today,
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    Due,
    Priority,
    None,
}

/// Format a priority level for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}

/// Format a recurrence cadence for display.
pub fn format_recurrence(r: Option<Recurrence>) -> &'static str {
    match r {
        Some(Recurrence::Daily) => "daily",
        Some(Recurrence::Weekly) => "weekly",
        Some(Recurrence::Monthly) => "monthly",
        Some(Recurrence::Yearly) => "yearly",
        None => "-",
    }
}

/// Format a filter mode for display.
pub fn format_filter(f: Filter) -> &'static str {
    match f {
        Filter::All => "all",
        Filter::Focused => "focused",
        Filter::Shared => "shared",
        Filter::Archives => "archives",
        Filter::Today => "today",
    }
}

/// Format a category label for display.
pub fn format_category(c: Option<Category>) -> &'static str {
    match c {
        Some(Category::Today) => "today",
        Some(Category::Secondary) => "secondary",
        Some(Category::Upcoming) => "upcoming",
        Some(Category::Completed) => "completed",
        None => "-",
    }
}
