//! Command implementations for the CLI interface.
//!
//! Each command loads one operation onto the store and prints its result;
//! the store handles persistence itself. All display formatting lives here
//! and in [`crate::query`] — the store knows nothing about presentation.

use chrono::{DateTime, Local, Utc};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::date::{parse_due_input, start_end_of_this_week};
use crate::fields::{
    format_category, format_filter, format_priority, format_recurrence, Category, Filter,
    Priority, Recurrence, SortKey,
};
use crate::query::{
    completion_percentage, due_date_status, format_due_relative, overdue_tasks, print_table,
    sort_tasks_by_due_date, sort_tasks_by_priority, tasks_by_date_range, tasks_for_calendar,
    upcoming_tasks,
};
use crate::store::TaskStore;
use crate::task::{SubtaskDraft, TaskDraft, TaskPatch};

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Task title
        title: String,
        /// Longer description
        #[arg(long, short)]
        desc: Option<String>,
        /// Priority level (defaults to medium)
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Due date ("today", "tomorrow", "in 3d", "friday", "YYYY-MM-DD")
        #[arg(long)]
        due: Option<String>,
        /// Recurrence cadence (descriptive only)
        #[arg(long, value_enum)]
        recurrence: Option<Recurrence>,
        /// Category label
        #[arg(long, value_enum)]
        category: Option<Category>,
        /// Tag (repeatable)
        #[arg(long)]
        tag: Vec<String>,
        /// Subtask title (repeatable, in order)
        #[arg(long)]
        subtask: Vec<String>,
        /// Id of a task this one is blocked by (repeatable)
        #[arg(long)]
        depends_on: Vec<String>,
    },

    /// List tasks through a filter mode, with optional search and sorting.
    List {
        /// Filter mode
        #[arg(long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
        /// Case-insensitive search over title, description, and tags
        #[arg(long, short)]
        search: Option<String>,
        /// Sort order
        #[arg(long, value_enum, default_value_t = SortKey::None)]
        sort: SortKey,
        /// Show at most this many tasks
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View one task in detail.
    View {
        /// Task id
        id: String,
    },

    /// Update fields of an existing task.
    Update {
        /// Task id
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long, short)]
        desc: Option<String>,
        /// New priority
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// New due date
        #[arg(long)]
        due: Option<String>,
        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
        /// New recurrence cadence
        #[arg(long, value_enum)]
        recurrence: Option<Recurrence>,
        /// New category label
        #[arg(long, value_enum)]
        category: Option<Category>,
        /// Replace the tag list (repeatable)
        #[arg(long)]
        tag: Vec<String>,
        /// Replace the dependency list (repeatable)
        #[arg(long)]
        depends_on: Vec<String>,
    },

    /// Toggle a task's completion flag.
    Toggle {
        /// Task id
        id: String,
    },

    /// Toggle one subtask; completing the last one completes the task.
    Check {
        /// Parent task id
        id: String,
        /// Subtask id (e.g. "<task-id>-0")
        subtask_id: String,
    },

    /// Delete a task. Dependents keep their (now dangling) reference.
    Delete {
        /// Task id
        id: String,
    },

    /// Search all tasks, ignoring filter modes.
    Search {
        /// Query text
        query: String,
    },

    /// Show aggregate counts.
    Stats,

    /// Incomplete tasks due within the next seven days.
    Upcoming,

    /// Incomplete tasks past their due date.
    Overdue,

    /// Tasks due in the current ISO week (Monday to Sunday).
    Week,

    /// Tasks of a month, bucketed per day.
    Calendar {
        /// Month (1-12)
        month: u32,
        /// Year
        year: i32,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_due_or_warn(input: &str) -> Option<DateTime<Utc>> {
    let today = Local::now().date_naive();
    let parsed = parse_due_input(input, today);
    if parsed.is_none() {
        eprintln!("Unrecognised due date '{input}', leaving it unset");
    }
    parsed
}

/// Add a new task to the store.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    store: &mut TaskStore,
    title: String,
    desc: Option<String>,
    priority: Option<Priority>,
    due: Option<String>,
    recurrence: Option<Recurrence>,
    category: Option<Category>,
    tags: Vec<String>,
    subtasks: Vec<String>,
    depends_on: Vec<String>,
) {
    if title.trim().is_empty() {
        eprintln!("Task title cannot be empty");
        std::process::exit(1);
    }
    let draft = TaskDraft {
        description: desc,
        priority,
        due_date: due.as_deref().and_then(parse_due_or_warn),
        recurrence,
        category,
        tags,
        subtasks: subtasks.into_iter().map(SubtaskDraft::new).collect(),
        dependencies: depends_on,
        ..TaskDraft::new(title)
    };
    let id = store.add_task(draft);
    println!("Added task {id}");
}

/// List tasks with filtering, search, and sorting.
pub fn cmd_list(
    store: &mut TaskStore,
    filter: Filter,
    search: Option<String>,
    sort: SortKey,
    limit: Option<usize>,
) {
    store.set_filter(filter);
    store.set_search_query(search.unwrap_or_default());

    let mut tasks = store.filtered_tasks();
    match sort {
        SortKey::Due => tasks = sort_tasks_by_due_date(tasks),
        SortKey::Priority => tasks = sort_tasks_by_priority(tasks),
        SortKey::None => {}
    }
    if let Some(n) = limit {
        tasks.truncate(n);
    }
    print_table(&tasks, Local::now().date_naive());
    println!(
        "{} of {} tasks (filter: {}{})",
        tasks.len(),
        store.tasks().len(),
        format_filter(store.active_filter()),
        if store.search_query().is_empty() {
            String::new()
        } else {
            format!(", search: \"{}\"", store.search_query())
        }
    );
}

/// View detailed information about a specific task. The viewed task
/// becomes the store's transient selection for the rest of the run.
pub fn cmd_view(store: &mut TaskStore, id: &str) {
    store.set_selected_task(Some(id.to_string()));
    let Some(task) = store
        .selected_task_id()
        .and_then(|sid| store.get_task_by_id(sid))
    else {
        eprintln!("Task '{id}' not found");
        std::process::exit(1);
    };
    let today = Local::now().date_naive();

    println!("{} {}", if task.completed { "[x]" } else { "[ ]" }, task.title);
    println!("  id:         {}", task.id);
    if let Some(desc) = &task.description {
        println!("  desc:       {desc}");
    }
    println!("  priority:   {}", format_priority(task.priority));
    println!(
        "  due:        {} ({})",
        format_due_relative(task.due_date, today),
        due_date_status(&task, today).label()
    );
    println!("  recurrence: {}", format_recurrence(task.recurrence));
    println!("  category:   {}", format_category(task.category));
    if !task.tags.is_empty() {
        println!("  tags:       {}", task.tags.join(", "));
    }
    if !task.dependencies.is_empty() {
        println!("  blocked by: {}", task.dependencies.join(", "));
    }
    if !task.subtasks.is_empty() {
        println!("  subtasks ({}%):", completion_percentage(&task));
        for sub in &task.subtasks {
            println!(
                "    {} {}  ({})",
                if sub.completed { "[x]" } else { "[ ]" },
                sub.title,
                sub.id
            );
        }
    }
}

/// Update fields of an existing task.
#[allow(clippy::too_many_arguments)]
pub fn cmd_update(
    store: &mut TaskStore,
    id: &str,
    title: Option<String>,
    desc: Option<String>,
    priority: Option<Priority>,
    due: Option<String>,
    clear_due: bool,
    recurrence: Option<Recurrence>,
    category: Option<Category>,
    tags: Vec<String>,
    depends_on: Vec<String>,
) {
    if store.get_task_by_id(id).is_none() {
        eprintln!("Task '{id}' not found");
        std::process::exit(1);
    }
    let due_date = if clear_due {
        Some(None)
    } else {
        due.as_deref().and_then(parse_due_or_warn).map(Some)
    };
    store.update_task(
        id,
        TaskPatch {
            title,
            description: desc.map(Some),
            priority,
            due_date,
            recurrence: recurrence.map(Some),
            category: category.map(Some),
            tags: (!tags.is_empty()).then_some(tags),
            dependencies: (!depends_on.is_empty()).then_some(depends_on),
            ..TaskPatch::default()
        },
    );
    println!("Updated task {id}");
}

/// Flip a task's completion flag.
pub fn cmd_toggle(store: &mut TaskStore, id: &str) {
    let Some(task) = store.get_task_by_id(id) else {
        eprintln!("Task '{id}' not found");
        std::process::exit(1);
    };
    store.toggle_task(id);
    println!(
        "Task {id} is now {}",
        if task.completed { "open" } else { "done" }
    );
}

/// Flip one subtask's completion flag.
pub fn cmd_check(store: &mut TaskStore, id: &str, subtask_id: &str) {
    let Some(task) = store.get_task_by_id(id) else {
        eprintln!("Task '{id}' not found");
        std::process::exit(1);
    };
    if !task.subtasks.iter().any(|s| s.id == subtask_id) {
        eprintln!("Subtask '{subtask_id}' not found on task '{id}'");
        std::process::exit(1);
    }
    store.toggle_subtask(id, subtask_id);
    let task = store.get_task_by_id(id).unwrap_or(task);
    println!(
        "Task {id} at {}% ({})",
        completion_percentage(&task),
        if task.completed { "done" } else { "open" }
    );
}

/// Delete a task.
pub fn cmd_delete(store: &mut TaskStore, id: &str) {
    if store.get_task_by_id(id).is_none() {
        eprintln!("Task '{id}' not found");
        std::process::exit(1);
    }
    store.delete_task(id);
    println!("Deleted task {id}");
}

/// Search all tasks, ignoring filter modes.
pub fn cmd_search(store: &TaskStore, query: &str) {
    let hits = store.search_tasks(query);
    print_table(&hits, Local::now().date_naive());
}

/// Show aggregate counts over the whole collection.
pub fn cmd_stats(store: &TaskStore) {
    let stats = store.task_stats();
    println!("total:     {}", stats.total);
    println!("completed: {}", stats.completed);
    println!("pending:   {}", stats.pending);
    println!("pending by priority:");
    println!("  high:   {}", stats.high_priority);
    println!("  medium: {}", stats.medium_priority);
    println!("  low:    {}", stats.low_priority);
}

/// Incomplete tasks due within the next seven days.
pub fn cmd_upcoming(store: &TaskStore) {
    let tasks = upcoming_tasks(store.tasks(), Utc::now());
    print_table(&tasks, Local::now().date_naive());
}

/// Incomplete tasks past their due date.
pub fn cmd_overdue(store: &TaskStore) {
    let today = Local::now().date_naive();
    let tasks = overdue_tasks(store.tasks(), today);
    print_table(&tasks, today);
}

/// Tasks due in the current ISO week.
pub fn cmd_week(store: &TaskStore) {
    let today = Local::now().date_naive();
    let (start, end) = start_end_of_this_week(today);
    let tasks = tasks_by_date_range(store.tasks(), start, end);
    print_table(&tasks, today);
}

/// Print the month's tasks bucketed per day.
pub fn cmd_calendar(store: &TaskStore, month: u32, year: i32) {
    if !(1..=12).contains(&month) {
        eprintln!("Month must be between 1 and 12");
        std::process::exit(1);
    }
    let buckets = tasks_for_calendar(store.tasks(), month, year);
    if buckets.is_empty() {
        println!("No tasks due in {year}-{month:02}");
        return;
    }
    for (day, tasks) in buckets {
        println!("{day}");
        for task in tasks {
            println!(
                "  {} {} ({})",
                if task.completed { "[x]" } else { "[ ]" },
                task.title,
                format_priority(task.priority)
            );
        }
    }
}

/// Generate shell completion scripts on stdout.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "dt", &mut std::io::stdout());
}
