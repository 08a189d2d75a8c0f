//! The task store: the single owner of the task collection.
//!
//! All mutation goes through the operations here; callers only ever see
//! borrowed or cloned snapshots. Every mutating operation writes through to
//! the injected [`Storage`] backend after the in-memory change has
//! committed, so a failed save degrades to a warning rather than rolling
//! anything back. Transient view state (`active_filter`, `search_query`,
//! `selected_task_id`) is never persisted.
//!
//! Lookup-by-id operations silently no-op on an unknown id. Stale ids are a
//! benign race from the caller's point of view (e.g. a delete issued from
//! another view), never an error.

use chrono::Utc;
use tracing::warn;

use crate::db::{seed_tasks, Storage};
use crate::fields::{Category, Filter, Priority};
use crate::task::{Task, TaskDraft, TaskPatch};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

/// Produce a short random base-36 token.
///
/// Practically unique for a single-user local store; the store additionally
/// re-rolls on collision so task ids are unique unconditionally.
pub fn generate_id() -> String {
    let mut n = rand::random::<u64>();
    let mut id = String::with_capacity(ID_LEN);
    for _ in 0..ID_LEN {
        id.push(ID_ALPHABET[(n % 36) as usize] as char);
        n /= 36;
    }
    id
}

/// Aggregate counts over the whole collection. The per-priority counts
/// cover pending tasks only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub high_priority: usize,
    pub medium_priority: usize,
    pub low_priority: usize,
}

/// Owns the task collection plus transient view state.
pub struct TaskStore {
    tasks: Vec<Task>,
    active_filter: Filter,
    selected_task_id: Option<String>,
    search_query: String,
    storage: Option<Box<dyn Storage>>,
}

impl TaskStore {
    /// An empty in-memory store with no persistence attached.
    pub fn new() -> Self {
        Self::from_tasks(Vec::new())
    }

    /// An in-memory store over an existing collection.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        TaskStore {
            tasks,
            active_filter: Filter::default(),
            selected_task_id: None,
            search_query: String::new(),
            storage: None,
        }
    }

    /// Open a store backed by `storage`: rehydrate the persisted collection
    /// if one exists, otherwise start from the seed collection. Malformed
    /// prior state counts as absent.
    pub fn open(storage: Box<dyn Storage>) -> Self {
        let tasks = storage.load().unwrap_or_else(seed_tasks);
        let mut store = Self::from_tasks(tasks);
        store.storage = Some(storage);
        store
    }

    fn flush(&self) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save(&self.tasks) {
                warn!(error = %e, "failed to persist tasks; in-memory state is ahead of disk");
            }
        }
    }

    // --- snapshots -------------------------------------------------------

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn active_filter(&self) -> Filter {
        self.active_filter
    }

    pub fn selected_task_id(&self) -> Option<&str> {
        self.selected_task_id.as_deref()
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    // --- mutations -------------------------------------------------------

    /// Add a task from a draft and return its generated id.
    ///
    /// Always succeeds; business rules such as non-empty titles are the
    /// caller's to enforce. Subtasks arriving without an id get
    /// `{task_id}-{index}` backfilled.
    pub fn add_task(&mut self, draft: TaskDraft) -> String {
        let mut id = generate_id();
        while self.tasks.iter().any(|t| t.id == id) {
            id = generate_id();
        }
        let now = Utc::now();
        let subtasks = draft
            .subtasks
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.into_subtask(&id, i))
            .collect();
        self.tasks.push(Task {
            id: id.clone(),
            title: draft.title,
            description: draft.description,
            completed: draft.completed,
            priority: draft.priority.unwrap_or_default(),
            due_date: draft.due_date,
            recurrence: draft.recurrence,
            subtasks,
            tags: draft.tags,
            category: draft.category,
            created_at: now,
            updated_at: now,
            dependencies: draft.dependencies,
        });
        self.flush();
        id
    }

    /// Merge a patch onto the matching task, field by field, refreshing
    /// `updated_at`. Silent no-op on an unknown id.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return;
        };
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(recurrence) = patch.recurrence {
            task.recurrence = recurrence;
        }
        if let Some(subtasks) = patch.subtasks {
            task.subtasks = subtasks
                .into_iter()
                .enumerate()
                .map(|(i, s)| s.into_subtask(id, i))
                .collect();
        }
        if let Some(tags) = patch.tags {
            task.tags = tags;
        }
        if let Some(category) = patch.category {
            task.category = category;
        }
        if let Some(dependencies) = patch.dependencies {
            task.dependencies = dependencies;
        }
        task.updated_at = Utc::now();
        self.flush();
    }

    /// Remove the matching task. Clears the selection if it pointed at the
    /// removed task. Other tasks' dependency lists are left untouched, so a
    /// dangling id may remain — consumers treat it as matching nothing.
    pub fn delete_task(&mut self, id: &str) {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return;
        }
        if self.selected_task_id.as_deref() == Some(id) {
            self.selected_task_id = None;
        }
        self.flush();
    }

    /// Flip a task's completion flag.
    pub fn toggle_task(&mut self, id: &str) {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return;
        };
        task.completed = !task.completed;
        task.updated_at = Utc::now();
        self.flush();
    }

    /// Flip one subtask's completion flag. If that leaves every subtask of
    /// the task completed, the task itself is forced complete. The rule is
    /// one-directional: un-toggling a subtask afterwards does not reopen
    /// the task.
    pub fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            return;
        };
        let Some(subtask) = task.subtasks.iter_mut().find(|s| s.id == subtask_id) else {
            return;
        };
        subtask.completed = !subtask.completed;
        if task.all_subtasks_done() {
            task.completed = true;
        }
        task.updated_at = Utc::now();
        self.flush();
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.active_filter = filter;
    }

    pub fn set_selected_task(&mut self, id: Option<String>) {
        self.selected_task_id = id;
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    // --- derived queries -------------------------------------------------

    /// The collection as seen through the current search query and active
    /// filter, in that order: search narrows first, then the filter mode.
    pub fn filtered_tasks(&self) -> Vec<&Task> {
        let query = self.search_query.trim().to_lowercase();
        self.tasks
            .iter()
            .filter(|t| query.is_empty() || matches_query(t, &query))
            .filter(|t| match self.active_filter {
                Filter::Focused => t.priority == Priority::High && !t.completed,
                Filter::Shared => !t.dependencies.is_empty(),
                Filter::Archives => t.completed,
                Filter::Today => t.category == Some(Category::Today),
                Filter::All => true,
            })
            .collect()
    }

    /// All tasks labelled "today", independent of filter and search.
    pub fn today_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.category == Some(Category::Today))
            .collect()
    }

    /// A copy of the matching task. Date fields are canonical in memory, so
    /// the copy needs no further normalisation.
    pub fn get_task_by_id(&self, id: &str) -> Option<Task> {
        self.tasks.iter().find(|t| t.id == id).cloned()
    }

    /// Aggregate counts over the whole collection; priority buckets count
    /// pending tasks only.
    pub fn task_stats(&self) -> TaskStats {
        let mut stats = TaskStats {
            total: self.tasks.len(),
            ..TaskStats::default()
        };
        for task in &self.tasks {
            if task.completed {
                stats.completed += 1;
                continue;
            }
            stats.pending += 1;
            match task.priority {
                Priority::High => stats.high_priority += 1,
                Priority::Medium => stats.medium_priority += 1,
                Priority::Low => stats.low_priority += 1,
            }
        }
        stats
    }

    /// Case-insensitive substring search over title, description and tags,
    /// ignoring the active filter. An empty (post-trim) query matches
    /// everything.
    pub fn search_tasks(&self, query: &str) -> Vec<&Task> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.tasks.iter().collect();
        }
        self.tasks.iter().filter(|t| matches_query(t, &query)).collect()
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

/// `query` must already be trimmed and lowercased.
fn matches_query(task: &Task, query: &str) -> bool {
    task.title.to_lowercase().contains(query)
        || task
            .description
            .as_ref()
            .is_some_and(|d| d.to_lowercase().contains(query))
        || task.tags.iter().any(|tag| tag.to_lowercase().contains(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{JsonFileStorage, STORE_FILE_NAME};
    use crate::fields::Recurrence;
    use crate::task::SubtaskDraft;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    fn quick_task(id: &str, completed: bool, priority: Priority) -> Task {
        let now = Utc.with_ymd_and_hms(2024, 12, 1, 12, 0, 0).unwrap();
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            description: None,
            completed,
            priority,
            due_date: None,
            recurrence: None,
            subtasks: Vec::new(),
            tags: Vec::new(),
            category: None,
            created_at: now,
            updated_at: now,
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn generated_ids_are_short_base36() {
        let id = generate_id();
        assert_eq!(id.len(), 9);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn add_task_assigns_generated_fields_and_defaults() {
        let mut store = TaskStore::new();
        let due = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let id = store.add_task(TaskDraft {
            title: "Write report".into(),
            description: Some("annual".into()),
            due_date: Some(due),
            recurrence: Some(Recurrence::Yearly),
            tags: vec!["work".into()],
            subtasks: vec![
                SubtaskDraft::new("outline"),
                SubtaskDraft {
                    id: Some("custom".into()),
                    title: "draft".into(),
                    completed: false,
                },
            ],
            ..TaskDraft::default()
        });

        let task = store.get_task_by_id(&id).unwrap();
        assert_eq!(task.title, "Write report");
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.completed);
        assert_eq!(task.due_date, Some(due));
        assert_eq!(task.created_at, task.updated_at);
        assert!(task.dependencies.is_empty());
        // Positional id for the subtask that arrived without one, supplied
        // id kept for the other.
        assert_eq!(task.subtasks[0].id, format!("{id}-0"));
        assert_eq!(task.subtasks[1].id, "custom");
    }

    #[test]
    fn added_ids_are_unique() {
        let mut store = TaskStore::new();
        let ids: HashSet<String> = (0..100)
            .map(|i| store.add_task(TaskDraft::new(format!("t{i}"))))
            .collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn completing_all_subtasks_completes_parent_one_directionally() {
        let mut store = TaskStore::new();
        let id = store.add_task(TaskDraft {
            title: "X".into(),
            subtasks: vec![SubtaskDraft::new("a"), SubtaskDraft::new("b")],
            ..TaskDraft::default()
        });

        store.toggle_subtask(&id, &format!("{id}-0"));
        assert!(!store.get_task_by_id(&id).unwrap().completed);

        store.toggle_subtask(&id, &format!("{id}-1"));
        assert!(store.get_task_by_id(&id).unwrap().completed);

        // Un-toggling one subtask must not reopen the parent.
        store.toggle_subtask(&id, &format!("{id}-0"));
        let task = store.get_task_by_id(&id).unwrap();
        assert!(task.completed);
        assert!(!task.subtasks[0].completed);
    }

    #[test]
    fn update_merges_field_by_field() {
        let mut store = TaskStore::new();
        let due = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let id = store.add_task(TaskDraft {
            title: "before".into(),
            description: Some("keep me".into()),
            due_date: Some(due),
            ..TaskDraft::default()
        });
        let created = store.get_task_by_id(&id).unwrap().created_at;

        store.update_task(
            &id,
            TaskPatch {
                title: Some("after".into()),
                ..TaskPatch::default()
            },
        );
        let task = store.get_task_by_id(&id).unwrap();
        assert_eq!(task.title, "after");
        assert_eq!(task.description.as_deref(), Some("keep me"));
        assert_eq!(task.due_date, Some(due));
        assert!(task.updated_at >= created);

        // An explicit clear is distinct from an absent field.
        store.update_task(
            &id,
            TaskPatch {
                due_date: Some(None),
                ..TaskPatch::default()
            },
        );
        assert_eq!(store.get_task_by_id(&id).unwrap().due_date, None);
    }

    #[test]
    fn update_backfills_subtask_ids_positionally() {
        let mut store = TaskStore::new();
        let id = store.add_task(TaskDraft::new("X"));
        store.update_task(
            &id,
            TaskPatch {
                subtasks: Some(vec![
                    SubtaskDraft {
                        id: Some("kept".into()),
                        title: "a".into(),
                        completed: true,
                    },
                    SubtaskDraft::new("b"),
                ]),
                ..TaskPatch::default()
            },
        );
        let task = store.get_task_by_id(&id).unwrap();
        assert_eq!(task.subtasks[0].id, "kept");
        assert_eq!(task.subtasks[1].id, format!("{id}-1"));
    }

    #[test]
    fn lookups_on_unknown_ids_are_silent_noops() {
        let mut store = TaskStore::new();
        let id = store.add_task(TaskDraft::new("only"));
        store.update_task("missing", TaskPatch::default());
        store.toggle_task("missing");
        store.toggle_subtask("missing", "missing-0");
        store.toggle_subtask(&id, "no-such-subtask");
        store.delete_task("missing");
        assert_eq!(store.tasks().len(), 1);
        assert!(store.get_task_by_id("missing").is_none());
    }

    #[test]
    fn delete_clears_selection_but_not_dependents() {
        let mut store = TaskStore::from_tasks(vec![
            quick_task("1", true, Priority::High),
            {
                let mut t = quick_task("2", false, Priority::Medium);
                t.dependencies = vec!["1".into()];
                t
            },
        ]);
        store.set_selected_task(Some("1".into()));
        store.delete_task("1");

        assert_eq!(store.selected_task_id(), None);
        // The dependency edge dangles rather than cascading.
        let survivor = store.get_task_by_id("2").unwrap();
        assert_eq!(survivor.dependencies, vec!["1".to_string()]);
    }

    #[test]
    fn filtered_tasks_applies_search_then_filter() {
        let mut store = TaskStore::from_tasks(vec![
            {
                let mut t = quick_task("1", false, Priority::High);
                t.title = "Ship release".into();
                t
            },
            {
                let mut t = quick_task("2", true, Priority::High);
                t.tags = vec!["release".into()];
                t
            },
            {
                let mut t = quick_task("3", false, Priority::Low);
                t.description = Some("prep release notes".into());
                t
            },
        ]);

        store.set_search_query("RELEASE");
        assert_eq!(store.filtered_tasks().len(), 3);

        store.set_filter(Filter::Focused);
        let focused: Vec<_> = store.filtered_tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(focused, vec!["1"]);

        store.set_search_query("");
        store.set_filter(Filter::Archives);
        let archived: Vec<_> = store.filtered_tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(archived, vec!["2"]);
    }

    #[test]
    fn shared_and_today_filters() {
        let mut store = TaskStore::from_tasks(vec![
            {
                let mut t = quick_task("1", false, Priority::Medium);
                t.dependencies = vec!["0".into()];
                t
            },
            {
                let mut t = quick_task("2", false, Priority::Medium);
                t.category = Some(Category::Today);
                t
            },
        ]);
        store.set_filter(Filter::Shared);
        assert_eq!(store.filtered_tasks()[0].id, "1");
        store.set_filter(Filter::Today);
        assert_eq!(store.filtered_tasks()[0].id, "2");
        assert_eq!(store.today_tasks()[0].id, "2");
    }

    #[test]
    fn task_stats_counts_priorities_for_pending_only() {
        let store = TaskStore::from_tasks(vec![
            quick_task("1", true, Priority::High),
            {
                let mut t = quick_task("2", false, Priority::Medium);
                t.dependencies = vec!["1".into()];
                t
            },
        ]);
        assert_eq!(
            store.task_stats(),
            TaskStats {
                total: 2,
                completed: 1,
                pending: 1,
                high_priority: 0,
                medium_priority: 1,
                low_priority: 0,
            }
        );
    }

    #[test]
    fn search_tasks_ignores_active_filter() {
        let mut store = TaskStore::from_tasks(vec![
            {
                let mut t = quick_task("1", true, Priority::Low);
                t.title = "Budget review".into();
                t
            },
            quick_task("2", false, Priority::Low),
        ]);
        store.set_filter(Filter::Focused);
        assert_eq!(store.search_tasks("budget").len(), 1);
        assert_eq!(store.search_tasks("   ").len(), 2);
    }

    #[test]
    fn open_falls_back_to_seed_and_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();

        let mut store = TaskStore::open(Box::new(JsonFileStorage::new(path.clone())));
        assert_eq!(store.tasks().len(), crate::db::seed_tasks().len());

        let id = store.add_task(TaskDraft::new("persisted"));

        // A fresh store over the same file sees the committed mutation.
        let reopened = TaskStore::open(Box::new(JsonFileStorage::new(path)));
        assert!(reopened.get_task_by_id(&id).is_some());
    }
}
