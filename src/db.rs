//! Durable storage for the task collection.
//!
//! The store persists exactly one JSON document, `{ "tasks": [...] }`, with
//! all date fields as ISO-8601 strings. Rehydration is deliberately
//! forgiving: a missing or malformed file is treated as absence of prior
//! state and the caller falls back to the built-in seed collection, so
//! startup never fails on bad data.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fields::{Category, Priority, Recurrence};
use crate::task::{Subtask, Task};

/// Default store file name under the data directory.
pub const STORE_FILE_NAME: &str = "tasks.json";

/// Persistence backend injected into the task store.
///
/// `load` returns `None` both when no prior state exists and when the blob
/// is malformed; the distinction never matters to the store, which seeds
/// itself either way. `save` failures are surfaced to the store, which has
/// already committed in memory and downgrades them to a warning.
pub trait Storage {
    fn load(&self) -> Option<Vec<Task>>;
    fn save(&self, tasks: &[Task]) -> anyhow::Result<()>;
}

#[derive(Deserialize)]
struct StoreFile {
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    tasks: &'a [Task],
}

/// JSON-file backend: one document per store, written atomically.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStorage { path: path.into() }
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Option<Vec<Task>> {
        if !self.path.exists() {
            return None;
        }
        let mut buf = String::new();
        match File::open(&self.path).and_then(|mut f| f.read_to_string(&mut buf)) {
            Ok(_) => match serde_json::from_str::<StoreFile>(&buf) {
                Ok(file) => {
                    debug!(path = %self.path.display(), tasks = file.tasks.len(), "loaded store");
                    Some(file.tasks)
                }
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "malformed store file, starting from seed data");
                    None
                }
            },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable store file, starting from seed data");
                None
            }
        }
    }

    /// Atomic-ish write via temp file + rename.
    fn save(&self, tasks: &[Task]) -> anyhow::Result<()> {
        let data = serde_json::to_string_pretty(&StoreFileRef { tasks })
            .context("failed to serialize task collection")?;
        let tmp = self.path.with_extension("json.tmp");
        let mut f = File::create(&tmp)
            .with_context(|| format!("failed to create {}", tmp.display()))?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        debug!(path = %self.path.display(), tasks = tasks.len(), "saved store");
        Ok(())
    }
}

fn seed_date(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn seed_subtask(id: &str, title: &str, completed: bool) -> Subtask {
    Subtask {
        id: id.to_string(),
        title: title.to_string(),
        completed,
    }
}

/// The collection a fresh store starts from when no usable prior state
/// exists: a handful of demonstration tasks covering subtasks, recurrence,
/// dependencies, and both category labels.
pub fn seed_tasks() -> Vec<Task> {
    let blank = Task {
        id: String::new(),
        title: String::new(),
        description: None,
        completed: false,
        priority: Priority::Medium,
        due_date: None,
        recurrence: None,
        subtasks: Vec::new(),
        tags: Vec::new(),
        category: None,
        created_at: DateTime::UNIX_EPOCH,
        updated_at: DateTime::UNIX_EPOCH,
        dependencies: Vec::new(),
    };

    vec![
        Task {
            id: "1".into(),
            title: "Finalize Brand Strategy".into(),
            description: Some("Complete the brand strategy document for Q4 launch".into()),
            completed: true,
            priority: Priority::High,
            due_date: Some(seed_date(2024, 12, 1, 9, 0)),
            category: Some(Category::Today),
            subtasks: vec![
                seed_subtask("1-1", "Research competitors", true),
                seed_subtask("1-2", "Define brand values", true),
                seed_subtask("1-3", "Create mood board", false),
                seed_subtask("1-4", "Write positioning statement", false),
            ],
            tags: vec!["branding".into(), "strategy".into(), "marketing".into()],
            created_at: seed_date(2024, 11, 25, 0, 0),
            updated_at: seed_date(2024, 11, 30, 0, 0),
            ..blank.clone()
        },
        Task {
            id: "2".into(),
            title: "Sync with Operations".into(),
            description: Some("Weekly sync meeting with operations team about inventory".into()),
            priority: Priority::Medium,
            recurrence: Some(Recurrence::Weekly),
            category: Some(Category::Today),
            due_date: Some(seed_date(2024, 12, 5, 14, 30)),
            dependencies: vec!["1".into()],
            tags: vec!["meeting".into(), "operations".into()],
            created_at: seed_date(2024, 11, 28, 0, 0),
            updated_at: seed_date(2024, 11, 28, 0, 0),
            ..blank.clone()
        },
        Task {
            id: "3".into(),
            title: "Review Documentation".into(),
            description: Some("Review API documentation for new microservices".into()),
            priority: Priority::Low,
            due_date: Some(seed_date(2024, 12, 2, 11, 0)),
            category: Some(Category::Today),
            tags: vec!["documentation".into(), "api".into()],
            created_at: seed_date(2024, 11, 29, 0, 0),
            updated_at: seed_date(2024, 11, 29, 0, 0),
            ..blank.clone()
        },
        Task {
            id: "4".into(),
            title: "Internal Audit Prep".into(),
            description: Some("Prepare documents for internal financial audit".into()),
            priority: Priority::Low,
            recurrence: Some(Recurrence::Monthly),
            category: Some(Category::Secondary),
            due_date: Some(seed_date(2024, 12, 15, 9, 0)),
            tags: vec!["finance".into(), "audit".into()],
            created_at: seed_date(2024, 11, 27, 0, 0),
            updated_at: seed_date(2024, 11, 27, 0, 0),
            ..blank.clone()
        },
        Task {
            id: "5".into(),
            title: "Client Strategy Meeting".into(),
            description: Some("Quarterly strategy meeting with key clients".into()),
            priority: Priority::High,
            due_date: Some(seed_date(2024, 12, 5, 9, 30)),
            category: Some(Category::Today),
            subtasks: vec![
                seed_subtask("5-1", "Prepare presentation", true),
                seed_subtask("5-2", "Review client data", false),
                seed_subtask("5-3", "Schedule follow-up", false),
            ],
            tags: vec!["client".into(), "meeting".into()],
            created_at: seed_date(2024, 11, 30, 0, 0),
            updated_at: seed_date(2024, 11, 30, 0, 0),
            ..blank.clone()
        },
        Task {
            id: "6".into(),
            title: "Team Sync: Project Phoenix".into(),
            description: Some("Weekly team sync for the Project Phoenix initiative".into()),
            priority: Priority::Medium,
            recurrence: Some(Recurrence::Weekly),
            category: Some(Category::Secondary),
            due_date: Some(seed_date(2024, 12, 6, 11, 0)),
            tags: vec!["team".into(), "sync".into()],
            created_at: seed_date(2024, 11, 28, 0, 0),
            updated_at: seed_date(2024, 11, 28, 0, 0),
            ..blank.clone()
        },
        Task {
            id: "7".into(),
            title: "Quarterly Budget Review".into(),
            description: Some("Review and adjust Q4 budget allocations".into()),
            completed: true,
            priority: Priority::Medium,
            recurrence: Some(Recurrence::Monthly),
            category: Some(Category::Secondary),
            due_date: Some(seed_date(2024, 11, 30, 8, 0)),
            tags: vec!["budget".into(), "finance".into()],
            created_at: seed_date(2024, 11, 20, 0, 0),
            updated_at: seed_date(2024, 11, 30, 0, 0),
            ..blank
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn storage_in(dir: &Path) -> JsonFileStorage {
        JsonFileStorage::new(dir.join(STORE_FILE_NAME))
    }

    #[test]
    fn missing_file_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(storage_in(dir.path()).load().is_none());
    }

    #[test]
    fn round_trip_preserves_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(dir.path());
        let tasks = seed_tasks();
        storage.save(&tasks).unwrap();
        let loaded = storage.load().unwrap();
        assert_eq!(loaded, tasks);
    }

    #[test]
    fn malformed_blob_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        fs::write(&path, "{not json").unwrap();
        assert!(JsonFileStorage::new(path).load().is_none());
    }

    #[test]
    fn missing_timestamps_default_to_now() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        fs::write(&path, r#"{"tasks":[{"id":"x","title":"bare"}]}"#).unwrap();

        let before = Utc::now();
        let loaded = JsonFileStorage::new(path).load().unwrap();
        assert_eq!(loaded.len(), 1);
        let task = &loaded[0];
        assert!(task.created_at >= before);
        assert!(task.updated_at >= before);
        assert_eq!(task.due_date, None);
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn unparseable_due_date_becomes_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        fs::write(
            &path,
            r#"{"tasks":[{"id":"x","title":"bad due","due_date":"someday"}]}"#,
        )
        .unwrap();
        let loaded = JsonFileStorage::new(path).load().unwrap();
        assert_eq!(loaded[0].due_date, None);
    }
}
