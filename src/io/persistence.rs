use std::collections::HashSet;
use std::path::PathBuf;

use serde_json::Value;

use crate::io::kv::{KeyValueStore, StorageError};
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::task::{Task, fresh_id};

/// Key holding the JSON array of tasks
pub const TASKS_KEY: &str = "todoTasks";
/// Key holding the editable list title
pub const LIST_TITLE_KEY: &str = "listTitle";
/// Key holding the banner title
pub const BANNER_TITLE_KEY: &str = "bannerTitle";
/// Key holding the details-panel collapsed flag ("true"/"false")
pub const DETAILS_COLLAPSED_KEY: &str = "detailsCollapsed";

/// File name of the key-value store inside the data directory
pub const STORE_FILE: &str = "storage.json";

/// Title used for untitled records found in storage
pub const UNTITLED: &str = "Untitled task";

/// Reads and writes the task collection and the free-standing settings
/// through a key-value store.
pub struct Persistence {
    kv: Box<dyn KeyValueStore>,
    /// Where recoverable failures are logged (None = not logged)
    log_dir: Option<PathBuf>,
}

impl Persistence {
    pub fn new(kv: Box<dyn KeyValueStore>) -> Self {
        Persistence { kv, log_dir: None }
    }

    /// Log recoverable failures to the recovery log in `dir`.
    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = Some(dir);
        self
    }

    /// Append to the recovery log, if one is attached.
    pub fn log(&self, entry: RecoveryEntry) {
        if let Some(dir) = &self.log_dir {
            recovery::log_recovery(dir, entry);
        }
    }

    // -----------------------------------------------------------------------
    // Task collection
    // -----------------------------------------------------------------------

    /// Load the task collection.
    ///
    /// Missing key: empty. Unparsable value: the key is erased, the raw value
    /// is logged, and the result is empty. Individual records are normalized
    /// (see `normalize_records`); if that changed ids or dropped records the
    /// normalized collection is written back so storage matches memory.
    pub fn load_tasks(&mut self) -> Vec<Task> {
        let Some(raw) = self.kv.get(TASKS_KEY) else {
            return Vec::new();
        };

        let records = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(records)) => records,
            Ok(other) => {
                self.discard_collection(&raw, &format!("expected array, found {}", kind(&other)));
                return Vec::new();
            }
            Err(e) => {
                self.discard_collection(&raw, &e.to_string());
                return Vec::new();
            }
        };

        let (tasks, repairs) = normalize_records(records);
        if !repairs.is_empty() {
            let entry = RecoveryEntry::now(RecoveryCategory::Parser, "repaired task records")
                .field("Key", TASKS_KEY)
                .body(repairs.join("\n"));
            self.log(entry);
            if let Err(e) = self.save_tasks(&tasks) {
                self.log(
                    RecoveryEntry::now(RecoveryCategory::Write, "could not store repaired tasks")
                        .field("Key", TASKS_KEY)
                        .field("Error", e.to_string()),
                );
            }
        }
        tasks
    }

    fn discard_collection(&mut self, raw: &str, reason: &str) {
        let removed = self.kv.remove(TASKS_KEY);
        let mut entry =
            RecoveryEntry::now(RecoveryCategory::Parser, "discarded unparsable task collection")
                .field("Key", TASKS_KEY)
                .field("Error", reason);
        if let Err(e) = removed {
            entry = entry.field("Remove failed", e.to_string());
        }
        self.log(entry.body(raw));
    }

    /// Serialize and write the task collection.
    pub fn save_tasks(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        let json = serde_json::to_string(tasks)?;
        self.kv.set(TASKS_KEY, &json)
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    /// Stored list title, or `default` when absent.
    pub fn list_title(&self, default: &str) -> String {
        self.kv
            .get(LIST_TITLE_KEY)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn set_list_title(&mut self, title: &str) -> Result<(), StorageError> {
        self.write_setting(LIST_TITLE_KEY, title)
    }

    /// Stored banner title, or the list title when absent.
    pub fn banner_title(&self, list_title: &str) -> String {
        self.kv
            .get(BANNER_TITLE_KEY)
            .unwrap_or_else(|| list_title.to_string())
    }

    pub fn set_banner_title(&mut self, title: &str) -> Result<(), StorageError> {
        self.write_setting(BANNER_TITLE_KEY, title)
    }

    /// Whether the details panel is collapsed. Anything but "true" is false.
    pub fn details_collapsed(&self) -> bool {
        self.kv.get(DETAILS_COLLAPSED_KEY).as_deref() == Some("true")
    }

    pub fn set_details_collapsed(&mut self, collapsed: bool) -> Result<(), StorageError> {
        self.write_setting(
            DETAILS_COLLAPSED_KEY,
            if collapsed { "true" } else { "false" },
        )
    }

    fn write_setting(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let result = self.kv.set(key, value);
        if let Err(e) = &result {
            self.log(
                RecoveryEntry::now(RecoveryCategory::Write, "setting not saved")
                    .field("Key", key)
                    .field("Error", e.to_string()),
            );
        }
        result
    }
}

/// Turn stored JSON records into tasks.
///
/// - `details` absent or non-string becomes empty
/// - `completed` is coerced by truthiness
/// - numeric ids are stringified; missing or duplicate ids get fresh ones
/// - missing or blank titles become `UNTITLED`
/// - non-object entries are dropped
///
/// Returns the tasks plus a description of each repair that changed identity,
/// titles, or dropped data. Filling in defaults is not reported.
pub fn normalize_records(records: Vec<Value>) -> (Vec<Task>, Vec<String>) {
    let mut tasks: Vec<Task> = Vec::with_capacity(records.len());
    let mut seen: HashSet<String> = HashSet::new();
    let mut repairs = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        let Value::Object(mut fields) = record else {
            repairs.push(format!("record {}: dropped non-object entry", index));
            continue;
        };

        let stored_id = match fields.remove("id") {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let id = match stored_id {
            Some(id) if !seen.contains(&id) => id,
            Some(dup) => {
                let id = fresh_id(&tasks);
                repairs.push(format!("record {}: duplicate id {} replaced by {}", index, dup, id));
                id
            }
            None => {
                let id = fresh_id(&tasks);
                repairs.push(format!("record {}: missing id, assigned {}", index, id));
                id
            }
        };
        seen.insert(id.clone());

        let text = match fields.remove("text") {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                repairs.push(format!("record {}: missing title", index));
                UNTITLED.to_string()
            }
        };

        let completed = fields.get("completed").is_some_and(truthy);

        let details = match fields.remove("details") {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };

        tasks.push(Task {
            id,
            text,
            completed,
            details,
        });
    }

    (tasks, repairs)
}

/// Loose truthiness for stored flags.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
