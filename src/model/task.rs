use serde::{Deserialize, Serialize};

/// A single to-do entry.
///
/// Position is not stored on the task: it is the task's index in the
/// store's ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque identifier, assigned at creation and never reassigned
    pub id: String,
    /// Task title (never empty while the task exists)
    pub text: String,
    /// Completion flag
    #[serde(default)]
    pub completed: bool,
    /// Raw markdown source for the details pane
    #[serde(default)]
    pub details: String,
}

impl Task {
    /// Create an open task with empty details
    pub fn new(id: String, text: String) -> Self {
        Task {
            id,
            text,
            completed: false,
            details: String::new(),
        }
    }
}

/// Generate a fresh task id that does not collide with any id in `existing`.
pub fn fresh_id(existing: &[Task]) -> String {
    loop {
        let id = uuid::Uuid::new_v4().simple().to_string();
        if !existing.iter().any(|t| t.id == id) {
            return id;
        }
    }
}
