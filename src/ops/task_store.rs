use crate::io::kv::StorageError;
use crate::io::persistence::{Persistence, TASKS_KEY};
use crate::io::recovery::{RecoveryCategory, RecoveryEntry};
use crate::model::task::{Task, fresh_id};
use crate::ops::reorder::{self, DropSide};

/// The ordered task collection and its persistence.
///
/// Every mutation is computed on a copy, written through, and only then
/// adopted, so memory never holds a state that storage rejected.
pub struct TaskStore {
    tasks: Vec<Task>,
    persistence: Persistence,
}

impl TaskStore {
    /// Load the collection from storage.
    pub fn load(mut persistence: Persistence) -> Self {
        let tasks = persistence.load_tasks();
        TaskStore { tasks, persistence }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut Persistence {
        &mut self.persistence
    }

    fn commit(&mut self, next: Vec<Task>) -> Result<(), StorageError> {
        if let Err(e) = self.persistence.save_tasks(&next) {
            self.persistence.log(
                RecoveryEntry::now(RecoveryCategory::Write, "task collection not saved")
                    .field("Key", TASKS_KEY)
                    .field("Error", e.to_string()),
            );
            return Err(e);
        }
        self.tasks = next;
        Ok(())
    }

    /// Append a new open task. Blank text is rejected with `Ok(None)`.
    pub fn add(&mut self, text: &str) -> Result<Option<Task>, StorageError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let task = Task::new(fresh_id(&self.tasks), text.to_string());
        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next)?;
        Ok(Some(task))
    }

    /// Flip a task's completion flag. Returns false if the id is unknown.
    pub fn toggle_complete(&mut self, id: &str) -> Result<bool, StorageError> {
        let Some(idx) = self.index_of(id) else {
            return Ok(false);
        };
        let mut next = self.tasks.clone();
        next[idx].completed = !next[idx].completed;
        self.commit(next)?;
        Ok(true)
    }

    /// Change a task's title.
    ///
    /// Returns false without writing when the id is unknown, the task is
    /// completed (its title is read-only), the trimmed text is blank, or the
    /// text is unchanged.
    pub fn set_text(&mut self, id: &str, new_text: &str) -> Result<bool, StorageError> {
        let new_text = new_text.trim();
        let Some(idx) = self.index_of(id) else {
            return Ok(false);
        };
        let task = &self.tasks[idx];
        if task.completed || new_text.is_empty() || task.text == new_text {
            return Ok(false);
        }
        let mut next = self.tasks.clone();
        next[idx].text = new_text.to_string();
        self.commit(next)?;
        Ok(true)
    }

    /// Replace a task's details verbatim (may be empty).
    pub fn set_details(&mut self, id: &str, details: &str) -> Result<bool, StorageError> {
        let Some(idx) = self.index_of(id) else {
            return Ok(false);
        };
        let mut next = self.tasks.clone();
        next[idx].details = details.to_string();
        self.commit(next)?;
        Ok(true)
    }

    /// Remove a task. Returns false if the id is unknown.
    pub fn delete(&mut self, id: &str) -> Result<bool, StorageError> {
        let Some(idx) = self.index_of(id) else {
            return Ok(false);
        };
        let mut next = self.tasks.clone();
        next.remove(idx);
        self.commit(next)?;
        Ok(true)
    }

    /// Move the task at `from` so it ends at index `to`.
    /// Out-of-range or identical indices are a no-op.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<bool, StorageError> {
        if from == to || from >= self.tasks.len() || to >= self.tasks.len() {
            return Ok(false);
        }
        let mut next = self.tasks.clone();
        reorder::move_item(&mut next, from, to);
        self.commit(next)?;
        Ok(true)
    }

    /// Move `source_id` next to `target_id` on `side`.
    pub fn move_beside(
        &mut self,
        source_id: &str,
        target_id: &str,
        side: DropSide,
    ) -> Result<bool, StorageError> {
        let (Some(from), Some(target)) = (self.index_of(source_id), self.index_of(target_id))
        else {
            return Ok(false);
        };
        match reorder::drop_index(from, target, side) {
            Some(to) => self.reorder(from, to),
            None => Ok(false),
        }
    }
}
