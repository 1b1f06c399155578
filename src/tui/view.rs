//! Projection of store and selection state into what the screen shows.
//!
//! Nothing here draws; `render` turns a `ViewModel` into widgets. The
//! projection is rebuilt in full on every frame.

use std::collections::HashMap;

use ratatui::text::Text;

use crate::io::recovery::{RecoveryCategory, RecoveryEntry};
use crate::model::task::Task;
use crate::ops::reorder::{DragState, DropSide};
use crate::ops::selection::{DetailMode, Selection};
use crate::tui::markdown::{MarkdownRenderer, RenderError};

pub const EMPTY_LIST_MESSAGE: &str = "No tasks yet! Press a to add one.";
pub const NO_SELECTION_MESSAGE: &str = "Select a task from the list to see its details here.";
pub const STALE_SELECTION_MESSAGE: &str = "Error: Selected task not found.";
pub const NO_DETAILS_MESSAGE: &str = "No details added.";
pub const RENDER_FAILED_MESSAGE: &str = "Error rendering details.";

/// One list row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub selected: bool,
    /// Keyboard cursor is on this row
    pub cursor: bool,
    /// This row is the current drop target
    pub drop_cue: Option<DropSide>,
    /// This row is being dragged
    pub dragging: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Empty { message: &'static str },
    Rows(Vec<RowView>),
}

/// Body of the preview surface
#[derive(Debug, Clone, PartialEq)]
pub enum DetailBody {
    Rendered(Text<'static>),
    NoDetails,
    /// The renderer failed; the raw source is shown instead
    RenderFailed { error: String, raw: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    /// Nothing selected
    Empty,
    /// The selection pointed at a task that no longer exists
    Stale { id: String },
    Preview {
        title: String,
        completed: bool,
        body: DetailBody,
    },
    Edit { title: String, draft: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub list: ListView,
    pub detail: DetailView,
}

/// Result of one projection pass
#[derive(Debug)]
pub struct Projection {
    pub view: ViewModel,
    /// Selection id cleared because its task no longer exists
    pub cleared_stale: Option<String>,
    /// Recoverable failures found while projecting
    pub log: Vec<RecoveryEntry>,
}

/// Markdown renderer plus a per-task cache of its last output.
///
/// A task is re-rendered only when its details change, so a failing source
/// is reported once rather than on every frame.
pub struct DetailRenderer {
    renderer: Box<dyn MarkdownRenderer>,
    cache: HashMap<String, (String, Result<Text<'static>, RenderError>)>,
}

impl DetailRenderer {
    pub fn new(renderer: Box<dyn MarkdownRenderer>) -> Self {
        DetailRenderer {
            renderer,
            cache: HashMap::new(),
        }
    }

    fn body(&mut self, task: &Task, log: &mut Vec<RecoveryEntry>) -> DetailBody {
        if task.details.is_empty() {
            return DetailBody::NoDetails;
        }
        let fresh = !matches!(self.cache.get(&task.id), Some((source, _)) if *source == task.details);
        if fresh {
            let result = self.renderer.render(&task.details);
            if let Err(e) = &result {
                log.push(
                    RecoveryEntry::now(RecoveryCategory::Render, "details could not be rendered")
                        .field("Task", task.id.clone())
                        .field("Error", e.to_string()),
                );
            }
            self.cache
                .insert(task.id.clone(), (task.details.clone(), result));
        }
        match self.cache.get(&task.id).map(|(_, r)| r) {
            Some(Ok(text)) => DetailBody::Rendered(text.clone()),
            Some(Err(e)) => DetailBody::RenderFailed {
                error: e.to_string(),
                raw: task.details.clone(),
            },
            None => DetailBody::NoDetails,
        }
    }

    fn retain(&mut self, tasks: &[Task]) {
        self.cache.retain(|id, _| tasks.iter().any(|t| &t.id == id));
    }
}

/// Build the view model.
///
/// A selection whose task is gone is cleared here before anything is shown.
/// An empty list forces the selection to unset. `stale_notice` keeps a
/// previously cleared id on screen until the next user input.
pub fn project(
    tasks: &[Task],
    selection: &mut Selection,
    drag: &DragState,
    cursor: Option<usize>,
    stale_notice: Option<&str>,
    details: &mut DetailRenderer,
) -> Projection {
    let mut log = Vec::new();

    let cleared_stale = selection.drop_stale(|id| tasks.iter().any(|t| t.id == id));
    if let Some(id) = &cleared_stale {
        log.push(
            RecoveryEntry::now(RecoveryCategory::Selection, "selected task no longer exists")
                .field("Task", id.clone()),
        );
    }
    if tasks.is_empty() {
        selection.clear();
    }
    details.retain(tasks);

    let list = if tasks.is_empty() {
        ListView::Empty {
            message: EMPTY_LIST_MESSAGE,
        }
    } else {
        ListView::Rows(
            tasks
                .iter()
                .enumerate()
                .map(|(i, t)| RowView {
                    id: t.id.clone(),
                    text: t.text.clone(),
                    completed: t.completed,
                    selected: selection.is_selected(&t.id),
                    cursor: cursor == Some(i),
                    drop_cue: drag.cue_for(&t.id),
                    dragging: drag.source() == Some(t.id.as_str()),
                })
                .collect(),
        )
    };

    let selected = selection
        .selected()
        .and_then(|id| tasks.iter().find(|t| t.id == id));
    let detail = match (selected, selection.mode()) {
        (Some(task), DetailMode::Edit) => DetailView::Edit {
            title: task.text.clone(),
            draft: selection.draft().to_string(),
        },
        (Some(task), _) => DetailView::Preview {
            title: task.text.clone(),
            completed: task.completed,
            body: details.body(task, &mut log),
        },
        (None, _) => match cleared_stale.as_deref().or(stale_notice) {
            Some(id) => DetailView::Stale { id: id.to_string() },
            None => DetailView::Empty,
        },
    };

    Projection {
        view: ViewModel { list, detail },
        cleared_stale,
        log,
    }
}
