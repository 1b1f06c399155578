use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    Event, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Position, Rect};

use crate::io::kv::{FileStore, StorageError};
use crate::io::persistence::{Persistence, STORE_FILE};
use crate::model::AppConfig;
use crate::ops::reorder::{DragState, DropSide};
use crate::ops::selection::{DetailMode, Selection};
use crate::ops::task_store::TaskStore;

use super::input;
use super::markdown::{CmarkRenderer, MarkdownRenderer};
use super::render;
use super::theme::Theme;
use super::view::{self, DetailRenderer, ViewModel};

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing into the new-task input line
    AddTask,
    /// Editing a task title in place
    EditTitle,
    EditListTitle,
    EditBanner,
    /// Editing the selected task's raw details
    EditDetails,
    /// Keyboard reorder of the cursor row
    Move,
}

/// A single-line text buffer with a byte-offset cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    pub text: String,
    pub cursor: usize,
}

impl EditBuffer {
    /// Buffer holding `text` with the cursor at the end
    pub fn new(text: &str) -> Self {
        EditBuffer {
            text: text.to_string(),
            cursor: text.len(),
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

/// A state change driven by user input.
///
/// Every change to the store, the selection, or the persisted settings goes
/// through `App::apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AddTask(String),
    ToggleComplete(String),
    SetText { id: String, text: String },
    DeleteTask(String),
    /// Row click: select, switch, or deselect
    SelectTask(String),
    BeginDetailsEdit,
    SaveDetails,
    CancelDetailsEdit,
    DragBegin(String),
    DragHover { target_id: String, side: DropSide },
    DragLeave,
    DragCommit,
    DragCancel,
    SetListTitle(String),
    SetBannerTitle(String),
    ToggleDetailsCollapsed,
}

/// One-line message in the status row, cleared on the next input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        StatusMessage {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        StatusMessage {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Clickable controls in the detail pane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailButton {
    Edit,
    Save,
    Cancel,
    Collapse,
}

/// Screen geometry of one list row, recorded while drawing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHit {
    pub id: String,
    /// The whole row, spacer line included
    pub area: Rect,
    pub checkbox: Rect,
    pub text: Rect,
    pub delete: Rect,
}

/// Where things were drawn on the last frame, for mouse hit-testing
#[derive(Debug, Clone, Default)]
pub struct HitMap {
    pub rows: Vec<RowHit>,
    pub banner: Rect,
    pub list_title: Rect,
    pub add_input: Rect,
    pub buttons: Vec<(Rect, DetailButton)>,
}

impl HitMap {
    pub fn row_at(&self, column: u16, row: u16) -> Option<&RowHit> {
        self.rows
            .iter()
            .find(|r| r.area.contains(Position::new(column, row)))
    }

    pub fn button_at(&self, column: u16, row: u16) -> Option<DetailButton> {
        self.buttons
            .iter()
            .find(|(area, _)| area.contains(Position::new(column, row)))
            .map(|(_, b)| *b)
    }
}

/// A left-button press on a row body that may become a click or a drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Press {
    pub id: String,
    pub column: u16,
    pub row: u16,
    pub dragging: bool,
}

/// Main application state
pub struct App {
    pub store: TaskStore,
    pub selection: Selection,
    pub drag: DragState,
    pub mode: Mode,
    pub should_quit: bool,
    pub theme: Theme,
    pub config: AppConfig,
    /// Keyboard cursor (row index), independent of the selection
    pub cursor: usize,
    /// First visible row
    pub scroll_offset: usize,
    pub list_title: String,
    pub banner_title: String,
    pub details_collapsed: bool,
    /// Buffer for the new-task line
    pub new_task: EditBuffer,
    /// Buffer for title, list title, and banner edits
    pub edit: EditBuffer,
    /// Task whose title is being edited
    pub edit_target: Option<String>,
    /// Cursor into the details draft
    pub details_cursor: usize,
    /// Row index the keyboard move is hovering
    pub move_target: Option<usize>,
    pub status: Option<StatusMessage>,
    /// A cleared stale selection, shown until the next input
    pub stale_notice: Option<String>,
    pub show_help: bool,
    pub hits: HitMap,
    pub press: Option<Press>,
    details: DetailRenderer,
}

impl App {
    pub fn new(store: TaskStore, config: AppConfig, renderer: Box<dyn MarkdownRenderer>) -> Self {
        let list_title = store
            .persistence()
            .list_title(&config.ui.default_list_title);
        let banner_title = store.persistence().banner_title(&list_title);
        let details_collapsed = store.persistence().details_collapsed();
        let theme = Theme::from_config(&config.ui);

        App {
            store,
            selection: Selection::default(),
            drag: DragState::default(),
            mode: Mode::Navigate,
            should_quit: false,
            theme,
            config,
            cursor: 0,
            scroll_offset: 0,
            list_title,
            banner_title,
            details_collapsed,
            new_task: EditBuffer::default(),
            edit: EditBuffer::default(),
            edit_target: None,
            details_cursor: 0,
            move_target: None,
            status: None,
            stale_notice: None,
            show_help: false,
            hits: HitMap::default(),
            press: None,
            details: DetailRenderer::new(renderer),
        }
    }

    /// Apply an action, surfacing a failed write in the status row.
    pub fn apply(&mut self, action: Action) {
        if let Err(e) = self.try_apply(action) {
            self.status = Some(StatusMessage::error(format!("Not saved: {}", e)));
        }
    }

    /// Apply an action. A rejected write leaves the store and settings as
    /// they were and is returned to the caller.
    pub fn try_apply(&mut self, action: Action) -> Result<(), StorageError> {
        match action {
            Action::AddTask(text) => {
                if let Some(task) = self.store.add(&text)? {
                    self.selection.focus(&task.id);
                    self.cursor = self.store.len() - 1;
                }
            }
            Action::ToggleComplete(id) => {
                self.store.toggle_complete(&id)?;
            }
            Action::SetText { id, text } => {
                self.store.set_text(&id, &text)?;
            }
            Action::DeleteTask(id) => {
                if self.store.delete(&id)? {
                    self.selection.forget(&id);
                    if self.edit_target.as_deref() == Some(id.as_str()) {
                        self.cancel_title_edit();
                    }
                    self.clamp_cursor();
                }
            }
            Action::SelectTask(id) => {
                if let Some(idx) = self.store.index_of(&id) {
                    self.cursor = idx;
                    self.selection.toggle(&id);
                    if self.mode == Mode::EditDetails {
                        self.mode = Mode::Navigate;
                    }
                }
            }
            Action::BeginDetailsEdit => {
                let details = self
                    .selection
                    .selected()
                    .and_then(|id| self.store.get(id))
                    .map(|t| t.details.clone());
                if let Some(details) = details
                    && self.selection.begin_edit(&details)
                {
                    self.details_cursor = details.len();
                    self.mode = Mode::EditDetails;
                }
            }
            Action::SaveDetails => {
                if let Some((id, draft)) = self.selection.pending_save() {
                    let (id, draft) = (id.to_string(), draft.to_string());
                    self.store.set_details(&id, &draft)?;
                    self.selection.end_edit();
                }
                if self.mode == Mode::EditDetails {
                    self.mode = Mode::Navigate;
                }
            }
            Action::CancelDetailsEdit => {
                self.selection.end_edit();
                if self.mode == Mode::EditDetails {
                    self.mode = Mode::Navigate;
                }
            }
            Action::DragBegin(id) => {
                if self.store.contains(&id) {
                    self.drag.begin(&id);
                }
            }
            Action::DragHover { target_id, side } => self.drag.hover(&target_id, side),
            Action::DragLeave => self.drag.leave(),
            Action::DragCommit => {
                if let Some(drop) = self.drag.commit() {
                    self.store.move_beside(
                        &drop.source_id,
                        &drop.target.target_id,
                        drop.target.side,
                    )?;
                    if let Some(idx) = self.store.index_of(&drop.source_id) {
                        self.cursor = idx;
                    }
                }
            }
            Action::DragCancel => self.drag.cancel(),
            Action::SetListTitle(title) => {
                let title = title.trim();
                if title.is_empty() {
                    return Ok(());
                }
                if title != self.list_title {
                    self.store.persistence_mut().set_list_title(title)?;
                    self.list_title = title.to_string();
                }
                // The banner follows list title commits, even unchanged ones
                if title != self.banner_title {
                    self.store.persistence_mut().set_banner_title(title)?;
                    self.banner_title = title.to_string();
                }
            }
            Action::SetBannerTitle(title) => {
                let title = title.trim();
                if title.is_empty() || title == self.banner_title {
                    return Ok(());
                }
                self.store.persistence_mut().set_banner_title(title)?;
                self.banner_title = title.to_string();
            }
            Action::ToggleDetailsCollapsed => {
                let collapsed = !self.details_collapsed;
                self.store
                    .persistence_mut()
                    .set_details_collapsed(collapsed)?;
                self.details_collapsed = collapsed;
            }
        }
        Ok(())
    }

    /// Project the current state for drawing.
    ///
    /// Logs what the projection found and remembers a cleared stale
    /// selection so the detail pane keeps reporting it until the next input.
    pub fn view_model(&mut self) -> ViewModel {
        let cursor = (!self.store.is_empty()).then_some(self.cursor);
        let projection = view::project(
            self.store.tasks(),
            &mut self.selection,
            &self.drag,
            cursor,
            self.stale_notice.as_deref(),
            &mut self.details,
        );
        for entry in projection.log {
            self.store.persistence().log(entry);
        }
        if let Some(id) = projection.cleared_stale {
            self.stale_notice = Some(id);
        }
        if self.mode == Mode::EditDetails && self.selection.mode() != DetailMode::Edit {
            self.mode = Mode::Navigate;
        }
        projection.view
    }

    /// Called before handling each input event.
    pub fn begin_input(&mut self) {
        self.status = None;
        self.stale_notice = None;
    }

    /// Id of the task under the keyboard cursor
    pub fn cursor_task_id(&self) -> Option<String> {
        self.store.tasks().get(self.cursor).map(|t| t.id.clone())
    }

    pub fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.store.len().saturating_sub(1));
    }

    /// Start editing a task's title. Completed tasks are read-only.
    pub fn begin_title_edit(&mut self, id: &str) -> bool {
        let Some(task) = self.store.get(id).filter(|t| !t.completed) else {
            return false;
        };
        self.edit = EditBuffer::new(&task.text);
        self.edit_target = Some(id.to_string());
        self.mode = Mode::EditTitle;
        true
    }

    pub fn cancel_title_edit(&mut self) {
        self.edit_target = None;
        self.edit.clear();
        if self.mode == Mode::EditTitle {
            self.mode = Mode::Navigate;
        }
    }

    pub fn begin_list_title_edit(&mut self) {
        self.edit = EditBuffer::new(&self.list_title);
        self.mode = Mode::EditListTitle;
    }

    pub fn begin_banner_edit(&mut self) {
        self.edit = EditBuffer::new(&self.banner_title);
        self.mode = Mode::EditBanner;
    }

    /// Commit whatever single-line edit is open, as on losing focus.
    /// Blank titles are rejected and the previous value stays.
    pub fn commit_line_edit(&mut self) {
        let text = std::mem::take(&mut self.edit).text;
        match self.mode {
            Mode::EditTitle => {
                if let Some(id) = self.edit_target.take() {
                    self.apply(Action::SetText { id, text });
                }
            }
            Mode::EditListTitle => self.apply(Action::SetListTitle(text)),
            Mode::EditBanner => self.apply(Action::SetBannerTitle(text)),
            _ => return,
        }
        self.mode = Mode::Navigate;
    }

    /// Drop an open single-line edit, keeping the stored value.
    pub fn cancel_line_edit(&mut self) {
        self.edit.clear();
        self.edit_target = None;
        if matches!(
            self.mode,
            Mode::EditTitle | Mode::EditListTitle | Mode::EditBanner
        ) {
            self.mode = Mode::Navigate;
        }
    }
}

/// Run the TUI application
pub fn run(data_dir: &Path, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(data_dir)?;
    let kv = FileStore::open(&data_dir.join(STORE_FILE))?;
    let persistence = Persistence::new(Box::new(kv)).with_log_dir(data_dir.to_path_buf());
    let store = TaskStore::load(persistence);
    let renderer = CmarkRenderer::new(&Theme::from_config(&config.ui));
    let mut app = App::new(store, config, Box::new(renderer));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key(app, key),
                Event::Mouse(mouse) => input::handle_mouse(app, mouse),
                Event::Paste(text) => input::handle_paste(app, &text),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
