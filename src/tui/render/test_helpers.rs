use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use ratatui::text::Text;

use crate::io::kv::MemoryStore;
use crate::io::persistence::Persistence;
use crate::model::AppConfig;
use crate::ops::task_store::TaskStore;
use crate::tui::app::{Action, App};
use crate::tui::markdown::{CmarkRenderer, MarkdownRenderer, RenderError};

pub const TERM_W: u16 = 100;
pub const TERM_H: u16 = 30;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// Draw the whole screen at the standard test size.
pub fn render_app(app: &mut App) -> String {
    render_to_string(TERM_W, TERM_H, |frame, _| super::render(frame, app))
}

/// An app over an empty in-memory store.
pub fn test_app() -> (App, MemoryStore) {
    test_app_with_renderer(Box::new(CmarkRenderer::default()))
}

pub fn test_app_with_renderer(renderer: Box<dyn MarkdownRenderer>) -> (App, MemoryStore) {
    let handle = MemoryStore::new();
    let store = TaskStore::load(Persistence::new(Box::new(handle.clone())));
    (App::new(store, AppConfig::default(), renderer), handle)
}

pub fn add_tasks(app: &mut App, titles: &[&str]) {
    for title in titles {
        app.apply(Action::AddTask(title.to_string()));
    }
}

/// A renderer that always fails
pub struct FailingRenderer;

impl MarkdownRenderer for FailingRenderer {
    fn render(&self, _source: &str) -> Result<Text<'static>, RenderError> {
        Err(RenderError::Failed("unsupported input".into()))
    }
}
