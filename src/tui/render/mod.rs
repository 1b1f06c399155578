pub mod detail_pane;
pub mod help_overlay;
pub mod list_pane;
pub mod status_row;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use super::app::{App, HitMap, Mode};
use crate::util::unicode;

/// Main render function: dispatches to sub-renderers
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let view = app.view_model();
    app.hits = HitMap::default();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: banner (2 rows) | content | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_banner(frame, app, chunks[0]);

    // Collapsed details give the list the full width, except while editing
    let show_details = !app.details_collapsed || app.mode == Mode::EditDetails;
    if show_details {
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);
        list_pane::render_list_pane(frame, app, &view.list, panes[0]);
        detail_pane::render_detail_pane(frame, app, &view.detail, panes[1]);
    } else {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(chunks[1]);
        list_pane::render_list_pane(frame, app, &view.list, parts[0]);
        detail_pane::render_collapsed_bar(frame, app, &view.detail, parts[1]);
    }

    if app.show_help {
        help_overlay::render_help_overlay(frame, app, area);
    }

    status_row::render_status_row(frame, app, chunks[2]);
}

/// Banner title plus a separator line
fn render_banner(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    let style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let title_line = if app.mode == Mode::EditBanner {
        let mut spans = vec![Span::styled(" ", style)];
        spans.extend(edit_spans(&app.edit.text, app.edit.cursor, style));
        Line::from(spans)
    } else {
        let text = unicode::truncate_to_width(&app.banner_title, area.width.saturating_sub(2) as usize);
        Line::from(Span::styled(format!(" {}", text), style))
    };
    let separator = Line::from(Span::styled(
        "\u{2500}".repeat(area.width as usize),
        Style::default().fg(app.theme.dim).bg(bg),
    ));
    frame.render_widget(Paragraph::new(vec![title_line, separator]), area);

    app.hits.banner = Rect::new(area.x, area.y, area.width, area.height.min(1));
}

/// Spans for an edit buffer with the cursor drawn as a reversed cell.
pub(super) fn edit_spans(text: &str, cursor: usize, style: Style) -> Vec<Span<'static>> {
    let cursor = cursor.min(text.len());
    let cursor_style = style.add_modifier(Modifier::REVERSED);
    let mut spans = Vec::new();
    if cursor > 0 {
        spans.push(Span::styled(text[..cursor].to_string(), style));
    }
    match unicode::next_grapheme_boundary(text, cursor) {
        Some(end) => {
            spans.push(Span::styled(text[cursor..end].to_string(), cursor_style));
            if end < text.len() {
                spans.push(Span::styled(text[end..].to_string(), style));
            }
        }
        None => spans.push(Span::styled(" ", cursor_style)),
    }
    spans
}

/// Compute a centered rect as a percentage of `area`
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
