use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::ops::reorder::DropSide;
use crate::tui::app::{App, Mode, RowHit};
use crate::tui::view::{ListView, RowView};
use crate::util::unicode;

/// Lines above the first row: list title, add line, blank
const HEADER_LINES: u16 = 3;
/// Each row is a content line plus a spacer line
pub const ROW_HEIGHT: u16 = 2;

const CHECKBOX_COL: u16 = 2;
const TEXT_COL: u16 = 6;
const DELETE_WIDTH: u16 = 3;

const ADD_PLACEHOLDER: &str = "Add a new task\u{2026}";

/// Render the list title, the add-task line, and one row per task
pub fn render_list_pane(frame: &mut Frame, app: &mut App, list: &ListView, area: Rect) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    render_list_title(frame, app, line_rect(area, 0));
    render_add_line(frame, app, line_rect(area, 1));

    let rows = match list {
        ListView::Empty { message } => {
            let style = Style::default().fg(app.theme.dim).bg(app.theme.background);
            frame.render_widget(
                Paragraph::new(Span::styled(format!("  {}", message), style)),
                line_rect(area, HEADER_LINES),
            );
            return;
        }
        ListView::Rows(rows) => rows,
    };

    let visible = (area.height.saturating_sub(HEADER_LINES) / ROW_HEIGHT).max(1) as usize;
    let focus = match app.mode {
        Mode::Move => app.move_target.unwrap_or(app.cursor),
        _ => app.cursor,
    };
    if focus < app.scroll_offset {
        app.scroll_offset = focus;
    } else if focus >= app.scroll_offset + visible {
        app.scroll_offset = focus + 1 - visible;
    }
    app.scroll_offset = app.scroll_offset.min(rows.len().saturating_sub(1));

    for (slot, row) in rows.iter().skip(app.scroll_offset).take(visible).enumerate() {
        let top = HEADER_LINES + slot as u16 * ROW_HEIGHT;
        let row_area = Rect::new(
            area.x,
            area.y + top,
            area.width,
            ROW_HEIGHT.min(area.height.saturating_sub(top)),
        );
        render_row(frame, app, row, row_area);
    }
}

fn line_rect(area: Rect, offset: u16) -> Rect {
    if offset >= area.height {
        return Rect::new(area.x, area.y + area.height, area.width, 0);
    }
    Rect::new(area.x, area.y + offset, area.width, 1)
}

fn render_list_title(frame: &mut Frame, app: &mut App, area: Rect) {
    let style = Style::default()
        .fg(app.theme.text_bright)
        .bg(app.theme.background)
        .add_modifier(Modifier::BOLD);
    let mut spans = vec![Span::styled(" ", style)];
    if app.mode == Mode::EditListTitle {
        spans.extend(super::edit_spans(&app.edit.text, app.edit.cursor, style));
    } else {
        let max = area.width.saturating_sub(2) as usize;
        spans.push(Span::styled(
            unicode::truncate_to_width(&app.list_title, max),
            style,
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
    app.hits.list_title = area;
}

fn render_add_line(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    let prompt = Style::default().fg(app.theme.highlight).bg(bg);
    let text = Style::default().fg(app.theme.text).bg(bg);
    let dim = Style::default().fg(app.theme.dim).bg(bg);

    let mut spans = vec![Span::styled(" + ", prompt)];
    if app.mode == Mode::AddTask {
        spans.extend(super::edit_spans(
            &app.new_task.text,
            app.new_task.cursor,
            text,
        ));
    } else if app.new_task.text.is_empty() {
        spans.push(Span::styled(ADD_PLACEHOLDER, dim));
    } else {
        spans.push(Span::styled(app.new_task.text.clone(), dim));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
    app.hits.add_input = area;
}

fn render_row(frame: &mut Frame, app: &mut App, row: &RowView, area: Rect) {
    let theme = &app.theme;
    let mut bg = theme.background;
    if row.selected {
        bg = theme.selection_bg;
    }
    if row.drop_cue == Some(DropSide::Before) {
        bg = theme.drop_cue;
    }
    let base = Style::default().fg(theme.text).bg(bg);

    let gutter = match row.drop_cue {
        Some(DropSide::Before) => Span::styled("\u{25B2}", base.fg(theme.cyan)),
        _ if row.cursor && app.mode != Mode::AddTask => {
            Span::styled("\u{25B8}", base.fg(theme.highlight))
        }
        _ => Span::styled(" ", base),
    };
    let checkbox = if row.completed { "[x]" } else { "[ ]" };
    let checkbox_style = if row.completed {
        base.fg(theme.green)
    } else {
        base.fg(theme.text_bright)
    };

    let mut text_style = if row.completed {
        base.fg(theme.dim).add_modifier(Modifier::CROSSED_OUT)
    } else if row.selected {
        base.fg(theme.text_bright)
    } else {
        base
    };
    if row.dragging {
        text_style = text_style.add_modifier(Modifier::ITALIC | Modifier::DIM);
    }

    let text_width = area.width.saturating_sub(TEXT_COL + DELETE_WIDTH + 1) as usize;
    let editing =
        app.mode == Mode::EditTitle && app.edit_target.as_deref() == Some(row.id.as_str());
    let text_spans = if editing {
        super::edit_spans(&app.edit.text, app.edit.cursor, text_style)
    } else {
        vec![Span::styled(
            unicode::truncate_to_width(&row.text, text_width),
            text_style,
        )]
    };
    let shown_width: usize = text_spans
        .iter()
        .map(|s| unicode::display_width(&s.content))
        .sum();

    let mut spans = vec![
        gutter,
        Span::styled(" ", base),
        Span::styled(checkbox, checkbox_style),
        Span::styled(" ", base),
    ];
    spans.extend(text_spans);
    let used = TEXT_COL as usize + shown_width;
    let pad = (area.width as usize).saturating_sub(used + DELETE_WIDTH as usize);
    spans.push(Span::styled(" ".repeat(pad), base));
    spans.push(Span::styled(" \u{2715} ", base.fg(theme.red)));

    let spacer = match row.drop_cue {
        Some(DropSide::After) => Line::from(Span::styled(
            format!(
                "\u{25BC}{}",
                "\u{2500}".repeat(area.width.saturating_sub(1) as usize)
            ),
            Style::default().fg(theme.cyan).bg(theme.background),
        )),
        _ => Line::default(),
    };

    frame.render_widget(
        Paragraph::new(vec![Line::from(spans), spacer]).style(Style::default().bg(theme.background)),
        area,
    );

    let y = area.y;
    app.hits.rows.push(RowHit {
        id: row.id.clone(),
        area,
        checkbox: Rect::new(area.x + CHECKBOX_COL, y, 3, 1),
        text: Rect::new(
            area.x + TEXT_COL,
            y,
            (shown_width.max(1) as u16).min(text_width.max(1) as u16),
            1,
        ),
        delete: Rect::new(
            area.right().saturating_sub(DELETE_WIDTH),
            y,
            DELETE_WIDTH,
            1,
        ),
    });
}
