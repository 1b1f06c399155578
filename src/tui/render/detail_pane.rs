use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::tui::app::{App, DetailButton};
use crate::tui::view::{
    DetailBody, DetailView, NO_DETAILS_MESSAGE, NO_SELECTION_MESSAGE, RENDER_FAILED_MESSAGE,
    STALE_SELECTION_MESSAGE,
};
use crate::util::unicode;

fn button_label(button: DetailButton) -> &'static str {
    match button {
        DetailButton::Edit => "[Edit]",
        DetailButton::Save => "[Save]",
        DetailButton::Cancel => "[Cancel]",
        DetailButton::Collapse => "[\u{2212}]",
    }
}

/// Render the detail pane for the selected task
pub fn render_detail_pane(frame: &mut Frame, app: &mut App, detail: &DetailView, area: Rect) {
    let bg = app.theme.background;
    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width < 2 {
        return;
    }

    let buttons: &[DetailButton] = match detail {
        DetailView::Preview { .. } => &[DetailButton::Edit, DetailButton::Collapse],
        DetailView::Edit { .. } => &[DetailButton::Save, DetailButton::Cancel],
        DetailView::Empty | DetailView::Stale { .. } => &[DetailButton::Collapse],
    };
    render_header(frame, app, buttons, Rect::new(inner.x, inner.y, inner.width, 1));

    let body = Rect::new(
        inner.x + 1,
        inner.y + 2,
        inner.width - 1,
        inner.height.saturating_sub(2),
    );
    if body.height == 0 {
        return;
    }

    let dim = Style::default().fg(app.theme.dim).bg(bg);
    match detail {
        DetailView::Empty => {
            frame.render_widget(
                Paragraph::new(Span::styled(NO_SELECTION_MESSAGE, dim)).wrap(Wrap { trim: true }),
                body,
            );
        }
        DetailView::Stale { .. } => {
            let red = Style::default().fg(app.theme.red).bg(bg);
            frame.render_widget(
                Paragraph::new(Span::styled(STALE_SELECTION_MESSAGE, red)).wrap(Wrap { trim: true }),
                body,
            );
        }
        DetailView::Preview {
            title,
            completed,
            body: content,
        } => {
            let mut lines = vec![title_line(app, title, *completed), Line::default()];
            lines.extend(body_lines(app, content));
            frame.render_widget(
                Paragraph::new(lines)
                    .style(Style::default().fg(app.theme.text).bg(bg))
                    .wrap(Wrap { trim: false }),
                body,
            );
        }
        DetailView::Edit { title, draft } => {
            let mut lines = vec![title_line(app, title, false), Line::default()];
            let text_style = Style::default().fg(app.theme.text_bright).bg(bg);
            let (cursor_line, line_start) = unicode::line_of_offset(draft, app.details_cursor);
            for (i, line) in draft.split('\n').enumerate() {
                if i == cursor_line {
                    lines.push(Line::from(super::edit_spans(
                        line,
                        app.details_cursor - line_start,
                        text_style,
                    )));
                } else {
                    lines.push(Line::from(Span::styled(line.to_string(), text_style)));
                }
            }
            // Keep the cursor line in view (two lines of title above the draft)
            let cursor_row = cursor_line + 2;
            let height = body.height as usize;
            let scroll = cursor_row.saturating_sub(height.saturating_sub(1));
            frame.render_widget(
                Paragraph::new(lines).scroll((scroll as u16, 0)),
                body,
            );
        }
    }
}

fn render_header(frame: &mut Frame, app: &mut App, buttons: &[DetailButton], area: Rect) {
    let bg = app.theme.background;
    let header = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let button_style = Style::default().fg(app.theme.highlight).bg(bg);

    let labels_width: u16 = buttons
        .iter()
        .map(|b| unicode::display_width(button_label(*b)) as u16 + 1)
        .sum();
    let mut spans = vec![Span::styled(" Details", header)];
    let pad = area.width.saturating_sub(8 + labels_width);
    spans.push(Span::styled(" ".repeat(pad as usize), Style::default().bg(bg)));

    let mut x = area.x + 8 + pad;
    for button in buttons {
        let label = button_label(*button);
        let width = unicode::display_width(label) as u16;
        spans.push(Span::styled(label, button_style));
        spans.push(Span::styled(" ", Style::default().bg(bg)));
        if x + width <= area.right() {
            app.hits
                .buttons
                .push((Rect::new(x, area.y, width, 1), *button));
        }
        x += width + 1;
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn title_line(app: &App, title: &str, completed: bool) -> Line<'static> {
    let mut style = Style::default()
        .fg(app.theme.highlight)
        .bg(app.theme.background)
        .add_modifier(Modifier::BOLD);
    if completed {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    Line::from(Span::styled(title.to_string(), style))
}

fn body_lines(app: &App, body: &DetailBody) -> Vec<Line<'static>> {
    let bg = app.theme.background;
    match body {
        DetailBody::Rendered(text) => text.lines.clone(),
        DetailBody::NoDetails => vec![Line::from(Span::styled(
            NO_DETAILS_MESSAGE,
            Style::default()
                .fg(app.theme.dim)
                .bg(bg)
                .add_modifier(Modifier::ITALIC),
        ))],
        DetailBody::RenderFailed { error, raw } => {
            let mut lines = vec![
                Line::from(Span::styled(
                    RENDER_FAILED_MESSAGE,
                    Style::default().fg(app.theme.red).bg(bg),
                )),
                Line::from(Span::styled(
                    error.clone(),
                    Style::default().fg(app.theme.dim).bg(bg),
                )),
                Line::default(),
            ];
            lines.extend(
                raw.lines()
                    .map(|l| Line::from(Span::styled(l.to_string(), Style::default().bg(bg)))),
            );
            lines
        }
    }
}

/// One-line stand-in for the collapsed detail pane
pub fn render_collapsed_bar(frame: &mut Frame, app: &mut App, detail: &DetailView, area: Rect) {
    let bg = app.theme.background;
    let style = Style::default().fg(app.theme.dim).bg(bg);
    let mut text = String::from(" \u{25B8} Details");
    if let DetailView::Preview { title, .. } | DetailView::Edit { title, .. } = detail {
        text.push_str(" \u{00B7} ");
        text.push_str(title);
    }
    let text = unicode::truncate_to_width(&text, area.width as usize);
    frame.render_widget(Paragraph::new(Span::styled(text, style)), area);
    app.hits.buttons.push((area, DetailButton::Collapse));
}
