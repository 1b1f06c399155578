use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};
use crate::util::unicode;

fn mode_hint(mode: Mode) -> &'static str {
    match mode {
        Mode::Navigate => "a add  e edit  i details  m move  ? help",
        Mode::AddTask => "Enter add  Esc done",
        Mode::EditTitle | Mode::EditListTitle | Mode::EditBanner => "Enter save  Esc cancel",
        Mode::EditDetails => "Ctrl-S save  Esc cancel",
        Mode::Move => "\u{2191}\u{2193} move  Enter drop  Esc cancel",
    }
}

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let mut spans = Vec::new();
    if let Some(status) = &app.status {
        let color = if status.is_error {
            app.theme.red
        } else {
            app.theme.green
        };
        spans.push(Span::styled(
            format!(" {}", status.text),
            Style::default().fg(color).bg(bg),
        ));
    } else if app.mode == Mode::Move {
        spans.push(Span::styled(
            " MOVE",
            Style::default().fg(app.theme.highlight).bg(bg),
        ));
    }

    if app.config.ui.show_key_hints {
        let hint = mode_hint(app.mode);
        let content_width: usize = spans
            .iter()
            .map(|s| unicode::display_width(&s.content))
            .sum();
        let hint_width = unicode::display_width(hint);
        if content_width + hint_width < width {
            let padding = width - content_width - hint_width;
            spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
            spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
        }
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::app::StatusMessage;
    use crate::tui::render::test_helpers::*;

    fn status_line(app: &App) -> String {
        render_to_string(TERM_W, 1, |frame, area| {
            render_status_row(frame, app, area);
        })
    }

    #[test]
    fn navigate_hints() {
        let (app, _) = test_app();
        assert!(status_line(&app).ends_with("? help"));
    }

    #[test]
    fn hints_can_be_disabled() {
        let (mut app, _) = test_app();
        app.config.ui.show_key_hints = false;
        assert_eq!(status_line(&app), "");
    }

    #[test]
    fn error_message_shown() {
        let (mut app, _) = test_app();
        app.status = Some(StatusMessage::error("Not saved: quota"));
        let line = status_line(&app);
        assert!(line.starts_with(" Not saved: quota"));
    }

    #[test]
    fn move_mode_label() {
        let (mut app, _) = test_app();
        app.mode = Mode::Move;
        let line = status_line(&app);
        assert!(line.starts_with(" MOVE"));
        assert!(line.contains("Enter drop"));
    }
}
