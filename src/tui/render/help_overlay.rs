use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Tasks",
        &[
            (" \u{2191}\u{2193}/jk", "Move cursor"),
            (" g/G", "Jump to top/bottom"),
            (" Enter", "Select / deselect"),
            (" Space/x", "Toggle complete"),
            (" a", "Add a task"),
            (" e", "Edit title"),
            (" d/Del", "Delete task"),
            (" m", "Move task (then \u{2191}\u{2193}, Enter)"),
        ],
    ),
    (
        "Details",
        &[
            (" i", "Edit details"),
            (" Ctrl-S", "Save details"),
            (" Esc", "Cancel edit"),
            (" c", "Collapse / expand pane"),
        ],
    ),
    (
        "Titles",
        &[
            (" t", "Edit list title"),
            (" b", "Edit banner"),
        ],
    ),
    (
        "Mouse",
        &[
            (" click", "Select row, toggle box, edit title"),
            (" drag", "Reorder rows"),
        ],
    ),
    ("", &[(" ?", "Close help"), (" q", "Quit")]),
];

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let overlay_area = super::centered_rect(60, 80, area);
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(bg);
    let header_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(" Key Bindings", header_style)),
        Line::from(""),
    ];
    for (title, bindings) in SECTIONS {
        if !title.is_empty() {
            lines.push(Line::from(Span::styled(format!(" {}", title), header_style)));
        }
        for (key, desc) in *bindings {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<10}", key), key_style),
                Span::styled(*desc, desc_style),
            ]));
        }
        lines.push(Line::from(""));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.selection_border).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), overlay_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn lists_bindings() {
        let (app, _) = test_app();
        let out = render_to_string(TERM_W, 40, |frame, area| {
            render_help_overlay(frame, &app, area);
        });
        assert!(out.contains("Key Bindings"));
        assert!(out.contains("Toggle complete"));
        assert!(out.contains("Edit details"));
    }
}
