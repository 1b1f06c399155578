mod edit;
mod mouse;
mod move_mode;
mod navigate;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{Action, App, Mode};

use edit::*;
use move_mode::*;
use navigate::*;

pub use mouse::handle_mouse;

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    app.begin_input();

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Help overlay intercepts all input
    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.show_help = false;
        }
        return;
    }

    // Esc aborts a mouse drag in any mode
    if key.code == KeyCode::Esc && app.press.as_ref().is_some_and(|p| p.dragging) {
        app.press = None;
        app.apply(Action::DragCancel);
        return;
    }

    match app.mode {
        Mode::Navigate => handle_navigate(app, key),
        Mode::AddTask => handle_add_task(app, key),
        Mode::EditTitle | Mode::EditListTitle | Mode::EditBanner => handle_line_edit(app, key),
        Mode::EditDetails => handle_details_edit(app, key),
        Mode::Move => handle_move(app, key),
    }
}

/// Handle a bracketed paste event. Single-line fields get newlines folded
/// into spaces; the details editor keeps them.
pub fn handle_paste(app: &mut App, text: &str) {
    if text.is_empty() {
        return;
    }
    app.begin_input();
    match app.mode {
        Mode::AddTask => {
            let clean = single_line(text);
            insert_str(&mut app.new_task.text, &mut app.new_task.cursor, &clean);
        }
        Mode::EditTitle | Mode::EditListTitle | Mode::EditBanner => {
            let clean = single_line(text);
            insert_str(&mut app.edit.text, &mut app.edit.cursor, &clean);
        }
        Mode::EditDetails => {
            let clean = text.replace("\r\n", "\n").replace('\r', "\n");
            if let Some(draft) = app.selection.draft_mut() {
                insert_str(draft, &mut app.details_cursor, &clean);
            }
        }
        Mode::Navigate | Mode::Move => {}
    }
}

fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;
    use crate::tui::app::Press;
    use crossterm::event::KeyEventKind;

    pub(super) fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn modifier_only_keys_are_ignored() {
        let (mut app, _) = test_app();
        app.status = Some(crate::tui::app::StatusMessage::info("kept"));
        let mut ev = key(KeyCode::Modifier(crossterm::event::ModifierKeyCode::LeftShift));
        ev.kind = KeyEventKind::Press;
        handle_key(&mut app, ev);
        assert!(app.status.is_some());
    }

    #[test]
    fn help_overlay_swallows_keys() {
        let (mut app, _) = test_app();
        handle_key(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key(&mut app, key(KeyCode::Char('a')));
        assert_eq!(app.mode, Mode::Navigate);
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(!app.show_help);
    }

    #[test]
    fn ctrl_c_quits() {
        let (mut app, _) = test_app();
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn paste_into_fields() {
        let (mut app, _) = test_app();
        app.mode = Mode::AddTask;
        handle_paste(&mut app, "two\nlines");
        assert_eq!(app.new_task.text, "two lines");

        add_tasks(&mut app, &["T"]);
        app.mode = Mode::Navigate;
        app.apply(Action::BeginDetailsEdit);
        handle_paste(&mut app, "a\r\nb");
        assert_eq!(app.selection.draft(), "a\nb");
        assert_eq!(app.details_cursor, 3);
    }

    #[test]
    fn esc_cancels_drag_but_keeps_plain_press() {
        let (mut app, _) = test_app();
        add_tasks(&mut app, &["A", "B"]);
        let a = app.store.tasks()[0].id.clone();
        app.press = Some(Press {
            id: a.clone(),
            column: 4,
            row: 5,
            dragging: false,
        });
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(app.press.is_some());

        app.apply(Action::DragBegin(a.clone()));
        if let Some(press) = app.press.as_mut() {
            press.dragging = true;
        }
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(app.press.is_none());
        assert_eq!(app.drag.source(), None);
    }
}
