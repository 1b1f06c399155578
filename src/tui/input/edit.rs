use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{Action, App, Mode};
use crate::util::unicode;

/// Insert `s` at the cursor and move past it.
pub(super) fn insert_str(text: &mut String, cursor: &mut usize, s: &str) {
    let at = (*cursor).min(text.len());
    text.insert_str(at, s);
    *cursor = at + s.len();
}

/// Offer a key to a text buffer. Returns false if the key is not an
/// editing key, leaving the buffer untouched.
pub(super) fn edit_text(text: &mut String, cursor: &mut usize, key: KeyEvent, multiline: bool) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    *cursor = (*cursor).min(text.len());
    let (_, line_start) = unicode::line_of_offset(text, *cursor);
    let line_end = text[*cursor..]
        .find('\n')
        .map_or(text.len(), |i| *cursor + i);

    match key.code {
        KeyCode::Char('a') if ctrl => *cursor = line_start,
        KeyCode::Char('e') if ctrl => *cursor = line_end,
        KeyCode::Char('u') if ctrl => {
            text.replace_range(line_start..*cursor, "");
            *cursor = line_start;
        }
        KeyCode::Char(_) if ctrl || key.modifiers.contains(KeyModifiers::ALT) => return false,
        KeyCode::Char(c) => {
            let mut buf = [0u8; 4];
            insert_str(text, cursor, c.encode_utf8(&mut buf));
        }
        KeyCode::Enter if multiline => insert_str(text, cursor, "\n"),
        KeyCode::Backspace => {
            if let Some(prev) = unicode::prev_grapheme_boundary(text, *cursor) {
                text.replace_range(prev..*cursor, "");
                *cursor = prev;
            }
        }
        KeyCode::Delete => {
            if let Some(next) = unicode::next_grapheme_boundary(text, *cursor) {
                text.replace_range(*cursor..next, "");
            }
        }
        KeyCode::Left => {
            if let Some(prev) = unicode::prev_grapheme_boundary(text, *cursor) {
                *cursor = prev;
            }
        }
        KeyCode::Right => {
            if let Some(next) = unicode::next_grapheme_boundary(text, *cursor) {
                *cursor = next;
            }
        }
        KeyCode::Home => *cursor = line_start,
        KeyCode::End => *cursor = line_end,
        KeyCode::Up if multiline => {
            if let Some(pos) = unicode::vertical_offset(text, *cursor, true) {
                *cursor = pos;
            }
        }
        KeyCode::Down if multiline => {
            if let Some(pos) = unicode::vertical_offset(text, *cursor, false) {
                *cursor = pos;
            }
        }
        _ => return false,
    }
    true
}

/// New-task input line: Enter adds and clears, Esc leaves the line.
pub(super) fn handle_add_task(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            let text = app.new_task.text.clone();
            if text.trim().is_empty() {
                app.new_task.clear();
                return;
            }
            let before = app.store.len();
            app.apply(Action::AddTask(text));
            // Keep the text if the write failed
            if app.store.len() > before {
                app.new_task.clear();
            }
        }
        KeyCode::Esc => app.mode = Mode::Navigate,
        _ => {
            edit_text(
                &mut app.new_task.text,
                &mut app.new_task.cursor,
                key,
                false,
            );
        }
    }
}

/// Task title, list title, and banner edits: Enter commits, Esc reverts.
pub(super) fn handle_line_edit(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.commit_line_edit(),
        KeyCode::Esc => app.cancel_line_edit(),
        _ => {
            edit_text(&mut app.edit.text, &mut app.edit.cursor, key, false);
        }
    }
}

/// Details editor: Ctrl-S saves, Esc discards the draft.
pub(super) fn handle_details_edit(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.apply(Action::SaveDetails);
        }
        KeyCode::Esc => app.apply(Action::CancelDetailsEdit),
        _ => {
            if let Some(draft) = app.selection.draft_mut() {
                edit_text(draft, &mut app.details_cursor, key, true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::selection::DetailMode;
    use crate::tui::input::handle_key;
    use crate::tui::render::test_helpers::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            handle_key(app, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn single_line_editing_keys() {
        let mut text = String::from("hello");
        let mut cursor = 5;
        assert!(edit_text(&mut text, &mut cursor, key(KeyCode::Backspace), false));
        assert_eq!((text.as_str(), cursor), ("hell", 4));
        edit_text(&mut text, &mut cursor, key(KeyCode::Home), false);
        edit_text(&mut text, &mut cursor, key(KeyCode::Char('>')), false);
        assert_eq!((text.as_str(), cursor), (">hell", 1));
        edit_text(&mut text, &mut cursor, key(KeyCode::Delete), false);
        assert_eq!(text, ">ell");
        edit_text(&mut text, &mut cursor, key(KeyCode::End), false);
        assert_eq!(cursor, 4);
        assert!(!edit_text(&mut text, &mut cursor, key(KeyCode::Enter), false));
        assert!(!edit_text(&mut text, &mut cursor, key(KeyCode::Up), false));
    }

    #[test]
    fn multiline_editing_keys() {
        let mut text = String::from("ab");
        let mut cursor = 2;
        edit_text(&mut text, &mut cursor, key(KeyCode::Enter), true);
        edit_text(&mut text, &mut cursor, key(KeyCode::Char('c')), true);
        assert_eq!(text, "ab\nc");
        edit_text(&mut text, &mut cursor, key(KeyCode::Up), true);
        assert_eq!(cursor, 1);
        edit_text(&mut text, &mut cursor, ctrl('e'), true);
        assert_eq!(cursor, 2);
        edit_text(&mut text, &mut cursor, key(KeyCode::Down), true);
        assert_eq!(cursor, 4);
        edit_text(&mut text, &mut cursor, ctrl('u'), true);
        assert_eq!(text, "ab\n");
    }

    #[test]
    fn graphemes_deleted_whole() {
        let mut text = String::from("ae\u{301}");
        let mut cursor = text.len();
        edit_text(&mut text, &mut cursor, key(KeyCode::Backspace), false);
        assert_eq!(text, "a");
    }

    #[test]
    fn add_line_adds_selects_and_clears() {
        let (mut app, _) = test_app();
        handle_key(&mut app, key(KeyCode::Char('a')));
        assert_eq!(app.mode, Mode::AddTask);
        type_str(&mut app, "Buy milk");
        handle_key(&mut app, key(KeyCode::Enter));

        assert_eq!(app.store.len(), 1);
        assert_eq!(app.store.tasks()[0].text, "Buy milk");
        assert_eq!(app.new_task.text, "");
        assert_eq!(app.selection.mode(), DetailMode::Preview);
        assert_eq!(app.mode, Mode::AddTask);

        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Navigate);
    }

    #[test]
    fn add_line_keeps_text_when_write_fails() {
        let (mut app, handle) = test_app();
        handle.set_quota(Some(1));
        app.mode = Mode::AddTask;
        type_str(&mut app, "Too much");
        handle_key(&mut app, key(KeyCode::Enter));
        assert!(app.store.is_empty());
        assert_eq!(app.new_task.text, "Too much");
        assert!(app.status.as_ref().is_some_and(|s| s.is_error));
    }

    #[test]
    fn title_edit_escape_reverts() {
        let (mut app, _) = test_app();
        add_tasks(&mut app, &["Original"]);
        handle_key(&mut app, key(KeyCode::Char('e')));
        assert_eq!(app.mode, Mode::EditTitle);
        type_str(&mut app, " changed");
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.store.tasks()[0].text, "Original");
        assert_eq!(app.mode, Mode::Navigate);
    }

    #[test]
    fn title_edit_enter_commits() {
        let (mut app, _) = test_app();
        add_tasks(&mut app, &["Original"]);
        handle_key(&mut app, key(KeyCode::Char('e')));
        type_str(&mut app, "!");
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.store.tasks()[0].text, "Original!");
    }

    #[test]
    fn details_edit_save_and_cancel() {
        let (mut app, _) = test_app();
        add_tasks(&mut app, &["T"]);
        handle_key(&mut app, key(KeyCode::Char('i')));
        assert_eq!(app.mode, Mode::EditDetails);
        type_str(&mut app, "line one");
        handle_key(&mut app, key(KeyCode::Enter));
        type_str(&mut app, "two");
        handle_key(&mut app, ctrl('s'));
        assert_eq!(app.store.tasks()[0].details, "line one\ntwo");
        assert_eq!(app.mode, Mode::Navigate);

        handle_key(&mut app, key(KeyCode::Char('i')));
        type_str(&mut app, " discarded");
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.store.tasks()[0].details, "line one\ntwo");
        assert_eq!(app.selection.mode(), DetailMode::Preview);
    }
}
