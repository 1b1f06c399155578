use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{Action, App, Mode, StatusMessage};

use super::begin_move;

/// Handle a key in Navigate mode
pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    let last = app.store.len().saturating_sub(1);
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,

        // Cursor
        KeyCode::Down | KeyCode::Char('j') => app.cursor = (app.cursor + 1).min(last),
        KeyCode::Up | KeyCode::Char('k') => app.cursor = app.cursor.saturating_sub(1),
        KeyCode::Home | KeyCode::Char('g') => app.cursor = 0,
        KeyCode::End | KeyCode::Char('G') => app.cursor = last,

        // Row actions
        KeyCode::Enter => {
            if let Some(id) = app.cursor_task_id() {
                app.apply(Action::SelectTask(id));
            }
        }
        KeyCode::Char(' ') | KeyCode::Char('x') => {
            if let Some(id) = app.cursor_task_id() {
                app.apply(Action::ToggleComplete(id));
            }
        }
        KeyCode::Char('e') => {
            if let Some(id) = app.cursor_task_id()
                && !app.begin_title_edit(&id)
            {
                app.status = Some(StatusMessage::info("Completed tasks can't be renamed"));
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(id) = app.cursor_task_id() {
                app.apply(Action::DeleteTask(id));
            }
        }
        KeyCode::Char('m') => begin_move(app),
        KeyCode::Char('a') => app.mode = Mode::AddTask,

        // Details
        KeyCode::Char('i') => {
            if app.selection.selected().is_some() {
                app.apply(Action::BeginDetailsEdit);
            } else {
                app.status = Some(StatusMessage::info("Select a task first (Enter)"));
            }
        }
        KeyCode::Char('c') => app.apply(Action::ToggleDetailsCollapsed),
        KeyCode::Esc => {
            if let Some(id) = app.selection.selected().map(str::to_string) {
                app.apply(Action::SelectTask(id));
            }
        }

        // Titles
        KeyCode::Char('t') => app.begin_list_title_edit(),
        KeyCode::Char('b') => app.begin_banner_edit(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::ops::selection::DetailMode;
    use crate::tui::input::handle_key;
    use crate::tui::render::test_helpers::*;

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn cursor_moves_and_clamps() {
        let (mut app, _) = test_app();
        add_tasks(&mut app, &["A", "B", "C"]);
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.cursor, 0);
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.cursor, 0);
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.cursor, 2);
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('G'));
        assert_eq!(app.cursor, 2);
    }

    #[test]
    fn enter_toggles_selection_of_cursor_row() {
        let (mut app, _) = test_app();
        add_tasks(&mut app, &["A", "B"]);
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Enter);
        let a = app.store.tasks()[0].id.clone();
        assert_eq!(app.selection.selected(), Some(a.as_str()));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.selection.selected(), None);
        assert_eq!(app.selection.mode(), DetailMode::None);
    }

    #[test]
    fn space_toggles_complete_without_selecting() {
        let (mut app, _) = test_app();
        add_tasks(&mut app, &["A"]);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.selection.selected(), None);
        press(&mut app, KeyCode::Char(' '));
        assert!(app.store.tasks()[0].completed);
        assert_eq!(app.selection.selected(), None);
    }

    #[test]
    fn completed_task_title_refuses_edit() {
        let (mut app, _) = test_app();
        add_tasks(&mut app, &["A"]);
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.status.is_some());
    }

    #[test]
    fn delete_selected_row() {
        let (mut app, _) = test_app();
        add_tasks(&mut app, &["A", "B"]);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.selection.selected(), None);
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn details_edit_needs_selection() {
        let (mut app, _) = test_app();
        add_tasks(&mut app, &["A"]);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('i'));
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.status.is_some());
    }

    #[test]
    fn list_title_edit_from_keyboard() {
        let (mut app, _) = test_app();
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.mode, Mode::EditListTitle);
        for _ in 0.."My Tasks".len() {
            press(&mut app, KeyCode::Backspace);
        }
        for c in "Chores".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.list_title, "Chores");
        assert_eq!(app.banner_title, "Chores");
    }

    #[test]
    fn collapse_key() {
        let (mut app, _) = test_app();
        press(&mut app, KeyCode::Char('c'));
        assert!(app.details_collapsed);
        press(&mut app, KeyCode::Char('c'));
        assert!(!app.details_collapsed);
    }
}
