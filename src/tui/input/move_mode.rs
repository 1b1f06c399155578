use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::reorder::DropSide;
use crate::tui::app::{Action, App, Mode};

/// Start a keyboard move of the cursor row
pub(super) fn begin_move(app: &mut App) {
    let Some(id) = app.cursor_task_id() else {
        return;
    };
    app.apply(Action::DragBegin(id));
    app.move_target = Some(app.cursor);
    app.mode = Mode::Move;
}

/// Handle a key in Move mode: the hover target follows the arrows and the
/// drop side is whichever side the task approaches from.
pub(super) fn handle_move(app: &mut App, key: KeyEvent) {
    let last = app.store.len().saturating_sub(1);
    let Some(target) = app.move_target else {
        end_move(app, Action::DragCancel);
        return;
    };
    let next = match key.code {
        KeyCode::Up | KeyCode::Char('k') => target.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => (target + 1).min(last),
        KeyCode::Home | KeyCode::Char('g') => 0,
        KeyCode::End | KeyCode::Char('G') => last,
        KeyCode::Enter | KeyCode::Char('m') => {
            end_move(app, Action::DragCommit);
            return;
        }
        KeyCode::Esc => {
            end_move(app, Action::DragCancel);
            return;
        }
        _ => return,
    };
    app.move_target = Some(next);
    hover(app, next);
}

fn hover(app: &mut App, target: usize) {
    let source = app.drag.source().and_then(|id| app.store.index_of(id));
    let (Some(source), Some(task)) = (source, app.store.tasks().get(target)) else {
        return;
    };
    if source == target {
        app.apply(Action::DragLeave);
        return;
    }
    let side = if target < source {
        DropSide::Before
    } else {
        DropSide::After
    };
    let target_id = task.id.clone();
    app.apply(Action::DragHover { target_id, side });
}

fn end_move(app: &mut App, action: Action) {
    app.apply(action);
    app.move_target = None;
    app.mode = Mode::Navigate;
}
