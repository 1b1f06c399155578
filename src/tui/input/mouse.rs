use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use crate::ops::reorder;
use crate::tui::app::{Action, App, DetailButton, Mode, Press};
use crate::util::unicode;

/// Handle a mouse event.
///
/// A left press on a row body becomes a selection click when released on the
/// same row without moving, or a drag once the pointer moves. Presses on the
/// checkbox, the title text, or the delete control are handled on their own
/// and never select or start a drag.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (column, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => press(app, column, row),
        MouseEventKind::Drag(MouseButton::Left) => drag(app, column, row),
        MouseEventKind::Up(MouseButton::Left) => release(app, column, row),
        MouseEventKind::ScrollDown if app.mode == Mode::Navigate => {
            app.cursor = (app.cursor + 1).min(app.store.len().saturating_sub(1));
        }
        MouseEventKind::ScrollUp if app.mode == Mode::Navigate => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        _ => {}
    }
}

/// The single-line field currently being edited
fn active_field(app: &App) -> Option<Rect> {
    match app.mode {
        Mode::EditTitle => {
            let id = app.edit_target.as_deref()?;
            let hit = app.hits.rows.iter().find(|r| r.id == id)?;
            Some(Rect::new(
                hit.text.x,
                hit.text.y,
                hit.delete.x.saturating_sub(hit.text.x),
                1,
            ))
        }
        Mode::EditListTitle => Some(app.hits.list_title),
        Mode::EditBanner => Some(app.hits.banner),
        _ => None,
    }
}

fn press(app: &mut App, column: u16, row: u16) {
    app.begin_input();
    let pos = Position::new(column, row);

    if app.show_help {
        app.show_help = false;
        return;
    }
    // The keyboard move owns the drag state until it ends
    if app.mode == Mode::Move {
        return;
    }

    // Clicking inside the field being edited moves the cursor; anywhere else
    // is a blur and commits the edit.
    if matches!(
        app.mode,
        Mode::EditTitle | Mode::EditListTitle | Mode::EditBanner
    ) {
        if let Some(field) = active_field(app)
            && field.contains(pos)
        {
            // Header fields start with one cell of padding before the text
            let col = column.saturating_sub(field.x + u16::from(app.mode != Mode::EditTitle));
            app.edit.cursor = unicode::display_col_to_byte_offset(&app.edit.text, col as usize);
            return;
        }
        app.commit_line_edit();
    }
    if app.mode == Mode::AddTask && !app.hits.add_input.contains(pos) {
        app.mode = Mode::Navigate;
    }

    if let Some(button) = app.hits.button_at(column, row) {
        let action = match button {
            DetailButton::Edit => Action::BeginDetailsEdit,
            DetailButton::Save => Action::SaveDetails,
            DetailButton::Cancel => Action::CancelDetailsEdit,
            DetailButton::Collapse => Action::ToggleDetailsCollapsed,
        };
        app.apply(action);
        return;
    }
    if app.hits.banner.contains(pos) {
        app.begin_banner_edit();
        return;
    }
    if app.hits.list_title.contains(pos) {
        app.begin_list_title_edit();
        return;
    }
    if app.hits.add_input.contains(pos) {
        app.mode = Mode::AddTask;
        return;
    }

    let Some(hit) = app.hits.row_at(column, row).cloned() else {
        return;
    };
    if hit.checkbox.contains(pos) {
        app.apply(Action::ToggleComplete(hit.id));
    } else if hit.delete.contains(pos) {
        app.apply(Action::DeleteTask(hit.id));
    } else if hit.text.contains(pos) {
        // Completed titles are read-only; the click still stops here
        app.begin_title_edit(&hit.id);
    } else {
        app.press = Some(Press {
            id: hit.id,
            column,
            row,
            dragging: false,
        });
    }
}

fn drag(app: &mut App, column: u16, row: u16) {
    let Some(press) = app.press.as_mut() else {
        return;
    };
    if !press.dragging {
        if press.row == row && press.column.abs_diff(column) < 2 {
            return;
        }
        press.dragging = true;
        let id = press.id.clone();
        app.apply(Action::DragBegin(id));
    }
    hover(app, column, row);
}

fn hover(app: &mut App, column: u16, row: u16) {
    let action = match app.hits.row_at(column, row) {
        Some(hit) => Action::DragHover {
            target_id: hit.id.clone(),
            side: reorder::drop_side(hit.area.y, hit.area.height, row),
        },
        None => Action::DragLeave,
    };
    app.apply(action);
}

fn release(app: &mut App, column: u16, row: u16) {
    let Some(press) = app.press.take() else {
        return;
    };
    let over = app.hits.row_at(column, row).map(|hit| hit.id.clone());
    if press.dragging {
        if over.is_some() {
            hover(app, column, row);
            app.apply(Action::DragCommit);
        } else {
            app.apply(Action::DragCancel);
        }
    } else if over.as_deref() == Some(press.id.as_str()) {
        app.apply(Action::SelectTask(press.id));
    }
}
