//! Drag-and-drop reordering.
//!
//! A gesture is `begin(source)`, any number of `hover(target, side)` /
//! `leave()` calls, then either `commit()` or `cancel()`. The index math is
//! kept separate from the gesture state so keyboard moves can share it.

/// Which side of the target row the dragged task lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropSide {
    Before,
    After,
}

/// Disambiguate the drop side from the pointer position over a row.
///
/// Pointer above the row's vertical midpoint drops before it, otherwise
/// after. Positions are terminal cells; the pointer is taken at the center
/// of its cell.
pub fn drop_side(row_top: u16, row_height: u16, pointer_y: u16) -> DropSide {
    let pointer = 2 * u32::from(pointer_y) + 1;
    let midpoint = 2 * u32::from(row_top) + u32::from(row_height);
    if pointer < midpoint {
        DropSide::Before
    } else {
        DropSide::After
    }
}

/// Final index of an item moved from `from` so that it ends up adjacent to
/// the item currently at `target`, on `side`.
///
/// Returns None when the move would leave the order unchanged.
pub fn drop_index(from: usize, target: usize, side: DropSide) -> Option<usize> {
    if from == target {
        return None;
    }
    // Removing the dragged item shifts everything after it up by one
    let target_after_removal = if from < target { target - 1 } else { target };
    let to = match side {
        DropSide::Before => target_after_removal,
        DropSide::After => target_after_removal + 1,
    };
    (to != from).then_some(to)
}

/// Move one element so that it ends at index `to`, preserving the relative
/// order of everything else.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from == to || from >= items.len() || to >= items.len() {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

/// Where a drag is currently hovering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub target_id: String,
    pub side: DropSide,
}

/// A completed gesture, ready to apply to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropCommit {
    pub source_id: String,
    pub target: DropTarget,
}

/// Gesture state for one drag at a time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        source_id: String,
        hover: Option<DropTarget>,
    },
}

impl DragState {
    pub fn begin(&mut self, source_id: &str) {
        *self = DragState::Dragging {
            source_id: source_id.to_string(),
            hover: None,
        };
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            DragState::Dragging { source_id, .. } => Some(source_id),
            DragState::Idle => None,
        }
    }

    /// Hover over a candidate row. Hovering the dragged row itself shows no cue.
    pub fn hover(&mut self, target_id: &str, side: DropSide) {
        if let DragState::Dragging { source_id, hover } = self {
            *hover = (source_id.as_str() != target_id).then(|| DropTarget {
                target_id: target_id.to_string(),
                side,
            });
        }
    }

    /// Pointer left the hovered row: drop the cue but keep dragging.
    pub fn leave(&mut self) {
        if let DragState::Dragging { hover, .. } = self {
            *hover = None;
        }
    }

    /// The cue to draw on a row, if it is the current drop target.
    pub fn cue_for(&self, task_id: &str) -> Option<DropSide> {
        match self {
            DragState::Dragging {
                hover: Some(target),
                ..
            } if target.target_id == task_id => Some(target.side),
            _ => None,
        }
    }

    /// End the gesture. Returns the drop if the pointer was over another row.
    pub fn commit(&mut self) -> Option<DropCommit> {
        match std::mem::take(self) {
            DragState::Dragging {
                source_id,
                hover: Some(target),
            } => Some(DropCommit { source_id, target }),
            _ => None,
        }
    }

    /// Abort the gesture, clearing any cue.
    pub fn cancel(&mut self) {
        *self = DragState::Idle;
    }
}
