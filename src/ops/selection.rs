/// What the detail pane shows for the selected task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailMode {
    /// Nothing selected
    #[default]
    None,
    /// Rendered, read-only details
    Preview,
    /// Raw details in an editable buffer
    Edit,
}

/// At most one selected task plus the detail pane's mode.
///
/// `mode` is `None` exactly when nothing is selected; `draft` is only
/// meaningful in `Edit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<String>,
    mode: DetailMode,
    draft: String,
}

impl Selection {
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    pub fn mode(&self) -> DetailMode {
        self.mode
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Mutable access to the draft while editing.
    pub fn draft_mut(&mut self) -> Option<&mut String> {
        (self.mode == DetailMode::Edit).then_some(&mut self.draft)
    }

    /// Row click: select, switch, or deselect when clicking the current one.
    /// Any unsaved draft is discarded.
    pub fn toggle(&mut self, id: &str) {
        if self.is_selected(id) {
            self.clear();
        } else {
            self.focus(id);
        }
    }

    /// Select `id` in preview mode regardless of the current selection.
    pub fn focus(&mut self, id: &str) {
        self.selected = Some(id.to_string());
        self.mode = DetailMode::Preview;
        self.draft.clear();
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.mode = DetailMode::None;
        self.draft.clear();
    }

    /// Enter edit mode with the draft pre-filled. Requires a selection.
    pub fn begin_edit(&mut self, current_details: &str) -> bool {
        if self.selected.is_none() {
            return false;
        }
        self.mode = DetailMode::Edit;
        self.draft = current_details.to_string();
        true
    }

    /// The task id and text to save, if editing.
    pub fn pending_save(&self) -> Option<(&str, &str)> {
        match (self.mode, self.selected.as_deref()) {
            (DetailMode::Edit, Some(id)) => Some((id, self.draft.as_str())),
            _ => None,
        }
    }

    /// Leave edit mode back to preview (after a save, or to discard).
    pub fn end_edit(&mut self) {
        if self.mode == DetailMode::Edit {
            self.mode = DetailMode::Preview;
            self.draft.clear();
        }
    }

    /// A task was deleted: drop the selection if it pointed there.
    pub fn forget(&mut self, id: &str) {
        if self.is_selected(id) {
            self.clear();
        }
    }

    /// Clear a selection whose task no longer exists.
    /// Returns the stale id when one was cleared.
    pub fn drop_stale(&mut self, exists: impl Fn(&str) -> bool) -> Option<String> {
        let stale = self.selected.as_deref().filter(|id| !exists(id))?.to_string();
        self.clear();
        Some(stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let sel = Selection::default();
        assert_eq!(sel.selected(), None);
        assert_eq!(sel.mode(), DetailMode::None);
    }

    #[test]
    fn toggle_selects_switches_and_deselects() {
        let mut sel = Selection::default();
        sel.toggle("a");
        assert_eq!(sel.selected(), Some("a"));
        assert_eq!(sel.mode(), DetailMode::Preview);

        sel.toggle("b");
        assert_eq!(sel.selected(), Some("b"));
        assert_eq!(sel.mode(), DetailMode::Preview);

        sel.toggle("b");
        assert_eq!(sel.selected(), None);
        assert_eq!(sel.mode(), DetailMode::None);
    }

    #[test]
    fn switching_discards_draft() {
        let mut sel = Selection::default();
        sel.focus("a");
        assert!(sel.begin_edit("old"));
        sel.draft_mut().unwrap().push_str(" and new");
        sel.toggle("b");
        assert_eq!(sel.mode(), DetailMode::Preview);
        assert_eq!(sel.draft(), "");
        assert_eq!(sel.pending_save(), None);
    }

    #[test]
    fn edit_requires_selection() {
        let mut sel = Selection::default();
        assert!(!sel.begin_edit("x"));
        assert_eq!(sel.mode(), DetailMode::None);
        assert!(sel.draft_mut().is_none());
    }

    #[test]
    fn edit_then_end() {
        let mut sel = Selection::default();
        sel.focus("a");
        sel.begin_edit("**bold**");
        assert_eq!(sel.pending_save(), Some(("a", "**bold**")));
        sel.end_edit();
        assert_eq!(sel.mode(), DetailMode::Preview);
        assert_eq!(sel.selected(), Some("a"));
    }

    #[test]
    fn forget_only_matching() {
        let mut sel = Selection::default();
        sel.focus("a");
        sel.forget("b");
        assert_eq!(sel.selected(), Some("a"));
        sel.forget("a");
        assert_eq!(sel.selected(), None);
        assert_eq!(sel.mode(), DetailMode::None);
    }

    #[test]
    fn drop_stale_clears_missing() {
        let mut sel = Selection::default();
        sel.focus("gone");
        assert_eq!(sel.drop_stale(|id| id == "here"), Some("gone".to_string()));
        assert_eq!(sel.mode(), DetailMode::None);

        sel.focus("here");
        assert_eq!(sel.drop_stale(|id| id == "here"), None);
        assert_eq!(sel.selected(), Some("here"));
    }
}
