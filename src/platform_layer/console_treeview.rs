/*
 * This module provides the console rendition of the selection dialog's
 * checkbox tree. It keeps the rows of the currently shown dialog, numbered in
 * display order, applies visual-state updates from the application logic, and
 * maps the row numbers typed by the user back to `TreeItemId`s.
 */
use super::error::{PlatformError, Result as PlatformResult};
use super::types::{CheckState, TreeItemDescriptor, TreeItemId, WindowId};

use std::collections::HashMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TreeRow {
    pub(crate) item_id: TreeItemId,
    pub(crate) depth: usize,
    pub(crate) text: String,
    pub(crate) is_folder: bool,
    pub(crate) state: CheckState,
}

/// Rows of the open dialog plus the id-to-row index used for updates.
#[derive(Debug)]
pub(crate) struct TreeViewInternalState {
    pub(crate) window_id: WindowId,
    pub(crate) title: String,
    rows: Vec<TreeRow>,
    item_id_to_row: HashMap<TreeItemId, usize>,
}

impl TreeViewInternalState {
    pub(crate) fn new(window_id: WindowId, title: String, items: &[TreeItemDescriptor]) -> Self {
        let mut state = Self {
            window_id,
            title,
            rows: Vec::new(),
            item_id_to_row: HashMap::new(),
        };
        state.add_items_recursive(items, 0);
        log::debug!(
            "Platform: TreeView for {window_id:?} populated with {} rows.",
            state.rows.len()
        );
        state
    }

    fn add_items_recursive(&mut self, items: &[TreeItemDescriptor], depth: usize) {
        for item in items {
            self.item_id_to_row.insert(item.id, self.rows.len());
            self.rows.push(TreeRow {
                item_id: item.id,
                depth,
                text: item.text.clone(),
                is_folder: item.is_folder,
                state: item.state,
            });
            self.add_items_recursive(&item.children, depth + 1);
        }
    }

    pub(crate) fn update_item_state(
        &mut self,
        item_id: TreeItemId,
        new_state: CheckState,
    ) -> PlatformResult<()> {
        let row_index = *self.item_id_to_row.get(&item_id).ok_or_else(|| {
            PlatformError::InvalidHandle(format!(
                "TreeItemId {item_id:?} not found in dialog {:?}",
                self.window_id
            ))
        })?;
        self.rows[row_index].state = new_state;
        Ok(())
    }

    /*
     * Resolves a 1-based row number as shown to the user. Returns the item and
     * the state it would change to if toggled.
     */
    pub(crate) fn item_for_row_number(&self, row_number: usize) -> Option<(TreeItemId, CheckState)> {
        let row = self.rows.get(row_number.checked_sub(1)?)?;
        Some((row.item_id, row.state.toggled()))
    }

    #[cfg(test)]
    pub(crate) fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    pub(crate) fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== {} ==", self.title);
        if self.rows.is_empty() {
            let _ = writeln!(out, "  (vault is empty)");
        }
        for (index, row) in self.rows.iter().enumerate() {
            let mark = if row.state.is_checked() { 'x' } else { ' ' };
            let suffix = if row.is_folder { "/" } else { "" };
            let _ = writeln!(
                out,
                "{:>4} {}[{mark}] {}{suffix}",
                index + 1,
                "  ".repeat(row.depth),
                row.text
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_items() -> Vec<TreeItemDescriptor> {
        vec![TreeItemDescriptor {
            id: TreeItemId(1),
            text: "Root".to_string(),
            is_folder: true,
            state: CheckState::Unchecked,
            children: vec![
                TreeItemDescriptor {
                    id: TreeItemId(2),
                    text: "a.md".to_string(),
                    is_folder: false,
                    state: CheckState::Unchecked,
                    children: vec![],
                },
                TreeItemDescriptor {
                    id: TreeItemId(3),
                    text: "b.md".to_string(),
                    is_folder: false,
                    state: CheckState::Checked,
                    children: vec![],
                },
            ],
        }]
    }

    #[test]
    fn test_rows_are_flattened_depth_first() {
        let state = TreeViewInternalState::new(WindowId(1), "Select".into(), &sample_items());
        let ids: Vec<u64> = state.rows().iter().map(|r| r.item_id.0).collect();
        let depths: Vec<usize> = state.rows().iter().map(|r| r.depth).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(depths, vec![0, 1, 1]);
    }

    #[test]
    fn test_row_number_maps_to_item_and_next_state() {
        let state = TreeViewInternalState::new(WindowId(1), "Select".into(), &sample_items());
        assert_eq!(
            state.item_for_row_number(1),
            Some((TreeItemId(1), CheckState::Checked))
        );
        assert_eq!(
            state.item_for_row_number(3),
            Some((TreeItemId(3), CheckState::Unchecked))
        );
        assert_eq!(state.item_for_row_number(0), None);
        assert_eq!(state.item_for_row_number(4), None);
    }

    #[test]
    fn test_update_item_state_changes_render() {
        let mut state = TreeViewInternalState::new(WindowId(1), "Select".into(), &sample_items());
        state
            .update_item_state(TreeItemId(2), CheckState::Checked)
            .unwrap();

        let rendered = state.render();
        assert!(rendered.contains("== Select =="));
        assert!(rendered.contains("   1 [ ] Root/"));
        assert!(rendered.contains("   2   [x] a.md"));
        assert!(rendered.contains("   3   [x] b.md"));
    }

    #[test]
    fn test_update_unknown_item_is_invalid_handle() {
        let mut state = TreeViewInternalState::new(WindowId(1), "Select".into(), &sample_items());
        assert!(matches!(
            state.update_item_state(TreeItemId(99), CheckState::Checked),
            Err(PlatformError::InvalidHandle(_))
        ));
    }
}
