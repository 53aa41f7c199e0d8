/*
 * This module defines `SelectionDialogState`, the state of one selection
 * dialog session: the dialog's window id, the mapping between tree items and
 * the folder or file they stand for, and the current `SelectionSet`. It is
 * created when the dialog opens and dropped when it is confirmed or
 * cancelled, so nothing carries over between sessions.
 */
use super::ui_constants;
use crate::core::{FolderGroup, SelectionSet, ToggleTarget, apply_toggle};
use crate::platform_layer::{CheckState, TreeItemDescriptor, TreeItemId, WindowId};
use std::collections::HashMap;

#[derive(Debug)]
pub struct SelectionDialogState {
    pub window_id: WindowId,
    /* What each tree item toggles. */
    item_targets: HashMap<TreeItemId, ToggleTarget>,
    /* Vault-relative path of every rendered item to its TreeItemId. */
    path_to_tree_item_id: HashMap<String, TreeItemId>,
    next_tree_item_id_counter: u64,
    selection: SelectionSet,
}

impl SelectionDialogState {
    pub fn new(window_id: WindowId) -> Self {
        log::debug!("SelectionDialogState::new called for window_id: {window_id:?}");
        SelectionDialogState {
            window_id,
            item_targets: HashMap::new(),
            path_to_tree_item_id: HashMap::new(),
            next_tree_item_id_counter: 1,
            selection: SelectionSet::new(),
        }
    }

    fn generate_tree_item_id(&mut self) -> TreeItemId {
        let id = TreeItemId(self.next_tree_item_id_counter);
        self.next_tree_item_id_counter += 1;
        id
    }

    /*
     * Registers every folder group and its files as tree items and returns
     * the descriptors to render: one folder item per group with its files
     * nested under it, all unchecked.
     */
    pub fn build_tree_item_descriptors(&mut self, groups: &[FolderGroup]) -> Vec<TreeItemDescriptor> {
        let mut descriptors = Vec::with_capacity(groups.len());
        for group in groups {
            let folder_id = self.generate_tree_item_id();
            self.path_to_tree_item_id
                .insert(group.folder_path.clone(), folder_id);
            self.item_targets.insert(
                folder_id,
                ToggleTarget::Folder {
                    path: group.folder_path.clone(),
                    file_paths: group.file_paths(),
                },
            );

            let mut children = Vec::with_capacity(group.files.len());
            for file in &group.files {
                let file_id = self.generate_tree_item_id();
                self.path_to_tree_item_id.insert(file.path.clone(), file_id);
                self.item_targets.insert(
                    file_id,
                    ToggleTarget::File {
                        path: file.path.clone(),
                    },
                );
                children.push(TreeItemDescriptor {
                    id: file_id,
                    text: file.name.clone(),
                    is_folder: false,
                    state: CheckState::Unchecked,
                    children: Vec::new(),
                });
            }

            let text = if group.is_root() {
                ui_constants::ROOT_FOLDER_LABEL.to_string()
            } else {
                group.folder_path.clone()
            };
            descriptors.push(TreeItemDescriptor {
                id: folder_id,
                text,
                is_folder: true,
                state: CheckState::Unchecked,
                children,
            });
        }
        descriptors
    }

    /*
     * Applies a checkbox change. Returns the items whose visual state now
     * differs from before, including the toggled item itself, or `None` if
     * the item is unknown to this session.
     */
    pub fn apply_item_toggle(
        &mut self,
        item_id: TreeItemId,
        new_state: CheckState,
    ) -> Option<Vec<(TreeItemId, CheckState)>> {
        let target = self.item_targets.get(&item_id)?;
        let next = apply_toggle(&self.selection, target, new_state.is_checked());

        let mut changed: Vec<(TreeItemId, CheckState)> = self
            .path_to_tree_item_id
            .iter()
            .filter(|(path, _)| self.selection.contains(path) != next.contains(path))
            .map(|(path, id)| (*id, CheckState::from_checked(next.contains(path))))
            .collect();
        changed.sort_by_key(|(id, _)| id.0);

        self.selection = next;
        Some(changed)
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    // Ends the session, handing over the selection.
    pub fn into_selection(self) -> SelectionSet {
        self.selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{VaultFile, group_files_by_parent};

    fn dialog_with(paths: &[&str], folders: &[&str]) -> (SelectionDialogState, Vec<TreeItemDescriptor>) {
        let files: Vec<VaultFile> = paths.iter().map(|p| VaultFile::new(*p)).collect();
        let folders: Vec<String> = folders.iter().map(|f| f.to_string()).collect();
        let groups = group_files_by_parent(&files, &folders);
        let mut state = SelectionDialogState::new(WindowId(1));
        let descriptors = state.build_tree_item_descriptors(&groups);
        (state, descriptors)
    }

    #[test]
    fn test_descriptors_nest_files_under_folder_items() {
        let (_state, descriptors) = dialog_with(&["Welcome.md", "Projects/Plan.md"], &["Empty"]);

        let texts: Vec<&str> = descriptors.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["Root", "Empty", "Projects"]);
        assert!(descriptors.iter().all(|d| d.is_folder));
        assert_eq!(descriptors[0].children[0].text, "Welcome.md");
        assert!(descriptors[1].children.is_empty());
        assert_eq!(descriptors[2].children[0].text, "Plan.md");
        assert!(!descriptors[2].children[0].is_folder);
    }

    #[test]
    fn test_folder_toggle_reports_folder_and_file_updates() {
        let (mut state, descriptors) = dialog_with(&["Projects/a.md", "Projects/b.md"], &[]);
        let folder = &descriptors[0];

        let updates = state
            .apply_item_toggle(folder.id, CheckState::Checked)
            .unwrap();

        let expected: Vec<(TreeItemId, CheckState)> = vec![
            (folder.id, CheckState::Checked),
            (folder.children[0].id, CheckState::Checked),
            (folder.children[1].id, CheckState::Checked),
        ];
        assert_eq!(updates, expected);
        let selected: Vec<&str> = state.selection().iter().collect();
        assert_eq!(selected, vec!["Projects", "Projects/a.md", "Projects/b.md"]);
    }

    #[test]
    fn test_file_toggle_off_reports_only_that_file() {
        let (mut state, descriptors) = dialog_with(&["Projects/a.md", "Projects/b.md"], &[]);
        let folder = &descriptors[0];
        state.apply_item_toggle(folder.id, CheckState::Checked);

        let updates = state
            .apply_item_toggle(folder.children[1].id, CheckState::Unchecked)
            .unwrap();

        assert_eq!(updates, vec![(folder.children[1].id, CheckState::Unchecked)]);
        assert!(state.selection().contains("Projects"));
        assert!(!state.selection().contains("Projects/b.md"));
    }

    #[test]
    fn test_unknown_item_is_rejected() {
        let (mut state, _) = dialog_with(&["a.md"], &[]);
        assert!(state.apply_item_toggle(TreeItemId(999), CheckState::Checked).is_none());
        assert!(state.selection().is_empty());
    }

    #[test]
    fn test_into_selection_hands_over_paths() {
        let (mut state, descriptors) = dialog_with(&["a.md"], &[]);
        state.apply_item_toggle(descriptors[0].children[0].id, CheckState::Checked);

        let selection = state.into_selection();

        assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["a.md"]);
    }
}
