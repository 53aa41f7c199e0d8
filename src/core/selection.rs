/*
 * The per-session selection model. `SelectionSet` records which vault-relative
 * paths are currently checked, remembering the order they were checked in so
 * that later classification is deterministic. `apply_toggle` is the pure
 * reducer that turns a checkbox change into a new selection, including the
 * folder-to-file cascade.
 */
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ordered: Vec<String>,
    members: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /*
     * Adds a path. Returns false if it was already present, in which case its
     * position is left unchanged.
     */
    pub fn insert(&mut self, path: &str) -> bool {
        if !self.members.insert(path.to_string()) {
            return false;
        }
        self.ordered.push(path.to_string());
        true
    }

    pub fn remove(&mut self, path: &str) -> bool {
        if !self.members.remove(path) {
            return false;
        }
        self.ordered.retain(|p| p != path);
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.members.contains(path)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    // Paths in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }
}

/// The checkbox a user toggled, as far as selection semantics are concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleTarget {
    File {
        path: String,
    },
    /// A folder toggle and the files rendered directly beneath it.
    Folder {
        path: String,
        file_paths: Vec<String>,
    },
}

/*
 * Computes the selection after a checkbox changes to `checked`.
 *
 * A file toggle adds or removes exactly its own path. A folder toggle adds or
 * removes the folder's own path and then applies the same state to every file
 * directly under it, so a checked folder contributes both its own path and
 * each of its files' paths. The input set is left untouched.
 */
pub fn apply_toggle(current: &SelectionSet, target: &ToggleTarget, checked: bool) -> SelectionSet {
    let mut next = current.clone();
    let mut set_state = |path: &str| {
        if checked {
            next.insert(path);
        } else {
            next.remove(path);
        }
    };

    match target {
        ToggleTarget::File { path } => set_state(path),
        ToggleTarget::Folder { path, file_paths } => {
            set_state(path);
            for file_path in file_paths {
                set_state(file_path);
            }
        }
    }
    log::trace!(
        "Selection: Toggled {target:?} to {checked}; {} path(s) now selected.",
        next.len()
    );
    next
}
