use crate::core::path_utils;
use ignore::{WalkBuilder, overrides::OverrideBuilder};
use std::io;
use std::path::{Path, PathBuf};

/*
 * This module models the vault as seen by the rest of the application: a
 * read-only collaborator that can enumerate files and folders by their
 * vault-relative paths, classify a path as file or folder, and report the
 * vault's base directory. The trait `VaultHostOperations` is the seam used by
 * the presenter and the launcher; `CoreVaultHost` implements it on top of a
 * real directory using the `ignore` crate's walker.
 */

#[derive(Debug)]
pub enum VaultError {
    Io(io::Error),
    IgnoreError(ignore::Error),
    InvalidPath(PathBuf),
}

impl From<io::Error> for VaultError {
    fn from(err: io::Error) -> Self {
        VaultError::Io(err)
    }
}

impl From<ignore::Error> for VaultError {
    fn from(err: ignore::Error) -> Self {
        VaultError::IgnoreError(err)
    }
}

impl std::fmt::Display for VaultError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VaultError::Io(e) => write!(f, "I/O error: {e}"),
            VaultError::IgnoreError(e) => write!(f, "Ignore pattern processing error: {e}"),
            VaultError::InvalidPath(p) => write!(f, "Invalid vault path: {p:?}"),
        }
    }
}

impl std::error::Error for VaultError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VaultError::Io(e) => Some(e),
            VaultError::IgnoreError(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

/*
 * A file in the vault. `path` is vault-relative with `/` separators and is
 * unique per entry. `parent_path` is the containing folder, with the empty
 * string standing for the vault root.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultFile {
    pub path: String,
    pub name: String,
    pub parent_path: String,
}

impl VaultFile {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = match path.rfind('/') {
            Some(idx) => path[idx + 1..].to_string(),
            None => path.clone(),
        };
        let parent_path = path_utils::vault_parent(&path).to_string();
        VaultFile {
            path,
            name,
            parent_path,
        }
    }
}

/*
 * Files and non-root folders of the vault, both taken from the same walk so
 * they always agree with each other.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultSnapshot {
    pub files: Vec<VaultFile>,
    pub folders: Vec<String>,
}

/*
 * Read-only view of the vault's entry graph.
 * `snapshot` enumerates the vault at call time.
 * `entry_kind` answers for the current state of the vault; the empty path is
 * the root folder. `base_path` is absolute, or `None` when the vault is not
 * backed by an accessible directory.
 */
pub trait VaultHostOperations: Send + Sync {
    fn snapshot(&self) -> Result<VaultSnapshot>;

    fn entry_kind(&self, vault_relative: &str) -> Option<EntryKind>;

    fn base_path(&self) -> Option<PathBuf>;
}

pub struct CoreVaultHost {
    root: PathBuf,
    exclude_patterns: Vec<String>,
}

impl CoreVaultHost {
    pub fn new(root: PathBuf, exclude_patterns: Vec<String>) -> Self {
        // Editor command lines must not depend on our working directory.
        let root = match std::path::absolute(&root) {
            Ok(absolute) => absolute,
            Err(e) => {
                log::warn!("VaultHost: Could not make vault root {root:?} absolute: {e}");
                root
            }
        };
        CoreVaultHost {
            root,
            exclude_patterns,
        }
    }

    fn build_walker(&self) -> WalkBuilder {
        let mut walker_builder = WalkBuilder::new(&self.root);
        walker_builder
            .standard_filters(false)
            .hidden(true) // Skips .obsidian/, .git/, .trash/ and friends.
            .sort_by_file_path(|a, b| a.cmp(b));

        if !self.exclude_patterns.is_empty() {
            let mut override_builder = OverrideBuilder::new(&self.root);
            for pattern in &self.exclude_patterns {
                let trimmed = pattern.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    continue;
                }
                // Overrides are whitelists; a leading '!' turns them into excludes.
                let override_pattern = match trimmed.strip_prefix('!') {
                    Some(negated) if !negated.trim().is_empty() => negated.trim().to_string(),
                    Some(_) => continue,
                    None => format!("!{trimmed}"),
                };
                if let Err(err) = override_builder.add(&override_pattern) {
                    log::warn!("VaultHost: Invalid exclude pattern '{pattern}': {err}");
                }
            }
            match override_builder.build() {
                Ok(overrides) => {
                    walker_builder.overrides(overrides);
                }
                Err(err) => {
                    log::warn!("VaultHost: Failed to build overrides for exclude patterns: {err}");
                }
            }
        }
        walker_builder
    }

    // Walks the vault once, returning (vault-relative path, is_dir) pairs in path order.
    // Links count as what they point to, the same way `entry_kind` sees them.
    fn walk_entries(&self) -> Result<Vec<(String, bool)>> {
        if !self.root.is_dir() {
            return Err(VaultError::InvalidPath(self.root.clone()));
        }
        let mut entries = Vec::new();
        for entry_result in self.build_walker().build() {
            let entry = entry_result?;
            if entry.path() == self.root {
                continue;
            }
            let Some(relative) = path_utils::to_vault_relative(&self.root, entry.path()) else {
                log::warn!(
                    "VaultHost: Entry {:?} is outside vault root {:?}, skipping.",
                    entry.path(),
                    self.root
                );
                continue;
            };
            let is_dir = entry.path().is_dir();
            entries.push((relative, is_dir));
        }
        log::debug!(
            "VaultHost: Walked {} entries under {:?}.",
            entries.len(),
            self.root
        );
        Ok(entries)
    }
}

impl VaultHostOperations for CoreVaultHost {
    fn snapshot(&self) -> Result<VaultSnapshot> {
        let mut snapshot = VaultSnapshot::default();
        for (path, is_dir) in self.walk_entries()? {
            if is_dir {
                snapshot.folders.push(path);
            } else {
                snapshot.files.push(VaultFile::new(path));
            }
        }
        Ok(snapshot)
    }

    fn entry_kind(&self, vault_relative: &str) -> Option<EntryKind> {
        let absolute = path_utils::join_vault_path(&self.root, vault_relative);
        match absolute.metadata() {
            Ok(meta) if meta.is_dir() => Some(EntryKind::Folder),
            Ok(meta) if meta.is_file() => Some(EntryKind::File),
            Ok(_) => None,
            Err(e) => {
                log::debug!("VaultHost: No entry for '{vault_relative}' ({absolute:?}): {e}");
                None
            }
        }
    }

    fn base_path(&self) -> Option<PathBuf> {
        if self.root.is_dir() {
            Some(self.root.clone())
        } else {
            log::warn!("VaultHost: Vault root {:?} is not a directory.", self.root);
            None
        }
    }
}

/// Convenience for callers holding a path they want to show in messages.
pub fn describe_vault(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}
