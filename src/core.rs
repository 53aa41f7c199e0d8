/*
 * This module consolidates the core, platform-agnostic logic of the application.
 * It re-exports the vault abstraction (`VaultHostOperations`), the selection
 * model and its toggle reducer, folder grouping for the selection dialog, path
 * resolution and process launching (`ProcessLauncherOperations`), and the
 * persisted configuration (`ConfigManagerOperations`).
 */
pub mod config;
pub mod folder_tree;
pub mod launcher;
pub mod path_utils;
pub mod selection;
pub mod vault;

pub use config::{AppConfig, ConfigManagerOperations, CoreConfigManager};

pub use folder_tree::{FolderGroup, group_files_by_parent};

pub use launcher::{
    CoreProcessLauncher, LaunchKind, LaunchOutcome, OpenError, ProcessLauncherOperations,
    resolve_open_command,
};

pub use selection::{SelectionSet, ToggleTarget, apply_toggle};

pub use vault::{CoreVaultHost, VaultHostOperations};

// Only the presenter and startup tests name these directly.
#[cfg(test)]
pub use config::ConfigError;
#[cfg(test)]
pub use launcher::{LaunchError, ResolvedCommand};
#[cfg(test)]
pub use vault::{EntryKind, VaultError, VaultFile, VaultSnapshot};
