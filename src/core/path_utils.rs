/*
 * Path helpers shared by the core. Covers two concerns: locating the
 * application's local configuration directory, and translating vault-relative
 * `/`-separated paths to and from absolute filesystem paths.
 */
use directories::ProjectDirs;
use std::fs;
use std::path::{Component, Path, PathBuf};

/*
 * Retrieves the application's local configuration directory, creating it if
 * needed. Returns `None` if `ProjectDirs` cannot determine a location for the
 * current user or the directory cannot be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Attempting to get base app config local dir for '{app_name}'");
    ProjectDirs::from("", "", app_name).and_then(|proj_dirs| {
        let config_path = proj_dirs.config_local_dir();
        if !config_path.exists() {
            if let Err(e) = fs::create_dir_all(config_path) {
                log::error!(
                    "PathUtils: Failed to create base app config directory {config_path:?}: {e}"
                );
                return None;
            }
            log::debug!("PathUtils: Created base app config directory: {config_path:?}");
        }
        Some(config_path.to_path_buf())
    })
}

/*
 * Joins a vault-relative path onto the vault's base filesystem path.
 * The relative path is split on `/` and each non-empty segment is pushed, so
 * the result uses the platform separator. The empty string denotes the vault
 * root and yields `base_path` unchanged.
 */
pub fn join_vault_path(base_path: &Path, vault_relative: &str) -> PathBuf {
    let mut joined = base_path.to_path_buf();
    for segment in vault_relative.split('/').filter(|s| !s.is_empty()) {
        joined.push(segment);
    }
    joined
}

/*
 * Converts an absolute path below `root` into its vault-relative form using
 * `/` separators. Returns `None` if `path` is not inside `root`.
 */
pub fn to_vault_relative(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(segments.join("/"))
}

/// Parent of a vault-relative path; `""` for entries directly in the root.
pub fn vault_parent(vault_relative: &str) -> &str {
    match vault_relative.rfind('/') {
        Some(idx) => &vault_relative[..idx],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_vault_path_nested() {
        let base = PathBuf::from("/home/user/vault");
        let joined = join_vault_path(&base, "projects/alpha/notes.md");
        assert_eq!(
            joined,
            base.join("projects").join("alpha").join("notes.md")
        );
    }

    #[test]
    fn test_join_vault_path_root_is_base() {
        let base = PathBuf::from("/home/user/vault");
        assert_eq!(join_vault_path(&base, ""), base);
    }

    #[test]
    fn test_join_vault_path_keeps_spaces_in_names() {
        let base = PathBuf::from("/vault");
        let joined = join_vault_path(&base, "My Folder/Daily note.md");
        assert_eq!(joined, base.join("My Folder").join("Daily note.md"));
    }

    #[test]
    fn test_to_vault_relative_uses_forward_slashes() {
        let root = PathBuf::from("/vault");
        let path = root.join("a").join("b").join("c.md");
        assert_eq!(to_vault_relative(&root, &path), Some("a/b/c.md".to_string()));
        assert_eq!(to_vault_relative(&root, &root), Some(String::new()));
    }

    #[test]
    fn test_to_vault_relative_outside_root() {
        let root = PathBuf::from("/vault");
        assert_eq!(to_vault_relative(&root, Path::new("/elsewhere/x.md")), None);
    }

    #[test]
    fn test_vault_parent() {
        assert_eq!(vault_parent("a/b/c.md"), "a/b");
        assert_eq!(vault_parent("top.md"), "");
        assert_eq!(vault_parent(""), "");
    }

    #[test]
    fn test_get_base_app_config_local_dir_creates_if_not_exists() {
        let unique_app_name = format!("TestApp_VaultOpener_{}", rand::random::<u128>());

        let path = match get_base_app_config_local_dir(&unique_app_name) {
            Some(path) => path,
            // No home directory in this environment; nothing to verify.
            None => return,
        };
        assert!(path.is_dir(), "Directory should have been created at {path:?}");
        assert!(
            path.to_string_lossy()
                .to_lowercase()
                .contains(&unique_app_name.to_lowercase())
        );

        if let Err(e) = fs::remove_dir_all(&path) {
            eprintln!("Test cleanup error for {}: {e}", path.display());
        }
    }
}
