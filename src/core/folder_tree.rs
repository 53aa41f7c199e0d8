use super::vault::VaultFile;
use std::collections::BTreeMap;

/*
 * Groups the vault's files by their parent folder for the selection dialog.
 * Each group becomes one folder toggle with the folder's files nested under
 * it. Only direct children are grouped; nested folders get their own group.
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderGroup {
    // Empty string for the vault root.
    pub folder_path: String,
    pub files: Vec<VaultFile>,
}

impl FolderGroup {
    pub fn is_root(&self) -> bool {
        self.folder_path.is_empty()
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/*
 * Builds one group per distinct parent path of `files`, plus an empty group
 * for every entry in `folders` that directly contains no files, so empty
 * directories stay selectable. Groups are returned sorted by folder path
 * (root first, since the empty string sorts first). Within a group, files keep
 * the order in which they appear in `files`.
 */
pub fn group_files_by_parent(files: &[VaultFile], folders: &[String]) -> Vec<FolderGroup> {
    let mut grouped: BTreeMap<String, Vec<VaultFile>> = BTreeMap::new();
    for file in files {
        grouped
            .entry(file.parent_path.clone())
            .or_default()
            .push(file.clone());
    }
    for folder in folders {
        if folder.is_empty() {
            continue;
        }
        grouped.entry(folder.clone()).or_default();
    }

    log::debug!(
        "FolderTree: Grouped {} files into {} folder groups.",
        files.len(),
        grouped.len()
    );
    grouped
        .into_iter()
        .map(|(folder_path, files)| FolderGroup { folder_path, files })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn files(paths: &[&str]) -> Vec<VaultFile> {
        paths.iter().map(|p| VaultFile::new(*p)).collect()
    }

    #[test]
    fn test_one_group_per_parent_sorted_root_first() {
        let input = files(&["b/two.md", "top.md", "a/one.md", "b/three.md"]);

        let groups = group_files_by_parent(&input, &[]);

        let keys: Vec<&str> = groups.iter().map(|g| g.folder_path.as_str()).collect();
        assert_eq!(keys, vec!["", "a", "b"]);
        assert!(groups[0].is_root());
        assert_eq!(
            groups[2].file_paths(),
            vec!["b/two.md".to_string(), "b/three.md".to_string()]
        );
    }

    #[test]
    fn test_groups_cover_every_file_exactly_once() {
        let input = files(&[
            "x.md",
            "notes/a.md",
            "notes/deep/b.md",
            "notes/c.md",
            "archive/2023/d.md",
        ]);

        let groups = group_files_by_parent(&input, &[]);

        let mut seen = HashSet::new();
        let mut total = 0;
        for group in &groups {
            for file in &group.files {
                assert_eq!(file.parent_path, group.folder_path);
                assert!(seen.insert(file.path.clone()), "duplicate {}", file.path);
                total += 1;
            }
        }
        assert_eq!(total, input.len());
        let parents: HashSet<&str> = input.iter().map(|f| f.parent_path.as_str()).collect();
        assert_eq!(groups.len(), parents.len());
    }

    #[test]
    fn test_empty_folders_get_their_own_group() {
        let input = files(&["notes/a.md"]);
        let folders = vec!["notes".to_string(), "empty".to_string(), String::new()];

        let groups = group_files_by_parent(&input, &folders);

        let keys: Vec<&str> = groups.iter().map(|g| g.folder_path.as_str()).collect();
        assert_eq!(keys, vec!["empty", "notes"]);
        assert!(groups[0].files.is_empty());
    }

    #[test]
    fn test_no_files_no_groups() {
        assert!(group_files_by_parent(&[], &[]).is_empty());
    }
}
