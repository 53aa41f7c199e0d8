/*
 * Shared user-facing strings for the selection dialog and its notifications.
 * Messages that mention the editor are built by the handler from the
 * configured editor name.
 */

pub const SELECTION_DIALOG_TITLE: &str = "Select Files and Directories";

// Label of the folder toggle for files directly in the vault root.
pub const ROOT_FOLDER_LABEL: &str = "Root";

pub const MSG_NOTHING_SELECTED: &str = "No files or directories selected";

pub const MSG_BASE_PATH_UNAVAILABLE: &str = "Unable to get vault path";

pub fn msg_directory_opened(editor: &str) -> String {
    format!("Directory opened in {editor}")
}

pub fn msg_files_opened(editor: &str) -> String {
    format!("Files opened in {editor}")
}

pub fn msg_open_failed(editor: &str) -> String {
    format!("Failed to open in {editor}")
}
