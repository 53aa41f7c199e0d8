/*
 * Executes `PlatformCommand`s against the console frontend. Each command
 * updates the console window state and writes whatever the user should see to
 * the provided output stream. Unit tests for these functions are in
 * `console_executor_tests.rs`.
 */
use super::console_treeview::TreeViewInternalState;
use super::error::{PlatformError, Result as PlatformResult};
use super::types::{CheckState, MessageSeverity, PlatformCommand, TreeItemDescriptor, TreeItemId, WindowId};

use std::io::Write;

// What the console currently shows. At most one dialog is open at a time.
#[derive(Debug, Default)]
pub(crate) struct ConsoleWindowState {
    pub(crate) open_dialog: Option<TreeViewInternalState>,
    pub(crate) quit_requested: bool,
}

pub(crate) fn execute_command(
    state: &mut ConsoleWindowState,
    command: PlatformCommand,
    out: &mut dyn Write,
) -> PlatformResult<()> {
    match command {
        PlatformCommand::ShowSelectionDialog {
            window_id,
            title,
            items,
        } => execute_show_selection_dialog(state, window_id, title, &items, out),
        PlatformCommand::UpdateTreeItemVisualState {
            window_id,
            item_id,
            new_state,
        } => execute_update_tree_item_visual_state(state, window_id, item_id, new_state),
        PlatformCommand::CloseDialog { window_id } => execute_close_dialog(state, window_id, out),
        PlatformCommand::ShowNotification { text, severity } => {
            execute_show_notification(&text, severity, out)
        }
        PlatformCommand::QuitApplication => {
            log::debug!("Platform: QuitApplication received.");
            state.quit_requested = true;
            Ok(())
        }
    }
}

fn execute_show_selection_dialog(
    state: &mut ConsoleWindowState,
    window_id: WindowId,
    title: String,
    items: &[TreeItemDescriptor],
    out: &mut dyn Write,
) -> PlatformResult<()> {
    if let Some(previous) = &state.open_dialog {
        log::warn!(
            "Platform: Replacing open dialog {:?} with {window_id:?}.",
            previous.window_id
        );
    }
    let tree = TreeViewInternalState::new(window_id, title, items);
    write!(out, "{}", tree.render())?;
    writeln!(
        out,
        "Enter a row number to toggle it, 'ok' to open the selection, 'cancel' to discard it."
    )?;
    state.open_dialog = Some(tree);
    Ok(())
}

fn execute_update_tree_item_visual_state(
    state: &mut ConsoleWindowState,
    window_id: WindowId,
    item_id: TreeItemId,
    new_state: CheckState,
) -> PlatformResult<()> {
    match state.open_dialog.as_mut() {
        Some(tree) if tree.window_id == window_id => tree.update_item_state(item_id, new_state),
        _ => Err(PlatformError::InvalidHandle(format!(
            "Dialog {window_id:?} is not open"
        ))),
    }
}

fn execute_close_dialog(
    state: &mut ConsoleWindowState,
    window_id: WindowId,
    out: &mut dyn Write,
) -> PlatformResult<()> {
    match &state.open_dialog {
        Some(tree) if tree.window_id == window_id => {
            state.open_dialog = None;
            writeln!(out, "(dialog closed)")?;
            Ok(())
        }
        _ => Err(PlatformError::InvalidHandle(format!(
            "Dialog {window_id:?} is not open"
        ))),
    }
}

fn execute_show_notification(
    text: &str,
    severity: MessageSeverity,
    out: &mut dyn Write,
) -> PlatformResult<()> {
    let prefix = match severity {
        MessageSeverity::Information => "info",
        MessageSeverity::Warning => "warning",
        MessageSeverity::Error => "error",
    };
    writeln!(out, "[{prefix}] {text}")?;
    Ok(())
}
