use super::selection_dialog_state::SelectionDialogState;
use super::ui_constants;
use crate::core::{
    AppConfig, LaunchKind, LaunchOutcome, OpenError, ProcessLauncherOperations, SelectionSet,
    VaultHostOperations, group_files_by_parent, resolve_open_command,
};
use crate::platform_layer::{
    AppEvent, AppEventSender, CheckState, MessageSeverity, PlatformCommand, PlatformEventHandler,
    TreeItemId, WindowId,
};
use std::collections::VecDeque;
use std::sync::Arc;

/*
 * Manages the application state and UI logic in a platform-agnostic manner.
 * It processes events from the platform layer, owns the state of the
 * selection dialog while one is open, and enqueues `PlatformCommand`s for the
 * platform layer to execute. The vault and the editor launcher are injected
 * through their `*Operations` traits.
 */
pub struct VaultOpenerLogic {
    vault_host: Arc<dyn VaultHostOperations>,
    launcher: Arc<dyn ProcessLauncherOperations>,
    config: AppConfig,
    event_sender: AppEventSender,
    pub(crate) dialog: Option<SelectionDialogState>,
    next_window_id_counter: usize,
    synchronous_commands: VecDeque<PlatformCommand>,
}

impl VaultOpenerLogic {
    pub fn new(
        vault_host: Arc<dyn VaultHostOperations>,
        launcher: Arc<dyn ProcessLauncherOperations>,
        config: AppConfig,
        event_sender: AppEventSender,
    ) -> Self {
        VaultOpenerLogic {
            vault_host,
            launcher,
            config,
            event_sender,
            dialog: None,
            next_window_id_counter: 1,
            synchronous_commands: VecDeque::new(),
        }
    }

    fn enqueue_command(&mut self, command: PlatformCommand) {
        self.synchronous_commands.push_back(command);
    }

    fn notify(&mut self, text: String, severity: MessageSeverity) {
        self.enqueue_command(PlatformCommand::ShowNotification { text, severity });
    }

    fn generate_window_id(&mut self) -> WindowId {
        let id = WindowId(self.next_window_id_counter);
        self.next_window_id_counter += 1;
        id
    }

    /*
     * Opens a new selection dialog session. The vault is read once here; the
     * dialog does not follow changes made to the vault while it is open.
     */
    fn handle_open_selection_dialog(&mut self) {
        if let Some(dialog) = &self.dialog {
            log::debug!(
                "AppLogic: Selection dialog {:?} already open, ignoring request.",
                dialog.window_id
            );
            return;
        }

        let snapshot = match self.vault_host.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::error!("AppLogic: Failed to read vault contents: {e}");
                self.notify(
                    format!("Failed to read vault: {e}"),
                    MessageSeverity::Error,
                );
                return;
            }
        };

        let groups = group_files_by_parent(&snapshot.files, &snapshot.folders);
        let window_id = self.generate_window_id();
        let mut dialog = SelectionDialogState::new(window_id);
        let items = dialog.build_tree_item_descriptors(&groups);
        log::info!(
            "AppLogic: Opening selection dialog {window_id:?} with {} files in {} folders.",
            snapshot.files.len(),
            groups.len()
        );
        self.dialog = Some(dialog);
        self.enqueue_command(PlatformCommand::ShowSelectionDialog {
            window_id,
            title: ui_constants::SELECTION_DIALOG_TITLE.to_string(),
            items,
        });
    }

    fn handle_tree_item_toggled(
        &mut self,
        window_id: WindowId,
        item_id: TreeItemId,
        new_state: CheckState,
    ) {
        let Some(dialog) = self.dialog.as_mut().filter(|d| d.window_id == window_id) else {
            log::warn!("AppLogic: Toggle for {item_id:?} in unknown dialog {window_id:?}.");
            return;
        };
        let Some(updates) = dialog.apply_item_toggle(item_id, new_state) else {
            log::warn!("AppLogic: Unknown TreeItemId {item_id:?} in dialog {window_id:?}.");
            return;
        };
        log::debug!(
            "AppLogic: {item_id:?} toggled to {new_state:?}; {} items change, {} paths selected.",
            updates.len(),
            dialog.selection().len()
        );
        for (update_id, state) in updates {
            self.enqueue_command(PlatformCommand::UpdateTreeItemVisualState {
                window_id,
                item_id: update_id,
                new_state: state,
            });
        }
    }

    // Ends the session for `window_id`, closing the dialog. Returns its selection.
    fn end_dialog_session(&mut self, window_id: WindowId) -> Option<SelectionSet> {
        if self.dialog.as_ref().map(|d| d.window_id) != Some(window_id) {
            log::warn!("AppLogic: Request to close unknown dialog {window_id:?}.");
            return None;
        }
        let dialog = self.dialog.take()?;
        self.enqueue_command(PlatformCommand::CloseDialog { window_id });
        Some(dialog.into_selection())
    }

    fn handle_dialog_confirmed(&mut self, window_id: WindowId) {
        let Some(selection) = self.end_dialog_session(window_id) else {
            return;
        };
        log::info!(
            "AppLogic: Dialog {window_id:?} confirmed with {} selected paths.",
            selection.len()
        );
        self.open_selection(&selection);
    }

    /*
     * Resolves the selection and dispatches at most one editor launch. Every
     * failure ends in a notification; the launch result arrives later as
     * `AppEvent::LaunchCompleted`.
     */
    fn open_selection(&mut self, selection: &SelectionSet) {
        match resolve_open_command(selection, self.vault_host.as_ref(), &self.config) {
            Ok(command) => {
                let sender = self.event_sender.clone();
                self.launcher.launch(
                    command,
                    Box::new(move |outcome| sender.send(AppEvent::LaunchCompleted { outcome })),
                );
            }
            Err(OpenError::BasePathUnavailable) => {
                log::warn!("AppLogic: Vault base path unavailable, nothing launched.");
                self.notify(
                    ui_constants::MSG_BASE_PATH_UNAVAILABLE.to_string(),
                    MessageSeverity::Error,
                );
            }
            Err(OpenError::NothingSelected) => {
                log::info!("AppLogic: Nothing selected, nothing launched.");
                self.notify(
                    ui_constants::MSG_NOTHING_SELECTED.to_string(),
                    MessageSeverity::Warning,
                );
            }
        }
    }

    fn handle_launch_completed(&mut self, outcome: LaunchOutcome) {
        let editor = self.config.editor_command.clone();
        match outcome {
            LaunchOutcome::Succeeded {
                kind: LaunchKind::Directory,
            } => self.notify(
                ui_constants::msg_directory_opened(&editor),
                MessageSeverity::Information,
            ),
            LaunchOutcome::Succeeded {
                kind: LaunchKind::Files,
            } => self.notify(
                ui_constants::msg_files_opened(&editor),
                MessageSeverity::Information,
            ),
            LaunchOutcome::Failed(e) => {
                log::error!("AppLogic: Opening in '{editor}' failed: {e}");
                self.notify(ui_constants::msg_open_failed(&editor), MessageSeverity::Error);
            }
        }
    }
}

impl PlatformEventHandler for VaultOpenerLogic {
    fn handle_event(&mut self, event: AppEvent) {
        log::trace!("AppLogic: Handling event {event:?}");
        match event {
            AppEvent::OpenSelectionDialogRequested => self.handle_open_selection_dialog(),
            AppEvent::TreeViewItemToggledByUser {
                window_id,
                item_id,
                new_state,
            } => self.handle_tree_item_toggled(window_id, item_id, new_state),
            AppEvent::DialogConfirmed { window_id } => self.handle_dialog_confirmed(window_id),
            AppEvent::DialogCancelled { window_id } => {
                if let Some(selection) = self.end_dialog_session(window_id) {
                    log::info!(
                        "AppLogic: Dialog {window_id:?} cancelled, discarding {} selected paths.",
                        selection.len()
                    );
                }
            }
            AppEvent::LaunchCompleted { outcome } => self.handle_launch_completed(outcome),
            AppEvent::QuitRequested => {
                if let Some(dialog) = self.dialog.take() {
                    self.enqueue_command(PlatformCommand::CloseDialog {
                        window_id: dialog.window_id,
                    });
                }
                self.enqueue_command(PlatformCommand::QuitApplication);
            }
        }
    }

    fn on_quit(&mut self) {
        log::debug!("AppLogic: on_quit called.");
    }

    fn try_dequeue_command(&mut self) -> Option<PlatformCommand> {
        self.synchronous_commands.pop_front()
    }
}
