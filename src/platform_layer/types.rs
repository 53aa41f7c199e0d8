/*
 * This module defines the data types exchanged between the application logic
 * and the platform layer: identifiers for dialogs and tree items, the
 * description of the checkbox tree to render, platform-agnostic events
 * (`AppEvent`), commands for the platform layer (`PlatformCommand`), and the
 * `PlatformEventHandler` trait the application logic implements.
 */

use crate::core::LaunchOutcome;

// An opaque identifier for a dialog window, handed out by the application logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub(crate) usize);

// An opaque identifier for a checkbox item within the selection tree.
//
// Generated by the application logic for every folder and file toggle of a
// dialog session and used in both commands and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeItemId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Checked,
    Unchecked,
}

impl CheckState {
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    }

    pub fn is_checked(self) -> bool {
        self == CheckState::Checked
    }

    pub fn toggled(self) -> Self {
        match self {
            CheckState::Checked => CheckState::Unchecked,
            CheckState::Unchecked => CheckState::Checked,
        }
    }
}

// Describes a single checkbox in the selection tree and the items nested under it.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeItemDescriptor {
    pub id: TreeItemId,
    pub text: String,
    pub is_folder: bool,
    pub state: CheckState,
    pub children: Vec<TreeItemDescriptor>,
}

// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageSeverity {
    Information,
    Warning,
    Error,
}

/*
 * Platform-agnostic events delivered to the application logic. Most originate
 * from user input; `LaunchCompleted` is posted from the editor launch worker
 * after the dialog has already closed.
 */
#[derive(Debug)]
pub enum AppEvent {
    OpenSelectionDialogRequested,
    TreeViewItemToggledByUser {
        window_id: WindowId,
        item_id: TreeItemId,
        new_state: CheckState,
    },
    DialogConfirmed {
        window_id: WindowId,
    },
    DialogCancelled {
        window_id: WindowId,
    },
    LaunchCompleted {
        outcome: LaunchOutcome,
    },
    QuitRequested,
}

// Commands sent from the application logic to the platform layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCommand {
    ShowSelectionDialog {
        window_id: WindowId,
        title: String,
        items: Vec<TreeItemDescriptor>,
    },
    UpdateTreeItemVisualState {
        window_id: WindowId,
        item_id: TreeItemId,
        new_state: CheckState,
    },
    CloseDialog {
        window_id: WindowId,
    },
    ShowNotification {
        text: String,
        severity: MessageSeverity,
    },
    QuitApplication,
}

// Implemented by the application logic; driven by the platform layer's run loop.
pub trait PlatformEventHandler: Send + Sync + 'static {
    // Handles one event, enqueueing any resulting `PlatformCommand`s.
    fn handle_event(&mut self, event: AppEvent);

    // Called once when the run loop is about to exit.
    fn on_quit(&mut self) {}

    fn try_dequeue_command(&mut self) -> Option<PlatformCommand>;
}
