/*
 * Executes `PlatformCommand`s against the Win32 frontend: builds the
 * selection dialog (tree view plus OK/Cancel buttons), keeps its checkboxes
 * in sync, destroys it, and shows notifications as message boxes.
 */

use super::app::Win32ApiInternalState;
use super::control_treeview::{self, ID_TREEVIEW_CTRL, TreeViewInternalState};
use super::error::{PlatformError, Result as PlatformResult};
use super::types::{MessageSeverity, PlatformCommand, TreeItemDescriptor, WindowId};
use super::window_common::{
    self, ID_BUTTON_CANCEL, ID_BUTTON_OK, NativeWindowData, WC_BUTTON,
};

use std::sync::Arc;
use windows::{
    Win32::{
        Foundation::HWND,
        UI::WindowsAndMessaging::{
            BS_DEFPUSHBUTTON, BS_PUSHBUTTON, CreateWindowExW, DestroyWindow, HMENU,
            MB_ICONERROR, MB_ICONINFORMATION, MB_ICONWARNING, MB_OK, MB_SETFOREGROUND,
            MessageBoxW, PostQuitMessage, SW_SHOW, SetForegroundWindow, ShowWindow,
            WINDOW_EX_STYLE, WINDOW_STYLE, WS_CHILD, WS_TABSTOP, WS_VISIBLE,
        },
    },
    core::HSTRING,
};

const DIALOG_WIDTH: i32 = 480;
const DIALOG_HEIGHT: i32 = 560;

pub(crate) fn execute_command(
    internal_state: &Arc<Win32ApiInternalState>,
    command: PlatformCommand,
) -> PlatformResult<()> {
    match command {
        PlatformCommand::ShowSelectionDialog {
            window_id,
            title,
            items,
        } => execute_show_selection_dialog(internal_state, window_id, &title, &items),
        PlatformCommand::UpdateTreeItemVisualState {
            window_id,
            item_id,
            new_state,
        } => control_treeview::update_treeview_item_visual_state(
            internal_state,
            window_id,
            item_id,
            new_state,
        ),
        PlatformCommand::CloseDialog { window_id } => {
            window_common::destroy_native_window(internal_state, window_id)
        }
        PlatformCommand::ShowNotification { text, severity } => {
            execute_show_notification(internal_state, &text, severity);
            Ok(())
        }
        PlatformCommand::QuitApplication => {
            log::debug!("CommandExecutor: execute_quit_application. Posting WM_QUIT.");
            unsafe { PostQuitMessage(0) };
            Ok(())
        }
    }
}

/*
 * Creates the dialog window and its controls, fills the tree, and shows it.
 * The window is registered in `active_windows` only once it is complete, so
 * messages sent during construction never see a half-built dialog.
 */
fn execute_show_selection_dialog(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    title: &str,
    items: &[TreeItemDescriptor],
) -> PlatformResult<()> {
    let already_open = internal_state
        .active_windows
        .read()
        .map_err(|_| PlatformError::OperationFailed("Failed to lock windows map".into()))?
        .contains_key(&window_id);
    if already_open {
        return Err(PlatformError::OperationFailed(format!(
            "Dialog {window_id:?} is already shown"
        )));
    }

    let hwnd = window_common::create_native_window(
        internal_state,
        window_id,
        title,
        DIALOG_WIDTH,
        DIALOG_HEIGHT,
    )?;
    let mut window_data = NativeWindowData::new(hwnd, window_id);
    if let Err(e) = build_dialog_controls(internal_state, &mut window_data, items) {
        unsafe {
            let _ = DestroyWindow(hwnd);
        }
        return Err(e);
    }
    log::debug!(
        "CommandExecutor: Built dialog {:?} with {} controls.",
        window_data.id,
        window_data.control_hwnd_map.len()
    );

    internal_state
        .active_windows
        .write()
        .map_err(|_| PlatformError::OperationFailed("Failed to lock windows map".into()))?
        .insert(window_id, window_data);

    window_common::apply_layout_to_client_area(internal_state, window_id, hwnd);
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = SetForegroundWindow(hwnd);
    }
    Ok(())
}

fn build_dialog_controls(
    internal_state: &Arc<Win32ApiInternalState>,
    window_data: &mut NativeWindowData,
    items: &[TreeItemDescriptor],
) -> PlatformResult<()> {
    let hwnd_tv = control_treeview::create_treeview(internal_state.h_instance, window_data.hwnd)?;
    window_data.control_hwnd_map.insert(ID_TREEVIEW_CTRL, hwnd_tv);
    let mut tv_state = TreeViewInternalState::default();
    control_treeview::populate_treeview(&mut tv_state, hwnd_tv, items)?;
    window_data.treeview_state = Some(tv_state);

    for (control_id, text, style) in [
        (ID_BUTTON_OK, "OK", BS_DEFPUSHBUTTON),
        (ID_BUTTON_CANCEL, "Cancel", BS_PUSHBUTTON),
    ] {
        let hwnd_button = create_button(internal_state, window_data.hwnd, control_id, text, style)?;
        window_data.control_hwnd_map.insert(control_id, hwnd_button);
    }
    Ok(())
}

fn create_button(
    internal_state: &Arc<Win32ApiInternalState>,
    hwnd_parent: HWND,
    control_id: i32,
    text: &str,
    button_style: i32,
) -> PlatformResult<HWND> {
    let hwnd_button = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            WC_BUTTON,
            &HSTRING::from(text),
            WS_CHILD | WS_VISIBLE | WS_TABSTOP | WINDOW_STYLE(button_style as u32),
            0,
            0,
            10,
            10, // Dummies, WM_SIZE will adjust
            Some(hwnd_parent),
            Some(HMENU(control_id as *mut _)),
            Some(internal_state.h_instance),
            None,
        )
    }
    .map_err(|e| PlatformError::ControlCreationFailed(format!("Button '{text}': {e}")))?;
    log::debug!("CommandExecutor: Created button '{text}' (ID {control_id}) with HWND {hwnd_button:?}");
    Ok(hwnd_button)
}

// Blocks in a modal message box until the user dismisses it.
fn execute_show_notification(
    internal_state: &Arc<Win32ApiInternalState>,
    text: &str,
    severity: MessageSeverity,
) {
    match severity {
        MessageSeverity::Information => log::info!("CommandExecutor: Notification: {text}"),
        MessageSeverity::Warning => log::warn!("CommandExecutor: Notification: {text}"),
        MessageSeverity::Error => log::error!("CommandExecutor: Notification: {text}"),
    }
    let icon = match severity {
        MessageSeverity::Information => MB_ICONINFORMATION,
        MessageSeverity::Warning => MB_ICONWARNING,
        MessageSeverity::Error => MB_ICONERROR,
    };
    unsafe {
        let _ = MessageBoxW(
            None,
            &HSTRING::from(text),
            &HSTRING::from(internal_state.app_name_for_class.as_str()),
            MB_OK | MB_SETFOREGROUND | icon,
        );
    }
}
