use super::app::Win32ApiInternalState;
use super::control_treeview::{self, ID_TREEVIEW_CTRL, TreeViewInternalState};
use super::error::{PlatformError, Result as PlatformResult};
use super::types::{AppEvent, WindowId};

use windows::{
    Win32::{
        Foundation::{ERROR_INVALID_WINDOW_HANDLE, GetLastError, HWND, LPARAM, LRESULT, RECT, WPARAM},
        Graphics::Gdi::{COLOR_WINDOW, HBRUSH},
        UI::Controls::{NM_CLICK, NMHDR, TVN_KEYDOWN},
        UI::WindowsAndMessaging::*,
    },
    core::{HSTRING, PCWSTR, w},
};

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::Arc;

pub(crate) const WC_BUTTON: PCWSTR = w!("BUTTON");

pub(crate) const ID_BUTTON_OK: i32 = 1002;
pub(crate) const ID_BUTTON_CANCEL: i32 = 1003;

// Posted to the dialog by the tree view click handlers; WPARAM carries the
// HTREEITEM, LPARAM the control ID.
pub(crate) const WM_APP_TREEVIEW_CHECKBOX_CLICKED: u32 = WM_APP + 0x100;
// Thread message that wakes the loop for events posted from other threads.
pub(crate) const WM_APP_EVENT_POSTED: u32 = WM_APP + 0x101;

pub(crate) const BUTTON_AREA_HEIGHT: i32 = 44;
const BUTTON_WIDTH: i32 = 90;
const BUTTON_HEIGHT: i32 = 28;
const MARGIN: i32 = 8;

/// Holds the native handles of one dialog and the state of its tree view.
#[derive(Debug)]
pub(crate) struct NativeWindowData {
    pub(crate) hwnd: HWND,
    pub(crate) id: WindowId,
    pub(crate) control_hwnd_map: HashMap<i32, HWND>,
    pub(crate) treeview_state: Option<TreeViewInternalState>,
}

impl NativeWindowData {
    pub(crate) fn new(hwnd: HWND, id: WindowId) -> Self {
        NativeWindowData {
            hwnd,
            id,
            control_hwnd_map: HashMap::new(),
            treeview_state: None,
        }
    }

    pub(crate) fn get_control_hwnd(&self, control_id: i32) -> Option<HWND> {
        self.control_hwnd_map.get(&control_id).copied()
    }
}

/// Context passed to `CreateWindowExW` via `lpCreateParams`, so the static
/// `WndProc` can find the shared state and the `WindowId` of its window.
struct WindowCreationContext {
    internal_state_arc: Arc<Win32ApiInternalState>,
    window_id: WindowId,
}

fn class_name(internal_state: &Win32ApiInternalState) -> HSTRING {
    HSTRING::from(format!(
        "{}_SelectionDialogClass",
        internal_state.app_name_for_class
    ))
}

pub(crate) fn register_window_class(
    internal_state: &Arc<Win32ApiInternalState>,
) -> PlatformResult<()> {
    let class_name_hstring = class_name(internal_state);
    let class_name_pcwstr = PCWSTR(class_name_hstring.as_ptr());

    unsafe {
        let mut wc_test = WNDCLASSEXW::default();
        if GetClassInfoExW(
            Some(internal_state.h_instance),
            class_name_pcwstr,
            &mut wc_test,
        )
        .is_ok()
        {
            return Ok(());
        }

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(facade_wnd_proc_router),
            cbClsExtra: 0,
            cbWndExtra: 0,
            hInstance: internal_state.h_instance,
            hIcon: LoadIconW(None, IDI_APPLICATION)?,
            hCursor: LoadCursorW(None, IDC_ARROW)?,
            hbrBackground: HBRUSH((COLOR_WINDOW.0 + 1) as *mut c_void),
            lpszMenuName: PCWSTR::null(),
            lpszClassName: class_name_pcwstr,
            hIconSm: LoadIconW(None, IDI_APPLICATION)?,
        };

        if RegisterClassExW(&wc) == 0 {
            Err(PlatformError::InitializationFailed(format!(
                "RegisterClassExW failed: {:?}",
                GetLastError()
            )))
        } else {
            Ok(())
        }
    }
}

pub(crate) fn create_native_window(
    internal_state_arc: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    title: &str,
    width: i32,
    height: i32,
) -> PlatformResult<HWND> {
    let creation_context = Box::new(WindowCreationContext {
        internal_state_arc: Arc::clone(internal_state_arc),
        window_id,
    });

    unsafe {
        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            &class_name(internal_state_arc),
            &HSTRING::from(title),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            width,
            height,
            None,
            None,
            Some(internal_state_arc.h_instance),
            Some(Box::into_raw(creation_context) as *mut c_void),
        )?;
        Ok(hwnd)
    }
}

/*
 * The window procedure for every dialog. Retrieves the per-window
 * `WindowCreationContext` stored in GWLP_USERDATA at WM_NCCREATE and hands
 * the message to `handle_window_message`.
 */
unsafe extern "system" fn facade_wnd_proc_router(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let context_ptr = if msg == WM_NCCREATE {
        let create_struct = unsafe { &*(lparam.0 as *const CREATESTRUCTW) };
        let context_raw_ptr = create_struct.lpCreateParams as *mut WindowCreationContext;
        unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, context_raw_ptr as isize) };
        context_raw_ptr
    } else {
        unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut WindowCreationContext }
    };

    if context_ptr.is_null() {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }

    // Cloned: handling a message may destroy this window, which frees the context.
    let (internal_state, window_id) = {
        let context = unsafe { &*context_ptr };
        (Arc::clone(&context.internal_state_arc), context.window_id)
    };

    let result = handle_window_message(&internal_state, hwnd, msg, wparam, lparam, window_id);

    if msg == WM_NCDESTROY {
        drop(unsafe { Box::from_raw(context_ptr) });
        unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) };
    }

    result
}

#[inline]
pub(crate) fn loword_from_lparam(lparam: LPARAM) -> i32 {
    (lparam.0 & 0xFFFF) as i32
}

#[inline]
pub(crate) fn hiword_from_lparam(lparam: LPARAM) -> i32 {
    ((lparam.0 >> 16) & 0xFFFF) as i32
}

#[inline]
fn loword_from_wparam(wparam: WPARAM) -> i32 {
    (wparam.0 & 0xFFFF) as i32
}

// Where the tree view and the two buttons go in a client area of the given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DialogLayout {
    pub(crate) tree: (i32, i32, i32, i32),
    pub(crate) ok_button: (i32, i32, i32, i32),
    pub(crate) cancel_button: (i32, i32, i32, i32),
}

pub(crate) fn compute_dialog_layout(width: i32, height: i32) -> DialogLayout {
    let tree_height = (height - BUTTON_AREA_HEIGHT).max(0);
    let button_y = tree_height + (BUTTON_AREA_HEIGHT - BUTTON_HEIGHT) / 2;
    let cancel_x = (width - MARGIN - BUTTON_WIDTH).max(0);
    let ok_x = (cancel_x - MARGIN - BUTTON_WIDTH).max(0);
    DialogLayout {
        tree: (0, 0, width.max(0), tree_height),
        ok_button: (ok_x, button_y, BUTTON_WIDTH, BUTTON_HEIGHT),
        cancel_button: (cancel_x, button_y, BUTTON_WIDTH, BUTTON_HEIGHT),
    }
}

// Positions the controls of `window_id` for a client area of the given size.
pub(crate) fn apply_layout(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    width: i32,
    height: i32,
) {
    let controls: Vec<(HWND, (i32, i32, i32, i32))> = {
        let Ok(windows_guard) = internal_state.active_windows.read() else {
            log::error!("Platform: Failed to lock windows map for layout.");
            return;
        };
        let Some(window_data) = windows_guard.get(&window_id) else {
            // WM_SIZE during CreateWindowExW, before the controls exist.
            return;
        };
        let layout = compute_dialog_layout(width, height);
        [
            (ID_TREEVIEW_CTRL, layout.tree),
            (ID_BUTTON_OK, layout.ok_button),
            (ID_BUTTON_CANCEL, layout.cancel_button),
        ]
        .into_iter()
        .filter_map(|(id, rect)| window_data.get_control_hwnd(id).map(|hwnd| (hwnd, rect)))
        .collect()
    };

    for (hwnd_ctrl, (x, y, cx, cy)) in controls {
        unsafe {
            if let Err(e) = SetWindowPos(hwnd_ctrl, None, x, y, cx, cy, SWP_NOZORDER | SWP_NOACTIVATE) {
                log::warn!("Platform: SetWindowPos failed for control {hwnd_ctrl:?}: {e}");
            }
        }
    }
}

pub(crate) fn apply_layout_to_client_area(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    hwnd: HWND,
) {
    let mut rect = RECT::default();
    if unsafe { GetClientRect(hwnd, &mut rect) }.is_ok() {
        apply_layout(
            internal_state,
            window_id,
            rect.right - rect.left,
            rect.bottom - rect.top,
        );
    }
}

fn handle_window_message(
    internal_state: &Arc<Win32ApiInternalState>,
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
    window_id: WindowId,
) -> LRESULT {
    let mut app_event_to_send: Option<AppEvent> = None;

    match msg {
        WM_SIZE => {
            apply_layout(
                internal_state,
                window_id,
                loword_from_lparam(lparam),
                hiword_from_lparam(lparam),
            );
            return LRESULT(0);
        }
        WM_COMMAND => {
            // Buttons report BN_CLICKED (0) in the high word.
            if (wparam.0 >> 16) & 0xFFFF == BN_CLICKED as usize {
                match loword_from_wparam(wparam) {
                    ID_BUTTON_OK => app_event_to_send = Some(AppEvent::DialogConfirmed { window_id }),
                    ID_BUTTON_CANCEL => {
                        app_event_to_send = Some(AppEvent::DialogCancelled { window_id })
                    }
                    _ => {}
                }
            }
        }
        WM_NOTIFY => {
            let nmhdr = unsafe { &*(lparam.0 as *const NMHDR) };
            if nmhdr.idFrom as i32 == ID_TREEVIEW_CTRL {
                if nmhdr.code == NM_CLICK {
                    control_treeview::handle_nm_click(hwnd, nmhdr);
                } else if nmhdr.code == TVN_KEYDOWN {
                    control_treeview::handle_tvn_keydown(hwnd, lparam);
                }
            }
        }
        WM_APP_TREEVIEW_CHECKBOX_CLICKED => {
            app_event_to_send = control_treeview::handle_wm_app_treeview_checkbox_clicked(
                internal_state,
                window_id,
                wparam,
                lparam,
            );
        }
        WM_CLOSE => {
            // Closing the window is a cancel; the application logic destroys it.
            log::debug!("Platform: WM_CLOSE for WindowId {window_id:?}, treated as cancel.");
            internal_state.dispatch_event(AppEvent::DialogCancelled { window_id });
            return LRESULT(0);
        }
        WM_DESTROY => {
            log::debug!("Platform: WM_DESTROY for HWND {hwnd:?}, WindowId {window_id:?}");
            if let Ok(mut windows_map_guard) = internal_state.active_windows.write() {
                windows_map_guard.remove(&window_id);
            }
        }
        _ => {}
    }

    if let Some(event) = app_event_to_send {
        internal_state.dispatch_event(event);
        return LRESULT(0);
    }
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}

/// Destroys a dialog in response to the application logic closing it.
pub(crate) fn destroy_native_window(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
) -> PlatformResult<()> {
    let hwnd_to_destroy = {
        let windows_read_guard = internal_state.active_windows.read().map_err(|_| {
            PlatformError::OperationFailed(
                "Failed to acquire read lock on windows map for destroy_native_window".into(),
            )
        })?;
        windows_read_guard.get(&window_id).map(|data| data.hwnd)
    };

    let Some(hwnd) = hwnd_to_destroy else {
        log::debug!("Platform: WindowId {window_id:?} not found for destroy, already gone.");
        return Ok(());
    };
    unsafe {
        if DestroyWindow(hwnd).is_err() {
            let err = GetLastError();
            if err.0 != ERROR_INVALID_WINDOW_HANDLE.0 {
                return Err(PlatformError::OperationFailed(format!(
                    "DestroyWindow failed for {window_id:?}: {err:?}"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_puts_buttons_below_tree_right_aligned() {
        let layout = compute_dialog_layout(400, 300);
        assert_eq!(layout.tree, (0, 0, 400, 256));
        assert_eq!(layout.cancel_button, (302, 264, 90, 28));
        assert_eq!(layout.ok_button, (204, 264, 90, 28));
    }

    #[test]
    fn test_layout_never_goes_negative_when_tiny() {
        let layout = compute_dialog_layout(10, 10);
        assert_eq!(layout.tree.3, 0);
        assert_eq!(layout.cancel_button.0, 0);
        assert_eq!(layout.ok_button.0, 0);
    }
}
