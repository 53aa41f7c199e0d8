/*
 * This module provides the Win32 implementation of the selection tree: a
 * native TreeView with TVS_CHECKBOXES. It creates and populates the control
 * from `TreeItemDescriptor`s, updates checkbox images on command, and turns
 * clicks and the space bar on a checkbox into `TreeViewItemToggledByUser`
 * events. `TreeViewInternalState` maps the application's `TreeItemId`s to
 * native `HTREEITEM`s and back.
 */
use super::app::Win32ApiInternalState;
use super::error::{PlatformError, Result as PlatformResult};
use super::types::{AppEvent, CheckState, TreeItemDescriptor, TreeItemId, WindowId};
use super::window_common::WM_APP_TREEVIEW_CHECKBOX_CLICKED;

use windows::{
    Win32::{
        Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, POINT, WPARAM},
        Graphics::Gdi::ScreenToClient,
        UI::Controls::{
            HTREEITEM, NMHDR, NMTVKEYDOWN, TVE_EXPAND, TVGN_CARET, TVHITTESTINFO,
            TVHITTESTINFO_FLAGS, TVHT_ONITEMSTATEICON, TVI_LAST, TVIF_CHILDREN, TVIF_PARAM,
            TVIF_STATE, TVIF_TEXT, TVINSERTSTRUCTW, TVINSERTSTRUCTW_0, TVIS_STATEIMAGEMASK,
            TVITEMEXW, TVITEMEXW_CHILDREN, TVM_DELETEITEM, TVM_EXPAND, TVM_GETITEMW,
            TVM_GETNEXTITEM, TVM_HITTEST, TVM_INSERTITEMW, TVM_SETITEMW, TVS_CHECKBOXES,
            TVS_HASBUTTONS, TVS_HASLINES, TVS_LINESATROOT, TVS_SHOWSELALWAYS, WC_TREEVIEWW,
        },
        UI::Input::KeyboardAndMouse::VK_SPACE,
        UI::WindowsAndMessaging::{
            CreateWindowExW, GetCursorPos, HMENU, PostMessageW, SendMessageW, WINDOW_EX_STYLE,
            WINDOW_STYLE, WS_BORDER, WS_CHILD, WS_TABSTOP, WS_VISIBLE,
        },
    },
    core::{PCWSTR, PWSTR},
};

use std::collections::HashMap;
use std::sync::Arc;

pub(crate) const ID_TREEVIEW_CTRL: i32 = 1001;

// TVS_CHECKBOXES state images: 1 is unchecked, 2 is checked.
const STATE_IMAGE_UNCHECKED: u32 = 1;
const STATE_IMAGE_CHECKED: u32 = 2;

fn state_image_bits(state: CheckState) -> u32 {
    let image_index = match state {
        CheckState::Checked => STATE_IMAGE_CHECKED,
        CheckState::Unchecked => STATE_IMAGE_UNCHECKED,
    };
    image_index << 12 // INDEXTOSTATEIMAGEMASK
}

fn check_state_from_item_state(item_state: u32) -> CheckState {
    CheckState::from_checked((item_state & TVIS_STATEIMAGEMASK.0) >> 12 == STATE_IMAGE_CHECKED)
}

#[derive(Debug, Default)]
pub(crate) struct TreeViewInternalState {
    item_id_to_htreeitem: HashMap<TreeItemId, HTREEITEM>,
    htreeitem_to_item_id: HashMap<isize, TreeItemId>,
}

impl TreeViewInternalState {
    fn clear_items(&mut self, hwnd_treeview: HWND) {
        unsafe {
            // TVI_ROOT is HTREEITEM(0)
            SendMessageW(
                hwnd_treeview,
                TVM_DELETEITEM,
                Some(WPARAM(0)),
                Some(LPARAM(HTREEITEM(0).0)),
            );
        }
        self.item_id_to_htreeitem.clear();
        self.htreeitem_to_item_id.clear();
    }
}

pub(crate) fn create_treeview(h_instance: HINSTANCE, hwnd_parent: HWND) -> PlatformResult<HWND> {
    let tvs_style = WINDOW_STYLE(
        TVS_HASLINES | TVS_LINESATROOT | TVS_HASBUTTONS | TVS_SHOWSELALWAYS | TVS_CHECKBOXES,
    );
    let combined_style = WS_CHILD | WS_VISIBLE | WS_BORDER | WS_TABSTOP | tvs_style;
    let hwnd_tv = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            WC_TREEVIEWW,
            PCWSTR::null(),
            combined_style,
            0,
            0,
            10,
            10, // Dummies, WM_SIZE will adjust
            Some(hwnd_parent),
            Some(HMENU(ID_TREEVIEW_CTRL as *mut _)),
            Some(h_instance),
            None,
        )
    }
    .map_err(|e| PlatformError::ControlCreationFailed(format!("TreeView: {e}")))?;
    log::debug!("Platform: Created TreeView with HWND {hwnd_tv:?}");
    Ok(hwnd_tv)
}

/// Replaces the content of the tree view with `items`, folders expanded.
pub(crate) fn populate_treeview(
    tv_state: &mut TreeViewInternalState,
    hwnd_treeview: HWND,
    items: &[TreeItemDescriptor],
) -> PlatformResult<()> {
    tv_state.clear_items(hwnd_treeview);
    for item_desc in items {
        add_treeview_item_recursive(tv_state, hwnd_treeview, HTREEITEM(0), item_desc)?;
    }
    log::debug!(
        "Platform: Populated TreeView with {} items.",
        tv_state.item_id_to_htreeitem.len()
    );
    Ok(())
}

fn add_treeview_item_recursive(
    tv_state: &mut TreeViewInternalState,
    hwnd_treeview: HWND,
    h_parent_native: HTREEITEM,
    item_desc: &TreeItemDescriptor,
) -> PlatformResult<()> {
    let mut text_buffer: Vec<u16> = item_desc.text.encode_utf16().collect();
    text_buffer.push(0);

    let tv_item = TVITEMEXW {
        mask: TVIF_TEXT | TVIF_PARAM | TVIF_CHILDREN | TVIF_STATE,
        hItem: HTREEITEM::default(),
        pszText: PWSTR(text_buffer.as_mut_ptr()),
        cchTextMax: text_buffer.len() as i32,
        lParam: LPARAM(item_desc.id.0 as isize),
        cChildren: TVITEMEXW_CHILDREN(if item_desc.children.is_empty() { 0 } else { 1 }),
        state: state_image_bits(item_desc.state),
        stateMask: TVIS_STATEIMAGEMASK.0,
        ..Default::default()
    };

    let tv_insert_struct = TVINSERTSTRUCTW {
        hParent: h_parent_native,
        hInsertAfter: TVI_LAST,
        Anonymous: TVINSERTSTRUCTW_0 { itemex: tv_item },
    };

    let h_current_item_native = HTREEITEM(
        unsafe {
            SendMessageW(
                hwnd_treeview,
                TVM_INSERTITEMW,
                Some(WPARAM(0)),
                Some(LPARAM(&tv_insert_struct as *const _ as isize)),
            )
        }
        .0,
    );

    if h_current_item_native.0 == 0 {
        return Err(PlatformError::ControlCreationFailed(format!(
            "Failed to insert TreeView item '{}': {:?}",
            item_desc.text,
            unsafe { GetLastError() }
        )));
    }

    tv_state
        .item_id_to_htreeitem
        .insert(item_desc.id, h_current_item_native);
    tv_state
        .htreeitem_to_item_id
        .insert(h_current_item_native.0, item_desc.id);

    for child_desc in &item_desc.children {
        add_treeview_item_recursive(tv_state, hwnd_treeview, h_current_item_native, child_desc)?;
    }
    if !item_desc.children.is_empty() {
        unsafe {
            SendMessageW(
                hwnd_treeview,
                TVM_EXPAND,
                Some(WPARAM(TVE_EXPAND.0 as usize)),
                Some(LPARAM(h_current_item_native.0)),
            );
        }
    }
    Ok(())
}

/// Updates the checkbox image of a single item.
pub(crate) fn update_treeview_item_visual_state(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    item_id: TreeItemId,
    new_check_state: CheckState,
) -> PlatformResult<()> {
    // Handles are copied out so no lock is held while the control is messaged.
    let (hwnd_treeview, h_item_native) = {
        let windows_guard = internal_state.active_windows.read().map_err(|_| {
            PlatformError::OperationFailed("Failed to acquire read lock for windows map".into())
        })?;
        let window_data = windows_guard.get(&window_id).ok_or_else(|| {
            PlatformError::InvalidHandle(format!(
                "WindowId {window_id:?} not found for UpdateTreeItemVisualState"
            ))
        })?;
        let hwnd_treeview = window_data.get_control_hwnd(ID_TREEVIEW_CTRL).ok_or_else(|| {
            PlatformError::InvalidHandle(format!("No TreeView in window {window_id:?}"))
        })?;
        let h_item_native = window_data
            .treeview_state
            .as_ref()
            .and_then(|tv_state| tv_state.item_id_to_htreeitem.get(&item_id).copied())
            .ok_or_else(|| {
                PlatformError::InvalidHandle(format!(
                    "TreeItemId {item_id:?} not found in window {window_id:?}"
                ))
            })?;
        (hwnd_treeview, h_item_native)
    };

    let mut tv_item_update = TVITEMEXW {
        mask: TVIF_STATE,
        hItem: h_item_native,
        state: state_image_bits(new_check_state),
        stateMask: TVIS_STATEIMAGEMASK.0,
        ..Default::default()
    };
    let send_result = unsafe {
        SendMessageW(
            hwnd_treeview,
            TVM_SETITEMW,
            Some(WPARAM(0)),
            Some(LPARAM(&mut tv_item_update as *mut _ as isize)),
        )
    };
    if send_result.0 == 0 {
        return Err(PlatformError::OperationFailed(format!(
            "TVM_SETITEMW failed for item {item_id:?}: {:?}",
            unsafe { GetLastError() }
        )));
    }
    Ok(())
}

fn post_checkbox_clicked(parent_hwnd: HWND, h_item: HTREEITEM, control_id: i32) {
    unsafe {
        if let Err(e) = PostMessageW(
            Some(parent_hwnd),
            WM_APP_TREEVIEW_CHECKBOX_CLICKED,
            WPARAM(h_item.0 as usize),
            LPARAM(control_id as isize),
        ) {
            log::error!("Platform: Failed to post WM_APP_TREEVIEW_CHECKBOX_CLICKED: {e}");
        }
    }
}

/*
 * Detects clicks on an item's checkbox. The TreeView flips the checkbox only
 * after NM_CLICK returns, so the new state is read back later from the
 * posted WM_APP_TREEVIEW_CHECKBOX_CLICKED.
 */
pub(crate) fn handle_nm_click(parent_hwnd: HWND, nmhdr: &NMHDR) {
    let hwnd_tv_from_notify = nmhdr.hwndFrom;
    if hwnd_tv_from_notify.is_invalid() {
        log::warn!("Platform: NM_CLICK from invalid HWND. Ignoring.");
        return;
    }

    let mut screen_pt_of_click = POINT::default();
    if unsafe { GetCursorPos(&mut screen_pt_of_click) }.is_err() {
        log::warn!("Platform: GetCursorPos failed in NM_CLICK. Cannot hit-test.");
        return;
    }
    let mut client_pt_for_hittest = screen_pt_of_click;
    if !unsafe { ScreenToClient(hwnd_tv_from_notify, &mut client_pt_for_hittest) }.as_bool() {
        log::warn!("Platform: ScreenToClient failed in NM_CLICK. Cannot hit-test.");
        return;
    }

    let mut tvht_info = TVHITTESTINFO {
        pt: client_pt_for_hittest,
        flags: TVHITTESTINFO_FLAGS(0),
        hItem: HTREEITEM(0),
    };
    let h_item_hit = HTREEITEM(
        unsafe {
            SendMessageW(
                hwnd_tv_from_notify,
                TVM_HITTEST,
                Some(WPARAM(0)),
                Some(LPARAM(&mut tvht_info as *mut _ as isize)),
            )
        }
        .0,
    );

    if h_item_hit.0 != 0 && (tvht_info.flags.0 & TVHT_ONITEMSTATEICON.0) != 0 {
        log::debug!("Platform: Checkbox click on HTREEITEM {h_item_hit:?}.");
        post_checkbox_clicked(parent_hwnd, h_item_hit, nmhdr.idFrom as i32);
    }
}

// The space bar toggles the checkbox of the focused item, same as a click.
pub(crate) fn handle_tvn_keydown(parent_hwnd: HWND, lparam: LPARAM) {
    let keydown = unsafe { &*(lparam.0 as *const NMTVKEYDOWN) };
    if keydown.wVKey != VK_SPACE.0 {
        return;
    }
    let h_caret = HTREEITEM(
        unsafe {
            SendMessageW(
                keydown.hdr.hwndFrom,
                TVM_GETNEXTITEM,
                Some(WPARAM(TVGN_CARET as usize)),
                Some(LPARAM(0)),
            )
        }
        .0,
    );
    if h_caret.0 != 0 {
        post_checkbox_clicked(parent_hwnd, h_caret, keydown.hdr.idFrom as i32);
    }
}

/*
 * Handles the posted WM_APP_TREEVIEW_CHECKBOX_CLICKED: reads the item's
 * checkbox state as the TreeView left it and reports the toggle to the
 * application logic.
 */
pub(crate) fn handle_wm_app_treeview_checkbox_clicked(
    internal_state: &Arc<Win32ApiInternalState>,
    window_id: WindowId,
    wparam_htreeitem: WPARAM,
    lparam_control_id: LPARAM,
) -> Option<AppEvent> {
    let h_item_clicked = HTREEITEM(wparam_htreeitem.0 as isize);
    let control_id = lparam_control_id.0 as i32;
    if h_item_clicked.0 == 0 {
        log::warn!("Platform: Checkbox click with null HTREEITEM for control {control_id}. Ignoring.");
        return None;
    }

    let (hwnd_treeview, mapped_item_id) = {
        let windows_guard = internal_state.active_windows.read().ok()?;
        let window_data = windows_guard.get(&window_id)?;
        let tv_state = window_data.treeview_state.as_ref()?;
        (
            window_data.get_control_hwnd(control_id)?,
            tv_state.htreeitem_to_item_id.get(&h_item_clicked.0).copied(),
        )
    };
    let Some(item_id) = mapped_item_id else {
        log::warn!("Platform: HTREEITEM {h_item_clicked:?} is not part of dialog {window_id:?}.");
        return None;
    };

    let mut tv_item_get = TVITEMEXW {
        mask: TVIF_STATE,
        hItem: h_item_clicked,
        stateMask: TVIS_STATEIMAGEMASK.0,
        ..Default::default()
    };
    let get_item_result = unsafe {
        SendMessageW(
            hwnd_treeview,
            TVM_GETITEMW,
            Some(WPARAM(0)),
            Some(LPARAM(&mut tv_item_get as *mut _ as isize)),
        )
    };
    if get_item_result.0 == 0 {
        log::error!(
            "Platform: TVM_GETITEMW failed for HTREEITEM {h_item_clicked:?}: {:?}",
            unsafe { GetLastError() }
        );
        return None;
    }

    let new_state = check_state_from_item_state(tv_item_get.state);
    log::debug!("Platform: {item_id:?} in {window_id:?} toggled to {new_state:?} by the user.");
    Some(AppEvent::TreeViewItemToggledByUser {
        window_id,
        item_id,
        new_state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_image_bits_round_trip_through_item_state() {
        for state in [CheckState::Checked, CheckState::Unchecked] {
            // Other state bits (selected, expanded) must not disturb the reading.
            let item_state = state_image_bits(state) | 0x0002 | 0x0020;
            assert_eq!(check_state_from_item_state(item_state), state);
        }
    }

    #[test]
    fn test_missing_state_image_reads_as_unchecked() {
        assert_eq!(check_state_from_item_state(0), CheckState::Unchecked);
    }
}
