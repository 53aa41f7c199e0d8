use super::command_executor;
use super::error::{PlatformError, Result as PlatformResult};
use super::event_sender::AppEventSender;
use super::session;
use super::types::{AppEvent, PlatformCommand, PlatformEventHandler, WindowId};
use super::window_common::{self, NativeWindowData, WM_APP_EVENT_POSTED};

use windows::{
    Win32::{
        Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, WPARAM},
        System::{LibraryLoader::GetModuleHandleW, Threading::GetCurrentThreadId},
        UI::{
            Controls::{ICC_TREEVIEW_CLASSES, INITCOMMONCONTROLSEX, InitCommonControlsEx},
            WindowsAndMessaging::{
                DispatchMessageW, GetMessageW, MSG, PM_NOREMOVE, PeekMessageW, PostQuitMessage,
                PostThreadMessageW, TranslateMessage,
            },
        },
    },
    core::PCWSTR,
};

use std::collections::HashMap;
use std::sync::{
    Arc, Mutex, RwLock, Weak,
    atomic::{AtomicBool, Ordering},
    mpsc,
};

/// Internal state for the Win32 platform layer.
///
/// Holds the Win32 handles and mappings needed to run the selection dialog.
/// It is owned by `PlatformInterface` and reached from the `WndProc` through
/// the per-window creation context.
pub(crate) struct Win32ApiInternalState {
    pub(crate) h_instance: HINSTANCE,
    /// The application name, used for the window class and message box captions.
    pub(crate) app_name_for_class: String,
    /// Maps the application's `WindowId` to the native window and its controls.
    pub(crate) active_windows: RwLock<HashMap<WindowId, NativeWindowData>>,
    /// Weak to avoid a cycle if the event handler ever holds the platform.
    event_handler: Mutex<Option<Weak<Mutex<dyn PlatformEventHandler>>>>,
    main_thread_id: u32,
    event_tx: mpsc::Sender<AppEvent>,
    event_rx: Mutex<mpsc::Receiver<AppEvent>>,
    session_over: AtomicBool,
}

impl Win32ApiInternalState {
    fn new(app_name_for_class: String) -> PlatformResult<Arc<Self>> {
        unsafe {
            let icex = INITCOMMONCONTROLSEX {
                dwSize: std::mem::size_of::<INITCOMMONCONTROLSEX>() as u32,
                dwICC: ICC_TREEVIEW_CLASSES,
            };
            if !InitCommonControlsEx(&icex).as_bool() {
                log::warn!(
                    "Platform: InitCommonControlsEx for TreeView failed. Error: {:?}",
                    GetLastError()
                );
            }

            // Makes sure this thread has a message queue before any worker
            // thread tries to post to it.
            let mut msg = MSG::default();
            let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);

            let h_instance = HINSTANCE(GetModuleHandleW(PCWSTR::null())?.0);
            let (event_tx, event_rx) = mpsc::channel();
            Ok(Arc::new(Self {
                h_instance,
                app_name_for_class,
                active_windows: RwLock::new(HashMap::new()),
                event_handler: Mutex::new(None),
                main_thread_id: GetCurrentThreadId(),
                event_tx,
                event_rx: Mutex::new(event_rx),
                session_over: AtomicBool::new(false),
            }))
        }
    }

    fn current_event_handler(&self) -> Option<Arc<Mutex<dyn PlatformEventHandler>>> {
        self.event_handler
            .lock()
            .ok()?
            .as_ref()
            .and_then(|weak_handler| weak_handler.upgrade())
    }

    pub(crate) fn has_open_windows(&self) -> bool {
        self.active_windows
            .read()
            .map(|windows| !windows.is_empty())
            .unwrap_or(false)
    }

    /*
     * Hands one event to the application logic and executes the commands it
     * enqueued. The handler lock is released before any command runs, since
     * destroying a window or showing a message box re-enters the `WndProc`.
     */
    pub(crate) fn dispatch_event(self: &Arc<Self>, event: AppEvent) {
        let after_confirm = matches!(event, AppEvent::DialogConfirmed { .. });
        let Some(handler) = self.current_event_handler() else {
            log::warn!("Platform: Event handler not available, dropping {event:?}.");
            return;
        };

        let commands: Vec<PlatformCommand> = match handler.lock() {
            Ok(mut handler_guard) => {
                handler_guard.handle_event(event);
                std::iter::from_fn(|| handler_guard.try_dequeue_command()).collect()
            }
            Err(_) => {
                log::error!("Platform: Event handler mutex poisoned.");
                return;
            }
        };

        for command in commands.iter().cloned() {
            if let Err(e) = command_executor::execute_command(self, command) {
                log::error!("Platform: Failed to execute command: {e}");
            }
        }

        if session::session_finished(after_confirm, &commands, self.has_open_windows())
            && !self.session_over.swap(true, Ordering::SeqCst)
        {
            log::info!("Platform: Nothing left to show, leaving the message loop.");
            unsafe { PostQuitMessage(0) };
        }
    }

    // Delivers events posted from other threads.
    fn drain_posted_events(self: &Arc<Self>) {
        loop {
            let next = match self.event_rx.lock() {
                Ok(rx) => rx.try_recv().ok(),
                Err(_) => None,
            };
            match next {
                Some(event) => self.dispatch_event(event),
                None => break,
            }
        }
    }
}

/// The primary interface to the platform abstraction layer.
pub struct PlatformInterface {
    internal_state: Arc<Win32ApiInternalState>,
}

impl PlatformInterface {
    pub fn new(app_name_for_class: String) -> PlatformResult<Self> {
        let internal_state = Win32ApiInternalState::new(app_name_for_class)?;
        window_common::register_window_class(&internal_state)?;
        log::debug!("Platform: Window class registered, PlatformInterface ready.");
        Ok(PlatformInterface { internal_state })
    }

    /*
     * Events sent through the returned handle are queued on a channel and the
     * UI thread is woken with a thread message. The channel is drained after
     * every message, so a wake-up swallowed by a modal loop is not lost.
     */
    pub fn event_sender(&self) -> AppEventSender {
        let tx = self.internal_state.event_tx.clone();
        let thread_id = self.internal_state.main_thread_id;
        AppEventSender::new(move |event| {
            if tx.send(event).is_err() {
                return false;
            }
            if let Err(e) =
                unsafe { PostThreadMessageW(thread_id, WM_APP_EVENT_POSTED, WPARAM(0), LPARAM(0)) }
            {
                log::warn!("Platform: Failed to wake the UI thread: {e}");
            }
            true
        })
    }

    /*
     * Runs the Win32 message loop. The selection dialog is requested once at
     * startup; the loop ends when the session is over or the application
     * logic asks to quit.
     */
    pub fn run(&self, event_handler: Arc<Mutex<dyn PlatformEventHandler>>) -> PlatformResult<()> {
        *self
            .internal_state
            .event_handler
            .lock()
            .map_err(|_| PlatformError::OperationFailed("Event handler slot poisoned".into()))? =
            Some(Arc::downgrade(&event_handler));

        self.internal_state
            .dispatch_event(AppEvent::OpenSelectionDialogRequested);
        self.internal_state.drain_posted_events();

        let loop_result = unsafe {
            let mut msg = MSG::default();
            loop {
                let result = GetMessageW(&mut msg, None, 0, 0);
                if result.0 > 0 {
                    if msg.hwnd == HWND::default() && msg.message == WM_APP_EVENT_POSTED {
                        log::trace!("Platform: Woken for posted events.");
                    } else {
                        let _ = TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                    self.internal_state.drain_posted_events();
                } else if result.0 == 0 {
                    log::debug!("Platform: GetMessageW returned 0 (WM_QUIT), exiting message loop.");
                    break Ok(());
                } else {
                    let e = windows::core::Error::from_win32();
                    log::error!("Platform: GetMessageW failed: {e}");
                    break Err(PlatformError::Win32(e));
                }
            }
        };

        match event_handler.lock() {
            Ok(mut handler) => handler.on_quit(),
            Err(_) => log::error!("Platform: Event handler mutex poisoned during shutdown."),
        }
        if let Ok(mut slot) = self.internal_state.event_handler.lock() {
            *slot = None;
        }
        log::debug!("Platform: Message loop exited.");
        loop_result
    }
}
