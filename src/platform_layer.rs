pub mod error;
pub mod event_sender;
pub mod types;

// Win32 frontend: the selection dialog is a native window with a checkbox tree view.
#[cfg(windows)]
pub mod app;
#[cfg(windows)]
pub(crate) mod command_executor;
#[cfg(windows)]
pub(crate) mod control_treeview;
#[cfg(windows)]
pub(crate) mod window_common;
#[cfg(any(windows, test))]
pub(crate) mod session;

// Console frontend for every other platform.
#[cfg(not(windows))]
pub mod console_app;
#[cfg(not(windows))]
pub(crate) mod console_executor;
#[cfg(not(windows))]
pub(crate) mod console_treeview;


#[cfg(windows)]
pub use app::PlatformInterface;
#[cfg(not(windows))]
pub use console_app::PlatformInterface;
pub use error::Result as PlatformResult;
pub use event_sender::AppEventSender;
pub use types::{
    AppEvent, CheckState, MessageSeverity, PlatformCommand, PlatformEventHandler,
    TreeItemDescriptor, TreeItemId, WindowId,
};
