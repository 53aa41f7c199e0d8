use std::io;
#[cfg(windows)]
use windows::core::Error as WinError;

// Errors raised by the platform layer while creating the dialog, executing
// commands against it, or reading and rendering console input and output.
#[derive(Debug)]
pub enum PlatformError {
    /// An error originating from the Windows API.
    #[cfg(windows)]
    Win32(WinError),
    /// Failure during the initialization of the platform layer or its components.
    #[cfg(windows)]
    InitializationFailed(String),
    /// Failure to create a native control.
    #[cfg(windows)]
    ControlCreationFailed(String),
    /// Reading from the terminal or writing to it failed.
    Io(io::Error),
    /// A command referred to a dialog or tree item the platform does not know.
    InvalidHandle(String),
    /// A requested operation could not be completed.
    OperationFailed(String),
}

#[cfg(windows)]
impl From<WinError> for PlatformError {
    fn from(err: WinError) -> Self {
        PlatformError::Win32(err)
    }
}

impl From<io::Error> for PlatformError {
    fn from(err: io::Error) -> Self {
        PlatformError::Io(err)
    }
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(windows)]
            PlatformError::Win32(e) => write!(f, "Win32 Error: {e}"),
            #[cfg(windows)]
            PlatformError::InitializationFailed(s) => write!(f, "Initialization Failed: {s}"),
            #[cfg(windows)]
            PlatformError::ControlCreationFailed(s) => write!(f, "Control Creation Failed: {s}"),
            PlatformError::Io(e) => write!(f, "Console I/O Error: {e}"),
            PlatformError::InvalidHandle(s) => write!(f, "Invalid Handle: {s}"),
            PlatformError::OperationFailed(s) => write!(f, "Operation Failed: {s}"),
        }
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(windows)]
            PlatformError::Win32(e) => Some(e),
            PlatformError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// A specialized `Result` type for platform layer operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
