use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to register the keyboard hook")]
    HookRegistrationFailed(#[source] std::io::Error),
    #[error("the hook thread terminated unexpectedly")]
    HookThreadCrashed,
    #[cfg(windows)]
    #[error("failed to set up the tray icon")]
    Tray(#[from] tray_icon::Error),
    #[cfg(windows)]
    #[error("failed to build the tray menu")]
    Menu(#[from] tray_icon::menu::Error),
    #[cfg(windows)]
    #[error("invalid icon image")]
    BadIcon(#[from] tray_icon::BadIcon),
}

pub type Result<T> = std::result::Result<T, Error>;
