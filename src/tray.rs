//! The notification-area indicator.
//!
//! `TrayIcon` must stay on the thread that created it, so the indicator loop never
//! touches it directly: [`UiThreadNotifier`] posts the mirrored state to the UI
//! thread as a thread message and the message pump applies it.

use std::path::PathBuf;

use tray_icon::{
    Icon, TrayIcon, TrayIconBuilder,
    menu::{Menu, MenuId, MenuItem},
};
use windows::Win32::{
    Foundation::{LPARAM, WPARAM},
    System::Threading::GetCurrentThreadId,
    UI::WindowsAndMessaging::{PostThreadMessageW, WM_APP},
};

use crate::{
    error::Result,
    indicator::{self, ICON_SIZE, IndicatorSink},
};

/// Thread message carrying a NumLock state change in its `wParam`.
pub const WM_NUMLOCK_CHANGED: u32 = WM_APP + 1;

const ICON_ON_FILE: &str = "NumLockOn.ico";
const ICON_OFF_FILE: &str = "NumLockOff.ico";

/// The tray icon plus its two state images.
///
/// Both images are loaded once here and only swapped by reference afterwards, so
/// the process holds exactly one icon pair for its whole lifetime no matter how
/// often the state flips.
pub struct TrayIndicator {
    tray: TrayIcon,
    icons: IconPair,
    exit_id: MenuId,
}

impl TrayIndicator {
    /// Creates the tray icon, its Exit menu, and the icon pair, showing `initial`.
    pub fn new(initial: bool) -> Result<Self> {
        let icons = IconPair::load()?;

        let exit = MenuItem::new("Exit", true, None);
        let exit_id = exit.id().clone();
        let menu = Menu::with_items(&[&exit])?;

        let tray = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(indicator::tooltip(initial))
            .with_icon(icons.select(initial).clone())
            .build()?;

        Ok(Self {
            tray,
            icons,
            exit_id,
        })
    }

    /// The menu id of the Exit entry, for the menu-event handler.
    pub fn exit_id(&self) -> &MenuId {
        &self.exit_id
    }

    /// Shows the given NumLock state. Update failures are cosmetic, log and move on.
    pub fn set_state(&mut self, on: bool) {
        if let Err(e) = self.tray.set_icon(Some(self.icons.select(on).clone())) {
            log::warn!("failed to update the tray icon: {e}");
        }
        if let Err(e) = self.tray.set_tooltip(Some(indicator::tooltip(on))) {
            log::warn!("failed to update the tray tooltip: {e}");
        }
    }
}

struct IconPair {
    on: Icon,
    off: Icon,
}

impl IconPair {
    fn load() -> Result<Self> {
        Ok(Self {
            on: load_icon(ICON_ON_FILE, true)?,
            off: load_icon(ICON_OFF_FILE, false)?,
        })
    }

    fn select(&self, on: bool) -> &Icon {
        if on { &self.on } else { &self.off }
    }
}

/// Loads an icon asset from next to the executable, falling back to the built-in
/// image when the file is missing or unreadable.
fn load_icon(file: &str, on: bool) -> Result<Icon> {
    if let Some(path) = asset_path(file) {
        match Icon::from_path(&path, None) {
            Ok(icon) => return Ok(icon),
            Err(e) => {
                log::warn!(
                    "failed to load {}: {e}; using the built-in icon",
                    path.display()
                );
            }
        }
    }

    Ok(Icon::from_rgba(
        indicator::icon_rgba(on),
        ICON_SIZE,
        ICON_SIZE,
    )?)
}

fn asset_path(file: &str) -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(file))
}

/// [`IndicatorSink`] that posts state changes to the UI thread's message queue.
pub struct UiThreadNotifier {
    thread_id: u32,
}

impl UiThreadNotifier {
    /// Captures the calling thread as the recipient of [`WM_NUMLOCK_CHANGED`].
    pub fn current_thread() -> Self {
        Self {
            thread_id: unsafe { GetCurrentThreadId() },
        }
    }
}

impl IndicatorSink for UiThreadNotifier {
    fn set_numlock(&mut self, on: bool) {
        let posted = unsafe {
            PostThreadMessageW(
                self.thread_id,
                WM_NUMLOCK_CHANGED,
                WPARAM(on as usize),
                LPARAM(0),
            )
        };
        if let Err(e) = posted {
            log::warn!("failed to notify the tray thread: {e}");
        }
    }
}
