//! Mirrors the keyboard NumLock toggle state into a system tray icon on Windows.
//!
//! A process-wide low-level keyboard hook observes keystrokes on its own thread,
//! stamps each event with the toggle state it produces while the event is still in
//! flight, and forwards it to an indicator loop, which pushes the state to a sink
//! whenever the NumLock key goes down. The binary wires the sink to the tray icon;
//! tests wire it to fakes.

pub mod error;
pub mod indicator;
pub mod subscription;

#[cfg(windows)]
pub mod keyboard_hook;
#[cfg(windows)]
pub mod tray;

#[cfg(windows)]
use std::thread;

#[cfg(windows)]
use error::Result;
#[cfg(windows)]
use indicator::IndicatorSink;

/// Starts the keyboard hook and the indicator loop feeding `sink`.
#[cfg(windows)]
pub fn start(sink: impl IndicatorSink + Send + 'static) -> Result<Running> {
    let (rx, keyboard_hook) = keyboard_hook::start_keyboard_hook()?;
    let indicator = indicator::start_indicator(rx, sink);

    Ok(Running {
        keyboard_hook,
        indicator,
    })
}

/// Handles to the running hook and indicator threads.
#[cfg(windows)]
pub struct Running {
    keyboard_hook: keyboard_hook::KeyboardHookHandle,
    indicator: thread::JoinHandle<()>,
}

#[cfg(windows)]
impl Running {
    /// Removes the keyboard hook, then drains the indicator loop.
    ///
    /// The hook goes first so no callback can fire once the indicator is gone.
    pub fn shutdown(self) -> thread::Result<()> {
        self.keyboard_hook.stop()?;
        self.indicator.join()
    }
}
