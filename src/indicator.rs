//! Mirror the NumLock toggle state into an indicator, providing interfaces for testing.
//!
//! The [`Indicator`] watches a stream of keyboard events. Each event arrives already
//! stamped with the NumLock state it produces, captured by the observer while the
//! event was in flight; whenever the NumLock key goes down, the indicator pushes that
//! state to an [`IndicatorSink`]. The sink is a trait so the mirroring policy can be
//! exercised without a real tray icon.

use std::thread;

/// Virtual-key code for NumLock (`VK_NUMLOCK`).
pub const VK_NUMLOCK: u32 = 0x90;

/// Tooltip shown while NumLock is on.
pub const TOOLTIP_ON: &str = "Numlock Is On";

/// Tooltip shown while NumLock is off.
pub const TOOLTIP_OFF: &str = "Numlock Is Off";

/// Side length of the built-in square indicator icon, in pixels.
pub const ICON_SIZE: u32 = 16;

/// Represents the state of a key: pressed or released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// The key is currently pressed.
    Down,
    /// The key is currently released.
    Up,
}

/// A single observed keyboard event, decoupled from the platform hook types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The virtual-key code of the key involved.
    pub vk_code: u32,
    /// Whether the key went down or up.
    pub state: KeyState,
    /// The NumLock toggle state once this event has been processed, captured by
    /// the observer while the event was still in flight.
    pub numlock_on: bool,
}

impl KeyEvent {
    /// Returns `true` if the event involves the NumLock key.
    pub fn is_numlock(&self) -> bool {
        self.vk_code == VK_NUMLOCK
    }

    /// Returns `true` if the key went down.
    pub fn is_key_down(&self) -> bool {
        self.state == KeyState::Down
    }
}

/// Reports the current NumLock toggle state as the OS sees it at the moment of
/// the call.
///
/// The hook adapter queries this while an event is in flight to stamp the event;
/// tests substitute a fake.
pub trait ToggleStateSource {
    fn numlock_on(&self) -> bool;
}

/// Receives the mirrored NumLock state.
///
/// The production sink forwards the state to the tray thread; tests record it.
pub trait IndicatorSink {
    fn set_numlock(&mut self, on: bool);
}

/// The state-mirroring policy: NumLock key-downs update the sink, nothing else does.
pub struct Indicator<K> {
    sink: K,
}

impl<K: IndicatorSink> Indicator<K> {
    pub fn new(sink: K) -> Self {
        Self { sink }
    }

    /// Reacts to one observed keyboard event.
    pub fn observe(&mut self, event: &KeyEvent) {
        if event.is_key_down() && event.is_numlock() {
            let on = event.numlock_on;
            log::debug!("numlock toggled {}", if on { "on" } else { "off" });
            self.sink.set_numlock(on);
        }
    }
}

/// Starts a thread that mirrors each received event in a loop.
///
/// `rx` is the source of incoming events, typically the receiver handed out by
/// `keyboard_hook::start_keyboard_hook`. The loop ends when the iterator does,
/// i.e. when the hook thread drops its sender.
pub fn start_indicator<I, K>(rx: I, sink: K) -> thread::JoinHandle<()>
where
    I: IntoIterator<Item = KeyEvent> + Send + 'static,
    K: IndicatorSink + Send + 'static,
{
    let mut indicator = Indicator::new(sink);

    thread::spawn(move || {
        log::debug!("started indicator loop");

        for event in rx {
            indicator.observe(&event);
        }
    })
}

/// Returns the tooltip text for the given NumLock state.
pub fn tooltip(on: bool) -> &'static str {
    if on { TOOLTIP_ON } else { TOOLTIP_OFF }
}

/// Renders the built-in indicator icon as RGBA pixels, [`ICON_SIZE`] square.
///
/// Used when the `.ico` assets next to the executable are missing. Green while
/// NumLock is on, gray while it is off, with a one-pixel darker border.
pub fn icon_rgba(on: bool) -> Vec<u8> {
    let (fill, border): ([u8; 4], [u8; 4]) = if on {
        ([0x39, 0xd3, 0x53, 0xff], [0x1f, 0x7a, 0x30, 0xff])
    } else {
        ([0x55, 0x55, 0x55, 0xff], [0x2e, 0x2e, 0x2e, 0xff])
    };

    let n = ICON_SIZE as usize;
    let mut rgba = Vec::with_capacity(n * n * 4);
    for y in 0..n {
        for x in 0..n {
            let edge = x == 0 || y == 0 || x == n - 1 || y == n - 1;
            rgba.extend_from_slice(if edge { &border } else { &fill });
        }
    }
    rgba
}
