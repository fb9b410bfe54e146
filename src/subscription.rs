//! Registration lifecycle for the global keyboard observer.

use std::io;

/// A one-shot subscription to an external keyboard event source.
///
/// The Win32 adapter in `keyboard_hook` implements this over
/// `SetWindowsHookExW`/`UnhookWindowsHookEx`; tests substitute a counting mock.
pub trait KeyboardSubscription {
    type Handle;

    fn register(&self) -> io::Result<Self::Handle>;
    fn unregister(&self, handle: Self::Handle) -> io::Result<()>;
}

/// Registers the subscription, runs `pump` to completion, then unregisters.
///
/// Registration failure aborts before the pump runs. A failed unregister is logged
/// and otherwise ignored: the OS reclaims the hook on process exit regardless.
pub fn observe_until<S: KeyboardSubscription>(api: &S, pump: impl FnOnce()) -> io::Result<()> {
    let handle = api.register()?;

    pump();

    if let Err(e) = api.unregister(handle) {
        log::warn!("failed to remove the keyboard hook: {e}");
    }

    Ok(())
}
