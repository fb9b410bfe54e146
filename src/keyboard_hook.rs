use std::{cell::OnceCell, io, sync::mpsc, thread};

use windows::Win32::{
    Foundation::{LPARAM, LRESULT, WPARAM},
    System::{LibraryLoader::GetModuleHandleW, Threading::GetCurrentThreadId},
    UI::{
        Input::KeyboardAndMouse::{GetKeyState, VK_NUMLOCK},
        WindowsAndMessaging::{
            CallNextHookEx, DispatchMessageW, GetMessageW, HC_ACTION, HHOOK, KBDLLHOOKSTRUCT, MSG,
            PostThreadMessageW, SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx,
            WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_QUIT, WM_SYSKEYDOWN, WM_SYSKEYUP,
        },
    },
};

use crate::{
    error::{Error, Result},
    indicator::{KeyEvent, KeyState, ToggleStateSource},
    subscription::{self, KeyboardSubscription},
};

thread_local! {
    static GLOBAL_SENDER: OnceCell<mpsc::Sender<KeyEvent>> = const { OnceCell::new() };
}

/// The running hook registration, owned by whoever started it.
///
/// Dropping the handle without calling [`stop`](Self::stop) leaves the hook
/// installed until process exit.
pub struct KeyboardHookHandle {
    thread_id: u32,
    join_handle: thread::JoinHandle<()>,
}

impl KeyboardHookHandle {
    /// Stops the hook thread, which removes the hook on its way out.
    ///
    /// Consumes the handle, so the hook is released at most once.
    pub fn stop(self) -> thread::Result<()> {
        unsafe {
            if let Err(e) = PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) {
                log::warn!("failed to signal the hook thread: {e}");
            }
        }
        self.join_handle.join()
    }
}

/// Installs the process-wide low-level keyboard hook on a dedicated thread.
///
/// Key events observed by the hook arrive on the returned receiver. Registration
/// failure is fatal and reported synchronously, before this function returns.
pub fn start_keyboard_hook() -> Result<(mpsc::Receiver<KeyEvent>, KeyboardHookHandle)> {
    let (tx, rx) = mpsc::channel::<KeyEvent>();

    let (result_tx, result_rx) = oneshot::channel::<Result<u32>>();

    let join_handle = thread::spawn(move || {
        GLOBAL_SENDER.with(|g| g.set(tx)).unwrap();

        let mut ready = Some(result_tx);
        let outcome = subscription::observe_until(&Win32KeyboardHook, || {
            if let Some(result_tx) = ready.take() {
                let _ = result_tx.send(Ok(unsafe { GetCurrentThreadId() }));
            }
            log::info!("registered keyboard hook");
            pump_thread_messages();
        });

        if let Err(e) = outcome {
            log::error!("failed to register keyboard hook: {e}");
            if let Some(result_tx) = ready.take() {
                let _ = result_tx.send(Err(Error::HookRegistrationFailed(e)));
            }
        }
    });

    match result_rx.recv() {
        Ok(Ok(thread_id)) => Ok((
            rx,
            KeyboardHookHandle {
                thread_id,
                join_handle,
            },
        )),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(Error::HookThreadCrashed),
    }
}

/// Runs the hook thread's message loop until `WM_QUIT` arrives.
fn pump_thread_messages() {
    let mut msg = MSG::default();
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).into() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

struct Win32KeyboardHook;

impl KeyboardSubscription for Win32KeyboardHook {
    type Handle = HHOOK;

    fn register(&self) -> io::Result<HHOOK> {
        let module = unsafe { GetModuleHandleW(None) }?;
        let hook = unsafe {
            SetWindowsHookExW(
                WH_KEYBOARD_LL,
                Some(low_level_keyboard_proc),
                Some(module.into()),
                0,
            )
        }?;
        Ok(hook)
    }

    fn unregister(&self, hook: HHOOK) -> io::Result<()> {
        Ok(unsafe { UnhookWindowsHookEx(hook) }?)
    }
}

unsafe extern "system" fn low_level_keyboard_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code == HC_ACTION as i32 {
        let kbd = unsafe { *(l_param.0 as *const KBDLLHOOKSTRUCT) };
        deliver_event(key_event_from(w_param, &kbd, &HookStateSource));
    }

    // The hook only observes; the chain continues no matter what was delivered.
    unsafe { CallNextHookEx(None, n_code, w_param, l_param) }
}

/// Hands the event to the indicator loop.
fn deliver_event(event: Option<KeyEvent>) {
    if let Some(event) = event {
        GLOBAL_SENDER.with(|s| {
            if let Some(sender) = s.get() {
                if let Err(_e) = sender.send(event) {
                    log::error!("{}", _e);
                }
            }
        });
    }
}

/// Converts a hook message into a [`KeyEvent`], if it is a keystroke message,
/// stamping it with the NumLock state it produces.
///
/// The toggle state must be read here, while the event is in flight: once the
/// callback returns, the OS commits the keystroke and `GetKeyState` moves on.
/// A low-level hook runs before that commit, so the state a NumLock key-down
/// produces is the inverse of what the source still reports; no other event
/// moves the toggle.
fn key_event_from(
    w_param: WPARAM,
    kbd: &KBDLLHOOKSTRUCT,
    source: &impl ToggleStateSource,
) -> Option<KeyEvent> {
    let state = match w_param.0 as u32 {
        WM_KEYDOWN | WM_SYSKEYDOWN => KeyState::Down,
        WM_KEYUP | WM_SYSKEYUP => KeyState::Up,
        _ => return None,
    };

    let current = source.numlock_on();
    let flips = kbd.vkCode == VK_NUMLOCK.0 as u32 && state == KeyState::Down;

    Some(KeyEvent {
        vk_code: kbd.vkCode,
        state,
        numlock_on: if flips { !current } else { current },
    })
}

/// Current NumLock toggle state as reported by the OS.
pub fn numlock_toggled() -> bool {
    unsafe { GetKeyState(VK_NUMLOCK.0 as i32) } & 0x0001 != 0
}

/// [`ToggleStateSource`] backed by `GetKeyState`, queried on the hook thread.
pub struct HookStateSource;

impl ToggleStateSource for HookStateSource {
    fn numlock_on(&self) -> bool {
        numlock_toggled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::indicator;

    struct FakeToggle(bool);

    impl ToggleStateSource for FakeToggle {
        fn numlock_on(&self) -> bool {
            self.0
        }
    }

    fn kbd(vk_code: u32) -> KBDLLHOOKSTRUCT {
        KBDLLHOOKSTRUCT {
            vkCode: vk_code,
            ..Default::default()
        }
    }

    fn event(w_param: u32, vk_code: u32, source: &FakeToggle) -> Option<KeyEvent> {
        key_event_from(WPARAM(w_param as usize), &kbd(vk_code), source)
    }

    #[test]
    fn numlock_press_is_stamped_with_the_state_it_produces() {
        // While the press is in flight the OS still reports the old state.
        let still_off = event(WM_KEYDOWN, indicator::VK_NUMLOCK, &FakeToggle(false));
        assert_eq!(still_off.map(|e| e.numlock_on), Some(true));

        let still_on = event(WM_KEYDOWN, indicator::VK_NUMLOCK, &FakeToggle(true));
        assert_eq!(still_on.map(|e| e.numlock_on), Some(false));
    }

    #[test]
    fn events_that_do_not_move_the_toggle_carry_the_current_state() {
        let letter = event(WM_KEYDOWN, 0x41, &FakeToggle(true));
        assert_eq!(letter.map(|e| e.numlock_on), Some(true));

        let release = event(WM_KEYUP, indicator::VK_NUMLOCK, &FakeToggle(true));
        assert_eq!(release.map(|e| e.numlock_on), Some(true));
    }

    #[test]
    fn keystroke_messages_map_to_key_events() {
        let source = FakeToggle(false);

        let down = event(WM_KEYDOWN, indicator::VK_NUMLOCK, &source);
        assert_eq!(
            down,
            Some(KeyEvent {
                vk_code: indicator::VK_NUMLOCK,
                state: KeyState::Down,
                numlock_on: true,
            })
        );

        let sys_down = event(WM_SYSKEYDOWN, 0x41, &source);
        assert_eq!(sys_down.map(|e| e.state), Some(KeyState::Down));

        let up = event(WM_KEYUP, 0x41, &source);
        assert_eq!(up.map(|e| e.state), Some(KeyState::Up));

        let sys_up = event(WM_SYSKEYUP, 0x41, &source);
        assert_eq!(sys_up.map(|e| e.state), Some(KeyState::Up));
    }

    #[test]
    fn non_keystroke_messages_are_ignored() {
        assert_eq!(event(0x0200, 0x41, &FakeToggle(false)), None);
    }

    #[test]
    fn delivery_feeds_the_indicator_channel() {
        let (tx, rx) = mpsc::channel();
        GLOBAL_SENDER.with(|g| g.set(tx)).unwrap();

        let observed = event(WM_KEYDOWN, indicator::VK_NUMLOCK, &FakeToggle(false));
        deliver_event(observed);
        assert_eq!(rx.try_recv().ok(), observed);

        deliver_event(None);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn numlock_key_code_matches_the_platform_constant() {
        assert_eq!(indicator::VK_NUMLOCK, VK_NUMLOCK.0 as u32);
    }
}
