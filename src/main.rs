#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::process::ExitCode;

#[cfg(windows)]
fn main() -> ExitCode {
    colog::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(windows)]
fn run() -> numlock_indicator::error::Result<()> {
    use numlock_indicator::keyboard_hook::numlock_toggled;
    use numlock_indicator::tray::{TrayIndicator, UiThreadNotifier, WM_NUMLOCK_CHANGED};
    use tray_icon::menu::MenuEvent;
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, GetMessageW, MSG, PostQuitMessage, TranslateMessage,
    };

    let mut tray = TrayIndicator::new(numlock_toggled())?;

    let exit_id = tray.exit_id().clone();
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        if event.id == exit_id {
            log::info!("exit requested from the tray menu");
            unsafe { PostQuitMessage(0) };
        }
    }));

    // The notifier must capture this thread before the hook starts feeding it.
    let running = numlock_indicator::start(UiThreadNotifier::current_thread())?;

    let mut msg = MSG::default();
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).into() {
            if msg.message == WM_NUMLOCK_CHANGED {
                tray.set_state(msg.wParam.0 != 0);
            } else {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }

    // Remove the hook before the tray goes away so no late callback races teardown.
    if running.shutdown().is_err() {
        log::warn!("a worker thread panicked during shutdown");
    }
    drop(tray);

    Ok(())
}

#[cfg(not(windows))]
fn main() -> ExitCode {
    eprintln!("numlock-indicator only runs on Windows");
    ExitCode::FAILURE
}
