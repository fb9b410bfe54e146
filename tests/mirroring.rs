use std::{
    sync::{Arc, Mutex, mpsc},
    thread,
    time::{Duration, Instant},
};

use numlock_indicator::indicator::{self, IndicatorSink, KeyEvent, KeyState, VK_NUMLOCK};

#[derive(Clone, Default)]
struct SharedLog(Arc<Mutex<Vec<bool>>>);

impl SharedLog {
    fn snapshot(&self) -> Vec<bool> {
        self.0.lock().unwrap().clone()
    }

    fn await_len(&self, len: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.0.lock().unwrap().len() < len {
            assert!(Instant::now() < deadline, "indicator loop stalled");
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl IndicatorSink for SharedLog {
    fn set_numlock(&mut self, on: bool) {
        self.0.lock().unwrap().push(on);
    }
}

fn numlock_down(on: bool) -> KeyEvent {
    KeyEvent {
        vk_code: VK_NUMLOCK,
        state: KeyState::Down,
        numlock_on: on,
    }
}

fn other_down(vk_code: u32) -> KeyEvent {
    KeyEvent {
        vk_code,
        state: KeyState::Down,
        numlock_on: true,
    }
}

#[test]
fn indicator_loop_mirrors_numlock_and_ignores_everything_else() {
    let log = SharedLog::default();
    let (tx, rx) = mpsc::channel();

    let handle = indicator::start_indicator(rx, log.clone());

    let mut expected = Vec::new();
    for i in 0..100 {
        let on = i % 2 == 0;
        tx.send(numlock_down(on)).unwrap();
        expected.push(on);
    }

    // Other keys, and NumLock releases, leave the indicator alone.
    tx.send(other_down(0x41)).unwrap();
    tx.send(other_down(0x0d)).unwrap();
    tx.send(KeyEvent {
        vk_code: VK_NUMLOCK,
        state: KeyState::Up,
        numlock_on: true,
    })
    .unwrap();
    tx.send(numlock_down(true)).unwrap();
    expected.push(true);

    log.await_len(expected.len());
    assert_eq!(log.snapshot(), expected);

    // Dropping the sender ends the loop, like the hook thread shutting down.
    drop(tx);
    handle.join().unwrap();
    assert_eq!(log.snapshot().len(), expected.len());
}

#[test]
fn startup_state_maps_to_the_documented_tooltips() {
    assert_eq!(indicator::tooltip(true), "Numlock Is On");
    assert_eq!(indicator::tooltip(false), "Numlock Is Off");
}
