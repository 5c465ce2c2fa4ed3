use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Input and timer events, stamped on the engine's millisecond timeline
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key { key: KeyEvent, at_ms: f64 },
    Resize,
    Tick { at_ms: f64 },
}

impl AppEvent {
    pub fn at_ms(&self) -> Option<f64> {
        match self {
            AppEvent::Key { at_ms, .. } | AppEvent::Tick { at_ms } => Some(*at_ms),
            AppEvent::Resize => None,
        }
    }
}

/// Millisecond time source for event stamps
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall time since creation; what the terminal front end runs on
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock; clones share the same time
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now_ms.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now_ms.get()
    }
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Crossterm reader thread.
///
/// Keys are stamped when read, so a slow redraw does not stretch the gaps
/// between keystrokes.
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new(clock: MonotonicClock) -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                // key releases are reported on some platforms; only presses type
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => AppEvent::Key {
                    key,
                    at_ms: clock.now_ms(),
                },
                Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(ev).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Events fed through a channel, for headless runs
pub struct ChannelEventSource {
    rx: Receiver<AppEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Waits up to one tick for input, otherwise emits a stamped tick
pub struct Runner<E: EventSource, C: Clock> {
    event_source: E,
    tick: Duration,
    clock: C,
}

impl<E: EventSource, C: Clock> Runner<E, C> {
    pub fn new(event_source: E, tick: Duration, clock: C) -> Self {
        Self {
            event_source,
            tick,
            clock,
        }
    }

    pub fn step(&self) -> AppEvent {
        match self.event_source.recv_timeout(self.tick) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                AppEvent::Tick {
                    at_ms: self.clock.now_ms(),
                }
            }
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn runner(rx: Receiver<AppEvent>, clock: ManualClock) -> Runner<ChannelEventSource, ManualClock> {
        Runner::new(ChannelEventSource::new(rx), Duration::from_millis(1), clock)
    }

    #[test]
    fn idle_source_ticks_at_clock_time() {
        let (_tx, rx) = mpsc::channel();
        let clock = ManualClock::new(250.0);
        let runner = runner(rx, clock.clone());

        assert_matches!(runner.step(), AppEvent::Tick { at_ms } if at_ms == 250.0);
        clock.advance(100.0);
        assert_matches!(runner.step(), AppEvent::Tick { at_ms } if at_ms == 350.0);
    }

    #[test]
    fn dropped_sender_ticks() {
        let (tx, rx) = mpsc::channel::<AppEvent>();
        drop(tx);
        assert_matches!(
            runner(rx, ManualClock::default()).step(),
            AppEvent::Tick { .. }
        );
    }

    #[test]
    fn queued_events_keep_their_stamps() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        tx.send(AppEvent::Key {
            key: KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE),
            at_ms: 40.0,
        })
        .unwrap();
        let runner = runner(rx, ManualClock::new(900.0));

        let first = runner.step();
        assert_matches!(first, AppEvent::Resize);
        assert_eq!(first.at_ms(), None);

        let second = runner.step();
        assert_matches!(
            second,
            AppEvent::Key { key: KeyEvent { code: KeyCode::Char('a'), .. }, .. }
        );
        assert_eq!(second.at_ms(), Some(40.0));
        assert_eq!(runner.step().at_ms(), Some(900.0));
    }

    #[test]
    fn monotonic_clock_never_goes_back() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        std::thread::sleep(Duration::from_millis(2));
        let b = clock.now_ms();
        assert!(a >= 0.0);
        assert!(b > a);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(0.0);
        let handle = clock.clone();
        handle.set(1_000.0);
        handle.advance(5.0);
        assert_eq!(clock.now_ms(), 1_005.0);
    }
}
