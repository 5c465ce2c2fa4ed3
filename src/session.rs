/// Session timing on the caller's millisecond timeline.
///
/// Starts on the first accepted keystroke, accrues nothing while paused and
/// freezes for good once the session finishes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionClock {
    start: Option<f64>,
    paused_accum_ms: f64,
    is_paused: bool,
    pause_started_at: Option<f64>,
    finished_at: Option<f64>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at `at`; later calls keep the original start
    pub fn start(&mut self, at: f64) {
        if self.start.is_none() {
            self.start = Some(at);
        }
    }

    pub fn has_started(&self) -> bool {
        self.start.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn started_at(&self) -> Option<f64> {
        self.start
    }

    pub fn paused_accum_ms(&self) -> f64 {
        self.paused_accum_ms
    }

    /// Returns true if the clock transitioned into the paused state
    pub fn pause(&mut self, at: f64) -> bool {
        if !self.has_started() || self.is_paused || self.is_finished() {
            return false;
        }
        self.is_paused = true;
        self.pause_started_at = Some(at);
        true
    }

    /// Returns true if the clock was paused and is now running again
    pub fn resume(&mut self, at: f64) -> bool {
        if !self.is_paused {
            return false;
        }
        if let Some(paused_at) = self.pause_started_at.take() {
            self.paused_accum_ms += (at - paused_at).max(0.0);
        }
        self.is_paused = false;
        true
    }

    /// Freeze the clock; a pending pause is closed at `at`
    pub fn finish(&mut self, at: f64) {
        if self.is_finished() {
            return;
        }
        self.resume(at);
        self.finished_at = Some(at);
    }

    /// Active (unpaused) milliseconds between start and `now`, or between
    /// start and the finish point once finished
    pub fn active_ms(&self, now: f64) -> f64 {
        let Some(start) = self.start else {
            return 0.0;
        };
        let end = self.finished_at.unwrap_or(now);
        let open_pause = match (self.is_paused, self.pause_started_at) {
            (true, Some(paused_at)) => (end - paused_at).max(0.0),
            _ => 0.0,
        };

        (end - start - self.paused_accum_ms - open_pause).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_started_has_no_elapsed_time() {
        let clock = SessionClock::new();
        assert!(!clock.has_started());
        assert_eq!(clock.active_ms(10_000.0), 0.0);
    }

    #[test]
    fn test_start_is_sticky() {
        let mut clock = SessionClock::new();
        clock.start(100.0);
        clock.start(500.0);
        assert_eq!(clock.started_at(), Some(100.0));
        assert_eq!(clock.active_ms(1_100.0), 1_000.0);
    }

    #[test]
    fn test_pause_excludes_time() {
        let mut clock = SessionClock::new();
        clock.start(0.0);
        assert!(clock.pause(4_000.0));
        // frozen while paused
        assert_eq!(clock.active_ms(9_000.0), 4_000.0);
        assert!(clock.resume(14_000.0));
        assert_eq!(clock.paused_accum_ms(), 10_000.0);
        assert_eq!(clock.active_ms(20_000.0), 10_000.0);
    }

    #[test]
    fn test_pause_before_start_is_noop() {
        let mut clock = SessionClock::new();
        assert!(!clock.pause(10.0));
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_double_pause_and_resume() {
        let mut clock = SessionClock::new();
        clock.start(0.0);
        assert!(clock.pause(1_000.0));
        assert!(!clock.pause(2_000.0));
        assert!(clock.resume(3_000.0));
        assert!(!clock.resume(4_000.0));
        assert_eq!(clock.paused_accum_ms(), 2_000.0);
    }

    #[test]
    fn test_finish_freezes() {
        let mut clock = SessionClock::new();
        clock.start(0.0);
        clock.finish(60_000.0);
        assert_eq!(clock.active_ms(120_000.0), 60_000.0);
        assert!(!clock.pause(70_000.0));
    }

    #[test]
    fn test_finish_while_paused_closes_pause() {
        let mut clock = SessionClock::new();
        clock.start(0.0);
        clock.pause(5_000.0);
        clock.finish(8_000.0);
        assert!(!clock.is_paused());
        assert_eq!(clock.active_ms(100_000.0), 5_000.0);
    }
}
