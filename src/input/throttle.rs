use std::time::{Duration, Instant};

/// Lets at most one call through per `wait`; calls inside the window are
/// dropped.
///
/// Time is passed in so callers drive it from their own event loop.
#[derive(Debug)]
pub struct Throttle {
    wait: Duration,
    last_call: Option<Instant>,
}

impl Throttle {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            last_call: None,
        }
    }

    /// Returns true, and starts a new window, if a call may run at `now`.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        let open = match self.last_call {
            Some(last) => now.saturating_duration_since(last) >= self.wait,
            None => true,
        };
        if open {
            self.last_call = Some(now);
        }
        open
    }
}
