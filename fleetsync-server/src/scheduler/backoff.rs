use std::time::Duration;

/// Doubling delay, capped, reset on success.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Option<Duration>,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max: max.max(base), current: None }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = match self.current {
            None => self.base,
            Some(prev) => prev.saturating_mul(2).min(self.max),
        };
        self.current = Some(delay);
        delay
    }

    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn is_backing_off(&self) -> bool {
        self.current.is_some()
    }
}
