use std::time::Duration;

/// A continuation that fires once, after its delay has elapsed on the tick clock.
///
/// Dropping it cancels it.
#[derive(Debug)]
pub struct Delayed<T> {
    delay: Duration,
    remaining: Duration,
    payload: Option<T>,
}

impl<T> Delayed<T> {
    pub fn new(delay: Duration, payload: T) -> Self {
        Self {
            delay,
            remaining: delay,
            payload: Some(payload),
        }
    }

    /// Counts `dt` off the delay. Returns the payload the first time the delay is used up,
    /// `None` before that and on every later call.
    pub fn advance(&mut self, dt: Duration) -> Option<T> {
        self.remaining = self.remaining.saturating_sub(dt);
        if self.remaining.is_zero() {
            self.payload.take()
        } else {
            None
        }
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn is_spent(&self) -> bool {
        self.payload.is_none()
    }

    pub fn ratio(&self) -> f64 {
        if self.delay.is_zero() {
            return 1.0;
        }
        (1.0 - self.remaining.as_secs_f64() / self.delay.as_secs_f64()).clamp(0.0, 1.0)
    }
}
