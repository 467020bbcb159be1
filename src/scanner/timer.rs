use std::time::{Duration, Instant};

/// One-shot deadline driven by the caller's clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// Arm the timer, replacing any pending deadline
    pub fn start(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Disarm and return `true` if the deadline has passed
    pub fn fire(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_deadline() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.start(t0, Duration::from_millis(300));

        assert!(!timer.fire(t0 + Duration::from_millis(299)));
        assert!(timer.fire(t0 + Duration::from_millis(300)));
        assert!(!timer.fire(t0 + Duration::from_millis(301)));
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_restart_pushes_deadline() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.start(t0, Duration::from_millis(300));
        timer.start(t0 + Duration::from_millis(200), Duration::from_millis(300));

        assert_eq!(timer.deadline(), Some(t0 + Duration::from_millis(500)));
        assert!(!timer.is_due(t0 + Duration::from_millis(400)));
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.start(t0, Duration::ZERO);
        timer.cancel();

        assert!(!timer.fire(t0 + Duration::from_secs(1)));
        assert_eq!(timer.deadline(), None);
    }
}
