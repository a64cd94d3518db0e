use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::OracleFailure;

/// Time budget and cancellation flag for one oracle call.
#[derive(Debug, Clone)]
pub struct Deadline {
    start: Instant,
    limit: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Deadline {
    pub fn new(limit: Option<Duration>, cancel: Option<Arc<AtomicBool>>) -> Self {
        Self {
            start: Instant::now(),
            limit,
            cancel,
        }
    }

    /// No time limit and no cancellation.
    pub fn unbounded() -> Self {
        Self::new(None, None)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Fails once the budget is spent or cancellation was requested.
    pub fn check(&self) -> Result<(), OracleFailure> {
        if let Some(cancel) = &self.cancel {
            if cancel.load(Ordering::Relaxed) {
                return Err(OracleFailure::Cancelled);
            }
        }
        if let Some(limit) = self.limit {
            if self.start.elapsed() >= limit {
                return Err(OracleFailure::Timeout);
            }
        }
        Ok(())
    }
}

/// Step counter that consults a [`Deadline`] every 1024 search nodes.
#[derive(Debug)]
pub struct SearchClock<'a> {
    deadline: &'a Deadline,
    steps: u64,
}

impl<'a> SearchClock<'a> {
    /// 1024 - 1
    const CHECK_MASK: u64 = 0x3FF;

    pub fn new(deadline: &'a Deadline) -> Self {
        Self { deadline, steps: 0 }
    }

    /// Count one node; the first node always checks the deadline.
    #[inline]
    pub fn tick(&mut self) -> Result<(), OracleFailure> {
        let check = self.steps & Self::CHECK_MASK == 0;
        self.steps = self.steps.wrapping_add(1);
        if check {
            self.deadline.check()
        } else {
            Ok(())
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_never_expires() {
        let deadline = Deadline::unbounded();
        let mut clock = SearchClock::new(&deadline);
        for _ in 0..5000 {
            clock.tick().unwrap();
        }
        assert_eq!(clock.steps(), 5000);
    }

    #[test]
    fn test_zero_budget_expires_on_first_tick() {
        let deadline = Deadline::new(Some(Duration::ZERO), None);
        let mut clock = SearchClock::new(&deadline);
        assert_eq!(clock.tick(), Err(OracleFailure::Timeout));
    }

    #[test]
    fn test_cancel_flag_wins() {
        let flag = Arc::new(AtomicBool::new(false));
        let deadline = Deadline::new(Some(Duration::ZERO), Some(flag.clone()));
        flag.store(true, Ordering::Relaxed);
        assert_eq!(deadline.check(), Err(OracleFailure::Cancelled));
    }
}
