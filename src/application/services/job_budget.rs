use std::time::{Duration, Instant};

/// The time budget of one queue-dispatched job. The queue layer enforces
/// the hard limit; work inside the job observes the budget cooperatively,
/// keeping every inner timeout strictly below what remains.
#[derive(Debug, Clone, Copy)]
pub struct JobBudget {
    started: Instant,
    soft_limit: Duration,
    hard_limit: Duration,
}

impl JobBudget {
    pub fn new(soft_limit: Duration, hard_limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            soft_limit,
            hard_limit,
        }
    }

    pub fn hard_limit(&self) -> Duration {
        self.hard_limit
    }

    pub fn soft_expired(&self) -> bool {
        self.started.elapsed() >= self.soft_limit
    }

    pub fn remaining(&self) -> Duration {
        self.hard_limit.saturating_sub(self.started.elapsed())
    }

    /// Clamp an inner timeout below the remaining hard budget, leaving a
    /// margin for cleanup before the queue kills the job.
    pub fn clamp_timeout(&self, wanted: Duration) -> Duration {
        let margin = Duration::from_secs(1);
        let ceiling = self.remaining().saturating_sub(margin);
        wanted.min(ceiling.max(Duration::from_secs(1)))
    }
}
