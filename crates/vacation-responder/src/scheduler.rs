use anyhow::Result;
use std::time::Duration;
use tokio::time::{self, Interval, MissedTickBehavior};

/// Source of poll triggers.
#[allow(async_fn_in_trait)]
pub trait Trigger {
    /// Wait for the next trigger. Returns `false` once no more will come.
    async fn fired(&mut self) -> bool;
}

/// Work executed on every trigger.
#[allow(async_fn_in_trait)]
pub trait PollJob {
    async fn run(&self) -> Result<()>;
}

/// Fixed-interval trigger. Fires immediately, then once per period; missed
/// periods are pushed back rather than fired in a burst.
pub struct IntervalTrigger {
    ticker: Interval,
}

impl IntervalTrigger {
    pub fn new(period: Duration) -> Self {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { ticker }
    }
}

impl Trigger for IntervalTrigger {
    async fn fired(&mut self) -> bool {
        self.ticker.tick().await;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Runs a poll job on every trigger, one at a time.
///
/// The next trigger is awaited only after the current run returns, so two
/// runs never overlap against the same mailbox.
pub struct PollScheduler<T, J> {
    trigger: T,
    job: J,
    state: SchedulerState,
    runs: u64,
}

impl<T: Trigger, J: PollJob> PollScheduler<T, J> {
    pub fn new(trigger: T, job: J) -> Self {
        Self {
            trigger,
            job,
            state: SchedulerState::Idle,
            runs: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Run until the trigger is exhausted. A failed run is logged and the
    /// loop carries on with the next trigger.
    pub async fn run(&mut self) {
        tracing::info!("Starting poll scheduler");

        while self.trigger.fired().await {
            self.run_once().await;
        }

        tracing::info!("Poll scheduler stopped after {} runs", self.runs);
    }

    async fn run_once(&mut self) {
        self.state = SchedulerState::Running;
        self.runs += 1;
        tracing::debug!("Running poll cycle {}", self.runs);

        let result = self.job.run().await;
        self.state = SchedulerState::Idle;

        if let Err(e) = result {
            tracing::error!("Poll cycle {} failed: {:?}", self.runs, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountedTrigger {
        remaining: usize,
    }

    impl Trigger for CountedTrigger {
        async fn fired(&mut self) -> bool {
            if self.remaining == 0 {
                return false;
            }
            self.remaining -= 1;
            true
        }
    }

    /// Fails on the runs listed in `fail_on` (1-based) and tracks overlap.
    #[derive(Default)]
    struct RecordingJob {
        runs: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fail_on: Vec<usize>,
    }

    impl PollJob for Arc<RecordingJob> {
        async fn run(&self) -> Result<()> {
            let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_on.contains(&run) {
                anyhow::bail!("simulated failure on run {}", run);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_runs_once_per_trigger() {
        let job = Arc::new(RecordingJob::default());
        let mut scheduler = PollScheduler::new(CountedTrigger { remaining: 3 }, job.clone());

        assert_eq!(scheduler.state(), SchedulerState::Idle);
        scheduler.run().await;

        assert_eq!(job.runs.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.runs(), 3);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_failed_run_does_not_stop_loop() {
        let job = Arc::new(RecordingJob {
            fail_on: vec![1, 2],
            ..Default::default()
        });
        let mut scheduler = PollScheduler::new(CountedTrigger { remaining: 4 }, job.clone());

        scheduler.run().await;

        assert_eq!(job.runs.load(Ordering::SeqCst), 4);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_runs_never_overlap() {
        let job = Arc::new(RecordingJob::default());
        let mut scheduler = PollScheduler::new(CountedTrigger { remaining: 5 }, job.clone());

        scheduler.run().await;

        assert_eq!(job.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_interval_trigger_fires_immediately() {
        let mut trigger = IntervalTrigger::new(Duration::from_secs(3600));

        let fired = time::timeout(Duration::from_secs(5), trigger.fired()).await;

        assert_eq!(fired.ok(), Some(true));
    }
}
