use std::fmt;
use std::future::Future;
use log::{debug, error, info};
use tokio::time::Instant;
use crate::trigger::IntervalTrigger;

/// A unit of recurring work driven by a [`Scheduler`]
pub trait ScheduledJob: Send + Sync {
    type Output: fmt::Display + Send;
    type Error: fmt::Display + Send;

    fn name(&self) -> &str;

    fn run(&self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the trigger
    Idle,
    /// One invocation in flight
    Running,
}

/// Cumulative cycle counters since startup
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub runs: u64,
    pub failures: u64,
}

/// Runs one job on an interval trigger, never more than one invocation at a time
///
/// Invocations are awaited inline, so a trigger that falls due while the job
/// is still running waits for it and then fires once. A failed invocation is
/// logged and counted; the schedule carries on.
pub struct Scheduler<J> {
    job: J,
    trigger: IntervalTrigger,
    last_run: Option<Instant>,
    state: SchedulerState,
    stats: CycleStats,
}

impl<J: ScheduledJob> Scheduler<J> {
    pub fn new(job: J, trigger: IntervalTrigger) -> Self {
        Self {
            job,
            trigger,
            last_run: None,
            state: SchedulerState::Idle,
            stats: CycleStats::default(),
        }
    }

    pub fn job(&self) -> &J {
        &self.job
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Start instant of the most recent invocation
    pub fn last_run(&self) -> Option<Instant> {
        self.last_run
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    pub fn next_due(&self) -> Instant {
        self.trigger.next_due(Instant::now(), self.last_run)
    }

    /// Dispatch the job if the trigger is due now; `None` when it is not
    pub async fn run_pending(&mut self) -> Option<Result<J::Output, J::Error>> {
        let now = Instant::now();
        if !self.trigger.due(now, self.last_run) {
            return None;
        }
        Some(self.dispatch(now).await)
    }

    /// Sleep until the trigger is due, then run the job once
    pub async fn step(&mut self) -> Result<J::Output, J::Error> {
        loop {
            tokio::time::sleep_until(self.next_due()).await;
            if let Some(result) = self.run_pending().await {
                return result;
            }
        }
    }

    /// Run the schedule forever
    pub async fn run(&mut self) {
        info!("Scheduling '{}' {}", self.job.name(), self.trigger);
        loop {
            // Failures are already logged and counted by dispatch
            let _ = self.step().await;
        }
    }

    async fn dispatch(&mut self, now: Instant) -> Result<J::Output, J::Error> {
        self.state = SchedulerState::Running;
        self.last_run = Some(now);
        self.stats.runs += 1;
        info!("⏰ Running '{}' (cycle {})", self.job.name(), self.stats.runs);

        let result = self.job.run().await;
        let elapsed = now.elapsed();

        match &result {
            Ok(output) => {
                info!("✅ '{}' finished in {:.1}s: {}", self.job.name(), elapsed.as_secs_f64(), output);
            }
            Err(e) => {
                self.stats.failures += 1;
                error!("❌ '{}' failed after {:.1}s: {}", self.job.name(), elapsed.as_secs_f64(), e);
            }
        }

        self.state = SchedulerState::Idle;
        debug!("{} cycle(s) run, {} failed; next run in {:?}",
               self.stats.runs, self.stats.failures,
               self.next_due().saturating_duration_since(Instant::now()));
        result
    }
}
