// src/lifecycle/poll.rs

//! Stop-verification timing: the settle/poll schedule and the sleeper that
//! waits it out.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Abstraction over "wait for this long".
///
/// Production code uses [`TokioSleeper`]; tests swap in a recorder so the
/// schedule runs without real wall-clock waits.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// How long to wait for a stopped stack to converge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopPolicy {
    /// Pause after issuing stop, before the first poll.
    pub settle: Duration,
    /// Number of status polls.
    pub attempts: u32,
    /// Pause after each poll that still observes running containers.
    pub interval: Duration,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(2),
            attempts: 3,
            interval: Duration::from_secs(3),
        }
    }
}

impl StopPolicy {
    pub fn schedule(&self) -> PollSchedule {
        PollSchedule {
            policy: *self,
            settled: false,
            polls: 0,
            wait_pending: false,
        }
    }

    /// Total time spent waiting when no poll ever converges.
    pub fn worst_case_wait(&self) -> Duration {
        self.schedule()
            .filter_map(|step| match step {
                PollStep::Wait(d) => Some(d),
                PollStep::Poll(_) => None,
            })
            .sum()
    }
}

/// One step of the stop-verification schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    Wait(Duration),
    /// Poll number, starting at 1.
    Poll(u32),
}

/// Bounded iterator: settle, then `attempts` polls each followed by an
/// interval wait.
///
/// The caller stops consuming as soon as a poll converges, so the trailing
/// wait only happens for polls that still observed running containers.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    policy: StopPolicy,
    settled: bool,
    polls: u32,
    wait_pending: bool,
}

impl Iterator for PollSchedule {
    type Item = PollStep;

    fn next(&mut self) -> Option<PollStep> {
        if !self.settled {
            self.settled = true;
            return Some(PollStep::Wait(self.policy.settle));
        }
        if self.wait_pending {
            self.wait_pending = false;
            return Some(PollStep::Wait(self.policy.interval));
        }
        if self.polls < self.policy.attempts {
            self.polls += 1;
            self.wait_pending = true;
            return Some(PollStep::Poll(self.polls));
        }
        None
    }
}
