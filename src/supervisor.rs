//! The repeat/interval loop.
//!
//! ```text
//! Idle -> Running -> Interval -> Running -> ... -> Terminated
//! ```
//!
//! Termination is only observed at checkpoints: before each attempt and
//! after each attempt completes. A running attempt is stopped solely by the
//! signal relayed to its process group.

use std::io;
use std::time::Duration;

use tracing::info;

use crate::cli::FailurePolicy;
use crate::config::ScheduleConfig;
use crate::error::ExecutionError;
use crate::launcher::Executor;
use crate::signals::SignalRelay;

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Repeats consumed.
    Completed,
    /// An attempt returned an unrecoverable code.
    Aborted(i32),
    /// A termination signal arrived.
    Terminated(libc::c_int),
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Completed => 0,
            Outcome::Aborted(_) => 1,
            Outcome::Terminated(signal) => 128 + signal,
        }
    }
}

/// Remaining extra cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatBudget {
    Unbounded,
    Remaining(u32),
}

impl RepeatBudget {
    pub fn new(repeat: Option<u32>) -> Self {
        match repeat {
            Some(n) => RepeatBudget::Remaining(n),
            None => RepeatBudget::Unbounded,
        }
    }

    /// Use up one cycle. Returns `false` once the budget is exhausted.
    pub fn consume(&mut self) -> bool {
        match self {
            RepeatBudget::Unbounded => true,
            RepeatBudget::Remaining(0) => false,
            RepeatBudget::Remaining(n) => {
                *n -= 1;
                true
            }
        }
    }
}

/// Waits between cycles.
pub trait Pause {
    fn pause(&mut self, interval: Duration) -> Result<(), ExecutionError>;
}

/// `nanosleep` that gives up on the first signal, so a shutdown request is
/// noticed without waiting out the interval.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntervalSleep;

impl Pause for IntervalSleep {
    fn pause(&mut self, interval: Duration) -> Result<(), ExecutionError> {
        let tv_sec =
            libc::time_t::try_from(interval.as_secs()).map_err(|_| ExecutionError::Sleep {
                interval,
                source: io::Error::from_raw_os_error(libc::EINVAL),
            })?;
        let request = libc::timespec {
            tv_sec,
            tv_nsec: interval.subsec_nanos() as libc::c_long,
        };

        let rc = unsafe { libc::nanosleep(&request, std::ptr::null_mut()) };
        if rc != 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                return Err(ExecutionError::Sleep { interval, source: err });
            }
        }
        Ok(())
    }
}

pub struct Supervisor<'a, E, P> {
    executor: E,
    pause: P,
    relay: &'a SignalRelay,
    policy: FailurePolicy,
    interval: Duration,
    budget: RepeatBudget,
}

impl<'a, E: Executor, P: Pause> Supervisor<'a, E, P> {
    pub fn new(config: &ScheduleConfig, executor: E, pause: P, relay: &'a SignalRelay) -> Self {
        Self {
            executor,
            pause,
            relay,
            policy: config.failure_policy,
            interval: config.interval,
            budget: RepeatBudget::new(config.repeat),
        }
    }

    pub fn run(&mut self) -> Result<Outcome, ExecutionError> {
        info!(interval_secs = self.interval.as_secs(), budget = ?self.budget, "supervisor started");
        let termination = self.relay.termination();

        while !termination.is_terminated() {
            let code = self.executor.execute()?;

            if let Some(fault) = self.relay.take_fault() {
                return Err(fault);
            }

            if self.policy.is_unrecoverable(code) {
                info!(exit_code = code, "unrecoverable pipeline failure; stopping");
                return Ok(Outcome::Aborted(code));
            }

            if termination.is_terminated() {
                break;
            }

            if !self.budget.consume() {
                break;
            }

            info!(secs = self.interval.as_secs(), "waiting for next cycle");
            self.pause.pause(self.interval)?;
        }

        let outcome = match termination.signal() {
            Some(signal) => {
                info!(signal, "exiting on signal");
                Outcome::Terminated(signal)
            }
            None => {
                info!("all cycles completed");
                Outcome::Completed
            }
        };
        Ok(outcome)
    }
}
