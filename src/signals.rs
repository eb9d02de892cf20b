//! Termination signal relay.
//!
//! SIGINT, SIGQUIT and SIGTERM are caught by the supervisor, recorded in a
//! [`TerminationState`] and forwarded unchanged to the process group of the
//! currently running child. Everything the handler touches is an atomic in
//! [`RELAY`], so the main loop can read it without locks.

use std::io;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use crate::error::ExecutionError;
use crate::process_group::{self, ChildHandle};

/// The signals that mean "shut down".
pub const TERMINATION_SIGNALS: [libc::c_int; 3] = [libc::SIGINT, libc::SIGQUIT, libc::SIGTERM];

/// Relay consulted by the installed handlers.
pub static RELAY: SignalRelay = SignalRelay::new();

/// Whether a termination signal has arrived, and which one.
#[derive(Debug)]
pub struct TerminationState {
    terminated: AtomicBool,
    signal: AtomicI32,
}

impl TerminationState {
    pub const fn new() -> Self {
        Self {
            terminated: AtomicBool::new(false),
            signal: AtomicI32::new(0),
        }
    }

    /// Mark as terminated by `signal`. Later deliveries overwrite the signal.
    pub fn record(&self, signal: libc::c_int) {
        self.signal.store(signal, Ordering::Release);
        self.terminated.store(true, Ordering::Release);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub fn signal(&self) -> Option<libc::c_int> {
        if self.is_terminated() {
            Some(self.signal.load(Ordering::Acquire))
        } else {
            None
        }
    }
}

impl Default for TerminationState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct SignalRelay {
    termination: TerminationState,
    /// Process group of the published child; 0 when none is live.
    active_pgid: AtomicI32,
    /// errno of the last failed delivery; 0 when none.
    fault_errno: AtomicI32,
    fault_pgid: AtomicI32,
    fault_signal: AtomicI32,
}

impl SignalRelay {
    pub const fn new() -> Self {
        Self {
            termination: TerminationState::new(),
            active_pgid: AtomicI32::new(0),
            fault_errno: AtomicI32::new(0),
            fault_pgid: AtomicI32::new(0),
            fault_signal: AtomicI32::new(0),
        }
    }

    pub fn termination(&self) -> &TerminationState {
        &self.termination
    }

    /// Make `child` the target of subsequent deliveries.
    pub fn publish(&self, child: ChildHandle) {
        self.active_pgid.store(child.pgid, Ordering::Release);
    }

    /// Stop targeting `child`, unless a newer child has been published since.
    pub fn retire(&self, child: ChildHandle) {
        let _ = self.active_pgid.compare_exchange(
            child.pgid,
            0,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub fn active_pgid(&self) -> Option<libc::pid_t> {
        match self.active_pgid.load(Ordering::Acquire) {
            0 => None,
            pgid => Some(pgid),
        }
    }

    /// Handler body: record termination, then forward `signal` to the
    /// active child group. A group that no longer exists is not an error.
    ///
    /// Async-signal-safe: atomics and `kill(2)` only.
    pub fn relay(&self, signal: libc::c_int) {
        self.termination.record(signal);

        let Some(pgid) = self.active_pgid() else {
            return;
        };

        if let Err(err) = process_group::signal_group(pgid, signal) {
            let errno = err.raw_os_error().unwrap_or(libc::EIO);
            if errno == libc::ESRCH {
                return;
            }
            self.fault_pgid.store(pgid, Ordering::Relaxed);
            self.fault_signal.store(signal, Ordering::Relaxed);
            self.fault_errno.store(errno, Ordering::Release);
        }
    }

    /// Take the last delivery failure, if any, as a fatal error.
    pub fn take_fault(&self) -> Option<ExecutionError> {
        let errno = self.fault_errno.swap(0, Ordering::AcqRel);
        if errno == 0 {
            return None;
        }
        Some(ExecutionError::Relay {
            signal: self.fault_signal.load(Ordering::Relaxed),
            pgid: self.fault_pgid.load(Ordering::Relaxed),
            source: io::Error::from_raw_os_error(errno),
        })
    }
}

impl Default for SignalRelay {
    fn default() -> Self {
        Self::new()
    }
}

extern "C" fn on_termination_signal(signal: libc::c_int) {
    relay_preserving_errno(&RELAY, signal);
}

/// Run the relay without leaking a failed `kill`'s errno into whatever the
/// interrupted code was about to read.
fn relay_preserving_errno(relay: &SignalRelay, signal: libc::c_int) {
    // SAFETY: errno is thread-local and this thread is the one interrupted.
    let saved = unsafe { *errno_location() };
    relay.relay(signal);
    unsafe { *errno_location() = saved };
}

#[cfg(any(target_os = "linux", target_os = "android"))]
unsafe fn errno_location() -> *mut libc::c_int {
    unsafe { libc::__errno_location() }
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
unsafe fn errno_location() -> *mut libc::c_int {
    unsafe { libc::__error() }
}

/// Route every termination signal to [`RELAY`].
///
/// `SA_RESTART` is left off so blocking waits and sleeps return `EINTR` and
/// the main loop gets to look at the termination state.
pub fn install() -> Result<(), ExecutionError> {
    for signal in TERMINATION_SIGNALS {
        // SAFETY: the handler only touches atomics and calls kill(2), both
        // async-signal-safe; the struct is zeroed and its mask initialised.
        let rc = unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction =
                on_termination_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
            action.sa_flags = 0;
            libc::sigemptyset(&mut action.sa_mask);
            libc::sigaction(signal, &action, ptr::null_mut())
        };
        if rc != 0 {
            return Err(ExecutionError::SignalInstall {
                signal,
                source: io::Error::last_os_error(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::{CommandExt, ExitStatusExt};
    use std::process::Command;

    #[test]
    fn fresh_state_is_not_terminated() {
        let state = TerminationState::new();
        assert!(!state.is_terminated());
        assert_eq!(state.signal(), None);
    }

    #[test]
    fn last_recorded_signal_wins() {
        let state = TerminationState::new();
        state.record(libc::SIGINT);
        state.record(libc::SIGTERM);
        assert!(state.is_terminated());
        assert_eq!(state.signal(), Some(libc::SIGTERM));
    }

    #[test]
    fn relay_without_active_child_only_records() {
        let relay = SignalRelay::new();
        relay.relay(libc::SIGTERM);

        assert_eq!(relay.termination().signal(), Some(libc::SIGTERM));
        assert!(relay.take_fault().is_none());
    }

    #[test]
    fn relay_forwards_the_same_signal_to_the_child_group() {
        let mut child = Command::new("sleep")
            .arg("30")
            .process_group(0)
            .spawn()
            .expect("spawn sleep");
        let handle = ChildHandle::leader(child.id() as libc::pid_t);

        let relay = SignalRelay::new();
        relay.publish(handle);
        relay.relay(libc::SIGQUIT);

        let status = child.wait().unwrap();
        assert_eq!(status.signal(), Some(libc::SIGQUIT));
        assert_eq!(relay.termination().signal(), Some(libc::SIGQUIT));
        assert!(relay.take_fault().is_none());
    }

    #[test]
    fn relay_to_vanished_group_is_not_a_fault() {
        let mut child = Command::new("true").process_group(0).spawn().unwrap();
        let handle = ChildHandle::leader(child.id() as libc::pid_t);
        child.wait().unwrap();

        let relay = SignalRelay::new();
        relay.publish(handle);
        relay.relay(libc::SIGINT);

        assert!(relay.termination().is_terminated());
        assert!(relay.take_fault().is_none());
    }

    #[test]
    fn handler_entry_restores_errno_after_failed_delivery() {
        let mut child = Command::new("true").process_group(0).spawn().unwrap();
        let handle = ChildHandle::leader(child.id() as libc::pid_t);
        child.wait().unwrap();

        let relay = SignalRelay::new();
        relay.publish(handle);

        unsafe { *errno_location() = libc::EAGAIN };
        // kill(-pgid) fails with ESRCH inside.
        relay_preserving_errno(&relay, libc::SIGTERM);
        let errno = unsafe { *errno_location() };

        assert_eq!(errno, libc::EAGAIN);
        assert_eq!(relay.termination().signal(), Some(libc::SIGTERM));
        assert!(relay.take_fault().is_none());
    }

    #[test]
    fn retire_ignores_stale_handles() {
        let relay = SignalRelay::new();
        let old = ChildHandle::leader(100);
        let new = ChildHandle::leader(200);

        relay.publish(old);
        relay.publish(new);
        relay.retire(old);
        assert_eq!(relay.active_pgid(), Some(200));

        relay.retire(new);
        assert_eq!(relay.active_pgid(), None);
    }
}
