use std::io;

use tracing::{debug, info};

use crate::error::ExecutionError;
use crate::pipeline::RecordingPipeline;
use crate::process_group::{self, ChildHandle};
use crate::signals::{SignalRelay, TERMINATION_SIGNALS};
use crate::status;

/// One cycle of work, as seen by the supervisor loop.
pub trait Executor {
    /// Run one attempt to completion and return its exit code.
    fn execute(&mut self) -> Result<i32, ExecutionError>;
}

/// Forks the recording pipeline into its own process group and waits for it.
pub struct Launcher<'a> {
    relay: &'a SignalRelay,
    pipeline: RecordingPipeline,
}

impl<'a> Launcher<'a> {
    pub fn new(relay: &'a SignalRelay, pipeline: RecordingPipeline) -> Self {
        Self { relay, pipeline }
    }

    fn spawn(&self) -> Result<ChildHandle, ExecutionError> {
        // SAFETY: the supervisor is single-threaded, so the child starts with
        // a consistent heap and never returns from `run_child`.
        let pid = unsafe { libc::fork() };
        if pid < 0 {
            return Err(ExecutionError::Spawn(io::Error::last_os_error()));
        }
        if pid == 0 {
            run_child(&self.pipeline);
        }

        // Also set from this side so the group exists before we publish it.
        process_group::set_process_group(pid, pid)
            .map_err(|source| ExecutionError::ProcessGroup { pid, source })?;

        Ok(ChildHandle::leader(pid))
    }
}

impl Executor for Launcher<'_> {
    fn execute(&mut self) -> Result<i32, ExecutionError> {
        let child = self.spawn()?;
        self.relay.publish(child);
        info!(pid = child.pid, pgid = child.pgid, "spawned recording pipeline");

        let result = status::wait_for_pid(child.pid);
        self.relay.retire(child);

        let code = result?;
        info!(pgid = child.pgid, exit_code = code, "recording pipeline exited");
        Ok(code)
    }
}

/// Child side of the fork: leave the parent's handlers and group behind,
/// run the pipeline, exit with its code.
fn run_child(pipeline: &RecordingPipeline) -> ! {
    let code = match prepare_child() {
        Ok(()) => pipeline.run(),
        Err(err) => {
            tracing::error!(error = %err, "failed to isolate recording pipeline");
            1
        }
    };
    debug!(exit_code = code, "recording pipeline finished");

    // SAFETY: skips the parent's atexit handlers and buffered state.
    unsafe { libc::_exit(code) }
}

fn prepare_child() -> io::Result<()> {
    process_group::reset_signal_dispositions(&TERMINATION_SIGNALS)?;
    let rc = unsafe { libc::setpgid(0, 0) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
