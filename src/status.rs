use std::io;

use crate::error::ExecutionError;

/// Convert an OS process status into shell-style exit code semantics.
///
/// Processes terminated by signal map to `128 + signal`.
pub fn exit_code(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = status.signal() {
        return 128 + signal;
    }

    1
}

/// Translate a raw `waitpid` status. `None` means the child has not reached
/// a final state yet (stopped or continued).
pub fn exit_code_from_wait_status(raw_status: libc::c_int) -> Option<i32> {
    if unsafe { libc::WIFEXITED(raw_status) } {
        return Some(unsafe { libc::WEXITSTATUS(raw_status) });
    }

    if unsafe { libc::WIFSIGNALED(raw_status) } {
        let signal = unsafe { libc::WTERMSIG(raw_status) };
        return Some(128 + signal);
    }

    None
}

/// Block until `pid` reaches a final state and return its exit code.
///
/// Interrupted waits are retried; any other failure is fatal.
pub fn wait_for_pid(pid: libc::pid_t) -> Result<i32, ExecutionError> {
    let mut raw_status: libc::c_int = 0;

    loop {
        let rc = unsafe { libc::waitpid(pid, &mut raw_status, 0) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return Err(ExecutionError::Wait { pid, source: err });
        }

        if let Some(code) = exit_code_from_wait_status(raw_status) {
            return Ok(code);
        }
    }
}
