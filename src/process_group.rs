use std::io;

/// The live child of the supervisor: a process that leads its own group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildHandle {
    pub pid: libc::pid_t,
    pub pgid: libc::pid_t,
}

impl ChildHandle {
    /// Handle for a child that has made itself leader of a new group.
    pub fn leader(pid: libc::pid_t) -> Self {
        Self { pid, pgid: pid }
    }
}

pub fn set_process_group(pid: libc::pid_t, pgid: libc::pid_t) -> io::Result<()> {
    loop {
        let rc = unsafe { libc::setpgid(pid, pgid) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(code) if code == libc::EINTR => continue,
            // Already exec'd or gone; the child's own setpgid covers it.
            Some(code) if code == libc::EACCES || code == libc::ESRCH => return Ok(()),
            _ => return Err(err),
        }
    }
}

/// Send `signal` to every process in group `pgid`.
///
/// Runs inside a signal handler, so it must not allocate.
pub fn signal_group(pgid: libc::pid_t, signal: libc::c_int) -> io::Result<()> {
    if pgid <= 0 {
        return Err(io::Error::from_raw_os_error(libc::EINVAL));
    }

    loop {
        let rc = unsafe { libc::kill(-pgid, signal) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}

/// Restore default handling for `signals` so this process can be stopped
/// independently of whatever the parent installed.
pub fn reset_signal_dispositions(signals: &[libc::c_int]) -> io::Result<()> {
    for &signal in signals {
        let previous = unsafe { libc::signal(signal, libc::SIG_DFL) };
        if previous == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}
