//! Errors surfaced by the launcher, translator and signal relay.
//!
//! Every component boundary reports failures as an [`ExecutionError`]; only
//! `main` decides what to do with them (log and exit 1).

use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to fork the recording pipeline")]
    Spawn(#[source] io::Error),

    #[error("failed to move child {pid} into its own process group")]
    ProcessGroup {
        pid: libc::pid_t,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for child {pid}")]
    Wait {
        pid: libc::pid_t,
        #[source]
        source: io::Error,
    },

    #[error("failed to install handler for signal {signal}")]
    SignalInstall {
        signal: libc::c_int,
        #[source]
        source: io::Error,
    },

    #[error("failed to sleep for {interval:?} between cycles")]
    Sleep {
        interval: Duration,
        #[source]
        source: io::Error,
    },

    #[error("failed to relay signal {signal} to process group {pgid}")]
    Relay {
        signal: libc::c_int,
        pgid: libc::pid_t,
        #[source]
        source: io::Error,
    },
}
