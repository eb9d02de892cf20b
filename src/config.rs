//! Immutable run configuration, built once from validated arguments.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{Channel, CliArgs, FailurePolicy, Region};

/// External programs the pipeline calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// TimeManager (`tm`): `crontab`, `set` and `terminate` subcommands.
    pub tm: PathBuf,
    pub player: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub region: Region,
    pub channel: Channel,
    pub schedule: String,
    /// Recording length in seconds.
    pub duration: u32,
    pub caption: String,
    pub interval: Duration,
    /// Extra cycles after the first; `None` repeats forever.
    pub repeat: Option<u32>,
    pub verbose: bool,
    pub failure_policy: FailurePolicy,
    pub tools: ToolPaths,
}

impl From<CliArgs> for ScheduleConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            region: args.region,
            channel: args.channel,
            schedule: args.schedule,
            duration: args.duration,
            caption: args.caption,
            interval: Duration::from_secs(args.interval),
            repeat: args.repeat,
            verbose: args.verbose,
            failure_policy: args.abort_on,
            tools: ToolPaths {
                tm: args.tm,
                player: args.player,
            },
        }
    }
}
