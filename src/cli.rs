//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

pub const DEFAULT_INTERVAL_SECS: u64 = 60;
/// Largest interval `nanosleep` accepts (`time_t` seconds).
pub const MAX_INTERVAL_SECS: u64 = i64::MAX as u64;

/// Schedule an NHK radio programme with TimeManager, repeatedly.
///
/// Each cycle registers the recording window with `tm`, plays the stream
/// with the player script and then releases the registration.
#[derive(Debug, Clone, Parser)]
#[command(name = "radiru-supervisor", version, long_about = None)]
pub struct CliArgs {
    /// Broadcast region.
    #[arg(value_enum)]
    pub region: Region,

    /// Channel.
    #[arg(value_enum)]
    pub channel: Channel,

    /// Schedule in `tm crontab` form (e.g. "0 19 * * *"); passed through as-is.
    pub schedule: String,

    /// Recording length in seconds.
    pub duration: u32,

    /// Caption attached to the registration.
    pub caption: String,

    /// Seconds to wait between cycles.
    #[arg(
        short = 'i',
        value_name = "SECS",
        default_value_t = DEFAULT_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(..=MAX_INTERVAL_SECS)
    )]
    pub interval: u64,

    /// Number of extra cycles after the first (default: repeat forever).
    #[arg(short = 'r', value_name = "COUNT")]
    pub repeat: Option<u32>,

    /// Debug logging.
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Which pipeline exit codes stop the supervisor.
    #[arg(long, value_enum, value_name = "POLICY", default_value_t = FailurePolicy::ExitOne)]
    pub abort_on: FailurePolicy,

    /// TimeManager executable.
    #[arg(long, value_name = "PATH", env = "RADIRU_TM", default_value = "tm")]
    pub tm: PathBuf,

    /// Player executable, called as `<player> <region> <channel>`.
    #[arg(long, value_name = "PATH", env = "RADIRU_PLAYER", default_value = "play_radiru.sh")]
    pub player: PathBuf,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Region {
    Sapporo,
    Sendai,
    Tokyo,
    Nagoya,
    Osaka,
    Hiroshima,
    Matsuyama,
    Fukuoka,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Region::Sapporo => "sapporo",
            Region::Sendai => "sendai",
            Region::Tokyo => "tokyo",
            Region::Nagoya => "nagoya",
            Region::Osaka => "osaka",
            Region::Hiroshima => "hiroshima",
            Region::Matsuyama => "matsuyama",
            Region::Fukuoka => "fukuoka",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Channel {
    R1,
    R2,
    Fm,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::R1 => "r1",
            Channel::R2 => "r2",
            Channel::Fm => "fm",
        }
    }
}

/// Decides when a failed cycle ends the whole run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum FailurePolicy {
    /// Only exit code 1 is unrecoverable; anything else is retried next interval.
    ExitOne,
    /// Any nonzero exit code is unrecoverable.
    #[value(name = "any-nonzero")]
    AnyNonZero,
}

impl FailurePolicy {
    pub fn is_unrecoverable(self, code: i32) -> bool {
        match self {
            FailurePolicy::ExitOne => code == 1,
            FailurePolicy::AnyNonZero => code != 0,
        }
    }
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
