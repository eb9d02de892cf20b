//! The recording pipeline run inside each child process group.
//!
//! Three steps, each an ordinary external process:
//!
//! 1. register: `0:<duration>:<caption>` is fed to `tm crontab -r <duration>
//!    <schedule>`, whose output is piped into `tm set -v -`;
//! 2. record: `<player> <region> <channel>`, only if registration succeeded;
//! 3. deregister: `tm terminate`, always.

use std::ffi::OsStr;
use std::io::{self, Write};
use std::process::{Command, Stdio};

use tracing::{debug, error, warn};

use crate::cli::{Channel, Region};
use crate::config::{ScheduleConfig, ToolPaths};
use crate::status;

const SET_ARGS: [&str; 3] = ["set", "-v", "-"];
const TERMINATE_ARGS: [&str; 1] = ["terminate"];

#[derive(Debug, Clone)]
pub struct RecordingPipeline {
    tools: ToolPaths,
    region: Region,
    channel: Channel,
    schedule: String,
    duration: u32,
    caption: String,
}

impl RecordingPipeline {
    pub fn new(config: &ScheduleConfig) -> Self {
        Self {
            tools: config.tools.clone(),
            region: config.region,
            channel: config.channel,
            schedule: config.schedule.clone(),
            duration: config.duration,
            caption: config.caption.clone(),
        }
    }

    /// Run all three steps and return the pipeline's exit code.
    pub fn run(&self) -> i32 {
        for line in self.describe() {
            debug!(cmd = %line, "pipeline step");
        }

        let registered = self.register();
        let recorded = if registered == 0 {
            Some(self.record())
        } else {
            warn!(exit_code = registered, "registration failed; skipping recording");
            None
        };
        let released = self.deregister();

        pipeline_code(registered, recorded, released)
    }

    /// Human-readable command lines, one per step.
    pub fn describe(&self) -> Vec<String> {
        let tm = self.tools.tm.display();
        vec![
            format!(
                "echo '{}' | {tm} crontab -r {} '{}' | {tm} {}",
                self.entry(),
                self.duration,
                self.schedule,
                SET_ARGS.join(" ")
            ),
            format!(
                "{} {} {}",
                self.tools.player.display(),
                self.region.as_str(),
                self.channel.as_str()
            ),
            format!("{tm} {}", TERMINATE_ARGS.join(" ")),
        ]
    }

    /// Line read by `tm crontab` on stdin.
    fn entry(&self) -> String {
        format!("0:{}:{}", self.duration, self.caption)
    }

    fn register(&self) -> i32 {
        self.try_register()
            .unwrap_or_else(|err| step_failure("register", &self.tools.tm, err))
    }

    fn try_register(&self) -> io::Result<i32> {
        let (reader, writer) = os_pipe::pipe()?;
        let duration = self.duration.to_string();

        let mut crontab = Command::new(&self.tools.tm)
            .args(["crontab", "-r", duration.as_str(), self.schedule.as_str()])
            .stdin(Stdio::piped())
            .stdout(writer)
            .spawn()?;

        // Spawned before feeding crontab so its output always has a reader.
        let set = Command::new(&self.tools.tm)
            .args(SET_ARGS)
            .stdin(reader)
            .spawn();

        if let Some(mut stdin) = crontab.stdin.take() {
            // A crontab that exits without reading reports through its status.
            let _ = writeln!(stdin, "{}", self.entry());
        }

        let crontab_code = status::exit_code(crontab.wait()?);
        let set_code = status::exit_code(set?.wait()?);

        Ok(if crontab_code != 0 { crontab_code } else { set_code })
    }

    fn record(&self) -> i32 {
        run_step(
            "record",
            &self.tools.player,
            [self.region.as_str(), self.channel.as_str()],
        )
    }

    fn deregister(&self) -> i32 {
        run_step("deregister", &self.tools.tm, TERMINATE_ARGS)
    }
}

fn run_step<I, S>(step: &str, program: &std::path::Path, args: I) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    match Command::new(program).args(args).status() {
        Ok(status) => status::exit_code(status),
        Err(err) => step_failure(step, program, err),
    }
}

/// Shell convention: 127 when the program is missing, 126 otherwise.
fn step_failure(step: &str, program: &std::path::Path, err: io::Error) -> i32 {
    error!(step, program = %program.display(), error = %err, "pipeline step could not run");
    if err.kind() == io::ErrorKind::NotFound {
        127
    } else {
        126
    }
}

/// Registration failure wins, then the recording result, then deregistration.
fn pipeline_code(registered: i32, recorded: Option<i32>, released: i32) -> i32 {
    let code = if registered != 0 {
        registered
    } else {
        recorded.unwrap_or(0)
    };
    if code != 0 { code } else { released }
}
