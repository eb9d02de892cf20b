#[cfg(not(unix))]
compile_error!("radiru-supervisor relies on POSIX process groups and signals");

mod cli;
mod config;
mod error;
mod launcher;
mod logging;
mod pipeline;
mod process_group;
mod signals;
mod status;
mod supervisor;

use anyhow::Context;

use crate::config::ScheduleConfig;
use crate::launcher::Launcher;
use crate::pipeline::RecordingPipeline;
use crate::signals::RELAY;
use crate::supervisor::{IntervalSleep, Outcome, Supervisor};

fn main() {
    let code = match run_main() {
        Ok(outcome) => {
            if let Outcome::Aborted(pipeline_code) = outcome {
                tracing::error!(pipeline_code, "recording pipeline failed");
            }
            outcome.exit_code()
        }
        Err(err) => {
            tracing::error!(error = ?err, "supervisor failed");
            eprintln!("radiru-supervisor error: {err:?}");
            1
        }
    };
    std::process::exit(code);
}

fn run_main() -> anyhow::Result<Outcome> {
    let config = ScheduleConfig::from(cli::parse());
    logging::init_logging(config.verbose)?;

    signals::install().context("installing termination signal handlers")?;

    let launcher = Launcher::new(&RELAY, RecordingPipeline::new(&config));
    let outcome = Supervisor::new(&config, launcher, IntervalSleep, &RELAY)
        .run()
        .context("supervising recording pipeline")?;
    Ok(outcome)
}
