mod bootstrap;
mod config;
mod loop_runner;
mod net;
mod store;
mod world;

use std::process::ExitCode;

use tracing::error;

pub(crate) fn run() -> ExitCode {
    match bootstrap::build_app() {
        Ok(wiring) => loop_runner::run(wiring),
        Err(err) => {
            error!(error = %err, "startup_failed");
            eprintln!("plaza: {err}");
            ExitCode::FAILURE
        }
    }
}
