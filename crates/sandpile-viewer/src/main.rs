use std::process::ExitCode;

use sandpile_engine::device::GpuInit;
use sandpile_engine::error;
use sandpile_engine::logging::{init_logging, LoggingConfig};
use sandpile_engine::sandpile::{SandpileApp, SandpileConfig};
use sandpile_engine::window::{Runtime, RuntimeConfig};

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    let app = SandpileApp::new(SandpileConfig::default());
    match Runtime::run(RuntimeConfig::default(), GpuInit::default(), app) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::from(error::exit_code(&err))
        }
    }
}
