use std::process::ExitCode;

use clap::Parser;
use tracing::metadata::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zmonitors::cli::ZmonitorsArgs;

fn main() -> ExitCode {
    let args = ZmonitorsArgs::parse();

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::DEBUG.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to set up logging: {err}");
        return ExitCode::FAILURE;
    }

    match zmonitors::run(&args) {
        Ok(()) => ExitCode::SUCCESS,

        Err(err) => {
            tracing::error!(%err, "zmonitors failed");

            let mut source = std::error::Error::source(&err);
            while let Some(err) = source {
                tracing::error!(%err, "caused by");
                source = err.source();
            }

            ExitCode::FAILURE
        }
    }
}
