use cli::Cli;
use std::{io::IsTerminal as _, process::ExitCode};

pub mod cli;
pub mod commands;

pub use commands::run;

pub fn setup_logger(cli: &Cli) -> eyre::Result<()> {
    use tracing_subscriber::{
        filter::LevelFilter, fmt::layer, layer::SubscriberExt, util::SubscriberInitExt, Registry,
    };

    let level = if cli.quiet {
        LevelFilter::ERROR
    } else {
        match cli.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    Registry::default()
        .with(level)
        .with(
            layer()
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init()?;
    Ok(())
}

/// Runs the command line until it finishes or Ctrl-C is pressed, which cancels the
/// current icon and exits with status 130.
pub async fn run_until_interrupted(cli: Cli) -> eyre::Result<ExitCode> {
    tokio::select! {
        result = run(cli) => {
            if result? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted, cleaning up");
            Ok(ExitCode::from(130))
        }
    }
}
