use clap::Parser as _;
use icnsoptim::cli::Cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    icnsoptim::setup_logger(&cli)?;
    icnsoptim::run_until_interrupted(cli).await
}
