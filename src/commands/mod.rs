use crate::cli::{Cli, ConfigFile};
use icnsoptim_core::{
    config::Config,
    pipeline::{Optimizer, Report},
};
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

async fn load_config(config_file: ConfigFile) -> eyre::Result<Config> {
    let config = match config_file {
        ConfigFile::Explicit(path) => Config::parse_file(&path).await?,
        ConfigFile::Default(Some(path)) if path.exists() => Config::parse_file(&path).await?,
        ConfigFile::Default(_) => Config::default(),
    };
    if let Some(source) = &config.source {
        tracing::debug!(path = %source.display(), "loaded configuration");
    }
    Ok(config)
}

pub fn print_config(config: &Config) -> eyre::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Runs the command line. Returns whether every file was optimized successfully.
pub async fn run(cli: Cli) -> eyre::Result<bool> {
    let mut config = load_config(cli.config_file()).await?;
    cli.apply(&mut config);
    config.validate()?;

    if cli.print_config {
        print_config(&config)?;
        return Ok(true);
    }
    if cli.output.is_some() && cli.files.len() != 1 {
        eyre::bail!("--output can only be used with a single input file");
    }

    let optimizer = Optimizer::new(&config)?;
    tracing::debug!(tools = ?optimizer.tools(), "located tools");
    Ok(optimize(&optimizer, &cli.files, cli.output.as_deref()).await)
}

pub async fn optimize(optimizer: &Optimizer, files: &[PathBuf], output: Option<&Path>) -> bool {
    let mut all_ok = true;
    for file in files {
        let started = Instant::now();
        let result = match output {
            Some(output) => optimizer.optimize_icon_to(file, output).await,
            None => optimizer.optimize_icon(file).await,
        };
        match result {
            Ok(report) => println!("{}", summary(file, &report, started.elapsed())),
            Err(error) => {
                tracing::error!("{}: {}", file.display(), error_chain(error));
                all_ok = false;
            }
        }
    }
    all_ok
}

fn error_chain(error: icnsoptim_core::pipeline::Error) -> String {
    format!("{:#}", eyre::Report::new(error))
}

fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::DECIMAL)
}

fn summary(file: &Path, report: &Report, elapsed: Duration) -> String {
    let elapsed = humantime::format_duration(Duration::from_millis(elapsed.as_millis() as u64));
    let mut line = if report.replaced {
        format!(
            "{}: {} -> {} ({:.1}% smaller) in {}",
            file.display(),
            format_size(report.original_size),
            format_size(report.optimized_size),
            report.saved_ratio() * 100.0,
            elapsed
        )
    } else {
        format!(
            "{}: {} already optimal, kept it in {}",
            file.display(),
            format_size(report.original_size),
            elapsed
        )
    };
    match report.png_failures.len() {
        0 => {}
        1 => line.push_str(" (1 image left unoptimized)"),
        n => line.push_str(&format!(" ({} images left unoptimized)", n)),
    }
    line
}
