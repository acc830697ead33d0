use dirs_next as dirs;
use icnsoptim_core::{
    config::{Config, PngFailurePolicy, ReplacePolicy},
    tools::Packer,
};
use std::path::PathBuf;

/// Where the configuration comes from.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigFile {
    /// Given on the command line or in the environment, so it has to exist.
    Explicit(PathBuf),
    /// The per-user default, which is fine to be missing.
    Default(Option<PathBuf>),
}

impl ConfigFile {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("icnsoptim").join("config.toml"))
    }
}

/// Makes .icns icon files smaller by losslessly recompressing the PNG images inside them.
#[derive(Debug, clap::Parser)]
#[command(version)]
pub struct Cli {
    /// Sets a custom configuration file path
    #[arg(short, long, env = "ICNSOPTIM_CONFIG_FILE", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Writes the optimized icon to PATH instead of replacing the input file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Sets the iconutil binary to use
    #[arg(long, value_name = "PATH")]
    pub iconutil: Option<PathBuf>,

    /// Sets the oxipng binary to use
    #[arg(long, value_name = "PATH")]
    pub oxipng: Option<PathBuf>,

    /// Sets the createicns binary to use
    #[arg(long, value_name = "PATH")]
    pub createicns: Option<PathBuf>,

    /// Selects the tool that repacks the icon: iconutil or createicns
    #[arg(long, value_name = "PACKER")]
    pub packer: Option<Packer>,

    /// Number of PNG images recompressed at the same time
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Fails an icon if any of its images can't be recompressed
    #[arg(long)]
    pub abort_on_png_failure: bool,

    /// Replaces icons even when the optimized version turns out larger
    #[arg(long)]
    pub always_replace: bool,

    /// Shows more log output, repeat for even more
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only shows errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Prints the active configuration and exits
    #[arg(long)]
    pub print_config: bool,

    /// The icon files to optimize
    #[arg(value_name = "FILE", required_unless_present = "print_config")]
    pub files: Vec<PathBuf>,
}

impl Cli {
    pub fn config_file(&self) -> ConfigFile {
        match &self.config_file {
            Some(path) => ConfigFile::Explicit(path.clone()),
            None => ConfigFile::Default(ConfigFile::default_path()),
        }
    }

    /// Applies command-line overrides on top of the configuration file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(iconutil) = &self.iconutil {
            config.tools.iconutil = Some(iconutil.clone());
        }
        if let Some(oxipng) = &self.oxipng {
            config.tools.oxipng = Some(oxipng.clone());
        }
        if let Some(createicns) = &self.createicns {
            config.tools.createicns = Some(createicns.clone());
        }
        if let Some(packer) = self.packer {
            config.packer = packer;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if self.abort_on_png_failure {
            config.png_failure = PngFailurePolicy::Abort;
        }
        if self.always_replace {
            config.replace = ReplacePolicy::Always;
        }
    }
}
