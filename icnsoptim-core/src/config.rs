use crate::tools::Packer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What to do when a single PNG in the iconset can't be recompressed.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PngFailurePolicy {
    /// Keep the unpacked PNG as it is and carry on with the rest.
    #[default]
    Skip,
    /// Fail the whole run.
    Abort,
}

/// When the repacked icon is written over the destination.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplacePolicy {
    /// Only if the repacked file is smaller than or as large as the original.
    #[default]
    IfSmaller,
    Always,
}

#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iconutil: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oxipng: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub createicns: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "kebab-case")]
pub struct OxipngConfig {
    /// optimization level passed to `oxipng -o`
    pub level: String,
    pub strip_metadata: bool,
}

impl Default for OxipngConfig {
    fn default() -> Self {
        OxipngConfig {
            level: "max".to_owned(),
            strip_metadata: true,
        }
    }
}

impl OxipngConfig {
    const LEVELS: &'static [&'static str] = &["0", "1", "2", "3", "4", "5", "6", "max"];

    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["-o".to_owned(), self.level.clone()];
        if self.strip_metadata {
            args.push("--strip".to_owned());
            args.push("safe".to_owned());
        }
        args
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub packer: Packer,
    pub png_failure: PngFailurePolicy,
    pub replace: ReplacePolicy,
    /// number of PNG files recompressed at the same time
    pub jobs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
    pub tools: ToolsConfig,
    pub oxipng: OxipngConfig,

    /// path of the configuration file, if the configuration was loaded from a file
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            packer: Packer::default(),
            png_failure: PngFailurePolicy::default(),
            replace: ReplacePolicy::default(),
            jobs: default_jobs(),
            temp_dir: None,
            tools: ToolsConfig::default(),
            oxipng: OxipngConfig::default(),
            source: None,
        }
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("invalid configuration string")]
    InvalidConfigString(String, #[source] eyre::Report),
    #[error("invalid configuration file {}", .0.display())]
    InvalidConfigFile(PathBuf, #[source] eyre::Report),
    #[error("i/o error reading configuration file {}", .0.display())]
    IoError(PathBuf, #[source] std::io::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    pub fn parse(s: &str) -> Result<Config, ConfigLoadError> {
        let config: Config = toml::from_str(s)
            .map_err(|e| ConfigLoadError::InvalidConfigString(s.to_owned(), e.into()))?;
        config.validate()?;
        Ok(config)
    }

    pub async fn parse_file(p: &Path) -> Result<Config, ConfigLoadError> {
        let config_string = tokio::fs::read_to_string(p)
            .await
            .map_err(|e| ConfigLoadError::IoError(p.to_owned(), e))?;
        let mut config: Config = toml::from_str(&config_string)
            .map_err(|e| ConfigLoadError::InvalidConfigFile(p.to_owned(), e.into()))?;
        config.validate()?;
        config.source = Some(p.to_owned());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.jobs == 0 {
            return Err(ConfigLoadError::Invalid(
                "jobs must be at least 1".to_owned(),
            ));
        }
        if !OxipngConfig::LEVELS.contains(&self.oxipng.level.as_str()) {
            return Err(ConfigLoadError::Invalid(format!(
                "unknown oxipng level '{}', expected one of {}",
                self.oxipng.level,
                OxipngConfig::LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// Directory the per-run working directories are created in.
    pub fn temp_base(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(temp_dir_base)
    }
}

/// The system temp directory, or `/tmp` if the system one is relative.
///
/// A relative `TMPDIR` would otherwise put working directories under the current directory.
pub fn temp_dir_base() -> PathBuf {
    let t = std::env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        #[cfg(windows)]
        {
            std::env::var("TEMP")
                .or_else(|_| std::env::var("TMP"))
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
        }
        #[cfg(not(windows))]
        {
            PathBuf::from("/tmp")
        }
    }
}
