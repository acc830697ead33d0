use crate::{
    config::{Config, OxipngConfig, PngFailurePolicy, ReplacePolicy},
    iconset::{self, IconsetEntry},
    tools::{self, ProcessOutput, ProcessRunner, SystemRunner, Tools},
};
use futures::prelude::*;
use std::{
    ffi::OsString,
    fs::Permissions,
    path::{Path, PathBuf},
    sync::Arc,
};

pub use bundle::IconBundle;
pub use error::{Error, ToolFailure};

mod bundle;
mod error;
mod replace;

/// Everything about a run that isn't a tool location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub png_failure: PngFailurePolicy,
    pub replace: ReplacePolicy,
    pub jobs: usize,
    pub temp_dir: PathBuf,
    pub oxipng: OxipngConfig,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Settings {
            png_failure: config.png_failure,
            replace: config.replace,
            jobs: config.jobs.max(1),
            temp_dir: config.temp_base(),
            oxipng: config.oxipng.clone(),
        }
    }
}

#[derive(Debug)]
pub struct PngFailure {
    pub path: PathBuf,
    pub failure: ToolFailure,
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct Report {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub original_size: u64,
    pub optimized_size: u64,
    /// whether the destination now holds the repacked icon
    pub replaced: bool,
    pub pngs: usize,
    /// PNGs that were left as unpacked because recompressing them failed
    pub png_failures: Vec<PngFailure>,
}

impl Report {
    pub fn saved_bytes(&self) -> u64 {
        if self.replaced {
            self.original_size.saturating_sub(self.optimized_size)
        } else {
            0
        }
    }

    /// Fraction of the original size that was saved, between 0 and 1.
    pub fn saved_ratio(&self) -> f64 {
        if self.original_size == 0 {
            0.0
        } else {
            self.saved_bytes() as f64 / self.original_size as f64
        }
    }
}

/// Shrinks icns files by unpacking them, recompressing every PNG and repacking them.
pub struct Optimizer {
    tools: Tools,
    settings: Settings,
    runner: Arc<dyn ProcessRunner>,
}

impl std::fmt::Debug for Optimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Optimizer")
            .field("tools", &self.tools)
            .field("settings", &self.settings)
            .field("runner", &"<...>")
            .finish()
    }
}

impl Optimizer {
    /// Locates all tools up front, failing with [`Error::ToolNotFound`] if one is missing.
    pub fn new(config: &Config) -> Result<Optimizer, Error> {
        let tools = Tools::resolve(&config.tools, config.packer)?;
        Ok(Self::with_runner(
            tools,
            Settings::from_config(config),
            SystemRunner,
        ))
    }

    pub fn with_runner(
        tools: Tools,
        settings: Settings,
        runner: impl ProcessRunner + 'static,
    ) -> Optimizer {
        Optimizer {
            tools,
            settings,
            runner: Arc::new(runner),
        }
    }

    pub fn tools(&self) -> &Tools {
        &self.tools
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn optimize_icon(&self, source: &Path) -> Result<Report, Error> {
        self.optimize_icon_to(source, source).await
    }

    /// Optimizes `source` and writes the result to `destination`, which may be `source`
    /// itself.
    ///
    /// An existing `destination` is resolved first, so a symlink keeps pointing at the
    /// now optimized file. On error, `destination` is left as it was. Dropping the
    /// returned future kills any running tool and removes the working directory.
    #[tracing::instrument(name = "optimize", skip_all, fields(source = %source.display()))]
    pub async fn optimize_icon_to(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<Report, Error> {
        let (source, original_size, permissions) = check_source(source).await?;
        let destination = resolve_destination(destination).await?;
        tracing::info!(original_size, "optimizing icon");
        let bundle = IconBundle::new(&source, &self.settings.temp_dir).map_err(Error::io(
            format!(
                "failed to create working directory in {}",
                self.settings.temp_dir.display()
            ),
        ))?;
        tracing::debug!(working_dir = %bundle.working_dir().display(), "created working directory");

        let report = self
            .run(&bundle, original_size, permissions, &destination)
            .await?;

        let working_dir = bundle.working_dir().to_owned();
        bundle.close().map_err(Error::io(format!(
            "failed to remove working directory {}",
            working_dir.display()
        )))?;
        Ok(report)
    }

    async fn run(
        &self,
        bundle: &IconBundle,
        original_size: u64,
        permissions: Permissions,
        destination: &Path,
    ) -> Result<Report, Error> {
        self.unpack(bundle).await?;

        let entries = iconset::entries(bundle.iconset_path())
            .await
            .map_err(Error::io("failed to list iconset contents"))?;
        tracing::debug!(count = entries.len(), "found PNG files in iconset");
        let png_failures = self.recompress_all(&entries).await?;

        self.repack(bundle).await?;

        let optimized_size = tokio::fs::metadata(bundle.output_path())
            .await
            .map_err(Error::io("failed to read size of repacked icon"))?
            .len();
        let replaced = match self.settings.replace {
            ReplacePolicy::Always => true,
            ReplacePolicy::IfSmaller => optimized_size <= original_size,
        };

        if replaced {
            tracing::info!(original_size, optimized_size, "writing optimized icon");
            replace::replace_file(bundle.output_path(), destination, Some(permissions))
                .await
                .map_err(Error::io(format!(
                    "failed to write {}",
                    destination.display()
                )))?;
        } else {
            tracing::info!(
                original_size,
                optimized_size,
                "optimized icon is larger, keeping original"
            );
            if !replace::is_same_file(bundle.source_path(), destination) {
                replace::replace_file(bundle.source_path(), destination, Some(permissions))
                    .await
                    .map_err(Error::io(format!(
                        "failed to write {}",
                        destination.display()
                    )))?;
            }
        }

        Ok(Report {
            source: bundle.source_path().to_owned(),
            destination: destination.to_owned(),
            original_size,
            optimized_size,
            replaced,
            pngs: entries.len(),
            png_failures,
        })
    }

    async fn invoke(
        &self,
        program: &Path,
        args: &[OsString],
    ) -> Result<ProcessOutput, tools::Error> {
        tracing::debug!(program = %program.display(), ?args, "running tool");
        self.runner.run(program, args).await
    }

    async fn unpack(&self, bundle: &IconBundle) -> Result<(), Error> {
        let fail = |failure| Error::UnpackFailed {
            icns: bundle.source_path().to_owned(),
            failure,
        };
        let args = tools::unpack_args(bundle.source_path(), bundle.iconset_path());
        ToolFailure::check(self.invoke(self.tools.iconutil(), &args).await).map_err(fail)?;

        if !tokio::fs::metadata(bundle.iconset_path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            return Err(fail(ToolFailure::MissingOutput(
                bundle.iconset_path().to_owned(),
            )));
        }
        Ok(())
    }

    async fn recompress_all(&self, entries: &[IconsetEntry]) -> Result<Vec<PngFailure>, Error> {
        let mut results = stream::iter(entries)
            .map(|entry| async move { (entry, self.recompress(&entry.path).await) })
            .buffer_unordered(self.settings.jobs.max(1))
            .collect::<Vec<_>>()
            .await;
        results.sort_by(|(a, _), (b, _)| a.path.cmp(&b.path));

        let mut failures = Vec::new();
        for (entry, result) in results {
            match result {
                Ok(()) => {}
                Err(Error::PngRecompressFailed { path, failure })
                    if self.settings.png_failure == PngFailurePolicy::Skip =>
                {
                    tracing::warn!(
                        path = %path.display(),
                        size = ?entry.size.map(|s| s.to_string()),
                        error = %failure,
                        "failed to recompress PNG, keeping it as it was"
                    );
                    failures.push(PngFailure { path, failure });
                }
                Err(error) => return Err(error),
            }
        }
        Ok(failures)
    }

    /// Recompresses one PNG in place. If the tool fails, the file gets its original
    /// bytes back so the iconset stays complete.
    async fn recompress(&self, png: &Path) -> Result<(), Error> {
        let fail = |failure| Error::PngRecompressFailed {
            path: png.to_owned(),
            failure,
        };
        let original = tokio::fs::read(png).await.map_err(|e| fail(ToolFailure::Io(e)))?;

        let mut args = self
            .settings
            .oxipng
            .args()
            .into_iter()
            .map(OsString::from)
            .collect::<Vec<_>>();
        args.push(png.into());

        match ToolFailure::check(self.invoke(self.tools.oxipng(), &args).await) {
            Ok(()) => Ok(()),
            Err(failure) => {
                tokio::fs::write(png, &original)
                    .await
                    .map_err(Error::io(format!("failed to restore {}", png.display())))?;
                Err(fail(failure))
            }
        }
    }

    async fn repack(&self, bundle: &IconBundle) -> Result<(), Error> {
        let packer = self.tools.packer();
        let fail = |failure| Error::RepackFailed { packer, failure };
        let args = packer.repack_args(bundle.iconset_path(), bundle.output_path());
        ToolFailure::check(self.invoke(self.tools.packer_path(), &args).await).map_err(fail)?;

        if !tokio::fs::metadata(bundle.output_path())
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            return Err(fail(ToolFailure::MissingOutput(
                bundle.output_path().to_owned(),
            )));
        }
        Ok(())
    }
}

/// Resolves the source to an absolute path and returns its size and permissions.
async fn check_source(source: &Path) -> Result<(PathBuf, u64, Permissions), Error> {
    let is_icns = source
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("icns"))
        .unwrap_or(false);
    if !is_icns {
        return Err(Error::InvalidSource {
            path: source.to_owned(),
            reason: "file name doesn't end in .icns",
        });
    }

    let metadata = tokio::fs::metadata(source)
        .await
        .map_err(Error::io(format!("failed to read {}", source.display())))?;
    if !metadata.is_file() {
        return Err(Error::InvalidSource {
            path: source.to_owned(),
            reason: "not a regular file",
        });
    }
    let source = tokio::fs::canonicalize(source)
        .await
        .map_err(Error::io(format!("failed to resolve {}", source.display())))?;
    Ok((source, metadata.len(), metadata.permissions()))
}

/// Follows symlinks in an existing destination so the file they point at gets
/// replaced instead of the link.
async fn resolve_destination(destination: &Path) -> Result<PathBuf, Error> {
    match tokio::fs::canonicalize(destination).await {
        Ok(resolved) => Ok(resolved),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(destination.to_owned()),
        Err(e) => Err(Error::io(format!("failed to resolve {}", destination.display()))(e)),
    }
}
