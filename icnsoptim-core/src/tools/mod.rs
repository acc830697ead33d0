use futures::future::{BoxFuture, FutureExt as _};
use serde::{Deserialize, Serialize};
use std::{
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
    process::Stdio,
    str::FromStr,
};
use tokio::process::Command;

pub use locate::*;
pub use process::*;

mod locate;
mod process;

/// The external programs the optimizer drives.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum Tool {
    Iconutil,
    Oxipng,
    Createicns,
}

impl Tool {
    pub fn binary_name(&self) -> &'static str {
        match self {
            Tool::Iconutil => "iconutil",
            Tool::Oxipng => "oxipng",
            Tool::Createicns => "createicns",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// The program that turns an iconset back into an icns file.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Packer {
    #[default]
    Iconutil,
    Createicns,
}

impl Packer {
    pub fn tool(&self) -> Tool {
        match self {
            Packer::Iconutil => Tool::Iconutil,
            Packer::Createicns => Tool::Createicns,
        }
    }

    pub fn repack_args(&self, iconset: &Path, output: &Path) -> Vec<OsString> {
        match self {
            Packer::Iconutil => vec![
                "-c".into(),
                "icns".into(),
                iconset.into(),
                "-o".into(),
                output.into(),
            ],
            Packer::Createicns => vec![iconset.into(), output.into()],
        }
    }
}

impl fmt::Display for Packer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tool(), f)
    }
}

impl FromStr for Packer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iconutil" => Ok(Packer::Iconutil),
            "createicns" => Ok(Packer::Createicns),
            other => Err(format!(
                "unknown packer '{}', expected 'iconutil' or 'createicns'",
                other
            )),
        }
    }
}

pub fn unpack_args(icns: &Path, iconset: &Path) -> Vec<OsString> {
    vec![
        "-c".into(),
        "iconset".into(),
        icns.into(),
        "-o".into(),
        iconset.into(),
    ]
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to start {}", .0.display())]
    FailedToStart(PathBuf, #[source] std::io::Error),
    #[error("error getting subprocess status")]
    SubprocessStatusError(#[source] std::io::Error),
}

/// Runs an external program to completion.
pub trait ProcessRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        program: &'a Path,
        args: &'a [OsString],
    ) -> BoxFuture<'a, Result<ProcessOutput, Error>>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for std::sync::Arc<R> {
    fn run<'a>(
        &'a self,
        program: &'a Path,
        args: &'a [OsString],
    ) -> BoxFuture<'a, Result<ProcessOutput, Error>> {
        (**self).run(program, args)
    }
}

/// Spawns real child processes.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run<'a>(
        &'a self,
        program: &'a Path,
        args: &'a [OsString],
    ) -> BoxFuture<'a, Result<ProcessOutput, Error>> {
        async move {
            let mut cmd = Command::new(program);
            cmd.args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                // a dropped run must not leave the tool running
                .kill_on_drop(true);

            let child = cmd
                .spawn()
                .map_err(|e| Error::FailedToStart(program.to_owned(), e))?;
            let output = child
                .wait_with_output()
                .await
                .map_err(Error::SubprocessStatusError)?;
            Ok(ProcessOutput {
                status: output.status.into(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_owned(),
            })
        }
        .boxed()
    }
}
