use crate::tools::{self, ExitStatus, NotFound, Packer, ProcessOutput};
use std::path::PathBuf;

/// Why a single tool invocation didn't produce what it should have.
#[derive(Debug, thiserror::Error)]
pub enum ToolFailure {
    #[error(transparent)]
    Process(tools::Error),
    #[error("{}{}", .status.message(), stderr_suffix(.stderr))]
    Exit { status: ExitStatus, stderr: String },
    #[error("expected output {} was not created", .0.display())]
    MissingOutput(PathBuf),
    #[error("i/o error")]
    Io(#[source] std::io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

impl ToolFailure {
    pub(crate) fn check(result: Result<ProcessOutput, tools::Error>) -> Result<(), ToolFailure> {
        let output = result.map_err(ToolFailure::Process)?;
        if !output.stderr.is_empty() {
            tracing::debug!(stderr = %output.stderr, "tool wrote to stderr");
        }
        if output.status.success() {
            Ok(())
        } else {
            Err(ToolFailure::Exit {
                status: output.status,
                stderr: output.stderr,
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    ToolNotFound(#[from] NotFound),
    #[error("{} is not an icns file: {reason}", .path.display())]
    InvalidSource { path: PathBuf, reason: &'static str },
    #[error("failed to unpack {}", .icns.display())]
    UnpackFailed {
        icns: PathBuf,
        #[source]
        failure: ToolFailure,
    },
    #[error("failed to recompress {}", .path.display())]
    PngRecompressFailed {
        path: PathBuf,
        #[source]
        failure: ToolFailure,
    },
    #[error("failed to repack iconset with {packer}")]
    RepackFailed {
        packer: Packer,
        #[source]
        failure: ToolFailure,
    },
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> Error {
        let context = context.into();
        move |source| Error::Io { context, source }
    }
}
