#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum ExitStatus {
    Successful,
    Failed(Option<i32>),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        self == &ExitStatus::Successful
    }

    pub fn message(&self) -> String {
        match self {
            ExitStatus::Successful => "exited successfully".to_owned(),
            ExitStatus::Failed(Some(code)) => format!("exited with error status {}", code),
            ExitStatus::Failed(None) => "exited with unknown error status".to_owned(),
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if status.success() {
            ExitStatus::Successful
        } else {
            ExitStatus::Failed(status.code())
        }
    }
}

/// What is left of a finished tool invocation.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    /// standard error, lossily decoded with trailing whitespace removed
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success() -> Self {
        ProcessOutput {
            status: ExitStatus::Successful,
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        ProcessOutput {
            status: ExitStatus::Failed(Some(code)),
            stderr: stderr.into(),
        }
    }
}
