use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

/// A step of the installation pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreateImage,
    RunMachine,
    CompressImage,
    BuildImage,
    PushImage,
}

impl Stage {
    /// The progress line logged when the stage starts.
    pub fn progress(&self) -> &'static str {
        match self {
            Stage::CreateImage => "Creating machine image...",
            Stage::RunMachine => "Starting machine...",
            Stage::CompressImage => "Compressing image...",
            Stage::BuildImage => "Building Docker image...",
            Stage::PushImage => "Pushing Docker image...",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::CreateImage => "create disk image",
            Stage::RunMachine => "run machine",
            Stage::CompressImage => "compress image",
            Stage::BuildImage => "build container image",
            Stage::PushImage => "push container image",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("unable to create working directory")]
    WorkingDirectory(#[source] io::Error),
    #[error("{stage} failed: unable to start {program:?}")]
    Spawn {
        stage: Stage,
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{stage} failed: {program:?} exited with {status}")]
    Stage {
        stage: Stage,
        program: PathBuf,
        status: ExitStatus,
        output: String,
    },
    #[error("{stage} failed: {context}")]
    Io {
        stage: Stage,
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("unable to interrupt emulator (pid {pid})")]
    Interrupt {
        pid: u32,
        #[source]
        source: nix::Error,
    },
}

impl InstallError {
    pub(crate) fn io(stage: Stage, context: impl Into<String>, source: io::Error) -> Self {
        InstallError::Io {
            stage,
            context: context.into(),
            source,
        }
    }

    /// The stage that failed, if the error happened inside one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            InstallError::WorkingDirectory(_) => None,
            InstallError::Spawn { stage, .. }
            | InstallError::Stage { stage, .. }
            | InstallError::Io { stage, .. } => Some(*stage),
            InstallError::Interrupt { .. } => Some(Stage::RunMachine),
        }
    }

    /// Captured output of the tool that exited unsuccessfully.
    pub fn output(&self) -> Option<&str> {
        match self {
            InstallError::Stage { output, .. } => Some(output),
            _ => None,
        }
    }

    /// The emulator could not be told to stop. The whole program must abort,
    /// not just the current stage.
    pub fn is_fatal(&self) -> bool {
        matches!(self, InstallError::Interrupt { .. })
    }
}
