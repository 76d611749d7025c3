//! Engine error taxonomy.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why the volume guard refused an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    RootOrHome(PathBuf),
    Protected { dir: PathBuf, marker: String },
    DeclinedSize { path: PathBuf, files: usize },
    CountFailed { path: PathBuf, message: String },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::RootOrHome(path) => write!(
                f,
                "refuses whole-root/home capture: {}",
                path.display()
            ),
            AbortReason::Protected { dir, marker } => write!(
                f,
                "protected workspace: {} contains {marker}",
                dir.display()
            ),
            AbortReason::DeclinedSize { path, files } => write!(
                f,
                "declined due to size: {} contains {files} files",
                path.display()
            ),
            AbortReason::CountFailed { path, message } => write!(
                f,
                "unable to count files in {}: {message}",
                path.display()
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("response does not match the expected schema: {0}")]
    ResponseSchema(String),
    #[error("file {} not found", .0.display())]
    NotFound(PathBuf),
    #[error("{} is a directory, not a file", .0.display())]
    NotAFile(PathBuf),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("refusing to write outside the working directory: {}", .0.display())]
    EscapingPath(PathBuf),
    #[error("{0}")]
    Policy(AbortReason),
    #[error("failed to render prompt template '{name}': {message}")]
    Template { name: String, message: String },
    #[error("invalid include pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
    #[error("cannot grab files and directories together")]
    MixedTargets,
    #[error("no code files found in {}", .0.display())]
    NoCodeFiles(PathBuf),
    #[error("interactive prompt failed: {0}")]
    Prompt(String),
}

impl EngineError {
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EngineError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
