//! Errors raised by loaders, savers and writer commits
//!
//! Read and write failures on an open handle are plain [`std::io::Error`]s
//! and never pass through this type.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Step of the commit sequence run by a writer's `close`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitStep {
    /// Flushing and syncing the staged content to storage
    Sync,
    /// Releasing the staging descriptor
    Close,
    /// Moving the current artifact into the backup slot
    Backup,
    /// Moving the staged content into place as the current artifact
    Publish,
}

impl CommitStep {
    /// Whether the committed artifact may have already left its path.
    ///
    /// True only for [`CommitStep::Publish`]: the backup rename has run, so
    /// the previous content lives in the backup slot until an operator moves
    /// it back.
    #[must_use]
    pub fn artifact_displaced(self) -> bool {
        matches!(self, Self::Publish)
    }
}

impl fmt::Display for CommitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sync => "sync",
            Self::Close => "close",
            Self::Backup => "backup rename",
            Self::Publish => "publish rename",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in load/save operations
#[derive(Debug)]
pub enum Error {
    /// No artifact has been committed yet
    NotFound { path: PathBuf },
    /// The artifact exists (or may exist) but could not be opened
    LoadFailed { path: PathBuf, source: io::Error },
    /// The staging generation could not be created
    SaveUnavailable { path: PathBuf, source: io::Error },
    /// Closing a writer failed before the new generation became current
    CommitFailed { step: CommitStep, source: io::Error },
}

impl Error {
    /// True if no artifact exists yet, as opposed to any other failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The commit step that failed, for [`Error::CommitFailed`].
    #[must_use]
    pub fn commit_step(&self) -> Option<CommitStep> {
        match self {
            Self::CommitFailed { step, .. } => Some(*step),
            _ => None,
        }
    }

    fn io_kind(&self) -> io::ErrorKind {
        match self {
            Self::NotFound { .. } => io::ErrorKind::NotFound,
            Self::LoadFailed { source, .. }
            | Self::SaveUnavailable { source, .. }
            | Self::CommitFailed { source, .. } => source.kind(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "Artifact not found: {}", path.display()),
            Self::LoadFailed { path, source } => {
                write!(f, "Failed to open artifact {}: {source}", path.display())
            }
            Self::SaveUnavailable { path, source } => {
                write!(f, "Cannot create staging file {}: {source}", path.display())
            }
            Self::CommitFailed { step, source } => write!(f, "Commit failed at {step}: {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::LoadFailed { source, .. }
            | Self::SaveUnavailable { source, .. }
            | Self::CommitFailed { source, .. } => Some(source),
        }
    }
}

/// Keeps the original error reachable through `get_ref`/`into_inner`.
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        io::Error::new(err.io_kind(), err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
