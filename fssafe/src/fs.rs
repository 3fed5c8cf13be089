//! Filesystem-backed implementation of `Loader` and `Saver`
//!
//! A save never writes to the artifact path. It stages the new content in
//! `P.new` and commits on close:
//!
//! ```text
//!   saver()          write()...        close()
//!  ┌────────┐      ┌──────────┐      ┌───────────────────────────────┐
//!  │ create │ ───▶ │ P.new    │ ───▶ │ 1. flush + fsync P.new        │
//!  │ P.new  │      │ (staged) │      │ 2. close P.new                │
//!  └────────┘      └──────────┘      │ 3. rename P -> P.old (if any) │
//!                                    │ 4. rename P.new -> P          │
//!                                    └───────────────────────────────┘
//! ```
//!
//! Readers see `P` either before step 3 or after step 4, never a partial
//! file. An open reader keeps the generation it was opened on.
//!
//! No locking is done: two savers closed at the same time race, and the
//! last publish rename wins.

use crate::basic::BasicLoaderSaver;
use crate::error::{CommitStep, Error, Result};
use crate::paths::GenerationPaths;
use crate::types::{BoxReader, BoxWriter, Close, Loader, Saver};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Artifact stored as a file, replaced atomically on every save
///
/// The parent directory must exist; it is never created.
#[derive(Debug)]
pub struct FileSystemLoaderSaver {
    inner: BasicLoaderSaver,
    paths: Arc<GenerationPaths>,
}

impl FileSystemLoaderSaver {
    /// Create a backend for the artifact at `path` with `.new` / `.old` siblings.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_paths(GenerationPaths::new(path))
    }

    /// Create a backend with explicit generation paths.
    #[must_use]
    pub fn with_paths(paths: GenerationPaths) -> Self {
        let paths = Arc::new(paths);
        let load_paths = Arc::clone(&paths);
        let save_paths = Arc::clone(&paths);
        let inner = BasicLoaderSaver::new(
            move || open_reader(&load_paths).map(|r| Box::new(r) as BoxReader),
            move || open_writer(&save_paths).map(|w| Box::new(w) as BoxWriter),
        );
        Self { inner, paths }
    }

    #[must_use]
    pub fn paths(&self) -> &GenerationPaths {
        &self.paths
    }

    /// Like [`Saver::saver`], but returns the concrete writer so the caller
    /// can use [`SafeWriter::sync`] before committing.
    ///
    /// # Errors
    /// Returns [`Error::SaveUnavailable`] if the staging file cannot be created.
    pub fn safe_writer(&self) -> Result<SafeWriter> {
        open_writer(&self.paths)
    }
}

impl Loader for FileSystemLoaderSaver {
    fn loader(&self) -> Result<BoxReader> {
        self.inner.loader()
    }
}

impl Saver for FileSystemLoaderSaver {
    fn saver(&self) -> Result<BoxWriter> {
        self.inner.saver()
    }
}

fn open_reader(paths: &GenerationPaths) -> Result<FileReader> {
    let path = paths.current();
    trace!(path = %path.display(), "opening artifact");
    match File::open(path) {
        Ok(file) => Ok(FileReader { file: Some(file) }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::NotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(Error::LoadFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn open_writer(paths: &Arc<GenerationPaths>) -> Result<SafeWriter> {
    let staging = paths.staging();
    let file = File::create(staging).map_err(|source| Error::SaveUnavailable {
        path: staging.to_path_buf(),
        source,
    })?;
    debug!(path = %staging.display(), "staging file created");
    Ok(SafeWriter {
        file: Some(BufWriter::new(file)),
        paths: Arc::clone(paths),
    })
}

fn closed_handle() -> io::Error {
    io::Error::other("handle is closed")
}

/// Reader over the artifact file as it was when opened
#[derive(Debug)]
pub struct FileReader {
    file: Option<File>,
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.read(buf),
            None => Err(closed_handle()),
        }
    }
}

impl Close for FileReader {
    fn close(&mut self) -> Result<()> {
        self.file = None;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.file.is_none()
    }
}

/// Writer for the staging file; `close` commits it
///
/// Dropping the writer without calling `close` abandons the save: the
/// artifact is untouched and the staging file stays on disk.
///
/// If commit fails at [`CommitStep::Sync`] or [`CommitStep::Close`] the
/// staging file is left in place for inspection. The writer counts as closed
/// after the first `close`, whatever its outcome.
///
/// If it fails at [`CommitStep::Publish`] the previous artifact is already in
/// the backup slot and a later `loader()` reports not-found. Check
/// [`Error::commit_step`] before treating such a not-found as a first run.
pub struct SafeWriter {
    file: Option<BufWriter<File>>,
    paths: Arc<GenerationPaths>,
}

impl SafeWriter {
    #[must_use]
    pub fn staging_path(&self) -> &Path {
        self.paths.staging()
    }

    /// Flush buffered bytes and sync the staging file without committing.
    ///
    /// # Errors
    /// Fails if the writer is closed or the sync fails.
    pub fn sync(&mut self) -> io::Result<()> {
        let file = self.file.as_mut().ok_or_else(closed_handle)?;
        file.flush()?;
        file.get_ref().sync_all()
    }

    fn commit(&self, mut staged: BufWriter<File>) -> Result<()> {
        let current = self.paths.current();
        let staging = self.paths.staging();
        let backup = self.paths.backup();

        staged
            .flush()
            .and_then(|()| staged.get_ref().sync_all())
            .map_err(|source| Error::CommitFailed {
                step: CommitStep::Sync,
                source,
            })?;
        trace!(path = %staging.display(), "staging file synced");

        let file = staged.into_inner().map_err(|e| Error::CommitFailed {
            step: CommitStep::Close,
            source: e.into_error(),
        })?;
        drop(file);

        match fs::rename(current, backup) {
            Ok(()) => debug!(
                from = %current.display(),
                to = %backup.display(),
                "previous generation kept as backup"
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %current.display(), "no previous generation");
            }
            Err(source) => {
                return Err(Error::CommitFailed {
                    step: CommitStep::Backup,
                    source,
                })
            }
        }

        fs::rename(staging, current).map_err(|source| Error::CommitFailed {
            step: CommitStep::Publish,
            source,
        })?;
        debug!(path = %current.display(), "new generation committed");

        sync_parent_dir(current);
        Ok(())
    }
}

impl Write for SafeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.write(buf),
            None => Err(closed_handle()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Err(closed_handle()),
        }
    }
}

impl Close for SafeWriter {
    fn close(&mut self) -> Result<()> {
        match self.file.take() {
            Some(staged) => self.commit(staged),
            None => Ok(()),
        }
    }

    fn is_closed(&self) -> bool {
        self.file.is_none()
    }
}

impl Drop for SafeWriter {
    fn drop(&mut self) {
        if self.file.is_some() {
            debug!(
                path = %self.paths.staging().display(),
                "writer dropped without close, save abandoned"
            );
        }
    }
}

impl std::fmt::Debug for SafeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeWriter")
            .field("staging", &self.paths.staging())
            .field("closed", &self.file.is_none())
            .finish()
    }
}

/// Persist the renames. The commit has already happened, so a failure here
/// is only reported.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if let Err(e) = File::open(parent).and_then(|dir| dir.sync_all()) {
        warn!(path = %parent.display(), error = %e, "directory sync after commit failed");
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}
