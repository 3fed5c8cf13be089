//! Capability traits and stream handle types

use crate::error::Result;
use std::io::{self, Read, Write};

/// A stream handle that must be closed explicitly.
pub trait Close {
    /// Close the handle.
    ///
    /// For writers, this is where the new generation is committed. Only the
    /// first call does anything; later calls return `Ok(())`.
    ///
    /// # Errors
    /// Returns [`crate::Error::CommitFailed`] if a writer cannot commit.
    fn close(&mut self) -> Result<()>;

    /// Whether `close` has been called.
    fn is_closed(&self) -> bool;
}

/// Readable, closable stream of a committed artifact
pub trait ReadClose: Read + Close {}

impl<T: Read + Close> ReadClose for T {}

/// Writable, closable stream of a not yet committed generation
pub trait WriteClose: Write + Close {}

impl<T: Write + Close> WriteClose for T {}

pub type BoxReader = Box<dyn ReadClose + Send>;
pub type BoxWriter = Box<dyn WriteClose + Send>;

/// Capability to read the current artifact.
pub trait Loader: Send + Sync {
    /// Open a reader over the artifact as it is right now.
    ///
    /// # Errors
    /// - [`crate::Error::NotFound`] if nothing was ever committed
    /// - [`crate::Error::LoadFailed`] for any other failure
    fn loader(&self) -> Result<BoxReader>;
}

/// Capability to produce a new artifact.
pub trait Saver: Send + Sync {
    /// Open a writer for a new generation.
    ///
    /// The artifact is replaced only when the writer is closed successfully.
    ///
    /// # Errors
    /// Returns [`crate::Error::SaveUnavailable`] if the staging area cannot be prepared.
    fn saver(&self) -> Result<BoxWriter>;
}

/// Both capabilities together.
pub trait LoaderSaver: Loader + Saver {}

impl<T: Loader + Saver> LoaderSaver for T {}

/// Read the whole artifact and close the reader.
///
/// Returns `Ok(None)` when there is no artifact yet.
///
/// # Errors
/// Any load failure other than not-found, and read errors.
pub fn load_bytes<L: Loader + ?Sized>(loader: &L) -> io::Result<Option<Vec<u8>>> {
    let mut reader = match loader.loader() {
        Ok(reader) => reader,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    reader.close()?;
    Ok(Some(data))
}

/// Write `data` as the new artifact and commit it.
///
/// If writing fails the writer is dropped unclosed, so nothing is committed.
///
/// # Errors
/// Save, write and commit failures.
pub fn save_bytes<S: Saver + ?Sized>(saver: &S, data: &[u8]) -> io::Result<()> {
    let mut writer = saver.saver()?;
    writer.write_all(data)?;
    writer.close()?;
    Ok(())
}
