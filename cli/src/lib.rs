//! Command implementations behind the `fssafe` binary
//!
//! Each command takes the capability it needs, so it runs the same against
//! the filesystem backend and the in-memory one.

use fssafe::{Close, GenerationPaths, Loader, Saver};
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::info;

/// Copy the artifact to `out`.
///
/// Returns `Ok(false)` if there is no artifact yet.
///
/// # Errors
/// Load failures other than not-found, and read/write errors.
pub fn cat<L: Loader + ?Sized>(store: &L, out: &mut impl Write) -> io::Result<bool> {
    let mut reader = match store.loader() {
        Ok(reader) => reader,
        Err(e) if e.is_not_found() => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    io::copy(&mut reader, out)?;
    reader.close()?;
    out.flush()?;
    Ok(true)
}

/// Commit everything readable from `input` as the new artifact.
///
/// Returns the number of bytes committed. If reading `input` fails, the
/// save is abandoned and the artifact is unchanged.
///
/// # Errors
/// Save, read and commit failures.
pub fn put<S: Saver + ?Sized>(store: &S, input: &mut impl Read) -> io::Result<u64> {
    let mut writer = store.saver()?;
    let n = io::copy(input, &mut writer)?;
    writer.close()?;
    info!(bytes = n, "artifact saved");
    Ok(n)
}

/// One on-disk generation of an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub label: &'static str,
    pub path: PathBuf,
    /// File size, `None` if the file does not exist
    pub size: Option<u64>,
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size {
            Some(size) => write!(f, "{:<8}{} ({size} bytes)", self.label, self.path.display()),
            None => write!(f, "{:<8}{} (absent)", self.label, self.path.display()),
        }
    }
}

/// Report which of the current, staging and backup files exist.
///
/// # Errors
/// Any metadata failure other than the file being absent.
pub fn status(paths: &GenerationPaths) -> io::Result<Vec<Generation>> {
    [
        ("current", paths.current()),
        ("staging", paths.staging()),
        ("backup", paths.backup()),
    ]
    .into_iter()
    .map(|(label, path)| {
        let size = match fs::metadata(path) {
            Ok(meta) => Some(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        Ok(Generation {
            label,
            path: path.to_path_buf(),
            size,
        })
    })
    .collect()
}
