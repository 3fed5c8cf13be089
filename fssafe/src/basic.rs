//! Capability holder built from a pair of closures
//!
//! Every backend is a `BasicLoaderSaver` with different closures inside, so
//! consumers never see a backend-specific type through the traits.

use crate::error::Result;
use crate::types::{BoxReader, BoxWriter, Loader, Saver};
use std::fmt;

pub type LoaderFn = Box<dyn Fn() -> Result<BoxReader> + Send + Sync>;
pub type SaverFn = Box<dyn Fn() -> Result<BoxWriter> + Send + Sync>;

/// Loader and saver stored as data
///
/// Calls are forwarded to the closures as they are.
///
/// # Example
///
/// ```
/// use fssafe::{BasicLoaderSaver, Error, Loader};
/// use std::path::PathBuf;
///
/// let empty = BasicLoaderSaver::new(
///     || Err(Error::NotFound { path: PathBuf::from("nothing") }),
///     || Err(Error::SaveUnavailable {
///         path: PathBuf::from("nothing.new"),
///         source: std::io::Error::other("read-only"),
///     }),
/// );
/// assert!(matches!(empty.loader(), Err(e) if e.is_not_found()));
/// ```
pub struct BasicLoaderSaver {
    loader: LoaderFn,
    saver: SaverFn,
}

impl BasicLoaderSaver {
    #[must_use]
    pub fn new<L, S>(loader: L, saver: S) -> Self
    where
        L: Fn() -> Result<BoxReader> + Send + Sync + 'static,
        S: Fn() -> Result<BoxWriter> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            saver: Box::new(saver),
        }
    }
}

impl Loader for BasicLoaderSaver {
    fn loader(&self) -> Result<BoxReader> {
        (self.loader)()
    }
}

impl Saver for BasicLoaderSaver {
    fn saver(&self) -> Result<BoxWriter> {
        (self.saver)()
    }
}

impl fmt::Debug for BasicLoaderSaver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicLoaderSaver").finish_non_exhaustive()
    }
}
