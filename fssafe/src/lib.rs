//! Crash-resilient persistence of a single artifact.
//!
//! Consumers depend on two capabilities, [`Loader`] and [`Saver`]. A loader
//! hands out a reader over the committed artifact, a saver hands out a writer
//! for the next generation. Nothing is committed until the writer is closed.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Consumer (config, state, CLI...)   │
//! │  - loader() / saver()               │
//! └─────────────────────────────────────┘
//!          ▲
//!          │ Loader + Saver traits
//!          ▼
//! ┌─────────────────────────────────────┐
//! │  BasicLoaderSaver (holder)          │
//! │  - two closures, pure delegation    │
//! └─────────────────────────────────────┘
//!      ▲                       ▲
//!      │                       │
//! FileSystemLoaderSaver   TestingLoaderSaver
//! (P, P.new, P.old)       (fssafe_mocked)
//! ```

pub mod basic;
pub mod error;
pub mod fs;
pub mod paths;
pub mod types;

pub use basic::{BasicLoaderSaver, LoaderFn, SaverFn};
pub use error::{CommitStep, Error, Result};
pub use fs::{FileReader, FileSystemLoaderSaver, SafeWriter};
pub use paths::{GenerationPaths, BACKUP_SUFFIX, STAGING_SUFFIX};
pub use types::{
    load_bytes, save_bytes, BoxReader, BoxWriter, Close, Loader, LoaderSaver, ReadClose, Saver,
    WriteClose,
};
