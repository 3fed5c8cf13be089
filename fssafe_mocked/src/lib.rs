//! In-memory `Loader`/`Saver` backend for tests.
//!
//! - `TestingLoaderSaver::new()` starts with no committed artifact.
//! - Every reader and writer handed out is recorded with its closed flag.
//! - Every committed buffer is kept, in close order.
//! - `fail_next(Fault)` makes the next matching call fail once.

pub mod handles;
pub mod memory;

pub use handles::{TestingReader, TestingWriter};
pub use memory::{Fault, TestingLoaderSaver, MEMORY_ARTIFACT};
