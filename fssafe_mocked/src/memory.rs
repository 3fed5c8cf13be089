//! In-memory backend state and the `TestingLoaderSaver` holder

use crate::handles::{TestingReader, TestingWriter};
use fssafe::{BasicLoaderSaver, BoxReader, BoxWriter, Error, Loader, Result, Saver};
use parking_lot::Mutex;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Path reported in errors raised by the in-memory backend
pub const MEMORY_ARTIFACT: &str = "<memory>";

/// A one-shot failure armed with [`TestingLoaderSaver::fail_next`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Next `loader()` fails with [`Error::LoadFailed`]
    Load,
    /// Next `saver()` fails with [`Error::SaveUnavailable`]
    Save,
    /// Next writer `close()` fails with [`Error::CommitFailed`] and commits nothing
    Commit,
}

/// Position of a handle in the records, tagged with the `clear` epoch it
/// was created in
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slot {
    epoch: u64,
    index: usize,
}

impl Slot {
    pub(crate) fn index(self) -> usize {
        self.index
    }
}

#[derive(Default)]
pub(crate) struct State {
    epoch: u64,
    committed: Option<Arc<[u8]>>,
    history: Vec<Arc<[u8]>>,
    readers_closed: Vec<bool>,
    writers_closed: Vec<bool>,
    armed: Vec<Fault>,
}

impl State {
    fn take_fault(&mut self, fault: Fault) -> bool {
        match self.armed.iter().position(|f| *f == fault) {
            Some(index) => {
                self.armed.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn mark_reader_closed(&mut self, slot: Slot) {
        if slot.epoch != self.epoch {
            return;
        }
        if let Some(closed) = self.readers_closed.get_mut(slot.index) {
            *closed = true;
        }
    }

    /// Record the writer as closed, then commit `content` unless a commit
    /// fault is armed. Writers from before a `clear` change nothing.
    pub(crate) fn commit_writer(&mut self, slot: Slot, content: Vec<u8>) -> Result<()> {
        if slot.epoch != self.epoch {
            return Ok(());
        }
        if let Some(closed) = self.writers_closed.get_mut(slot.index) {
            *closed = true;
        }
        if self.take_fault(Fault::Commit) {
            return Err(Error::CommitFailed {
                step: fssafe::CommitStep::Publish,
                source: injected(),
            });
        }
        let content: Arc<[u8]> = Arc::from(content);
        self.history.push(Arc::clone(&content));
        self.committed = Some(content);
        Ok(())
    }
}

pub(crate) type Shared = Arc<Mutex<State>>;

fn injected() -> io::Error {
    io::Error::other("injected fault")
}

fn memory_path() -> PathBuf {
    PathBuf::from(MEMORY_ARTIFACT)
}

fn open_reader(state: &Shared) -> Result<TestingReader> {
    let mut guard = state.lock();
    if guard.take_fault(Fault::Load) {
        return Err(Error::LoadFailed {
            path: memory_path(),
            source: injected(),
        });
    }
    let snapshot = guard
        .committed
        .clone()
        .ok_or_else(|| Error::NotFound { path: memory_path() })?;
    guard.readers_closed.push(false);
    let slot = Slot {
        epoch: guard.epoch,
        index: guard.readers_closed.len() - 1,
    };
    Ok(TestingReader::new(snapshot, slot, Arc::clone(state)))
}

fn open_writer(state: &Shared) -> Result<TestingWriter> {
    let mut guard = state.lock();
    if guard.take_fault(Fault::Save) {
        return Err(Error::SaveUnavailable {
            path: memory_path(),
            source: injected(),
        });
    }
    guard.writers_closed.push(false);
    let slot = Slot {
        epoch: guard.epoch,
        index: guard.writers_closed.len() - 1,
    };
    Ok(TestingWriter::new(slot, Arc::clone(state)))
}

/// In-memory loader and saver for testing
///
/// Clones share the same state: hand one to the code under test and keep
/// another for assertions.
///
/// # Example
///
/// ```
/// use fssafe::{Close, Loader, Saver};
/// use fssafe_mocked::TestingLoaderSaver;
/// use std::io::{Read, Write};
///
/// let store = TestingLoaderSaver::new();
/// assert!(matches!(store.loader(), Err(e) if e.is_not_found()));
///
/// let mut writer = store.saver().unwrap();
/// writer.write_all(b"hello").unwrap();
/// writer.close().unwrap();
///
/// let mut reader = store.loader().unwrap();
/// let mut data = String::new();
/// reader.read_to_string(&mut data).unwrap();
/// reader.close().unwrap();
///
/// assert_eq!(data, "hello");
/// assert_eq!(store.buffers(), vec![b"hello".to_vec()]);
/// assert_eq!(store.readers_closed(), vec![true]);
/// ```
#[derive(Clone)]
pub struct TestingLoaderSaver {
    inner: Arc<BasicLoaderSaver>,
    state: Shared,
}

impl TestingLoaderSaver {
    /// Create a new, blank store
    #[must_use]
    pub fn new() -> Self {
        let state = Shared::default();
        let load_state = Arc::clone(&state);
        let save_state = Arc::clone(&state);
        let inner = BasicLoaderSaver::new(
            move || open_reader(&load_state).map(|r| Box::new(r) as BoxReader),
            move || open_writer(&save_state).map(|w| Box::new(w) as BoxWriter),
        );
        Self {
            inner: Arc::new(inner),
            state,
        }
    }

    /// Like `loader()`, but returns the concrete reader.
    ///
    /// # Errors
    /// Same as [`Loader::loader`].
    pub fn testing_reader(&self) -> Result<TestingReader> {
        open_reader(&self.state)
    }

    /// Like `saver()`, but returns the concrete writer.
    ///
    /// # Errors
    /// Same as [`Saver::saver`].
    pub fn testing_writer(&self) -> Result<TestingWriter> {
        open_writer(&self.state)
    }

    /// Every committed buffer, in the order the writers were closed
    #[must_use]
    pub fn buffers(&self) -> Vec<Vec<u8>> {
        self.state.lock().history.iter().map(|b| b.to_vec()).collect()
    }

    /// The current artifact, if any
    #[must_use]
    pub fn committed(&self) -> Option<Vec<u8>> {
        self.state.lock().committed.as_deref().map(<[u8]>::to_vec)
    }

    /// Closed flag of every reader handed out, in creation order
    #[must_use]
    pub fn readers_closed(&self) -> Vec<bool> {
        self.state.lock().readers_closed.clone()
    }

    /// Closed flag of every writer handed out, in creation order
    #[must_use]
    pub fn writers_closed(&self) -> Vec<bool> {
        self.state.lock().writers_closed.clone()
    }

    /// Index of the most recently created reader
    #[must_use]
    pub fn current_reader(&self) -> Option<usize> {
        self.state.lock().readers_closed.len().checked_sub(1)
    }

    /// Index of the most recently created writer
    #[must_use]
    pub fn current_writer(&self) -> Option<usize> {
        self.state.lock().writers_closed.len().checked_sub(1)
    }

    /// Make the next call matching `fault` fail. Faults of different kinds
    /// can be armed together; arming the same kind twice fails two calls.
    pub fn fail_next(&self, fault: Fault) {
        self.state.lock().armed.push(fault);
    }

    /// Forget the artifact, the history, the handle records and armed faults.
    ///
    /// Handles that are still open stay usable, but closing them no longer
    /// affects the store.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let epoch = state.epoch + 1;
        *state = State {
            epoch,
            ..State::default()
        };
    }
}

impl Default for TestingLoaderSaver {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader for TestingLoaderSaver {
    fn loader(&self) -> Result<BoxReader> {
        self.inner.loader()
    }
}

impl Saver for TestingLoaderSaver {
    fn saver(&self) -> Result<BoxWriter> {
        self.inner.saver()
    }
}

impl std::fmt::Debug for TestingLoaderSaver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TestingLoaderSaver")
            .field("committed", &state.committed.as_ref().map(|c| c.len()))
            .field("history", &state.history.len())
            .field("readers", &state.readers_closed.len())
            .field("writers", &state.writers_closed.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fssafe::{Close, CommitStep};
    use std::io::{Read, Write};

    #[test]
    fn test_blank_store() {
        let store = TestingLoaderSaver::new();

        match store.loader() {
            Err(Error::NotFound { path }) => assert_eq!(path, PathBuf::from(MEMORY_ARTIFACT)),
            _ => panic!("Expected NotFound error"),
        }
        assert_eq!(store.committed(), None);
        assert_eq!(store.current_reader(), None);
        assert_eq!(store.current_writer(), None);
        assert!(store.buffers().is_empty());
    }

    #[test]
    fn test_save_fault_records_no_writer() {
        let store = TestingLoaderSaver::new();
        store.fail_next(Fault::Save);

        assert!(matches!(store.saver(), Err(Error::SaveUnavailable { .. })));
        assert_eq!(store.current_writer(), None);

        // One-shot
        assert!(store.saver().is_ok());
        assert_eq!(store.current_writer(), Some(0));
    }

    #[test]
    fn test_commit_fault_keeps_previous_artifact() {
        let store = TestingLoaderSaver::new();
        fssafe::save_bytes(&store, b"first").unwrap();

        store.fail_next(Fault::Commit);
        let mut writer = store.saver().unwrap();
        writer.write_all(b"second").unwrap();
        let err = writer.close().err().expect("commit should fail");

        assert_eq!(err.commit_step(), Some(CommitStep::Publish));
        assert!(writer.is_closed());
        assert_eq!(store.committed().as_deref(), Some(&b"first"[..]));
        assert_eq!(store.buffers(), vec![b"first".to_vec()]);
        assert_eq!(store.writers_closed(), vec![true, true]);
    }

    #[test]
    fn test_load_fault_is_not_not_found() {
        let store = TestingLoaderSaver::new();
        fssafe::save_bytes(&store, b"data").unwrap();
        store.fail_next(Fault::Load);

        match store.loader() {
            Err(e) => assert!(!e.is_not_found()),
            Ok(_) => panic!("Expected LoadFailed error"),
        }
        assert_eq!(store.current_reader(), None);

        let mut reader = store.loader().unwrap();
        let mut data = Vec::new();
        reader.read_to_end(&mut data).unwrap();
        assert_eq!(data, b"data");
    }

    #[test]
    fn test_clear_resets_everything() {
        let store = TestingLoaderSaver::new();
        fssafe::save_bytes(&store, b"data").unwrap();
        store.fail_next(Fault::Load);

        store.clear();

        assert!(matches!(store.loader(), Err(e) if e.is_not_found()));
        assert!(store.buffers().is_empty());
        assert!(store.writers_closed().is_empty());
        assert!(store.readers_closed().is_empty());
    }

    #[test]
    fn test_handles_from_before_clear_are_ignored() {
        let store = TestingLoaderSaver::new();
        let mut stale = store.saver().unwrap();
        stale.write_all(b"stale").unwrap();

        store.clear();
        let mut fresh = store.saver().unwrap();

        stale.close().unwrap();
        assert_eq!(store.writers_closed(), vec![false]);
        assert_eq!(store.committed(), None);

        fresh.write_all(b"fresh").unwrap();
        fresh.close().unwrap();
        assert_eq!(store.writers_closed(), vec![true]);
        assert_eq!(store.buffers(), vec![b"fresh".to_vec()]);
    }

    #[test]
    fn test_clones_share_state() {
        let store = TestingLoaderSaver::new();
        let observer = store.clone();

        fssafe::save_bytes(&store, b"shared").unwrap();

        assert_eq!(observer.buffers(), vec![b"shared".to_vec()]);
        assert_eq!(observer.writers_closed(), vec![true]);
    }
}
