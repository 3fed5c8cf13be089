//! Reader and writer handles of the in-memory backend

use crate::memory::{Shared, Slot};
use fssafe::{Close, Result};
use std::io::{self, Cursor, Read, Write};
use std::mem;
use std::sync::Arc;

fn closed_handle() -> io::Error {
    io::Error::other("handle is closed")
}

/// Reader over a snapshot of the committed buffer
///
/// Later commits do not affect what this reader returns.
pub struct TestingReader {
    data: Cursor<Arc<[u8]>>,
    slot: Slot,
    state: Shared,
    closed: bool,
}

impl TestingReader {
    pub(crate) fn new(snapshot: Arc<[u8]>, slot: Slot, state: Shared) -> Self {
        Self {
            data: Cursor::new(snapshot),
            slot,
            state,
            closed: false,
        }
    }

    /// Creation index, as used by `readers_closed()`
    #[must_use]
    pub fn index(&self) -> usize {
        self.slot.index()
    }
}

impl Read for TestingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Err(closed_handle());
        }
        self.data.read(buf)
    }
}

impl Close for TestingReader {
    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.state.lock().mark_reader_closed(self.slot);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Writer into a private buffer; `close` makes it the committed artifact
///
/// Dropping the writer without closing it commits nothing and leaves it
/// recorded as not closed.
pub struct TestingWriter {
    buffer: Vec<u8>,
    slot: Slot,
    state: Shared,
    closed: bool,
}

impl TestingWriter {
    pub(crate) fn new(slot: Slot, state: Shared) -> Self {
        Self {
            buffer: Vec::new(),
            slot,
            state,
            closed: false,
        }
    }

    /// Creation index, as used by `writers_closed()`
    #[must_use]
    pub fn index(&self) -> usize {
        self.slot.index()
    }

    /// Bytes written so far, not yet committed
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }
}

impl Write for TestingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(closed_handle());
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Close for TestingWriter {
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let content = mem::take(&mut self.buffer);
        self.state.lock().commit_writer(self.slot, content)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl std::fmt::Debug for TestingReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestingReader")
            .field("index", &self.slot.index())
            .field("position", &self.data.position())
            .field("closed", &self.closed)
            .finish()
    }
}

impl std::fmt::Debug for TestingWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestingWriter")
            .field("index", &self.slot.index())
            .field("pending", &self.buffer.len())
            .field("closed", &self.closed)
            .finish()
    }
}
