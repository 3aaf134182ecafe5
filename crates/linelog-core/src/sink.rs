//! Sink contract for completed lines.
//!
//! A sink is a long-lived, externally-owned consumer; the printer only ever
//! calls [`LineSink::emit`] and never manages the sink's lifecycle.

use std::io::Write;
use std::sync::Mutex;

/// Consumer of completed lines.
///
/// `emit` receives the line contents with terminators already stripped. Calls
/// run inside the printer's critical section, so implementations must be
/// short and non-blocking, and must not write back into the printer that
/// invoked them. Emission is infallible from the printer's perspective: a
/// sink that can fail handles (or drops) its own failures, since a flushed
/// line is never re-buffered.
pub trait LineSink {
    fn emit(&self, line: &[u8]);
}

impl<T: LineSink + ?Sized> LineSink for &T {
    fn emit(&self, line: &[u8]) {
        (**self).emit(line);
    }
}

impl<T: LineSink + ?Sized> LineSink for std::sync::Arc<T> {
    fn emit(&self, line: &[u8]) {
        (**self).emit(line);
    }
}

impl<T: LineSink + ?Sized> LineSink for Box<T> {
    fn emit(&self, line: &[u8]) {
        (**self).emit(line);
    }
}

/// Sink that collects emitted lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all lines emitted so far, in emission order.
    pub fn lines(&self) -> Vec<Vec<u8>> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of lines emitted so far.
    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether nothing has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LineSink for MemorySink {
    fn emit(&self, line: &[u8]) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_vec());
    }
}

/// Sink that appends each line plus a newline to an [`std::io::Write`]
/// target.
///
/// Write errors are dropped: emission is best-effort and the printer never
/// retries or re-buffers a flushed line.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write> LineSink for WriterSink<W> {
    fn emit(&self, line: &[u8]) {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writer.write_all(line);
        let _ = writer.write_all(b"\n");
        let _ = writer.flush();
    }
}
