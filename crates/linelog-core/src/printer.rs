//! Bounded line buffering.
//!
//! Accumulates producer bytes and emits a completed line to the sink when a
//! terminator arrives, the buffer fills, or the session closes.

use crate::error::{LinelogError, LinelogResult};
use crate::sink::LineSink;
use crate::source::ByteSource;

/// Default buffer capacity in bytes.
pub const DEFAULT_LINE_CAPACITY: usize = 508;

/// Marker appended when a line is force-flushed at capacity.
const ESCAPE: u8 = b'\\';

/// Accumulates bytes into a bounded buffer and emits complete lines.
///
/// A line ends at `\r` or `\n` (the terminator itself is never emitted),
/// when the buffer reaches capacity (the line is split and a trailing `\`
/// marks the continuation), or when the printer is closed with bytes still
/// buffered. Between calls the cursor never exceeds the capacity, and no
/// producer byte is ever silently dropped.
#[derive(Debug)]
pub struct LinePrinter<S: LineSink> {
    /// One byte of slack past `capacity` holds the escape marker.
    buf: Vec<u8>,
    capacity: usize,
    /// Number of valid bytes in `buf`.
    cursor: usize,
    sink: S,
}

impl<S: LineSink> LinePrinter<S> {
    /// Create a printer with the default capacity.
    pub fn new(sink: S) -> Self {
        Self::with_capacity(DEFAULT_LINE_CAPACITY, sink)
    }

    /// Create a printer holding at most `capacity` bytes before a forced
    /// flush. A capacity of 0 is treated as 1.
    pub fn with_capacity(capacity: usize, sink: S) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: vec![0u8; capacity + 1],
            capacity,
            cursor: 0,
            sink,
        }
    }

    /// Configured capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes currently buffered awaiting a terminator.
    pub fn pending(&self) -> usize {
        self.cursor
    }

    /// Append bytes from an in-memory slice.
    ///
    /// Returns the number of bytes consumed, which for a slice is always
    /// `data.len()`.
    pub fn write(&mut self, data: &[u8]) -> usize {
        for &byte in data {
            self.push(byte);
        }
        data.len()
    }

    /// Append bytes from a fallible source, in order, one byte at a time.
    ///
    /// A fetch fault aborts the remainder of the call: unprocessed input is
    /// discarded, already-buffered bytes are kept (not flushed), and the
    /// error reports how many bytes were consumed before the fault.
    pub fn write_from(&mut self, src: &mut dyn ByteSource) -> LinelogResult<usize> {
        let count = src.len();
        for i in 0..count {
            let byte = match src.fetch(i) {
                Ok(byte) => byte,
                Err(source) => {
                    return Err(LinelogError::Acquisition {
                        consumed: i,
                        source,
                    });
                }
            };
            self.push(byte);
        }
        Ok(count)
    }

    /// Emit the buffered partial line, if any, and reset the buffer.
    ///
    /// A flush with nothing buffered is a no-op; the sink never sees an
    /// empty line.
    pub fn flush(&mut self) {
        if self.cursor > 0 {
            self.sink.emit(&self.buf[..self.cursor]);
            self.cursor = 0;
        }
    }

    /// Flush any trailing partial line and consume the printer.
    pub fn close(mut self) {
        self.flush();
    }

    /// Access the sink collaborator.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Process one byte: escape-and-flush at capacity, flush on terminator,
    /// append otherwise.
    fn push(&mut self, byte: u8) {
        if self.cursor >= self.capacity {
            self.buf[self.cursor] = ESCAPE;
            self.cursor += 1;
            self.flush();
        }
        match byte {
            b'\r' | b'\n' => self.flush(),
            byte => {
                self.buf[self.cursor] = byte;
                self.cursor += 1;
            }
        }
    }
}

impl<S: LineSink> Drop for LinePrinter<S> {
    fn drop(&mut self) {
        // Sessions that end without an explicit close still drain.
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::io;
    use std::sync::Arc;

    /// Source that faults at a fixed index, like producer memory vanishing
    /// mid-copy.
    struct FlakySource {
        data: Vec<u8>,
        fail_at: usize,
    }

    impl ByteSource for FlakySource {
        fn len(&self) -> usize {
            self.data.len()
        }

        fn fetch(&mut self, index: usize) -> io::Result<u8> {
            if index == self.fail_at {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    "backing memory gone",
                ));
            }
            Ok(self.data[index])
        }
    }

    fn printer(capacity: usize) -> (LinePrinter<Arc<MemorySink>>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (LinePrinter::with_capacity(capacity, sink.clone()), sink)
    }

    #[test]
    fn newline_completes_line() {
        let (mut p, sink) = printer(8);
        p.write(b"hello\n");
        assert_eq!(sink.lines(), vec![b"hello".to_vec()]);
        assert_eq!(p.pending(), 0);
    }

    #[test]
    fn overflow_splits_with_marker() {
        let (mut p, sink) = printer(8);
        p.write(b"abcdefgh");
        // Full but not yet overflowed: nothing emitted.
        assert!(sink.is_empty());
        assert_eq!(p.pending(), 8);

        p.write(b"i");
        assert_eq!(sink.lines(), vec![b"abcdefgh\\".to_vec()]);
        assert_eq!(p.pending(), 1);

        p.flush();
        assert_eq!(sink.lines()[1], b"i".to_vec());
    }

    #[test]
    fn lone_terminator_emits_nothing() {
        let (mut p, sink) = printer(8);
        p.write(b"\n");
        assert!(sink.is_empty());
    }

    #[test]
    fn flush_is_idempotent() {
        let (mut p, sink) = printer(8);
        p.flush();
        p.flush();
        assert!(sink.is_empty());

        p.write(b"x\n");
        p.flush();
        p.flush();
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn close_flushes_trailing_partial_line() {
        let (mut p, sink) = printer(8);
        p.write(b"a");
        p.close();
        assert_eq!(sink.lines(), vec![b"a".to_vec()]);
    }

    #[test]
    fn drop_flushes_trailing_partial_line() {
        let sink = Arc::new(MemorySink::new());
        {
            let mut p = LinePrinter::with_capacity(8, sink.clone());
            p.write(b"tail");
        }
        assert_eq!(sink.lines(), vec![b"tail".to_vec()]);
    }

    #[test]
    fn crlf_pair_yields_no_empty_line() {
        let (mut p, sink) = printer(16);
        p.write(b"line1\r\nline2\n");
        assert_eq!(sink.lines(), vec![b"line1".to_vec(), b"line2".to_vec()]);
    }

    #[test]
    fn terminators_never_appear_in_output() {
        let (mut p, sink) = printer(4);
        p.write(b"a\rb\nc\r\n\r\rd");
        p.close();
        for line in sink.lines() {
            assert!(!line.contains(&b'\r'));
            assert!(!line.contains(&b'\n'));
        }
    }

    #[test]
    fn overflow_conserves_every_byte() {
        let input: Vec<u8> = (0..20).map(|i| b'a' + (i % 26) as u8).collect();
        let (mut p, sink) = printer(8);
        p.write(&input);
        p.close();

        // 20 bytes with capacity 8 force two splits: 8+marker, 8+marker, 4.
        let lines = sink.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 9);
        assert_eq!(lines[1].len(), 9);
        assert_eq!(lines[2].len(), 4);

        let total: usize = lines.iter().map(Vec::len).sum();
        assert_eq!(total, input.len() + 2);

        // Stripping the markers reconstructs the input in order.
        let mut reassembled = Vec::new();
        reassembled.extend_from_slice(&lines[0][..8]);
        reassembled.extend_from_slice(&lines[1][..8]);
        reassembled.extend_from_slice(&lines[2]);
        assert_eq!(reassembled, input);
    }

    #[test]
    fn cursor_never_exceeds_capacity_between_calls() {
        let (mut p, _sink) = printer(8);
        for chunk in [&b"abc"[..], &b"defgh"[..], &b"ijklmnop"[..], &b"q"[..]] {
            p.write(chunk);
            assert!(p.pending() <= p.capacity());
        }
    }

    #[test]
    fn full_buffer_then_terminator_keeps_marker() {
        // The escape-and-flush check runs before the terminator check, so a
        // terminator arriving on a full buffer still splits with the marker.
        let (mut p, sink) = printer(4);
        p.write(b"wxyz\n");
        assert_eq!(sink.lines(), vec![b"wxyz\\".to_vec()]);
        assert_eq!(p.pending(), 0);
    }

    #[test]
    fn acquisition_fault_reports_consumed_and_keeps_buffer() {
        let (mut p, sink) = printer(16);
        let mut src = FlakySource {
            data: b"0123456789".to_vec(),
            fail_at: 3,
        };

        let err = p.write_from(&mut src).unwrap_err();
        match err {
            LinelogError::Acquisition { consumed, .. } => assert_eq!(consumed, 3),
            other => panic!("unexpected error: {other}"),
        }

        // Nothing was flushed by the fault; the three bytes are recoverable.
        assert!(sink.is_empty());
        assert_eq!(p.pending(), 3);
        p.flush();
        assert_eq!(sink.lines(), vec![b"012".to_vec()]);
    }

    #[test]
    fn write_resumes_after_fault() {
        let (mut p, sink) = printer(16);
        let mut src = FlakySource {
            data: b"abcdef".to_vec(),
            fail_at: 2,
        };
        assert!(p.write_from(&mut src).is_err());

        // A later successful write continues the same line.
        p.write(b"CD\n");
        assert_eq!(sink.lines(), vec![b"abCD".to_vec()]);
    }

    #[test]
    fn write_from_slice_source_matches_write() {
        let (mut p, sink) = printer(8);
        let mut src: &[u8] = b"one\ntwo\n";
        let consumed = p.write_from(&mut src).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(sink.lines(), vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let (mut p, sink) = printer(0);
        assert_eq!(p.capacity(), 1);
        p.write(b"ab\n");
        // At capacity 1 every byte lands on a full buffer, the trailing
        // terminator included, so both splits carry the marker.
        assert_eq!(sink.lines(), vec![b"a\\".to_vec(), b"b\\".to_vec()]);
    }
}
