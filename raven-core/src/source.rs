//! Line sources for the bridge protocol stream
//!
//! ## Overview
//!
//! The serial bridge emits a line-oriented text protocol at a low bit rate.
//! Everything upstream of the framer is abstracted behind [`LineSource`]: a
//! blocking, one-line-per-call read with CR/LF already stripped. The framer
//! neither knows nor cares whether lines come from a serial device, a TCP
//! socket, a capture file, or a test vector.
//!
//! ```text
//! Serial ─┐
//! File   ─┼─→ LineSource ─→ Framer ─→ Decoder ─→ Reconciler
//! Memory ─┘
//! ```
//!
//! Disconnection is a first-class signal: [`SourceError::Disconnected`] is
//! distinct from transport errors so the caller can apply its
//! reconnect-or-exit policy. Timeout/liveness policy also lives with the
//! source owner — the framer itself will happily block forever.

use std::collections::VecDeque;
use std::io::BufRead;

use crate::errors::SourceError;

/// A blocking source of protocol text lines.
pub trait LineSource {
    /// Read the next line, blocking until one is available.
    ///
    /// Returned lines carry no trailing CR/LF. End of stream is
    /// [`SourceError::Disconnected`], never an empty line.
    fn next_line(&mut self) -> Result<String, SourceError>;
}

/// Adapter over any buffered reader.
///
/// This is the production path: wrap a serial port handle, TCP stream, or
/// file in a `BufReader` and hand it here.
pub struct ReaderSource<R> {
    inner: R,
}

impl<R: BufRead> ReaderSource<R> {
    /// Wrap a buffered reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Consume the adapter, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn next_line(&mut self) -> Result<String, SourceError> {
        let mut line = String::new();
        let n = self.inner.read_line(&mut line)?;
        if n == 0 {
            return Err(SourceError::Disconnected);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }
}

/// In-memory line source for tests and replay.
///
/// Yields its lines in order, then reports [`SourceError::Disconnected`] —
/// the same shape a real source has when the device is unplugged.
#[derive(Debug, Default)]
pub struct MemorySource {
    lines: VecDeque<String>,
}

impl MemorySource {
    /// Build from anything yielding line-like items.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Lines left to yield.
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for MemorySource {
    fn next_line(&mut self) -> Result<String, SourceError> {
        self.lines.pop_front().ok_or(SourceError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    #[test]
    fn reader_source_strips_line_endings() {
        let data: &[u8] = b"first\r\nsecond\nthird";
        let mut source = ReaderSource::new(BufReader::new(data));

        assert_eq!(source.next_line().unwrap(), "first");
        assert_eq!(source.next_line().unwrap(), "second");
        // Final line without a terminator still comes through.
        assert_eq!(source.next_line().unwrap(), "third");
        assert!(matches!(
            source.next_line(),
            Err(SourceError::Disconnected)
        ));
    }

    #[test]
    fn memory_source_disconnects_when_drained() {
        let mut source = MemorySource::new(["a", "b"]);
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.next_line().unwrap(), "a");
        assert_eq!(source.next_line().unwrap(), "b");
        assert!(matches!(
            source.next_line(),
            Err(SourceError::Disconnected)
        ));
    }
}
