//! Synchronous chunked reader.

use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use super::{ReadEvent, request_len};
use crate::cancel::CancellationToken;
use crate::config::DetectConfig;

/// Reads a [`Read`] source in chunks of at most `high_water_mark` bytes.
///
/// Each call to [`next_event`](Self::next_event) issues at most one read. The
/// chunk buffer is reused: once the caller drops the previous chunk, its
/// allocation backs the next read, so memory stays bounded by the high-water
/// mark however large the source is.
///
/// The reader owns the source. It is closed when the reader is dropped;
/// [`into_inner`](Self::into_inner) hands it back instead.
///
/// # Example
///
/// ```
/// use encsniff::{CancellationToken, ChunkReader, DetectConfig};
///
/// let config = DetectConfig::new(4)?;
/// let mut reader = ChunkReader::new(&b"abcdefghij"[..], &config);
/// let token = CancellationToken::new();
///
/// let mut total = 0;
/// while let Some(event) = reader.next_event(&token) {
///     total += event.chunk.len();
/// }
/// assert_eq!(total, 10);
/// # Ok::<(), encsniff::DetectError>(())
/// ```
#[derive(Debug)]
pub struct ChunkReader<R> {
    reader: R,
    buffer: BytesMut,
    high_water_mark: usize,
    remaining: Option<u64>,
    bytes_read: u64,
    finished: bool,
}

impl<R: Read> ChunkReader<R> {
    /// Creates a reader over `reader` sized by `config`.
    pub fn new(reader: R, config: &DetectConfig) -> Self {
        Self {
            reader,
            buffer: BytesMut::new(),
            high_water_mark: config.high_water_mark(),
            remaining: config.max_bytes(),
            bytes_read: 0,
            finished: false,
        }
    }

    /// Reads the next chunk.
    ///
    /// Returns `None` once a final event was delivered. If `cancel` is set
    /// when this is called, no read is issued and an empty final event is
    /// returned.
    pub fn next_event(&mut self, cancel: &CancellationToken) -> Option<ReadEvent> {
        if self.finished {
            return None;
        }

        if cancel.is_cancelled() {
            self.finished = true;
            return Some(ReadEvent::end());
        }

        let want = request_len(self.high_water_mark, self.remaining);
        if want == 0 {
            self.finished = true;
            return Some(ReadEvent::end());
        }

        self.buffer.reserve(want);
        self.buffer.resize(want, 0);

        let n = loop {
            match self.reader.read(&mut self.buffer[..want]) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buffer.clear();
                    self.finished = true;
                    return Some(ReadEvent::failed(e));
                }
            }
        };

        if n == 0 {
            self.buffer.clear();
            self.finished = true;
            return Some(ReadEvent::end());
        }

        self.buffer.truncate(n);
        self.bytes_read += n as u64;
        if let Some(left) = self.remaining.as_mut() {
            *left -= n as u64;
            self.finished = *left == 0;
        }

        Some(ReadEvent::data(self.buffer.split().freeze(), self.finished))
    }
}

impl<R> ChunkReader<R> {
    /// Returns the number of bytes delivered so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Returns `true` once the final event was delivered.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns a reference to the source.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Consumes the reader and returns the source.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
