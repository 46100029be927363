//! Chunked channel readers.
//!
//! - [`ChunkReader`] - Bounded reads from a [`std::io::Read`] source, one per call
//! - [`ChunkStream`] - The same over `futures_io::AsyncRead` (requires `async-io`)
//!
//! Both yield [`ReadEvent`]s in byte order and never hold more than the
//! configured high-water mark of unconsumed bytes.

mod channel;
#[cfg(feature = "async-io")]
mod stream;

pub use channel::ChunkReader;
#[cfg(feature = "async-io")]
pub use stream::ChunkStream;

use bytes::Bytes;

/// One delivery from a chunked reader.
///
/// Carries the bytes of one read, whether more reads will follow, and the I/O
/// error that ended the stream, if any. A final event may carry data (for
/// example when the read limit was reached) or be empty (end-of-stream,
/// cancellation, error).
#[derive(Debug)]
pub struct ReadEvent {
    /// Bytes produced by this read. May be empty.
    pub chunk: Bytes,
    /// `true` if no further events follow.
    pub is_final: bool,
    /// The read error that ended the stream.
    pub error: Option<std::io::Error>,
}

impl ReadEvent {
    pub(crate) fn data(chunk: Bytes, is_final: bool) -> Self {
        Self {
            chunk,
            is_final,
            error: None,
        }
    }

    pub(crate) fn end() -> Self {
        Self::data(Bytes::new(), true)
    }

    pub(crate) fn failed(error: std::io::Error) -> Self {
        Self {
            chunk: Bytes::new(),
            is_final: true,
            error: Some(error),
        }
    }
}

/// Bytes to request next: the high-water mark, capped by what is left of the
/// read limit.
pub(crate) fn request_len(high_water_mark: usize, remaining: Option<u64>) -> usize {
    match remaining {
        Some(left) => usize::try_from(left).map_or(high_water_mark, |left| left.min(high_water_mark)),
        None => high_water_mark,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_len() {
        assert_eq!(request_len(1024, None), 1024);
        assert_eq!(request_len(1024, Some(10)), 10);
        assert_eq!(request_len(1024, Some(0)), 0);
        assert_eq!(request_len(1024, Some(u64::MAX)), 1024);
    }
}
