//! Async chunked reader.
//!
//! This module provides chunked reading over the `futures-io::AsyncRead`
//! trait, making it runtime-agnostic and compatible with tokio, async-std,
//! smol, and other async runtimes.

use std::io::ErrorKind;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::BytesMut;
use futures_core::Stream;
use futures_io::AsyncRead;
use pin_project_lite::pin_project;

use super::{ReadEvent, request_len};
use crate::cancel::CancellationToken;
use crate::config::DetectConfig;

pin_project! {
    /// A stream of [`ReadEvent`]s from an async reader.
    ///
    /// Same rules as [`ChunkReader`](crate::ChunkReader): at most
    /// `high_water_mark` bytes per event, byte order preserved, exactly one
    /// final event, nothing after it. The stream is fused.
    ///
    /// For tokio readers, convert with `tokio_util::compat`:
    ///
    /// ```ignore
    /// use tokio_util::compat::TokioAsyncReadCompatExt;
    /// use encsniff::{ChunkStream, DetectConfig};
    ///
    /// let file = tokio::fs::File::open("file").await?;
    /// let stream = ChunkStream::new(file.compat(), &DetectConfig::default());
    /// ```
    #[derive(Debug)]
    pub struct ChunkStream<R> {
        #[pin]
        reader: R,
        buffer: BytesMut,
        high_water_mark: usize,
        remaining: Option<u64>,
        bytes_read: u64,
        cancel: Option<CancellationToken>,
        finished: bool,
    }
}

impl<R: AsyncRead> ChunkStream<R> {
    /// Creates a stream over `reader` sized by `config`.
    pub fn new(reader: R, config: &DetectConfig) -> Self {
        Self {
            reader,
            buffer: BytesMut::new(),
            high_water_mark: config.high_water_mark(),
            remaining: config.max_bytes(),
            bytes_read: 0,
            cancel: None,
            finished: false,
        }
    }

    /// Stops issuing reads once `token` is cancelled.
    ///
    /// The token is checked at the start of every poll, including the poll
    /// that would resume a read left pending. Once it is set, the next poll
    /// yields an empty final event and the reader is not polled again.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl<R> ChunkStream<R> {
    /// Returns the number of bytes delivered so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Consumes the stream and returns the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncRead> Stream for ChunkStream<R> {
    type Item = ReadEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.finished {
            return Poll::Ready(None);
        }

        if this.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            *this.finished = true;
            return Poll::Ready(Some(ReadEvent::end()));
        }

        let want = request_len(*this.high_water_mark, *this.remaining);
        if want == 0 {
            *this.finished = true;
            return Poll::Ready(Some(ReadEvent::end()));
        }

        this.buffer.reserve(want);
        this.buffer.resize(want, 0);

        let n = loop {
            match this.reader.as_mut().poll_read(cx, &mut this.buffer[..want]) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Ok(n)) => break n,
                Poll::Ready(Err(e)) if e.kind() == ErrorKind::Interrupted => continue,
                Poll::Ready(Err(e)) => {
                    this.buffer.clear();
                    *this.finished = true;
                    return Poll::Ready(Some(ReadEvent::failed(e)));
                }
            }
        };

        if n == 0 {
            this.buffer.clear();
            *this.finished = true;
            return Poll::Ready(Some(ReadEvent::end()));
        }

        this.buffer.truncate(n);
        *this.bytes_read += n as u64;
        if let Some(left) = this.remaining.as_mut() {
            *left -= n as u64;
            *this.finished = *left == 0;
        }

        Poll::Ready(Some(ReadEvent::data(this.buffer.split().freeze(), *this.finished)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished { (0, Some(0)) } else { (1, None) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_stream_empty() {
        let reader: &[u8] = &[];
        let events: Vec<_> = ChunkStream::new(reader, &DetectConfig::default())
            .collect()
            .await;
        assert_eq!(events.len(), 1);
        assert!(events[0].is_final);
    }

    #[tokio::test]
    async fn test_stream_bounded_chunks() {
        let data: Vec<u8> = (0..1000).map(|i| (i % 256) as u8).collect();
        let reader: &[u8] = &data;
        let config = DetectConfig::new(64).unwrap();
        let events: Vec<_> = ChunkStream::new(reader, &config).collect().await;

        let mut joined = Vec::new();
        for event in &events {
            assert!(event.chunk.len() <= 64);
            joined.extend_from_slice(&event.chunk);
        }
        assert_eq!(joined, data);
        assert_eq!(events.iter().filter(|e| e.is_final).count(), 1);
    }

    #[tokio::test]
    async fn test_stream_cancelled_before_first_read() {
        let token = CancellationToken::new();
        token.cancel();

        let reader: &[u8] = b"never read";
        let mut stream =
            ChunkStream::new(reader, &DetectConfig::default()).with_cancellation(token);
        let event = stream.next().await.unwrap();
        assert!(event.is_final);
        assert!(event.chunk.is_empty());
        assert!(stream.next().await.is_none());
        assert_eq!(stream.bytes_read(), 0);
    }

    /// Never completes a read; counts polls.
    struct Stalled {
        polls: usize,
    }

    impl AsyncRead for Stalled {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut [u8],
        ) -> Poll<std::io::Result<usize>> {
            self.polls += 1;
            Poll::Pending
        }
    }

    #[test]
    fn test_cancel_while_read_pending_ends_without_polling_reader() {
        let token = CancellationToken::new();
        let mut stream = ChunkStream::new(Stalled { polls: 0 }, &DetectConfig::default())
            .with_cancellation(token.clone());

        {
            let mut next = tokio_test::task::spawn(stream.next());
            assert!(next.poll().is_pending());
            token.cancel();
            match next.poll() {
                Poll::Ready(Some(event)) => {
                    assert!(event.is_final);
                    assert!(event.chunk.is_empty());
                    assert!(event.error.is_none());
                }
                other => panic!("expected final event, got {:?}", other),
            }
        }

        assert_eq!(stream.into_inner().polls, 1);
    }

    #[tokio::test]
    async fn test_stream_max_bytes() {
        let reader: &[u8] = &[b'z'; 50];
        let config = DetectConfig::new(16).unwrap().with_max_bytes(Some(24));
        let events: Vec<_> = ChunkStream::new(reader, &config).collect().await;

        let total: usize = events.iter().map(|e| e.chunk.len()).sum();
        assert_eq!(total, 24);
        assert!(events.last().unwrap().is_final);
    }

    #[tokio::test]
    async fn test_stream_error_after_data() {
        use tokio_util::compat::TokioAsyncReadCompatExt;

        let mock = tokio_test::io::Builder::new()
            .read(b"abc")
            .read(b"def")
            .read_error(std::io::Error::new(ErrorKind::ConnectionReset, "reset"))
            .build();
        let events: Vec<_> = ChunkStream::new(mock.compat(), &DetectConfig::default())
            .collect()
            .await;

        assert_eq!(events.len(), 3);
        assert_eq!(&events[0].chunk[..], b"abc");
        assert_eq!(&events[1].chunk[..], b"def");
        assert!(events[2].is_final);
        assert_eq!(
            events[2].error.as_ref().map(|e| e.kind()),
            Some(ErrorKind::ConnectionReset)
        );
    }
}
