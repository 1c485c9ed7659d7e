use bytes::{Bytes, BytesMut};
use futures::{Stream, ready};
use std::{
    collections::VecDeque,
    io,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Reshapes a stream of buffers of any size into buffers of exactly `part_size` bytes, the
/// last one holds the remainder. An empty input yields nothing.
///
/// The upstream is only polled when no complete part is waiting, so at most one input buffer
/// worth of parts is held in memory.
#[derive(Debug)]
pub struct Rechunker<S> {
    inner: S,
    part_size: usize,
    buffer: BytesMut,
    ready: VecDeque<Bytes>,
    done: bool,
}

impl<S> Rechunker<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    #[must_use]
    pub fn new(inner: S, part_size: usize) -> Self {
        let part_size = part_size.max(1);
        Self {
            inner,
            part_size,
            buffer: BytesMut::with_capacity(part_size),
            ready: VecDeque::new(),
            done: false,
        }
    }

    #[must_use]
    pub const fn part_size(&self) -> usize {
        self.part_size
    }

    fn push(&mut self, mut bytes: Bytes) {
        while !bytes.is_empty() {
            let room = self.part_size - self.buffer.len();
            let chunk = bytes.split_to(room.min(bytes.len()));
            self.buffer.extend_from_slice(&chunk);

            if self.buffer.len() == self.part_size {
                // split hands out the filled region, the accumulator keeps none of it
                self.ready.push_back(self.buffer.split().freeze());
                self.buffer.reserve(self.part_size);
            }
        }
    }
}

impl<R: AsyncRead + Unpin> Rechunker<ReaderStream<R>> {
    /// Read `reader` to the end in parts of `part_size`
    #[must_use]
    pub fn from_reader(reader: R, part_size: usize) -> Self {
        Self::new(ReaderStream::new(reader), part_size)
    }
}

impl<S> Stream for Rechunker<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if let Some(part) = this.ready.pop_front() {
                return Poll::Ready(Some(Ok(part)));
            }

            if this.done {
                return Poll::Ready(None);
            }

            match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
                Some(Ok(bytes)) => this.push(bytes),
                Some(Err(e)) => {
                    this.done = true;
                    this.buffer.clear();
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    this.done = true;
                    if !this.buffer.is_empty() {
                        return Poll::Ready(Some(Ok(this.buffer.split().freeze())));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::{StreamExt, TryStreamExt, stream};

    fn input(buffers: &[&'static [u8]]) -> impl Stream<Item = io::Result<Bytes>> + Unpin {
        stream::iter(
            buffers
                .iter()
                .map(|b| Ok(Bytes::from_static(b)))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect(buffers: &[&'static [u8]], part_size: usize) -> Vec<Bytes> {
        Rechunker::new(input(buffers), part_size)
            .try_collect()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_split_across_buffers() {
        let parts = collect(&[b"ha", b"lo"], 3).await;
        assert_eq!(parts, [Bytes::from_static(b"hal"), Bytes::from_static(b"o")]);
    }

    #[tokio::test]
    async fn test_single_short_buffer() {
        let parts = collect(&[b"halo"], 10).await;
        assert_eq!(parts, [Bytes::from_static(b"halo")]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        assert!(collect(&[], 4).await.is_empty());
        assert!(collect(&[b"", b""], 4).await.is_empty());
    }

    #[tokio::test]
    async fn test_exact_multiple() {
        let parts = collect(&[b"abcdef"], 3).await;
        assert_eq!(parts, [Bytes::from_static(b"abc"), Bytes::from_static(b"def")]);
    }

    #[tokio::test]
    async fn test_preserves_bytes_for_many_shapes() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        for part_size in [1, 2, 7, 64, 999, 1000, 4096] {
            for step in [1, 3, 100, 1000] {
                let buffers: Vec<io::Result<Bytes>> = data
                    .chunks(step)
                    .map(|c| Ok(Bytes::copy_from_slice(c)))
                    .collect();
                let parts: Vec<Bytes> = Rechunker::new(stream::iter(buffers), part_size)
                    .try_collect()
                    .await
                    .unwrap();

                let (last, full) = parts.split_last().unwrap();
                assert!(full.iter().all(|p| p.len() == part_size));
                assert!((1..=part_size).contains(&last.len()));
                assert_eq!(parts.concat(), data);
            }
        }
    }

    #[tokio::test]
    async fn test_upstream_error_is_propagated() {
        let buffers = vec![
            Ok(Bytes::from_static(b"abcd")),
            Err(io::Error::other("broken pipe")),
            Ok(Bytes::from_static(b"ef")),
        ];
        let mut rechunker = Rechunker::new(stream::iter(buffers), 3);
        assert_eq!(rechunker.next().await.unwrap().unwrap(), "abc");
        assert!(rechunker.next().await.unwrap().is_err());
        assert!(rechunker.next().await.is_none());
    }

    #[tokio::test]
    async fn test_from_reader() {
        let reader = std::io::Cursor::new(b"hello world".to_vec());
        let parts: Vec<Bytes> = Rechunker::from_reader(reader, 5).try_collect().await.unwrap();
        assert_eq!(parts, ["hello", " worl", "d"]);
    }

    #[test]
    fn test_zero_part_size_is_one() {
        let rechunker = Rechunker::new(input(&[]), 0);
        assert_eq!(rechunker.part_size(), 1);
    }
}
