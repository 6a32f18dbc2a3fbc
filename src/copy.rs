use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::{FtpError, Result};
use crate::signal::CancelSignal;

/// Streams bytes from `reader` to `writer` in bounded chunks, honoring
/// `signal` at every chunk boundary.
///
/// The signal is checked before each chunk, and the chunk read itself races
/// the signal, so an abort is observed within one chunk plus one blocking
/// call. On cancellation the engine stops immediately and returns
/// [`FtpError::Cancelled`] whose `bytes_copied` counts only fully written
/// chunks; it does not attempt to flush further data. On normal completion
/// the writer is flushed and the total byte count returned.
///
/// Both download (remote source, local sink) and upload (local source, remote
/// sink) go through this single primitive.
pub async fn copy<R, W>(
    signal: &CancelSignal,
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let chunk_size = chunk_size.max(1);
    let mut buf = BytesMut::with_capacity(chunk_size);
    let mut total: u64 = 0;

    loop {
        if let Some(reason) = signal.cause() {
            debug!("copy aborted after {} bytes: {}", total, reason);
            return Err(FtpError::Cancelled {
                reason,
                bytes_copied: total,
            });
        }

        buf.clear();
        let n = tokio::select! {
            reason = signal.triggered() => {
                debug!("copy aborted mid-read after {} bytes: {}", total, reason);
                return Err(FtpError::Cancelled {
                    reason,
                    bytes_copied: total,
                });
            }
            read_result = reader.read_buf(&mut buf) => read_result?,
        };
        if n == 0 {
            break;
        }

        writer.write_all(&buf[..n]).await?;
        total += n as u64;
    }

    writer.flush().await?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use super::*;
    use crate::error::CancelReason;

    /// Serves `chunk` forever, firing the signal once `cancel_at` chunks have
    /// been handed out.
    struct CancelAfterReader {
        chunk: Vec<u8>,
        served: usize,
        cancel_at: usize,
        signal: CancelSignal,
    }

    impl AsyncRead for CancelAfterReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            if self.served == self.cancel_at {
                self.signal.cancel();
            }
            let chunk = self.chunk.clone();
            buf.put_slice(&chunk);
            self.served += 1;
            Poll::Ready(Ok(()))
        }
    }

    /// Never yields data and never completes.
    struct StalledReader;

    impl AsyncRead for StalledReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Pending
        }
    }

    #[tokio::test]
    async fn copies_everything_in_chunks() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let mut reader = Cursor::new(data.clone());
        let mut sink = Vec::new();
        let signal = CancelSignal::new();

        let copied = copy(&signal, &mut reader, &mut sink, 64).await.unwrap();
        assert_eq!(copied, 1000);
        assert_eq!(sink, data);
    }

    #[tokio::test]
    async fn empty_source_copies_nothing() {
        let mut reader = Cursor::new(Vec::new());
        let mut sink = Vec::new();
        let signal = CancelSignal::new();

        let copied = copy(&signal, &mut reader, &mut sink, 64).await.unwrap();
        assert_eq!(copied, 0);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn pre_cancelled_signal_moves_no_bytes() {
        let mut reader = Cursor::new(vec![1u8; 128]);
        let mut sink = Vec::new();
        let signal = CancelSignal::new();
        signal.cancel();

        match copy(&signal, &mut reader, &mut sink, 16).await {
            Err(FtpError::Cancelled {
                reason: CancelReason::Explicit,
                bytes_copied: 0,
            }) => {}
            other => panic!("expected cancellation, got {other:?}"),
        }
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn elapsed_deadline_moves_no_bytes() {
        let mut reader = Cursor::new(vec![1u8; 128]);
        let mut sink = Vec::new();
        let signal = CancelSignal::with_timeout(Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(5)).await;

        match copy(&signal, &mut reader, &mut sink, 16).await {
            Err(FtpError::Cancelled {
                reason: CancelReason::DeadlineExceeded,
                bytes_copied: 0,
            }) => {}
            other => panic!("expected deadline cancellation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mid_stream_cancel_halts_at_chunk_boundary() {
        let signal = CancelSignal::new();
        let mut reader = CancelAfterReader {
            chunk: vec![7u8; 32],
            served: 0,
            cancel_at: 3,
            signal: signal.clone(),
        };
        let mut sink = Vec::new();

        // The cancel fires while the 4th chunk is served; that chunk still
        // completes, the next checkpoint aborts.
        match copy(&signal, &mut reader, &mut sink, 32).await {
            Err(FtpError::Cancelled {
                reason: CancelReason::Explicit,
                bytes_copied,
            }) => assert_eq!(bytes_copied, 4 * 32),
            other => panic!("expected cancellation, got {other:?}"),
        }
        assert_eq!(sink.len(), 4 * 32);
    }

    #[tokio::test]
    async fn cancel_interrupts_a_blocked_read() {
        let signal = CancelSignal::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let mut sink = Vec::new();
        match copy(&signal, &mut StalledReader, &mut sink, 16).await {
            Err(FtpError::Cancelled {
                reason: CancelReason::Explicit,
                bytes_copied: 0,
            }) => {}
            other => panic!("expected cancellation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn deadline_interrupts_a_blocked_read() {
        let signal = CancelSignal::with_timeout(Duration::from_millis(20));
        let mut sink = Vec::new();
        match copy(&signal, &mut StalledReader, &mut sink, 16).await {
            Err(FtpError::Cancelled {
                reason: CancelReason::DeadlineExceeded,
                bytes_copied: 0,
            }) => {}
            other => panic!("expected deadline cancellation, got {other:?}"),
        }
    }
}
