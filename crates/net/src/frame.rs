//! Frame read/write primitives for the relay wire
//!
//! The wire uses two framing shapes: exact-length reads and
//! NUL-terminated reads. The reader owns the connection's buffered read
//! half and is the session's single consumer; callers enforce semantic
//! length limits.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{Error, Result};

/// Map read errors so EOF is distinguishable from hard IO failures.
fn closed_on_eof(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::ConnectionClosed
    } else {
        Error::Io(e)
    }
}

/// Buffered frame reader over a connection's read half.
pub struct FrameReader<R> {
    inner: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
        }
    }

    /// Read a single byte.
    pub async fn read_u8(&mut self) -> Result<u8> {
        self.inner.read_u8().await.map_err(closed_on_eof)
    }

    /// Read exactly `n` bytes.
    pub async fn read_n(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf).await.map_err(closed_on_eof)?;
        Ok(buf)
    }

    /// Read bytes up to (not including) the next NUL. EOF before the
    /// terminator fails the connection.
    pub async fn read_until_nul(&mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.inner.read_until(0, &mut buf).await?;
        if buf.last() == Some(&0) {
            buf.pop();
            Ok(buf)
        } else {
            Err(Error::ConnectionClosed)
        }
    }
}

/// Write one frame and flush. Frame atomicity comes from the single
/// task that owns the connection's write half.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> Result<()> {
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}
