use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::Error;

/// An incremental reader over the control connection.
///
/// Inbound frames can only be classified after looking at their first
/// bytes, and text messages are consumed line by line while interleaved
/// payloads are consumed by exact length.  The reader keeps a lookahead
/// buffer so all three access patterns work on the same stream without
/// losing data between frames.
pub struct MessageReader<R> {
    inner: R,
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Returns the next `count` bytes without consuming them.
    pub async fn peek(&mut self, count: usize) -> Result<&[u8], Error> {
        while self.buffer.len() < count {
            self.fill().await?;
        }

        Ok(&self.buffer[..count])
    }

    /// Consumes and returns exactly `count` bytes.
    pub async fn read_exact(&mut self, count: usize) -> Result<Bytes, Error> {
        while self.buffer.len() < count {
            self.fill().await?;
        }

        Ok(self.buffer.split_to(count).freeze())
    }

    /// Consumes one line.  Lines terminate with LF; one preceding CR is
    /// stripped if present, as some peers do not send it.
    pub async fn read_line(&mut self) -> Result<Vec<u8>, Error> {
        loop {
            if let Some(position) = self.buffer.iter().position(|&byte| byte == b'\n') {
                let mut line = self.buffer.split_to(position + 1);
                line.truncate(position);
                if line.last() == Some(&b'\r') {
                    line.truncate(position - 1);
                }

                return Ok(line.to_vec());
            }

            self.fill().await?;
        }
    }

    async fn fill(&mut self) -> Result<(), Error> {
        let read = self
            .inner
            .read_buf(&mut self.buffer)
            .await
            .map_err(Error::read)?;
        if read == 0 {
            return Err(Error::read(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed",
            )));
        }

        Ok(())
    }
}
