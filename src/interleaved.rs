use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::{Error, reader::MessageReader};

/// The magic byte opening every interleaved frame.
pub const INTERLEAVED_MAGIC: u8 = 0x24;

/// Size in octets of the interleaved frame header.
pub const INTERLEAVED_HEADER_SIZE: usize = 4;

/// The fixed prefix wrapping a binary RTP or RTCP packet on the control
/// connection: magic byte, channel identifier and big-endian payload
/// length.  Channel parity encodes the stream kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterleavedHeader {
    pub channel: u8,
    pub length: u16,
}

impl InterleavedHeader {
    /// Even channels carry RTP, odd channels carry RTCP.
    pub fn is_rtp(&self) -> bool {
        self.channel % 2 == 0
    }

    /// # Test
    ///
    /// ```
    /// use rtsp_client::InterleavedHeader;
    ///
    /// let header = InterleavedHeader {
    ///     channel: 2,
    ///     length: 1024,
    /// };
    ///
    /// assert_eq!(header.encode(), [0x24, 0x02, 0x04, 0x00]);
    /// ```
    pub fn encode(&self) -> [u8; INTERLEAVED_HEADER_SIZE] {
        let length = self.length.to_be_bytes();
        [INTERLEAVED_MAGIC, self.channel, length[0], length[1]]
    }

    pub async fn write<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_all(&self.encode()).await.map_err(Error::write)
    }

    pub async fn read<R: AsyncRead + Unpin>(
        reader: &mut MessageReader<R>,
    ) -> Result<Self, Error> {
        let bytes = reader.read_exact(INTERLEAVED_HEADER_SIZE).await?;
        if bytes[0] != INTERLEAVED_MAGIC {
            return Err(Error::InvalidInterleavedSignature(bytes[0]));
        }

        Ok(Self {
            channel: bytes[1],
            length: u16::from_be_bytes([bytes[2], bytes[3]]),
        })
    }
}
