use bytes::Bytes;

use crate::{Error, header::Header};

/// A full RTP packet: header, opaque payload and trailing padding.
///
/// `padding_bytes` counts the zero octets written between the payload
/// and the mandatory length octet.  It only takes effect when the
/// header padding flag is set; otherwise it is ignored on encode and
/// zeroed on decode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub payload: Bytes,
    pub padding_bytes: u8,
}

impl Packet {
    /// The entire size of the packet according to its fields.
    pub fn size(&self) -> usize {
        let mut size = self.header.size() + self.payload.len();
        if self.header.padding {
            size += self.padding_bytes as usize + 1;
        }

        size
    }

    /// Encodes the packet into a freshly allocated buffer.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut buffer = vec![0u8; self.size()];
        self.encode_to(&mut buffer)?;

        Ok(buffer)
    }

    /// Encodes the packet into the given buffer, returning the number
    /// of octets written.
    ///
    /// # Test
    ///
    /// ```
    /// use bytes::Bytes;
    /// use rtsp_client_codec::{Header, Packet};
    ///
    /// let packet = Packet {
    ///     header: Header {
    ///         padding: true,
    ///         payload_type: 96,
    ///         sequence_number: 9164,
    ///         timestamp: 1681696377,
    ///         ssrc: 0x6b8b4567,
    ///         ..Default::default()
    ///     },
    ///     payload: Bytes::from_static(&[0x01, 0x02, 0x03]),
    ///     padding_bytes: 2,
    /// };
    ///
    /// let mut buffer = [0u8; 64];
    /// let size = packet.encode_to(&mut buffer).unwrap();
    ///
    /// assert_eq!(size, packet.size());
    /// assert_eq!(&buffer[size - 6..size], &[0x01, 0x02, 0x03, 0x00, 0x00, 0x03]);
    /// ```
    pub fn encode_to(&self, buffer: &mut [u8]) -> Result<usize, Error> {
        let size = self.size();
        if buffer.len() < size {
            return Err(Error::NotEnoughBufferSpace {
                expected: size,
                actual: buffer.len(),
            });
        }

        let offset = self.header.encode_to(buffer)?;
        buffer[offset..offset + self.payload.len()].copy_from_slice(&self.payload);

        if self.header.padding {
            let end = offset + self.payload.len() + self.padding_bytes as usize;
            buffer[offset + self.payload.len()..end].fill(0);
            buffer[end] = (self.padding_bytes as usize + 1) as u8;
        }

        Ok(size)
    }

    /// Decodes a packet, copying the payload into owned storage so the
    /// result does not alias the input buffer.
    ///
    /// # Test
    ///
    /// ```
    /// use rtsp_client_codec::Packet;
    ///
    /// let buffer = [
    ///     0xa0u8, 0x60, 0x23, 0xcc, 0x64, 0x3c, 0xa6, 0x79, 0x6b, 0x8b,
    ///     0x45, 0x67, 0x01, 0x02, 0x03, 0x00, 0x00, 0x03,
    /// ];
    ///
    /// let packet = Packet::decode(&buffer).unwrap();
    ///
    /// assert!(packet.header.padding);
    /// assert_eq!(packet.payload.as_ref(), &[0x01, 0x02, 0x03]);
    /// assert_eq!(packet.padding_bytes, 2);
    /// ```
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let (header, offset) = Header::decode(bytes)?;
        let tail = &bytes[offset..];

        if !header.padding {
            if tail.is_empty() {
                return Err(Error::PayloadMissing);
            }

            return Ok(Self {
                header,
                payload: Bytes::copy_from_slice(tail),
                padding_bytes: 0,
            });
        }

        let Some(&padding_length) = tail.last() else {
            return Err(Error::PayloadMissing);
        };

        // A zero length octet means the sender set the padding flag
        // without shipping any padding, the whole tail is payload.
        if padding_length == 0 {
            return Ok(Self {
                header,
                payload: Bytes::copy_from_slice(tail),
                padding_bytes: 0,
            });
        }

        let padding_length = padding_length as usize;
        if padding_length >= tail.len() {
            return Err(Error::PayloadMissing);
        }

        Ok(Self {
            header,
            payload: Bytes::copy_from_slice(&tail[..tail.len() - padding_length]),
            padding_bytes: (padding_length - 1) as u8,
        })
    }
}
