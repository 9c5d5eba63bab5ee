use bytes::Bytes;

use crate::{
    EXTENSION_HEADER_SIZE, Error, HEADER_SIZE, MAX_CSRC, MAX_PAYLOAD_TYPE, VERSION, raw::RawPacket,
};

/// An extension header, carried when the X bit is set.
///
/// The content length is stored on the wire as a count of 32-bit words,
/// so encoding pads the content with zero octets up to a multiple of 4.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Extension {
    pub profile: u16,
    pub content: Bytes,
}

/// The structured form of the RTP packet header (RFC3550).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Header {
    pub marker: bool,
    pub padding: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub csrc: Vec<u32>,
    pub extension: Option<Extension>,
}

impl Header {
    /// The entire size of the header according to its fields.
    pub fn size(&self) -> usize {
        let mut size = HEADER_SIZE + self.csrc.len() * 4;
        if let Some(extension) = &self.extension {
            size += EXTENSION_HEADER_SIZE + extension.content.len().div_ceil(4) * 4;
        }

        size
    }

    /// Validates and decodes a header, returning it together with the
    /// number of octets consumed.
    ///
    /// # Test
    ///
    /// ```
    /// use rtsp_client_codec::Header;
    ///
    /// let buffer = [
    ///     0x80u8, 0x60, 0x23, 0xcc, 0x64, 0x3c, 0xa6, 0x79, 0x6b, 0x8b,
    ///     0x45, 0x67,
    /// ];
    ///
    /// let (header, size) = Header::decode(&buffer).unwrap();
    ///
    /// assert_eq!(size, 12);
    /// assert_eq!(header.payload_type, 96);
    /// assert_eq!(header.sequence_number, 9164);
    /// assert_eq!(header.timestamp, 1681696377);
    /// assert_eq!(header.ssrc, 0x6b8b4567);
    /// ```
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), Error> {
        let mut expected = HEADER_SIZE;
        if bytes.len() < expected {
            return Err(Error::IncompleteHeader {
                expected,
                actual: bytes.len(),
            });
        }

        let raw = RawPacket(bytes);
        let version = raw.version();
        if version != VERSION {
            return Err(Error::VersionMismatch { version });
        }

        let csrc_count = raw.csrc_count() as usize;
        expected += csrc_count * 4;
        if raw.extension() {
            expected += EXTENSION_HEADER_SIZE;
        }

        if bytes.len() < expected {
            return Err(Error::IncompleteHeader {
                expected,
                actual: bytes.len(),
            });
        }

        if raw.extension() {
            expected += raw.extension_length() as usize * 4;
            if bytes.len() < expected {
                return Err(Error::IncompleteHeader {
                    expected,
                    actual: bytes.len(),
                });
            }
        }

        let header = Self {
            marker: raw.marker(),
            padding: raw.padding(),
            payload_type: raw.payload_type(),
            sequence_number: raw.sequence_number(),
            timestamp: raw.timestamp(),
            ssrc: raw.ssrc(),
            csrc: (0..csrc_count).map(|index| raw.csrc(index)).collect(),
            extension: raw.extension().then(|| Extension {
                profile: raw.extension_profile(),
                content: Bytes::copy_from_slice(raw.extension_content()),
            }),
        };

        Ok((header, expected))
    }

    /// Encodes the header into a freshly allocated buffer.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut buffer = vec![0u8; self.size()];
        self.encode_to(&mut buffer)?;

        Ok(buffer)
    }

    /// Encodes the header into the given buffer, returning the number
    /// of octets written.
    pub fn encode_to(&self, buffer: &mut [u8]) -> Result<usize, Error> {
        if buffer.len() < HEADER_SIZE {
            return Err(Error::NotEnoughBufferSpace {
                expected: HEADER_SIZE,
                actual: buffer.len(),
            });
        }

        if self.csrc.len() > MAX_CSRC {
            return Err(Error::CsrcLimitExceeded {
                count: self.csrc.len(),
            });
        }

        if self.payload_type > MAX_PAYLOAD_TYPE {
            return Err(Error::InvalidPayloadType {
                payload_type: self.payload_type,
            });
        }

        let size = self.size();
        if buffer.len() < size {
            return Err(Error::NotEnoughBufferSpace {
                expected: size,
                actual: buffer.len(),
            });
        }

        let mut raw = RawPacket(buffer);
        raw.set_version(VERSION);
        raw.set_padding(self.padding);
        raw.set_extension(self.extension.is_some());
        raw.set_csrc_count(self.csrc.len() as u8);
        raw.set_marker(self.marker);
        raw.set_payload_type(self.payload_type);
        raw.set_sequence_number(self.sequence_number);
        raw.set_timestamp(self.timestamp);
        raw.set_ssrc(self.ssrc);
        for (index, csrc) in self.csrc.iter().enumerate() {
            raw.set_csrc(index, *csrc);
        }

        if let Some(extension) = &self.extension {
            raw.set_extension_profile(extension.profile);
            raw.set_extension_length(extension.content.len().div_ceil(4) as u16);
            raw.set_extension_content(&extension.content);

            // The word padding must not leak whatever the caller's
            // buffer held before.
            let content_start =
                HEADER_SIZE + self.csrc.len() * 4 + EXTENSION_HEADER_SIZE + extension.content.len();
            let content_end = size;
            raw.0[content_start..content_end].fill(0);
        }

        Ok(size)
    }
}
