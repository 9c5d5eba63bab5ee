//! ## Real-time Transport Protocol (RTP)
//!
//! [RFC3550]: https://tools.ietf.org/html/rfc3550
//! [Section 5.1]: https://tools.ietf.org/html/rfc3550#section-5.1
//!
//! RTP provides end-to-end network transport functions suitable for
//! applications transmitting real-time data, such as audio, video or
//! simulation data, over multicast or unicast network services.  The
//! data transport is augmented by a control protocol (RTCP) to allow
//! monitoring of the data delivery in a manner scalable to large
//! multicast networks.  This crate implements the packet format of
//! [RFC3550], version 2, as described in [Section 5.1]: the fixed
//! header, the contributing source list, the one-word extension
//! descriptor and the trailing padding region.

pub mod header;
pub mod packet;
pub mod raw;

pub use self::{
    header::{Extension, Header},
    packet::Packet,
    raw::RawPacket,
};

/// The protocol version carried by every packet.
pub const VERSION: u8 = 2;

/// Size in octets of the fixed part of the header.
pub const HEADER_SIZE: usize = 12;

/// Size in octets of the extension descriptor (profile + word count).
pub const EXTENSION_HEADER_SIZE: usize = 4;

/// Maximum number of contributing sources the 4-bit count can address.
pub const MAX_CSRC: usize = 15;

/// Highest payload type value that fits the 7-bit field.
pub const MAX_PAYLOAD_TYPE: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    IncompleteHeader { expected: usize, actual: usize },
    VersionMismatch { version: u8 },
    InvalidPayloadType { payload_type: u8 },
    CsrcLimitExceeded { count: usize },
    PayloadMissing,
    NotEnoughBufferSpace { expected: usize, actual: usize },
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IncompleteHeader { expected, actual } => {
                write!(f, "incoming buffer too short: {} < {}", actual, expected)
            }
            Self::VersionMismatch { version } => {
                write!(f, "RTP version mismatch: {} != {}", version, VERSION)
            }
            Self::InvalidPayloadType { payload_type } => {
                write!(
                    f,
                    "invalid payload type: {} > {}",
                    payload_type, MAX_PAYLOAD_TYPE
                )
            }
            Self::CsrcLimitExceeded { count } => {
                write!(f, "CSRC limit exceeded: {} / {}", count, MAX_CSRC)
            }
            Self::PayloadMissing => write!(f, "payload is missing"),
            Self::NotEnoughBufferSpace { expected, actual } => {
                write!(f, "not enough buffer space: {} < {}", actual, expected)
            }
        }
    }
}
