//! ## Real Time Streaming Protocol (RTSP) client core
//!
//! [RFC2326]: https://tools.ietf.org/html/rfc2326
//! [Section 10.12]: https://tools.ietf.org/html/rfc2326#section-10.12
//!
//! RTSP is a text-based control plane for streaming sessions.  A single
//! reliable connection carries the request/response exchange and, per
//! [Section 10.12], binary RTP and RTCP packets wrapped in interleaved
//! frames.  This crate implements the low-level machinery of a client:
//! the message codec, the interleaved framing and a [`Session`] engine
//! that multiplexes concurrent requests and unsolicited server traffic
//! over one connection.  Orchestration of method sequencing (DESCRIBE,
//! SETUP, PLAY, ...), SDP and authentication belong to a higher layer.
//!
//! The RTP packet codec lives in the [`rtp`] crate re-exported here.
//!
//! ```no_run
//! use rtsp_client::{Incoming, Method, Request, Session};
//! use tokio::net::TcpStream;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = TcpStream::connect("192.168.1.10:554").await?;
//! let (session, mut incoming) = Session::new(stream);
//!
//! let request = Request::new(Method::Options, "rtsp://192.168.1.10:554/stream")?;
//! let response = session.request(request).await?;
//! println!("server says: {}", response.status);
//!
//! while let Some(item) = incoming.recv().await {
//!     match item {
//!         Incoming::Rtp { channel, packet } => {
//!             let packet = rtsp_client::rtp::Packet::decode(&packet)?;
//!             println!("rtp: channel={}, seq={}", channel, packet.header.sequence_number);
//!         }
//!         Incoming::Error(err) => return Err(err.into()),
//!         _ => {}
//!     }
//! }
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod interleaved;
pub mod message;
pub mod reader;
pub mod session;

pub use codec as rtp;

pub use self::{
    interleaved::InterleavedHeader,
    message::{Headers, Method, Request, Response, StatusCode},
    reader::MessageReader,
    session::{Incoming, IncomingItems, Session, SessionOptions},
};

use std::{io, sync::Arc};

/// Everything that can go wrong on the control connection.
///
/// Codec failures are returned to whoever invoked the parse or write.
/// Inside a [`Session`] any failure is terminal for the whole
/// connection: RTSP text and interleaved binary share one stream, so a
/// malformed byte leaves no safe place to resynchronize.
#[derive(Debug, Clone)]
pub enum Error {
    /// The leading byte of an interleaved frame was not `0x24`.
    InvalidInterleavedSignature(u8),
    /// The first byte of an inbound frame fits no known frame kind.
    UnrecognizedFrame(u8),
    ParseStatusLine(String),
    ParseRequestLine(String),
    ParseHeader(String),
    MalformedContentLength(String),
    InvalidMethod(String),
    InvalidUrl(String),
    /// A response without a usable `Cseq` header cannot be correlated.
    MissingCseq,
    /// A response carried a `Cseq` no in-flight request asked for.
    UnknownCseq(u64),
    Read(Arc<io::Error>),
    Write(Arc<io::Error>),
    Cancelled,
}

impl Error {
    pub(crate) fn read(err: io::Error) -> Self {
        Self::Read(Arc::new(err))
    }

    pub(crate) fn write(err: io::Error) -> Self {
        Self::Write(Arc::new(err))
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read(err) | Self::Write(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInterleavedSignature(byte) => {
                write!(f, "invalid signature of interleaved header: 0x{:02x}", byte)
            }
            Self::UnrecognizedFrame(byte) => {
                write!(f, "cannot classify incoming frame: 0x{:02x}", byte)
            }
            Self::ParseStatusLine(line) => write!(f, "cannot parse status line: {:?}", line),
            Self::ParseRequestLine(line) => write!(f, "cannot parse request line: {:?}", line),
            Self::ParseHeader(line) => write!(f, "cannot parse header: {:?}", line),
            Self::MalformedContentLength(value) => {
                write!(f, "Content-Length header malformed: {:?}", value)
            }
            Self::InvalidMethod(method) => write!(f, "invalid method: {:?}", method),
            Self::InvalidUrl(detail) => {
                write!(f, "URL must be rtsp://host:port/path: {}", detail)
            }
            Self::MissingCseq => write!(f, "Cseq header is not presented"),
            Self::UnknownCseq(seq) => write!(f, "unknown response: Cseq = {}", seq),
            Self::Read(err) => write!(f, "receive RTSP data failed: {}", err),
            Self::Write(err) => write!(f, "send RTSP data failed: {}", err),
            Self::Cancelled => write!(f, "session cancelled"),
        }
    }
}
