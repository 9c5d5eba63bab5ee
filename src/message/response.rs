use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::{Headers, StatusCode, encode_head_and_body, parse_proto, read_body, read_headers};
use crate::{Error, reader::MessageReader};

/// A server RTSP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The reason phrase as it appeared on the wire, e.g. "OK".
    pub status: String,
    pub status_code: StatusCode,
    pub proto_major: u8,
    pub proto_minor: u8,
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    /// Reads one full response: status line, headers and, when a
    /// `Content-Length` header is present, exactly that many octets of
    /// body.
    pub async fn read<R: AsyncRead + Unpin>(
        reader: &mut MessageReader<R>,
    ) -> Result<Self, Error> {
        let line = reader.read_line().await?;
        let line =
            String::from_utf8(line).map_err(|err| Error::ParseStatusLine(err.to_string()))?;
        let (proto_major, proto_minor, status_code, status) = parse_status_line(&line)?;

        let headers = read_headers(reader).await?;
        let body = read_body(reader, &headers).await?;

        Ok(Self {
            status,
            status_code,
            proto_major,
            proto_minor,
            headers,
            body,
        })
    }

    /// Serializes the response into a byte buffer, adding
    /// `Content-Length` when the body is non-empty.
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(256 + self.body.len());
        buffer.extend_from_slice(
            format!(
                "RTSP/{}.{} {} {}\r\n",
                self.proto_major,
                self.proto_minor,
                u16::from(self.status_code),
                self.status
            )
            .as_bytes(),
        );
        encode_head_and_body(&mut buffer, &self.headers, &self.body);

        buffer
    }

    /// Serializes the response to any writer.
    pub async fn write<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<(), Error> {
        writer
            .write_all(&self.encode())
            .await
            .map_err(Error::write)
    }

    /// The command sequence number carried by the `Cseq` header.
    pub fn cseq(&self) -> Result<u64, Error> {
        self.headers
            .get("Cseq")
            .ok_or(Error::MissingCseq)?
            .parse()
            .map_err(|_| Error::MissingCseq)
    }
}

/// `RTSP/<major>.<minor> <three-digit-code> <reason>`, whitespace
/// tolerant between the fields.
fn parse_status_line(line: &str) -> Result<(u8, u8, StatusCode, String), Error> {
    let parse_failed = || Error::ParseStatusLine(line.to_string());

    let (proto, rest) = line
        .split_once(char::is_whitespace)
        .ok_or_else(parse_failed)?;
    let (proto_major, proto_minor) = parse_proto(proto).ok_or_else(parse_failed)?;

    let (code, reason) = rest
        .trim_start()
        .split_once(char::is_whitespace)
        .ok_or_else(parse_failed)?;
    if code.len() != 3 || !code.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(parse_failed());
    }

    let reason = reason.trim_start();
    // Word characters and whitespace, plus the dash a few canonical
    // reasons carry ("Request Time-out").
    if reason.is_empty()
        || !reason
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-' || ch.is_whitespace())
    {
        return Err(parse_failed());
    }

    let code = code.parse::<u16>().map_err(|_| parse_failed())?;

    Ok((
        proto_major,
        proto_minor,
        StatusCode::from(code),
        reason.to_string(),
    ))
}
