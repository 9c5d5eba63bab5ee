use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use url::Url;

use super::{
    Headers, Method, encode_head_and_body, parse_proto, read_body, read_headers, validate_url,
};
use crate::{Error, reader::MessageReader};

/// A client RTSP request.
///
/// `Content-Length` is added automatically on write when the body is
/// non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub proto_major: u8,
    pub proto_minor: u8,
    pub headers: Headers,
    pub body: Bytes,
}

impl Request {
    /// Makes a new RTSP/1.0 request towards the given URL.
    ///
    /// The URL must use the `rtsp` scheme and name both a host and a
    /// port; no default port is ever assumed.
    ///
    /// # Test
    ///
    /// ```
    /// use rtsp_client::{Method, Request};
    ///
    /// let request = Request::new(Method::Describe, "rtsp://127.0.0.1:554/stream").unwrap();
    ///
    /// assert_eq!(request.method, Method::Describe);
    /// assert!(Request::new(Method::Describe, "rtsp://127.0.0.1/stream").is_err());
    /// ```
    pub fn new(method: Method, url: &str) -> Result<Self, Error> {
        let url = Url::parse(url).map_err(|err| Error::InvalidUrl(err.to_string()))?;
        validate_url(&url)?;

        Ok(Self {
            method,
            url,
            proto_major: 1,
            proto_minor: 0,
            headers: Headers::new(),
            body: Bytes::new(),
        })
    }

    /// Serializes the request into a byte buffer.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        validate_url(&self.url)?;

        let mut buffer = Vec::with_capacity(256 + self.body.len());
        buffer.extend_from_slice(
            format!(
                "{} {} RTSP/{}.{}\r\n",
                self.method, self.url, self.proto_major, self.proto_minor
            )
            .as_bytes(),
        );
        encode_head_and_body(&mut buffer, &self.headers, &self.body);

        Ok(buffer)
    }

    /// Serializes the request to any writer.
    pub async fn write<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<(), Error> {
        let bytes = self.encode()?;
        writer.write_all(&bytes).await.map_err(Error::write)
    }

    /// Reads one full request, the direction a server-initiated request
    /// arrives from.
    pub async fn read<R: AsyncRead + Unpin>(
        reader: &mut MessageReader<R>,
    ) -> Result<Self, Error> {
        let line = reader.read_line().await?;
        let line =
            String::from_utf8(line).map_err(|err| Error::ParseRequestLine(err.to_string()))?;
        let (method, url, proto_major, proto_minor) = parse_request_line(&line)?;

        let headers = read_headers(reader).await?;
        let body = read_body(reader, &headers).await?;

        Ok(Self {
            method,
            url,
            proto_major,
            proto_minor,
            headers,
            body,
        })
    }
}

/// `METHOD SP URI SP RTSP/<major>.<minor>`, method drawn from `[A-Z_-]+`.
fn parse_request_line(line: &str) -> Result<(Method, Url, u8, u8), Error> {
    let parse_failed = || Error::ParseRequestLine(line.to_string());

    let mut parts = line.split(' ');
    let method = parts.next().ok_or_else(parse_failed)?;
    let target = parts.next().ok_or_else(parse_failed)?;
    let proto = parts.next().ok_or_else(parse_failed)?;
    if parts.next().is_some() || target.is_empty() {
        return Err(parse_failed());
    }

    if method.is_empty()
        || !method
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ch == '_' || ch == '-')
    {
        return Err(parse_failed());
    }

    let method = method.parse::<Method>()?;
    let url = Url::parse(target).map_err(|err| Error::InvalidUrl(err.to_string()))?;
    validate_url(&url)?;

    let (proto_major, proto_minor) = parse_proto(proto).ok_or_else(parse_failed)?;

    Ok((method, url, proto_major, proto_minor))
}
