pub mod method;
pub mod request;
pub mod response;
pub mod status;

pub use self::{method::Method, request::Request, response::Response, status::StatusCode};

use std::collections::BTreeMap;

use bytes::Bytes;
use tokio::io::AsyncRead;
use url::Url;

use crate::{Error, reader::MessageReader};

/// An ordered multimap of message headers.
///
/// Keys are canonicalized the HTTP way (`cseq` and `CSEQ` are the same
/// header, stored as `Cseq`), values keep their arrival order, and
/// iteration yields keys alphabetically, which is also the order
/// headers are written in.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, Vec<String>>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value to the key, keeping any previous values.
    pub fn add(&mut self, key: &str, value: impl Into<String>) {
        self.0
            .entry(canonical_key(key))
            .or_default()
            .push(value.into());
    }

    /// Replaces all values of the key with a single one.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(canonical_key(key), vec![value.into()]);
    }

    /// The first value of the key, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(&canonical_key(key))
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of the key in arrival order.
    pub fn get_all(&self, key: &str) -> impl Iterator<Item = &str> {
        self.0
            .get(&canonical_key(key))
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(&canonical_key(key))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All key/value pairs in canonical write order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(key, values)| {
            values.iter().map(move |value| (key.as_str(), value.as_str()))
        })
    }
}

/// `content-length` becomes `Content-Length`, `CSEQ` becomes `Cseq`.
fn canonical_key(key: &str) -> String {
    let mut canonical = String::with_capacity(key.len());
    let mut upper = true;
    for ch in key.chars() {
        if upper {
            canonical.extend(ch.to_uppercase());
        } else {
            canonical.extend(ch.to_lowercase());
        }

        upper = ch == '-';
    }

    canonical
}

pub(crate) fn validate_url(url: &Url) -> Result<(), Error> {
    if url.scheme() != "rtsp" {
        return Err(Error::InvalidUrl(format!(
            "invalid scheme: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        None | Some("") => return Err(Error::InvalidUrl("empty host".to_string())),
        Some(_) => {}
    }

    if url.port().is_none() {
        return Err(Error::InvalidUrl("empty port".to_string()));
    }

    Ok(())
}

/// `RTSP/1.0` style protocol token, one digit each side.
pub(crate) fn parse_proto(token: &str) -> Option<(u8, u8)> {
    let version = token.strip_prefix("RTSP/")?;
    let (major, minor) = version.split_once('.')?;
    if major.len() != 1 || minor.len() != 1 {
        return None;
    }

    Some((major.parse().ok()?, minor.parse().ok()?))
}

pub(crate) async fn read_headers<R: AsyncRead + Unpin>(
    reader: &mut MessageReader<R>,
) -> Result<Headers, Error> {
    let mut headers = Headers::new();
    loop {
        let line = reader.read_line().await?;
        if line.is_empty() {
            break;
        }

        let line =
            String::from_utf8(line).map_err(|err| Error::ParseHeader(err.to_string()))?;
        let (key, value) = parse_header_line(&line)?;
        headers.add(key, value);
    }

    Ok(headers)
}

fn parse_header_line(line: &str) -> Result<(&str, &str), Error> {
    let parse_failed = || Error::ParseHeader(line.to_string());

    let (key, value) = line.split_once(':').ok_or_else(parse_failed)?;
    if key.is_empty()
        || !key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(parse_failed());
    }

    let value = value.trim_start();
    if value.is_empty() {
        return Err(parse_failed());
    }

    Ok((key, value))
}

/// A body is framed by `Content-Length` alone; without the header the
/// body is empty.
pub(crate) async fn read_body<R: AsyncRead + Unpin>(
    reader: &mut MessageReader<R>,
    headers: &Headers,
) -> Result<Bytes, Error> {
    let Some(value) = headers.get("Content-Length") else {
        return Ok(Bytes::new());
    };

    let length = value
        .parse::<usize>()
        .map_err(|_| Error::MalformedContentLength(value.to_string()))?;

    reader.read_exact(length).await
}

/// Serializes the header block and body, appending a `Content-Length`
/// header whenever the body is non-empty.
pub(crate) fn encode_head_and_body(
    destination: &mut Vec<u8>,
    headers: &Headers,
    body: &Bytes,
) {
    let mut headers = headers.clone();
    if !body.is_empty() {
        headers.set("Content-Length", body.len().to_string());
    }

    for (key, value) in headers.iter() {
        destination.extend_from_slice(key.as_bytes());
        destination.extend_from_slice(b": ");
        destination.extend_from_slice(value.as_bytes());
        destination.extend_from_slice(b"\r\n");
    }

    destination.extend_from_slice(b"\r\n");
    destination.extend_from_slice(body);
}
