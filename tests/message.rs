use anyhow::Result;
use bytes::Bytes;
use rtsp_client::{
    Error, Headers, InterleavedHeader, MessageReader, Method, Request, Response, StatusCode,
};

#[tokio::test]
async fn test_request_write() -> Result<()> {
    let request = Request::new(Method::Options, "rtsp://127.0.0.1:554/")?;
    assert_eq!(
        request.encode()?,
        b"OPTIONS rtsp://127.0.0.1:554/ RTSP/1.0\r\n\r\n"
    );

    let mut request = Request::new(Method::Options, "rtsp://127.0.0.1:554/")?;
    request.headers.add("User-Agent", "rtsp-client");
    request.headers.add("Host", "127.0.0.1");
    assert_eq!(
        request.encode()?,
        b"OPTIONS rtsp://127.0.0.1:554/ RTSP/1.0\r\nHost: 127.0.0.1\r\nUser-Agent: rtsp-client\r\n\r\n"
    );

    // A non-empty body adds Content-Length, in canonical header order
    // like everything else.
    request.body = Bytes::from_static(b"0123456789a");
    let mut buffer = Vec::new();
    request.write(&mut buffer).await?;
    assert_eq!(
        buffer,
        b"OPTIONS rtsp://127.0.0.1:554/ RTSP/1.0\r\nContent-Length: 11\r\nHost: 127.0.0.1\r\nUser-Agent: rtsp-client\r\n\r\n0123456789a"
    );

    Ok(())
}

#[test]
fn test_request_new_rejects_bad_urls() {
    assert!(matches!(
        Request::new(Method::Describe, "8086"),
        Err(Error::InvalidUrl(_))
    ));
    assert!(matches!(
        Request::new(Method::Describe, "http://127.0.0.1:554/"),
        Err(Error::InvalidUrl(_))
    ));
    assert!(matches!(
        Request::new(Method::Describe, "rtsp://127.0.0.1/"),
        Err(Error::InvalidUrl(_))
    ));

    // Validation also runs at write time for hand-built requests.
    let mut request = Request::new(Method::Describe, "rtsp://127.0.0.1:554/").unwrap();
    request.url = url::Url::parse("rtsp://127.0.0.1/").unwrap();
    assert!(matches!(request.encode(), Err(Error::InvalidUrl(_))));
}

#[tokio::test]
async fn test_request_read() -> Result<()> {
    let bytes: &[u8] =
        b"SETUP rtsp://127.0.0.1:554/stream RTSP/1.0\r\nTransport: RTP/AVP/TCP;interleaved=0-1\r\n\r\n";
    let mut reader = MessageReader::new(bytes);

    let request = Request::read(&mut reader).await?;
    assert_eq!(request.method, Method::Setup);
    assert_eq!(request.url.as_str(), "rtsp://127.0.0.1:554/stream");
    assert_eq!(request.proto_major, 1);
    assert_eq!(request.proto_minor, 0);
    assert_eq!(
        request.headers.get("Transport"),
        Some("RTP/AVP/TCP;interleaved=0-1")
    );
    assert!(request.body.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_request_read_rejects_malformed_lines() {
    // Unknown but well-formed method token.
    let bytes: &[u8] = b"FOO rtsp://127.0.0.1:554/ RTSP/1.0\r\n\r\n";
    let mut reader = MessageReader::new(bytes);
    assert!(matches!(
        Request::read(&mut reader).await,
        Err(Error::InvalidMethod(_))
    ));

    // Method charset violation.
    let bytes: &[u8] = b"oPTIONS rtsp://127.0.0.1:554/ RTSP/1.0\r\n\r\n";
    let mut reader = MessageReader::new(bytes);
    assert!(matches!(
        Request::read(&mut reader).await,
        Err(Error::ParseRequestLine(_))
    ));

    // Missing protocol token.
    let bytes: &[u8] = b"OPTIONS rtsp://127.0.0.1:554/\r\n\r\n";
    let mut reader = MessageReader::new(bytes);
    assert!(matches!(
        Request::read(&mut reader).await,
        Err(Error::ParseRequestLine(_))
    ));
}

#[tokio::test]
async fn test_response_read() -> Result<()> {
    let bytes: &[u8] = b"RTSP/1.0 200 OK\r\nCseq: 1\r\nPublic: DESCRIBE, GET_PARAMETER, SET_PARAMETER, SETUP, TEARDOWN, PLAY\r\n\r\n";
    let mut reader = MessageReader::new(bytes);

    let response = Response::read(&mut reader).await?;
    assert_eq!(response.status_code, StatusCode::Ok);
    assert_eq!(response.status, "OK");
    assert_eq!(response.proto_major, 1);
    assert_eq!(response.proto_minor, 0);
    assert_eq!(response.headers.get("Cseq"), Some("1"));
    assert_eq!(
        response.headers.get("Public"),
        Some("DESCRIBE, GET_PARAMETER, SET_PARAMETER, SETUP, TEARDOWN, PLAY")
    );
    assert_eq!(response.cseq()?, 1);

    Ok(())
}

#[tokio::test]
async fn test_response_read_tolerates_bare_lf() -> Result<()> {
    // Some cameras do not send the CR.
    let bytes: &[u8] = b"RTSP/1.0 200 OK\nCseq: 1\nPublic: DESCRIBE, GET_PARAMETER, SET_PARAMETER, SETUP, TEARDOWN, PLAY\n\n";
    let mut reader = MessageReader::new(bytes);

    let response = Response::read(&mut reader).await?;
    assert_eq!(response.status_code, StatusCode::Ok);
    assert_eq!(response.status, "OK");
    assert_eq!(response.headers.iter().count(), 2);

    Ok(())
}

#[tokio::test]
async fn test_response_read_body() -> Result<()> {
    let bytes: &[u8] =
        b"RTSP/1.0 200 OK\r\nCseq: 2\r\nContent-Type: application/sdp\nContent-Length: 11\r\n\r\n0123456789a";
    let mut reader = MessageReader::new(bytes);

    let response = Response::read(&mut reader).await?;
    assert_eq!(response.headers.get("Content-Type"), Some("application/sdp"));
    assert_eq!(response.body.as_ref(), b"0123456789a");

    Ok(())
}

#[tokio::test]
async fn test_response_read_failures() {
    // Status line glued to the first header.
    let cases: &[&[u8]] = &[
        b"RTSP/1.0 200 OKCseq: 1\r\nPublic: PLAY\r\n\r\n",
        b"RTSP/1.0 20 OK\r\n\r\n",
        b"HTTP/1.0 200 OK\r\n\r\n",
    ];
    for bytes in cases {
        let mut reader = MessageReader::new(*bytes);
        assert!(matches!(
            Response::read(&mut reader).await,
            Err(Error::ParseStatusLine(_))
        ));
    }

    // Header line without a colon.
    let bytes: &[u8] = b"RTSP/1.0 200 OK\r\nCseq 1\r\n\r\n";
    let mut reader = MessageReader::new(bytes);
    assert!(matches!(
        Response::read(&mut reader).await,
        Err(Error::ParseHeader(_))
    ));

    // Headers never terminated.
    let bytes: &[u8] = b"RTSP/1.0 200 OK\r\nCseq: 1\r\n";
    let mut reader = MessageReader::new(bytes);
    assert!(matches!(
        Response::read(&mut reader).await,
        Err(Error::Read(_))
    ));

    // Unparseable Content-Length.
    let bytes: &[u8] = b"RTSP/1.0 200 OK\r\nContent-Length: banana\r\n\r\n";
    let mut reader = MessageReader::new(bytes);
    assert!(matches!(
        Response::read(&mut reader).await,
        Err(Error::MalformedContentLength(_))
    ));
}

#[tokio::test]
async fn test_response_write() -> Result<()> {
    let mut response = Response {
        status: "OK".to_string(),
        status_code: StatusCode::Ok,
        proto_major: 1,
        proto_minor: 0,
        headers: Headers::new(),
        body: Bytes::new(),
    };
    response.headers.add("Cseq", "1");
    response.headers.add("Public", "DESCRIBE, SETUP, TEARDOWN, PLAY");

    assert_eq!(
        response.encode(),
        b"RTSP/1.0 200 OK\r\nCseq: 1\r\nPublic: DESCRIBE, SETUP, TEARDOWN, PLAY\r\n\r\n"
    );

    response.headers = Headers::new();
    response.headers.add("Cseq", "2");
    response.headers.add("Content-Type", "application/sdp");
    response.body = Bytes::from_static(b"0123456789a");

    let mut buffer = Vec::new();
    response.write(&mut buffer).await?;
    assert_eq!(
        buffer,
        b"RTSP/1.0 200 OK\r\nContent-Length: 11\r\nContent-Type: application/sdp\r\nCseq: 2\r\n\r\n0123456789a"
    );

    Ok(())
}

#[tokio::test]
async fn test_response_round_trip() -> Result<()> {
    let mut response = Response {
        status: "Session Not Found".to_string(),
        status_code: StatusCode::SessionNotFound,
        proto_major: 1,
        proto_minor: 0,
        headers: Headers::new(),
        body: Bytes::from_static(b"details"),
    };
    response.headers.add("Cseq", "7");

    let bytes = response.encode();
    let mut reader = MessageReader::new(&bytes[..]);
    let decoded = Response::read(&mut reader).await?;

    // Equal up to the Content-Length added by the encoder.
    response.headers.add("Content-Length", "7");
    assert_eq!(decoded, response);

    Ok(())
}

#[test]
fn test_response_cseq() {
    let mut response = Response {
        status: "OK".to_string(),
        status_code: StatusCode::Ok,
        proto_major: 1,
        proto_minor: 0,
        headers: Headers::new(),
        body: Bytes::new(),
    };
    assert!(matches!(response.cseq(), Err(Error::MissingCseq)));

    response.headers.set("Cseq", "oops");
    assert!(matches!(response.cseq(), Err(Error::MissingCseq)));

    response.headers.set("CSeq", "41");
    assert_eq!(response.cseq().unwrap(), 41);
}

#[test]
fn test_headers() {
    let mut headers = Headers::new();
    headers.add("cseq", "1");
    headers.add("Session", "abc");
    headers.add("session", "def");

    // Keys are canonicalized, values keep arrival order.
    assert_eq!(headers.get("CSEQ"), Some("1"));
    assert_eq!(
        headers.get_all("SESSION").collect::<Vec<_>>(),
        vec!["abc", "def"]
    );
    assert!(headers.contains("Cseq"));

    headers.set("session", "xyz");
    assert_eq!(headers.get_all("Session").count(), 1);

    // Iteration is alphabetic by canonical key.
    headers.add("Content-Length", "0");
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec![("Content-Length", "0"), ("Cseq", "1"), ("Session", "xyz")]
    );
}

#[test]
fn test_status_codes() {
    assert_eq!(StatusCode::from(200u16), StatusCode::Ok);
    assert_eq!(StatusCode::from(454u16), StatusCode::SessionNotFound);
    assert_eq!(u16::from(StatusCode::OptionNotSupported), 551);
    assert_eq!(StatusCode::Unauthorized.reason(), "Unauthorized");
    assert_eq!(
        StatusCode::VersionNotSupported.reason(),
        "RTSP Version not supported"
    );

    // Codes outside the enumeration land on Internal Server Error.
    assert_eq!(StatusCode::from(299u16), StatusCode::InternalServerError);
    assert_eq!(StatusCode::from(299u16).reason(), "Internal Server Error");
}

#[tokio::test]
async fn test_interleaved_header() -> Result<()> {
    let header = InterleavedHeader {
        channel: 0,
        length: 12,
    };
    assert_eq!(header.encode(), [0x24, 0x00, 0x00, 0x0c]);

    let mut buffer = Vec::new();
    header.write(&mut buffer).await?;
    buffer.extend_from_slice(&[0u8; 12]);

    let mut reader = MessageReader::new(&buffer[..]);
    let decoded = InterleavedHeader::read(&mut reader).await?;
    assert_eq!(decoded, header);
    assert!(decoded.is_rtp());
    assert!(
        !InterleavedHeader {
            channel: 1,
            length: 0,
        }
        .is_rtp()
    );

    // Any other leading byte is a framing error.
    let bytes: &[u8] = &[0x25, 0x00, 0x00, 0x0c];
    let mut reader = MessageReader::new(bytes);
    assert!(matches!(
        InterleavedHeader::read(&mut reader).await,
        Err(Error::InvalidInterleavedSignature(0x25))
    ));

    Ok(())
}

#[tokio::test]
async fn test_message_reader() -> Result<()> {
    let bytes: &[u8] = b"first\r\nsecond\nrest";
    let mut reader = MessageReader::new(bytes);

    assert_eq!(reader.peek(5).await?, b"first");
    assert_eq!(reader.read_line().await?, b"first");
    assert_eq!(reader.read_line().await?, b"second");
    assert_eq!(reader.read_exact(4).await?.as_ref(), b"rest");

    // The stream is exhausted now.
    assert!(matches!(reader.peek(1).await, Err(Error::Read(_))));

    Ok(())
}
