//! Error responses.
//!
//! [`write_error`] renders an [`S3Error`] onto any [`ResponseSink`]: request-id
//! headers, `Content-Type`, status, then the XML error document. Failures to
//! write the body are never propagated. A client that has already gone away is
//! ignored; any other write failure is logged at warn level.

use std::io;

use bytes::BytesMut;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use s3gate_model::error::S3Error;

use crate::body::S3ResponseBody;

/// The `x-amz-request-id` response header.
pub const X_AMZ_REQUEST_ID: HeaderName = HeaderName::from_static("x-amz-request-id");

/// The `x-amz-id-2` response header.
pub const X_AMZ_ID_2: HeaderName = HeaderName::from_static("x-amz-id-2");

/// Where an error response is written.
///
/// Headers must be set before the status, and the status before the body.
pub trait ResponseSink {
    /// Set the response status.
    fn set_status(&mut self, status: StatusCode);

    /// Set a response header, replacing any previous value.
    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Append a chunk to the response body.
    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()>;
}

/// A sink that assembles an in-memory [`http::Response`].
#[derive(Debug)]
pub struct HttpResponseSink {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl Default for HttpResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpResponseSink {
    /// Create a sink with status 200, no headers and no body.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    /// Finish the response.
    #[must_use]
    pub fn into_response(self) -> http::Response<S3ResponseBody> {
        let mut response = http::Response::new(S3ResponseBody::from_bytes(self.body.freeze()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseSink for HttpResponseSink {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.body.extend_from_slice(chunk);
        Ok(())
    }
}

/// Write `err` as an S3 XML error response.
///
/// The error's request id fills `x-amz-request-id`, `x-amz-id-2` and the
/// `RequestId`/`HostId` elements. A request id that is not a valid header value
/// is left out of the headers but kept in the document.
pub fn write_error<S: ResponseSink + ?Sized>(err: &S3Error, sink: &mut S) {
    let request_id = err.request_id.as_deref().unwrap_or_default();

    let header_value = Some(request_id)
        .filter(|id| !id.is_empty())
        .and_then(|id| HeaderValue::from_str(id).ok());
    if let Some(value) = header_value {
        sink.set_header(X_AMZ_REQUEST_ID, value.clone());
        sink.set_header(X_AMZ_ID_2, value);
    }
    sink.set_header(CONTENT_TYPE, HeaderValue::from_static("application/xml"));
    sink.set_status(err.status_code);

    let document = s3gate_xml::error_to_xml(err.code.as_str(), &err.message, request_id);
    match sink.write_body(&document) {
        Err(e) if !is_disconnect(&e) => {
            tracing::warn!(error = %e, code = %err.code, request_id, "failed to write S3 error response");
        }
        _ => {}
    }
}

/// Build an error response, stamping `request_id` onto the error when it has none.
#[must_use]
pub fn error_to_response(err: S3Error, request_id: &str) -> http::Response<S3ResponseBody> {
    let err = if err.request_id.is_some() {
        err
    } else {
        err.with_request_id(request_id)
    };
    let mut sink = HttpResponseSink::new();
    write_error(&err, &mut sink);
    sink.into_response()
}

fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
    )
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use s3gate_model::error::{NOT_IMPLEMENTED_MESSAGE, S3ErrorCode};

    use super::*;

    /// Records every call and fails body writes with the given kind.
    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<String>,
        fail_with: Option<io::ErrorKind>,
    }

    impl ResponseSink for RecordingSink {
        fn set_status(&mut self, status: StatusCode) {
            self.calls.push(format!("status {}", status.as_u16()));
        }

        fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
            self.calls
                .push(format!("header {name}: {}", value.to_str().unwrap_or("?")));
        }

        fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
            if let Some(kind) = self.fail_with {
                return Err(io::Error::new(kind, "write failed"));
            }
            self.calls.push(format!("body {} bytes", chunk.len()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_should_render_not_implemented_response() {
        let err = S3Error::not_implemented("/b/k").with_request_id("req-42");
        let response = error_to_response(err, "ignored");

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/xml")
        );
        assert_eq!(
            response.headers().get(X_AMZ_REQUEST_ID).and_then(|v| v.to_str().ok()),
            Some("req-42")
        );
        assert_eq!(
            response.headers().get(X_AMZ_ID_2).and_then(|v| v.to_str().ok()),
            Some("req-42")
        );

        let body = response.into_body().collect().await.expect("collect").to_bytes();
        let body = std::str::from_utf8(&body).expect("valid UTF-8");
        assert!(body.contains("<Code>NotImplemented</Code>"));
        assert!(body.contains(&format!("<Message>{NOT_IMPLEMENTED_MESSAGE}</Message>")));
        assert!(body.contains("<RequestId>req-42</RequestId>"));
        assert!(body.contains("<HostId>req-42</HostId>"));
    }

    #[tokio::test]
    async fn test_should_render_exact_no_such_bucket_response() {
        let err = S3Error::no_such_bucket("photos").with_request_id("ABC123");
        let response = error_to_response(err, "unused");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(X_AMZ_REQUEST_ID).and_then(|v| v.to_str().ok()),
            Some("ABC123")
        );
        assert_eq!(
            response.headers().get(X_AMZ_ID_2).and_then(|v| v.to_str().ok()),
            Some("ABC123")
        );

        let body = response.into_body().collect().await.expect("collect").to_bytes();
        assert_eq!(
            std::str::from_utf8(&body).expect("valid UTF-8"),
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
                "<Error><Code>NoSuchBucket</Code>",
                "<Message>The specified bucket does not exist</Message>",
                "<RequestId>ABC123</RequestId><HostId>ABC123</HostId></Error>",
            )
        );
    }

    #[test]
    fn test_should_stamp_request_id_when_missing() {
        let response = error_to_response(S3Error::internal_error("boom"), "req-7");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(X_AMZ_REQUEST_ID).and_then(|v| v.to_str().ok()),
            Some("req-7")
        );
    }

    #[test]
    fn test_should_set_headers_before_status_before_body() {
        let err = S3Error::invalid_request("bad").with_request_id("r1");
        let mut sink = RecordingSink::default();
        write_error(&err, &mut sink);

        assert_eq!(sink.calls.len(), 5);
        assert_eq!(sink.calls[0], "header x-amz-request-id: r1");
        assert_eq!(sink.calls[1], "header x-amz-id-2: r1");
        assert_eq!(sink.calls[2], "header content-type: application/xml");
        assert_eq!(sink.calls[3], "status 400");
        assert!(sink.calls[4].starts_with("body "));
    }

    #[test]
    fn test_should_skip_request_id_headers_when_invalid() {
        let err = S3Error::invalid_request("bad").with_request_id("line\nbreak");
        let mut sink = RecordingSink::default();
        write_error(&err, &mut sink);
        assert!(!sink.calls.iter().any(|c| c.contains("x-amz-request-id")));
        assert!(sink.calls.contains(&"status 400".to_owned()));
    }

    #[test]
    fn test_should_swallow_disconnect_errors() {
        for kind in [
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::NotConnected,
            io::ErrorKind::UnexpectedEof,
        ] {
            let err = S3Error::method_not_allowed("PATCH").with_request_id("r");
            let mut sink = RecordingSink {
                fail_with: Some(kind),
                ..Default::default()
            };
            write_error(&err, &mut sink);
            assert!(sink.calls.contains(&"status 405".to_owned()));
            assert!(is_disconnect(&io::Error::from(kind)));
        }
    }

    #[test]
    fn test_should_not_propagate_other_write_errors() {
        let err = S3Error::new(S3ErrorCode::NotImplemented).with_request_id("r");
        let mut sink = RecordingSink {
            fail_with: Some(io::ErrorKind::PermissionDenied),
            ..Default::default()
        };
        write_error(&err, &mut sink);
        assert!(sink.calls.contains(&"status 501".to_owned()));
        assert!(!is_disconnect(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }

    #[tokio::test]
    async fn test_should_render_error_document_bytes() {
        let err = S3Error::invalid_request("Conflicting query string parameters: acl, tagging");
        let response = error_to_response(err, "abc");
        let doc = response.into_body().collect().await.expect("collect").to_bytes();
        let doc = std::str::from_utf8(&doc).expect("valid UTF-8");
        assert!(doc.starts_with(s3gate_xml::XML_DECLARATION));
        assert!(doc.contains(
            "<Message>Conflicting query string parameters: acl, tagging</Message>"
        ));
    }
}
