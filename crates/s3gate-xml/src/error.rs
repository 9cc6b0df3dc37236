//! S3 error document rendering.

use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

/// The XML declaration that opens every S3 XML document.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Errors that can occur while rendering XML.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Render an S3 error document.
///
/// The host id is the request id, as the service has no separate extended id.
///
/// # Example output
///
/// ```text
/// <?xml version="1.0" encoding="UTF-8"?>
/// <Error><Code>NoSuchBucket</Code><Message>The specified bucket does not exist</Message><RequestId>ABC123</RequestId><HostId>ABC123</HostId></Error>
/// ```
pub fn try_error_to_xml(code: &str, message: &str, request_id: &str) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(256);
    write_error_xml(&mut buf, code, message, request_id)?;
    Ok(buf)
}

/// Render an S3 error document, logging and returning an empty body on failure.
///
/// Writing into a `Vec<u8>` cannot fail, so an empty result means a logic error.
#[must_use]
pub fn error_to_xml(code: &str, message: &str, request_id: &str) -> Vec<u8> {
    match try_error_to_xml(code, message, request_id) {
        Ok(buf) => buf,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize S3 error XML");
            Vec::new()
        }
    }
}

fn write_error_xml(
    buf: &mut Vec<u8>,
    code: &str,
    message: &str,
    request_id: &str,
) -> io::Result<()> {
    let mut writer = Writer::new(buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.get_mut().write_all(b"\n")?;

    writer.create_element("Error").write_inner_content(|w| {
        w.create_element("Code")
            .write_text_content(BytesText::new(code))?;
        w.create_element("Message")
            .write_text_content(BytesText::new(message))?;
        w.create_element("RequestId")
            .write_text_content(BytesText::new(request_id))?;
        w.create_element("HostId")
            .write_text_content(BytesText::new(request_id))?;
        Ok(())
    })?;

    Ok(())
}
