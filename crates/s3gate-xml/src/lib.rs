//! S3 XML rendering for s3gate.
//!
//! S3 uses the RestXml protocol with `noErrorWrapping: true`, so an error is a
//! flat `<Error>` element preceded by the XML declaration and a newline:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <Error><Code>..</Code><Message>..</Message><RequestId>..</RequestId><HostId>..</HostId></Error>
//! ```

pub mod error;

pub use error::{XML_DECLARATION, XmlError, error_to_xml, try_error_to_xml};
