//! Bucket addressing styles and resolved routes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::Action;

/// The convention a client used to address a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStyle {
    /// Virtual-hosted style: `bucket.s3.example.com/key`.
    VHost,
    /// Path style: `s3.example.com/bucket/key`.
    VPath,
    /// CNAME style: the whole hostname is the bucket name.
    CName,
}

impl RequestStyle {
    /// Returns the style name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VHost => "VHost",
            Self::VPath => "VPath",
            Self::CName => "CName",
        }
    }
}

impl fmt::Display for RequestStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The addressing part of a route, derived from the hostname and the URL path.
///
/// `bucket` and `key` are empty strings when absent. No validation of bucket
/// name legality happens at this stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// The request hostname with any port removed.
    pub hostname: String,
    /// The accepted host that matched, or the hostname itself for CNAME style.
    pub base_host: String,
    /// The addressing style.
    pub style: RequestStyle,
    /// The bucket name.
    pub bucket: String,
    /// The object key.
    pub key: String,
}

impl Target {
    /// Returns `true` when a bucket name is present.
    #[must_use]
    pub fn has_bucket(&self) -> bool {
        !self.bucket.is_empty()
    }

    /// Returns `true` when an object key is present.
    #[must_use]
    pub fn has_key(&self) -> bool {
        !self.key.is_empty()
    }

    /// Attach the resolved action, producing a full [`Route`].
    #[must_use]
    pub fn into_route(self, action: Action) -> Route {
        Route {
            hostname: self.hostname,
            base_host: self.base_host,
            style: self.style,
            bucket: self.bucket,
            key: self.key,
            action,
        }
    }
}

/// A fully resolved request: addressing style, bucket, key and operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// The request hostname with any port removed.
    pub hostname: String,
    /// The accepted host that matched, or the hostname itself for CNAME style.
    pub base_host: String,
    /// The addressing style.
    pub style: RequestStyle,
    /// The bucket name, empty for service-level requests.
    pub bucket: String,
    /// The object key, empty for bucket-level requests.
    pub key: String,
    /// The resolved operation.
    pub action: Action,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(bucket: &str, key: &str) -> Target {
        Target {
            hostname: "s3.example.com".to_owned(),
            base_host: "s3.example.com".to_owned(),
            style: RequestStyle::VPath,
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        }
    }

    #[test]
    fn test_should_report_bucket_and_key_presence() {
        let t = target("bucket", "");
        assert!(t.has_bucket());
        assert!(!t.has_key());

        let t = target("bucket", "a/b");
        assert!(t.has_bucket());
        assert!(t.has_key());
    }

    #[test]
    fn test_should_carry_target_into_route() {
        let route = target("bucket", "key").into_route(Action::GetObject);
        assert_eq!(route.bucket, "bucket");
        assert_eq!(route.key, "key");
        assert_eq!(route.style, RequestStyle::VPath);
        assert_eq!(route.action, Action::GetObject);
    }

    #[test]
    fn test_should_display_style_names() {
        assert_eq!(RequestStyle::VHost.to_string(), "VHost");
        assert_eq!(RequestStyle::VPath.to_string(), "VPath");
        assert_eq!(RequestStyle::CName.to_string(), "CName");
    }
}
