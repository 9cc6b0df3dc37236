//! Host style resolution.
//!
//! Turns a request hostname and URL path into a [`Target`]: the addressing
//! style plus the bucket and key. Precedence is path style (hostname equals an
//! accepted host), then virtual-hosted style (hostname ends with `.` plus an
//! accepted host), then CNAME style. Within each rule the first accepted host
//! in configured order wins.

use std::sync::Arc;

use s3gate_model::{RequestStyle, Target};

/// Resolves the addressing style of requests against a fixed list of accepted hosts.
#[derive(Debug, Clone, Default)]
pub struct HostStyleResolver {
    hosts: Arc<[String]>,
}

impl HostStyleResolver {
    /// Create a resolver for the given accepted hosts, kept in order.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    /// The accepted hosts in configured order.
    #[must_use]
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Resolve `hostname` and an already percent-decoded `path` into a target.
    #[must_use]
    pub fn resolve(&self, hostname: &str, path: &str) -> Target {
        resolve_target(&self.hosts, hostname, path)
    }
}

/// Resolve a hostname and path against `accepted_hosts`.
///
/// The hostname must already be stripped of any port. Never fails: a hostname
/// matching no accepted host is treated as a CNAME for its bucket.
#[must_use]
pub fn resolve_target(accepted_hosts: &[String], hostname: &str, path: &str) -> Target {
    let path = path.strip_prefix('/').unwrap_or(path);

    if let Some(host) = accepted_hosts.iter().find(|h| h.as_str() == hostname) {
        let (bucket, key) = path.split_once('/').unwrap_or((path, ""));
        return Target {
            hostname: hostname.to_owned(),
            base_host: host.clone(),
            style: RequestStyle::VPath,
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        };
    }

    for host in accepted_hosts {
        if let Some(bucket) = vhost_bucket(hostname, host) {
            return Target {
                hostname: hostname.to_owned(),
                base_host: host.clone(),
                style: RequestStyle::VHost,
                bucket: bucket.to_owned(),
                key: path.to_owned(),
            };
        }
    }

    Target {
        hostname: hostname.to_owned(),
        base_host: hostname.to_owned(),
        style: RequestStyle::CName,
        bucket: hostname.to_owned(),
        key: path.to_owned(),
    }
}

/// The bucket label of `hostname` when it is `<bucket>.<host>`.
fn vhost_bucket<'a>(hostname: &'a str, host: &str) -> Option<&'a str> {
    hostname.strip_suffix(host)?.strip_suffix('.')
}

/// Strip the port, and the brackets around an IPv6 literal, from a `Host` value.
///
/// `s3.example.com:9000` becomes `s3.example.com` and `[::1]:9000` becomes `::1`.
#[must_use]
pub fn hostname_from_authority(authority: &str) -> &str {
    if let Some(rest) = authority.strip_prefix('[') {
        return rest.split_once(']').map_or(rest, |(host, _)| host);
    }
    match authority.rsplit_once(':') {
        Some((host, port)) if port.bytes().all(|b| b.is_ascii_digit()) => host,
        _ => authority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(hosts: &[&str]) -> HostStyleResolver {
        HostStyleResolver::new(hosts.iter().copied())
    }

    #[test]
    fn test_should_resolve_path_style() {
        let t = resolver(&["s3.example.com"]).resolve("s3.example.com", "/photos/2024/cat.jpg");
        assert_eq!(t.style, RequestStyle::VPath);
        assert_eq!(t.base_host, "s3.example.com");
        assert_eq!(t.bucket, "photos");
        assert_eq!(t.key, "2024/cat.jpg");
    }

    #[test]
    fn test_should_resolve_path_style_bucket_only() {
        let r = resolver(&["s3.example.com"]);
        let t = r.resolve("s3.example.com", "/photos");
        assert_eq!((t.bucket.as_str(), t.key.as_str()), ("photos", ""));

        let t = r.resolve("s3.example.com", "/photos/");
        assert_eq!((t.bucket.as_str(), t.key.as_str()), ("photos", ""));

        let t = r.resolve("s3.example.com", "/");
        assert_eq!((t.bucket.as_str(), t.key.as_str()), ("", ""));
    }

    #[test]
    fn test_should_resolve_virtual_hosted_style() {
        let t = resolver(&["s3.example.com"]).resolve("photos.s3.example.com", "/2024/cat.jpg");
        assert_eq!(t.style, RequestStyle::VHost);
        assert_eq!(t.hostname, "photos.s3.example.com");
        assert_eq!(t.base_host, "s3.example.com");
        assert_eq!(t.bucket, "photos");
        assert_eq!(t.key, "2024/cat.jpg");
    }

    #[test]
    fn test_should_keep_dots_in_virtual_hosted_bucket() {
        let t = resolver(&["s3.example.com"]).resolve("my.dotted.bucket.s3.example.com", "/");
        assert_eq!(t.style, RequestStyle::VHost);
        assert_eq!(t.bucket, "my.dotted.bucket");
        assert_eq!(t.key, "");
    }

    #[test]
    fn test_should_fall_back_to_cname() {
        let t = resolver(&["s3.example.com"]).resolve("cdn.mysite.org", "/index.html");
        assert_eq!(t.style, RequestStyle::CName);
        assert_eq!(t.base_host, "cdn.mysite.org");
        assert_eq!(t.bucket, "cdn.mysite.org");
        assert_eq!(t.key, "index.html");
    }

    #[test]
    fn test_should_not_match_suffix_without_dot() {
        let t = resolver(&["example.com"]).resolve("badexample.com", "/k");
        assert_eq!(t.style, RequestStyle::CName);
    }

    #[test]
    fn test_should_treat_every_request_as_cname_without_hosts() {
        let t = resolver(&[]).resolve("s3.example.com", "/bucket/key");
        assert_eq!(t.style, RequestStyle::CName);
        assert_eq!(t.bucket, "s3.example.com");
        assert_eq!(t.key, "bucket/key");
    }

    #[test]
    fn test_should_prefer_path_style_over_virtual_hosted() {
        // "s3.example.com" is also "s3" + "." + "example.com".
        let t = resolver(&["example.com", "s3.example.com"]).resolve("s3.example.com", "/b/k");
        assert_eq!(t.style, RequestStyle::VPath);
        assert_eq!(t.base_host, "s3.example.com");
        assert_eq!(t.bucket, "b");
    }

    #[test]
    fn test_should_use_first_matching_host_in_order() {
        let t = resolver(&["example.com", "s3.example.com"]).resolve("b.s3.example.com", "/");
        assert_eq!(t.style, RequestStyle::VHost);
        assert_eq!(t.base_host, "example.com");
        assert_eq!(t.bucket, "b.s3");

        let t = resolver(&["s3.example.com", "example.com"]).resolve("b.s3.example.com", "/");
        assert_eq!(t.base_host, "s3.example.com");
        assert_eq!(t.bucket, "b");
    }

    #[test]
    fn test_should_strip_port_from_authority() {
        assert_eq!(hostname_from_authority("s3.example.com:9000"), "s3.example.com");
        assert_eq!(hostname_from_authority("s3.example.com"), "s3.example.com");
        assert_eq!(hostname_from_authority("s3.example.com:"), "s3.example.com");
        assert_eq!(hostname_from_authority("localhost:4566"), "localhost");
    }

    #[test]
    fn test_should_strip_brackets_from_ipv6_authority() {
        assert_eq!(hostname_from_authority("[::1]:9000"), "::1");
        assert_eq!(hostname_from_authority("[fe80::1]"), "fe80::1");
    }
}
