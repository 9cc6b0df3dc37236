//! Server configuration.
//!
//! Values start from defaults, are replaced by an optional YAML file, then by
//! environment variables.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("text") {
            Some(Self::Text)
        } else if value.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }
}

/// s3gate server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address (e.g. `"0.0.0.0:4566"`).
    #[builder(default = String::from("0.0.0.0:4566"))]
    pub listen: String,

    /// Accepted hosts for path-style and virtual-hosted-style addressing.
    ///
    /// Order matters: the first matching host wins.
    #[builder(default = default_hosts())]
    pub hosts: Vec<String>,

    /// Seconds a client may take to send the request headers.
    #[builder(default = 30)]
    pub read_header_timeout_secs: u64,

    /// Log level filter string (e.g. `"info"`, `"s3gate_http=debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Log output format.
    #[builder(default)]
    pub log_format: LogFormat,
}

fn default_hosts() -> Vec<String> {
    vec!["s3.localhost".to_owned(), "localhost".to_owned()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ServerConfig {
    /// Load the configuration: defaults, then `path` if given, then the environment.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `S3GATE_LISTEN` | `listen` |
    /// | `S3GATE_HOSTS` | `hosts` (comma-separated) |
    /// | `S3GATE_READ_HEADER_TIMEOUT_SECS` | `read_header_timeout_secs` |
    /// | `LOG_LEVEL` | `log_level` |
    /// | `S3GATE_LOG_FORMAT` | `log_format` (`text` or `json`) |
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML configuration file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("failed to parse YAML configuration")
    }

    /// Apply overrides from a variable lookup, normally the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("S3GATE_LISTEN") {
            self.listen = v;
        }
        if let Some(v) = lookup("S3GATE_HOSTS") {
            self.hosts = v
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(v) = lookup("S3GATE_READ_HEADER_TIMEOUT_SECS") {
            self.read_header_timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("invalid S3GATE_READ_HEADER_TIMEOUT_SECS: {v}"))?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = lookup("S3GATE_LOG_FORMAT") {
            let Some(format) = LogFormat::parse(v.trim()) else {
                bail!("invalid S3GATE_LOG_FORMAT: {v} (expected text or json)");
            };
            self.log_format = format;
        }
        Ok(())
    }

    /// Check values that cannot be expressed in the types.
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if let Some(i) = self.hosts.iter().position(String::is_empty) {
            bail!("accepted host #{i} is empty");
        }
        if self.read_header_timeout_secs == 0 {
            bail!("read header timeout must be at least one second");
        }
        Ok(())
    }

    /// The parsed bind address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .with_context(|| format!("invalid bind address: {}", self.listen))
    }

    /// The header read timeout.
    #[must_use]
    pub fn read_header_timeout(&self) -> Duration {
        Duration::from_secs(self.read_header_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_should_create_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen, "0.0.0.0:4566");
        assert_eq!(config.hosts, ["s3.localhost", "localhost"]);
        assert_eq!(config.read_header_timeout(), Duration::from_secs(30));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_should_build_with_typed_builder() {
        let config = ServerConfig::builder()
            .listen("127.0.0.1:9000".into())
            .hosts(vec!["s3.example.com".into()])
            .read_header_timeout_secs(5)
            .log_level("debug".into())
            .log_format(LogFormat::Json)
            .build();
        assert_eq!(config.listen_addr().expect("valid addr").port(), 9000);
        assert_eq!(config.hosts, ["s3.example.com"]);
        assert_eq!(config.read_header_timeout_secs, 5);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_should_parse_partial_yaml() {
        let config = ServerConfig::from_yaml(
            "hosts:\n  - s3.example.com\n  - example.com\nreadHeaderTimeoutSecs: 10\n",
        )
        .expect("valid YAML");
        assert_eq!(config.hosts, ["s3.example.com", "example.com"]);
        assert_eq!(config.read_header_timeout_secs, 10);
        assert_eq!(config.listen, "0.0.0.0:4566");
    }

    #[test]
    fn test_should_reject_unknown_yaml_fields() {
        assert!(ServerConfig::from_yaml("domain: s3.example.com\n").is_err());
    }

    #[test]
    fn test_should_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "listen: 127.0.0.1:8080\nlogFormat: json").expect("write config");
        let config = ServerConfig::from_file(file.path()).expect("valid config file");
        assert_eq!(config.listen, "127.0.0.1:8080");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_should_report_missing_config_file() {
        let err = ServerConfig::from_file(Path::new("/nonexistent/s3gate.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn test_should_apply_env_overrides() {
        let mut config = ServerConfig::default();
        config
            .apply_overrides(lookup(&[
                ("S3GATE_LISTEN", "127.0.0.1:1234"),
                ("S3GATE_HOSTS", " s3.a.com, ,b.com "),
                ("S3GATE_READ_HEADER_TIMEOUT_SECS", "7"),
                ("LOG_LEVEL", "warn"),
                ("S3GATE_LOG_FORMAT", "JSON"),
            ]))
            .expect("valid overrides");
        assert_eq!(config.listen, "127.0.0.1:1234");
        assert_eq!(config.hosts, ["s3.a.com", "b.com"]);
        assert_eq!(config.read_header_timeout_secs, 7);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_should_allow_empty_host_list_from_env() {
        let mut config = ServerConfig::default();
        config
            .apply_overrides(lookup(&[("S3GATE_HOSTS", "")]))
            .expect("valid overrides");
        assert!(config.hosts.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_should_reject_bad_overrides() {
        let mut config = ServerConfig::default();
        assert!(
            config
                .apply_overrides(lookup(&[("S3GATE_READ_HEADER_TIMEOUT_SECS", "soon")]))
                .is_err()
        );
        assert!(
            config
                .apply_overrides(lookup(&[("S3GATE_LOG_FORMAT", "xml")]))
                .is_err()
        );
    }

    #[test]
    fn test_should_validate_values() {
        let config = ServerConfig::builder().listen("not-an-addr".into()).build();
        assert!(config.validate().is_err());

        let config = ServerConfig::builder().hosts(vec![String::new()]).build();
        assert!(config.validate().is_err());

        let config = ServerConfig::builder().read_header_timeout_secs(0).build();
        assert!(config.validate().is_err());
    }
}
