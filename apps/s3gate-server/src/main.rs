//! s3gate - the request-classification front door of an S3-compatible endpoint.
//!
//! Every request is resolved to its addressing style, bucket, key and S3
//! operation, then answered. Until a storage backend is attached, resolved
//! requests get `501 NotImplemented` and unresolvable ones the matching S3 error.
//!
//! # Usage
//!
//! ```text
//! s3gate --config s3gate.yaml
//! S3GATE_HOSTS=s3.example.com,localhost s3gate
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `S3GATE_CONFIG` | *(unset)* | YAML configuration file |
//! | `S3GATE_LISTEN` | `0.0.0.0:4566` | Bind address |
//! | `S3GATE_HOSTS` | `s3.localhost,localhost` | Accepted hosts, in match order |
//! | `S3GATE_READ_HEADER_TIMEOUT_SECS` | `30` | Header read timeout |
//! | `S3GATE_LOG_FORMAT` | `text` | `text` or `json` |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod config;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use s3gate_http::dispatch::{NotImplementedHandler, S3Handler};
use s3gate_http::service::{S3HttpConfig, S3HttpService};

use crate::config::{LogFormat, ServerConfig};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "s3gate", version)]
#[command(about = "S3 request classification front door", long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "S3GATE_CONFIG")]
    config: Option<PathBuf>,
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `log_level` config value.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}

fn build_http_config(config: &ServerConfig) -> S3HttpConfig {
    S3HttpConfig {
        hosts: config.hosts.clone(),
    }
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

/// Run the accept loop until `shutdown` resolves, then drain open connections.
async fn serve<H, F>(
    listener: TcpListener,
    service: S3HttpService<H>,
    read_header_timeout: Duration,
    shutdown: F,
) -> Result<()>
where
    H: S3Handler,
    F: Future<Output = ()>,
{
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let mut http = HttpConnBuilder::new(TokioExecutor::new());
    http.http1()
        .timer(TokioTimer::new())
        .header_read_timeout(read_header_timeout);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("received shutdown signal, draining connections");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ServerConfig::load(args.config.as_deref())?;

    init_tracing(&config.log_level, config.log_format)?;

    info!(
        listen = %config.listen,
        hosts = ?config.hosts,
        read_header_timeout_secs = config.read_header_timeout_secs,
        version = VERSION,
        "starting s3gate",
    );
    if config.hosts.is_empty() {
        warn!("no accepted hosts configured, every request is treated as CNAME style");
    }

    let service = S3HttpService::new(NotImplementedHandler, build_http_config(&config));

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(
        listener,
        service,
        config.read_header_timeout(),
        shutdown_signal(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    use super::*;

    #[test]
    fn test_should_build_http_config_from_server_config() {
        let config = ServerConfig::builder()
            .hosts(vec!["s3.example.com".into(), "example.com".into()])
            .build();
        let http_config = build_http_config(&config);
        assert_eq!(http_config.hosts, ["s3.example.com", "example.com"]);
    }

    #[test]
    fn test_should_parse_cli_args() {
        let args = Args::try_parse_from(["s3gate", "--config", "/etc/s3gate.yaml"])
            .expect("valid args");
        assert_eq!(args.config, Some(PathBuf::from("/etc/s3gate.yaml")));
    }

    async fn roundtrip(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.expect("connect");
        stream
            .write_all(request.as_bytes())
            .await
            .expect("write request");
        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .await
            .expect("read response");
        response
    }

    #[tokio::test]
    async fn test_should_serve_until_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let service = S3HttpService::new(
            NotImplementedHandler,
            S3HttpConfig {
                hosts: vec!["localhost".to_owned()],
            },
        );
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, service, Duration::from_secs(5), async {
            rx.await.ok();
        }));

        let response = roundtrip(
            addr,
            "GET /photos?acl&tagging HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 400"));
        assert!(response.contains("<Code>InvalidRequest</Code>"));
        assert!(response.contains("server: s3gate"));

        let response = roundtrip(
            addr,
            "DELETE /photos/cat.jpg HTTP/1.1\r\nHost: localhost:4566\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 501"));
        assert!(response.contains("<Code>NotImplemented</Code>"));

        tx.send(()).expect("server still running");
        server
            .await
            .expect("server task")
            .expect("server exits cleanly");
    }
}
