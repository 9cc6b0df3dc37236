//! S3 request classification and the hyper service that fronts it.
//!
//! Every request reaching an S3-compatible endpoint is classified here: which
//! bucket and key it addresses, how it addressed them, and which of the S3
//! operations it invokes. Requests that cannot be classified get a well-formed
//! S3 XML error.
//!
//! - **Host styles** ([`host`]): path style, virtual-hosted style or CNAME,
//!   derived from the hostname against an ordered list of accepted hosts.
//!
//! - **Routing table** ([`table`]): scope, subresource, method and selector, as
//!   plain data validated once at construction.
//!
//! - **Routing** ([`router`]): [`ActionResolver`](router::ActionResolver) walks the
//!   table; [`S3Router`](router::S3Router) applies both steps to an `http::Request`.
//!
//! - **Error responses** ([`response`]): the [`ResponseSink`](response::ResponseSink)
//!   abstraction and [`write_error`](response::write_error).
//!
//! - **Dispatch** ([`dispatch`]): the [`S3Handler`](dispatch::S3Handler) boundary.
//!
//! - **Service** ([`service`]): [`S3HttpService`](service::S3HttpService), hyper's
//!   `Service` over all of the above.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> S3HttpService (hyper Service)
//!     -> S3Router
//!       -> HostStyleResolver (VPath > VHost > CName)
//!       -> ActionResolver (scope -> subresource -> method -> selector)
//!     -> Body collection
//!     -> dispatch_operation (S3Handler trait)
//!     -> write_error on failure
//!     -> Common response headers (x-amz-request-id, x-amz-id-2, Server)
//!   <- HTTP Response
//! ```
//!
//! # Usage
//!
//! ```rust
//! use bytes::Bytes;
//! use http_body_util::Full;
//! use hyper::service::Service;
//! use s3gate_http::dispatch::NotImplementedHandler;
//! use s3gate_http::service::{S3HttpConfig, S3HttpService};
//!
//! let config = S3HttpConfig {
//!     hosts: vec!["s3.example.com".to_owned()],
//! };
//! let service = S3HttpService::new(NotImplementedHandler, config);
//!
//! let request = http::Request::builder()
//!     .method("GET")
//!     .uri("/photos?acl")
//!     .header("Host", "s3.example.com")
//!     .body(Full::new(Bytes::new()))
//!     .unwrap();
//!
//! let response = tokio_test::block_on(service.call(request)).unwrap();
//! assert_eq!(response.status(), http::StatusCode::NOT_IMPLEMENTED);
//! ```

// S3Error is returned by value from handlers and conversions.
#![allow(clippy::result_large_err)]

pub mod body;
pub mod dispatch;
pub mod host;
pub mod response;
pub mod router;
pub mod service;
pub mod table;

pub use host::HostStyleResolver;
pub use router::{ActionResolver, ResolutionError, RoutingContext, S3Router};
pub use table::{RoutingTable, Scope, Selector, TableError};
