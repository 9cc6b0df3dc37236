//! The S3 HTTP service implementing hyper's `Service` trait.
//!
//! [`S3HttpService`] ties routing, dispatch and error rendering into a single
//! hyper-compatible service. For every request it:
//!
//! 1. Assigns a fresh request id
//! 2. Resolves the [`Route`](s3gate_model::Route) with the [`S3Router`]
//! 3. Collects the request body
//! 4. Dispatches to the [`S3Handler`]
//! 5. Renders any error through [`error_to_response`]
//! 6. Adds the common response headers (`x-amz-request-id`, `x-amz-id-2`, `Server`)

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, SERVER};
use http_body_util::BodyExt;
use hyper::service::Service;
use s3gate_model::error::S3Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::body::S3ResponseBody;
use crate::dispatch::{S3Handler, dispatch_operation};
use crate::host::HostStyleResolver;
use crate::response::{X_AMZ_ID_2, X_AMZ_REQUEST_ID, error_to_response};
use crate::router::S3Router;
use crate::table::RoutingTable;

/// Value of the `Server` response header.
pub const SERVER_NAME: &str = "s3gate";

/// Configuration for the S3 HTTP service.
#[derive(Debug, Clone, Default)]
pub struct S3HttpConfig {
    /// Accepted hosts for path-style and virtual-hosted-style addressing, in match order.
    pub hosts: Vec<String>,
}

/// The S3 HTTP service.
///
/// Cloning is cheap: the handler and router are shared.
#[derive(Debug)]
pub struct S3HttpService<H: S3Handler> {
    handler: Arc<H>,
    router: Arc<S3Router>,
}

impl<H: S3Handler> S3HttpService<H> {
    /// Create a service over the standard routing table.
    #[must_use]
    pub fn new(handler: H, config: S3HttpConfig) -> Self {
        Self::with_table(handler, config, Arc::new(RoutingTable::standard()))
    }

    /// Create a service over a custom routing table.
    #[must_use]
    pub fn with_table(handler: H, config: S3HttpConfig, table: Arc<RoutingTable>) -> Self {
        let router = S3Router::new(HostStyleResolver::new(config.hosts), table);
        Self {
            handler: Arc::new(handler),
            router: Arc::new(router),
        }
    }
}

impl<H: S3Handler> Clone for S3HttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            router: Arc::clone(&self.router),
        }
    }
}

impl<H, B> Service<http::Request<B>> for S3HttpService<H>
where
    H: S3Handler,
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    type Response = http::Response<S3ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let router = Arc::clone(&self.router);

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let response = process_request(req, handler.as_ref(), &router, &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Run one request through routing and dispatch.
async fn process_request<H, B>(
    req: http::Request<B>,
    handler: &H,
    router: &S3Router,
    request_id: &str,
) -> http::Response<S3ResponseBody>
where
    H: S3Handler,
    B: http_body::Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let method = req.method().clone();
    let uri = req.uri().clone();
    debug!(%method, %uri, request_id, "processing S3 request");

    let ctx = match router.resolve(&req) {
        Ok(ctx) => ctx,
        Err(err) => {
            warn!(%method, %uri, error = %err, request_id, "failed to resolve S3 request");
            return error_to_response(err.into(), request_id);
        }
    };

    info!(
        action = %ctx.route.action,
        style = %ctx.route.style,
        bucket = %ctx.route.bucket,
        key = %ctx.route.key,
        request_id,
        "routed S3 request"
    );

    let (parts, body) = req.into_parts();
    let body = match collect_body(body).await {
        Ok(body) => body,
        Err(err) => {
            error!(error = %err, request_id, "failed to collect request body");
            let s3_err = S3Error::internal_error("Failed to read request body").with_source(err);
            return error_to_response(s3_err, request_id);
        }
    };

    match dispatch_operation(handler, ctx, parts, body).await {
        Ok(response) => response,
        Err(err) => {
            debug!(
                code = %err.code,
                resource = ?err.resource,
                request_id,
                "S3 operation returned error"
            );
            // One id per request: the body must match the common headers.
            error_to_response(err.with_request_id(request_id), request_id)
        }
    }
}

async fn collect_body<B: http_body::Body>(body: B) -> Result<Bytes, B::Error> {
    Ok(body.collect().await?.to_bytes())
}

/// Add the headers every response carries.
fn add_common_headers(
    mut response: http::Response<S3ResponseBody>,
    request_id: &str,
) -> http::Response<S3ResponseBody> {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(X_AMZ_REQUEST_ID, value.clone());
        headers.insert(X_AMZ_ID_2, value);
    }
    headers.insert(SERVER, HeaderValue::from_static(SERVER_NAME));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_add_common_headers() {
        let response = add_common_headers(http::Response::new(S3ResponseBody::empty()), "abc-123");
        let headers = response.headers();
        assert_eq!(
            headers.get(X_AMZ_REQUEST_ID).and_then(|v| v.to_str().ok()),
            Some("abc-123")
        );
        assert_eq!(
            headers.get(X_AMZ_ID_2).and_then(|v| v.to_str().ok()),
            Some("abc-123")
        );
        assert_eq!(
            headers.get(SERVER).and_then(|v| v.to_str().ok()),
            Some("s3gate")
        );
    }

    #[test]
    fn test_should_share_router_between_clones() {
        let config = S3HttpConfig {
            hosts: vec!["s3.example.com".to_owned()],
        };
        let service = S3HttpService::new(crate::dispatch::NotImplementedHandler, config);
        let clone = service.clone();
        assert!(Arc::ptr_eq(&service.router, &clone.router));
        assert_eq!(clone.router.hosts().hosts(), ["s3.example.com".to_owned()]);
    }
}
