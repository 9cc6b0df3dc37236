//! Operation dispatch: hands a routed request to the backend handler.
//!
//! The gateway only classifies requests. Whatever performs the operation sits
//! behind [`S3Handler`]; until one is plugged in, [`NotImplementedHandler`]
//! answers every action with `NotImplemented`.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use s3gate_model::error::S3Error;

use crate::body::S3ResponseBody;
use crate::router::RoutingContext;

/// The future returned by [`S3Handler::handle_operation`].
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<S3ResponseBody>, S3Error>> + Send>>;

/// The boundary between request classification and the storage backend.
///
/// Boxed futures keep the trait usable behind `Arc<dyn S3Handler>`.
pub trait S3Handler: Send + Sync + 'static {
    /// Perform the routed operation and produce an HTTP response.
    fn handle_operation(
        &self,
        ctx: RoutingContext,
        parts: http::request::Parts,
        body: Bytes,
    ) -> HandlerFuture;
}

/// Dispatch a routed request to the handler.
pub async fn dispatch_operation<H: S3Handler + ?Sized>(
    handler: &H,
    ctx: RoutingContext,
    parts: http::request::Parts,
    body: Bytes,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    tracing::debug!(
        action = %ctx.route.action,
        style = %ctx.route.style,
        bucket = %ctx.route.bucket,
        key = %ctx.route.key,
        "dispatching S3 operation"
    );
    handler.handle_operation(ctx, parts, body).await
}

/// Answers every action with `NotImplemented`, naming the request URI as the resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotImplementedHandler;

impl S3Handler for NotImplementedHandler {
    fn handle_operation(
        &self,
        _ctx: RoutingContext,
        parts: http::request::Parts,
        _body: Bytes,
    ) -> HandlerFuture {
        let resource = parts.uri.to_string();
        Box::pin(async move { Err(S3Error::not_implemented(resource)) })
    }
}
