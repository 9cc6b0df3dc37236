//! S3 request routing: host style resolution followed by action resolution.
//!
//! The [`S3Router`] maps incoming HTTP requests to a [`Route`] in two steps:
//!
//! 1. [`HostStyleResolver`] derives the addressing style, bucket and key from
//!    the `Host` header and the URL path.
//! 2. [`ActionResolver`] looks the request up in the [`RoutingTable`]: scope from
//!    bucket/key presence, subresource from the query keys, then HTTP method,
//!    then the entry's [`Selector`](crate::table::Selector).
//!
//! Both steps are pure and share no mutable state, so one router serves every
//! connection.

use std::collections::BTreeSet;
use std::sync::Arc;

use http::HeaderMap;
use percent_encoding::percent_decode_str;
use s3gate_model::error::S3Error;
use s3gate_model::{Route, Target};

use crate::host::{HostStyleResolver, hostname_from_authority};
use crate::table::{DEFAULT_SUBRESOURCE, RoutingTable, Scope};

/// Why a request could not be mapped to an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// The query string named more than one registered subresource.
    #[error("Conflicting query string parameters: {}", .keys.join(", "))]
    ConflictingSubresource {
        /// The conflicting subresource names, sorted and deduplicated.
        keys: Vec<String>,
    },
    /// The subresource has no route for the request method.
    #[error("Method not allowed: {method}")]
    MethodNotAllowed {
        /// The rejected HTTP method.
        method: String,
    },
}

impl From<ResolutionError> for S3Error {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::ConflictingSubresource { keys } => S3Error::invalid_request(format!(
                "Conflicting query string parameters: {}",
                keys.join(", ")
            )),
            ResolutionError::MethodNotAllowed { method } => S3Error::method_not_allowed(&method),
        }
    }
}

/// Maps a [`Target`] plus method, query and headers onto an action.
#[derive(Debug, Clone)]
pub struct ActionResolver {
    table: Arc<RoutingTable>,
}

impl ActionResolver {
    /// Create a resolver over a shared routing table.
    #[must_use]
    pub fn new(table: Arc<RoutingTable>) -> Self {
        Self { table }
    }

    /// The routing table in use.
    #[must_use]
    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Resolve the action for a request.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::ConflictingSubresource`] when the query names two
    /// or more subresources registered for the scope, and
    /// [`ResolutionError::MethodNotAllowed`] when the selected subresource has no
    /// route for `method`.
    ///
    /// # Panics
    ///
    /// Panics when `target` has a key but no bucket (see [`Scope::of`]).
    pub fn resolve(
        &self,
        target: Target,
        method: &str,
        query_params: &[(String, String)],
        headers: &HeaderMap,
    ) -> Result<Route, ResolutionError> {
        let routes = self.table.scope(Scope::of(&target));

        let subresources: BTreeSet<&str> = query_params
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(|k| routes.is_subresource(k))
            .collect();

        let subresource = match subresources.len() {
            0 => DEFAULT_SUBRESOURCE,
            1 => subresources.first().copied().unwrap_or(DEFAULT_SUBRESOURCE),
            _ => {
                return Err(ResolutionError::ConflictingSubresource {
                    keys: subresources.into_iter().map(str::to_owned).collect(),
                });
            }
        };

        let selector = routes
            .get(subresource)
            .and_then(|methods| methods.get(method))
            .ok_or_else(|| ResolutionError::MethodNotAllowed {
                method: method.to_owned(),
            })?;

        let action = selector.select(&target, query_params, headers);
        Ok(target.into_route(action))
    }
}

/// The result of routing an HTTP request.
#[derive(Debug, Clone)]
pub struct RoutingContext {
    /// The resolved route.
    pub route: Route,
    /// Parsed query parameters from the request URI.
    pub query_params: Vec<(String, String)>,
}

/// Host style resolution and action resolution, applied to whole requests.
#[derive(Debug, Clone)]
pub struct S3Router {
    hosts: HostStyleResolver,
    actions: ActionResolver,
}

impl S3Router {
    /// Create a router from a host resolver and a routing table.
    #[must_use]
    pub fn new(hosts: HostStyleResolver, table: Arc<RoutingTable>) -> Self {
        Self {
            hosts,
            actions: ActionResolver::new(table),
        }
    }

    /// Create a router over the standard S3 routing table.
    #[must_use]
    pub fn with_hosts(hosts: HostStyleResolver) -> Self {
        Self::new(hosts, Arc::new(RoutingTable::standard()))
    }

    /// The host style resolver.
    #[must_use]
    pub fn hosts(&self) -> &HostStyleResolver {
        &self.hosts
    }

    /// Resolve an HTTP request to a routing context.
    ///
    /// The hostname comes from the `Host` header, falling back to the URI
    /// authority. The path is percent-decoded before the bucket/key split.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] when no action matches; see
    /// [`ActionResolver::resolve`].
    pub fn resolve<B>(&self, req: &http::Request<B>) -> Result<RoutingContext, ResolutionError> {
        let uri = req.uri();
        let headers = req.headers();

        let authority = headers
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.authority().map(http::uri::Authority::as_str))
            .unwrap_or_default();
        let hostname = hostname_from_authority(authority);
        let path = decode_uri_component(uri.path());

        let target = self.hosts.resolve(hostname, &path);
        let query_params = parse_query_params(uri.query().unwrap_or(""));

        let route = self
            .actions
            .resolve(target, req.method().as_str(), &query_params, headers)?;

        Ok(RoutingContext {
            route,
            query_params,
        })
    }
}

/// Decode a percent-encoded URI component.
fn decode_uri_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse a query string into key-value pairs, keeping order and duplicates.
fn parse_query_params(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode_uri_component(key), decode_uri_component(value)),
            None => (decode_uri_component(pair), String::new()),
        })
        .collect()
}
