//! The declarative routing table.
//!
//! A [`RoutingTable`] maps a [`Scope`] to its subresources, each subresource to
//! the HTTP methods it accepts, and each method to a [`Selector`]. The table is
//! pure data: it can be serialized, compared and swapped out in tests. The
//! empty subresource name `""` is the entry used when the query string names
//! no recognised subresource, and every scope must define it.

use std::collections::BTreeMap;
use std::fmt;

use http::HeaderMap;
use s3gate_model::{Action, Target};
use serde::{Deserialize, Serialize};

/// Subresource name of the default entry of every scope.
pub const DEFAULT_SUBRESOURCE: &str = "";

/// Header whose presence turns a PUT into a server-side copy.
pub const COPY_SOURCE_HEADER: &str = "x-amz-copy-source";

/// Query key selecting a single analytics/inventory/metrics/tiering configuration.
pub const CONFIGURATION_ID_QUERY: &str = "id";

/// Which part of the namespace a request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// No bucket and no key: service-level requests.
    Root,
    /// A bucket without a key.
    Bucket,
    /// A bucket and a key.
    Object,
}

impl Scope {
    /// Every scope.
    pub const ALL: [Scope; 3] = [Scope::Root, Scope::Bucket, Scope::Object];

    /// Choose the scope addressed by a target.
    ///
    /// # Panics
    ///
    /// Panics when the target has a key but no bucket. A path style request
    /// whose path starts with an empty segment (`//key`, `/%2Fkey`) gets here.
    #[must_use]
    pub fn of(target: &Target) -> Self {
        match (target.has_bucket(), target.has_key()) {
            (false, false) => Self::Root,
            (true, false) => Self::Bucket,
            (true, true) => Self::Object,
            (false, true) => {
                tracing::error!(
                    hostname = %target.hostname,
                    style = %target.style,
                    key = %target.key,
                    "target has an object key without a bucket"
                );
                panic!(
                    "cannot have an object key without a bucket (key: {:?})",
                    target.key
                )
            }
        }
    }

    /// Returns the scope name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Bucket => "bucket",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the final action for a request once scope, subresource and method are known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Selector {
    /// Always the same action.
    Static {
        /// The action.
        action: Action,
    },
    /// `if_present` when the query string contains `key`, `if_absent` otherwise.
    QueryConditional {
        /// The query parameter name.
        key: String,
        /// Action when the parameter is present.
        if_present: Action,
        /// Action when the parameter is absent.
        if_absent: Action,
    },
    /// `if_present` when header `key` has a non-empty value, `if_absent` otherwise.
    HeaderConditional {
        /// The header name.
        key: String,
        /// Action when the header is set.
        if_present: Action,
        /// Action when the header is missing or empty.
        if_absent: Action,
    },
}

impl Selector {
    /// A selector that always yields `action`.
    #[must_use]
    pub fn fixed(action: Action) -> Self {
        Self::Static { action }
    }

    /// A selector keyed on the presence of a query parameter.
    #[must_use]
    pub fn on_query(key: impl Into<String>, if_present: Action, if_absent: Action) -> Self {
        Self::QueryConditional {
            key: key.into(),
            if_present,
            if_absent,
        }
    }

    /// A selector keyed on a non-empty header value.
    #[must_use]
    pub fn on_header(key: impl Into<String>, if_present: Action, if_absent: Action) -> Self {
        Self::HeaderConditional {
            key: key.into(),
            if_present,
            if_absent,
        }
    }

    /// Evaluate the selector. Pure: no input is modified.
    #[must_use]
    pub fn select(
        &self,
        _target: &Target,
        query_params: &[(String, String)],
        headers: &HeaderMap,
    ) -> Action {
        match self {
            Self::Static { action } => *action,
            Self::QueryConditional {
                key,
                if_present,
                if_absent,
            } => {
                if query_params.iter().any(|(k, _)| k == key) {
                    *if_present
                } else {
                    *if_absent
                }
            }
            Self::HeaderConditional {
                key,
                if_present,
                if_absent,
            } => {
                let set = headers
                    .get(key.as_str())
                    .is_some_and(|value| !value.is_empty());
                if set { *if_present } else { *if_absent }
            }
        }
    }
}

/// Method name to selector.
pub type MethodRoutes = BTreeMap<String, Selector>;

/// The subresources registered under one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeRoutes(BTreeMap<String, MethodRoutes>);

impl ScopeRoutes {
    /// Create an empty set of routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `selector` for `method` on `subresource`.
    #[must_use]
    pub fn route(mut self, subresource: &str, method: &http::Method, selector: Selector) -> Self {
        self.0
            .entry(subresource.to_owned())
            .or_default()
            .insert(method.as_str().to_owned(), selector);
        self
    }

    /// The methods registered for a subresource.
    #[must_use]
    pub fn get(&self, subresource: &str) -> Option<&MethodRoutes> {
        self.0.get(subresource)
    }

    /// Whether `name` is a registered subresource (the default entry excluded).
    #[must_use]
    pub fn is_subresource(&self, name: &str) -> bool {
        !name.is_empty() && self.0.contains_key(name)
    }

    /// Iterate over registered subresource names, including the default entry.
    pub fn subresources(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// A routing table violation detected at construction time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// A scope lacks the `""` entry.
    #[error("routes for the {0} scope do not define a default route")]
    MissingDefault(Scope),
}

/// The complete, validated routing table.
///
/// Built once before serving and shared read-only by every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedTable")]
pub struct RoutingTable {
    root: ScopeRoutes,
    bucket: ScopeRoutes,
    object: ScopeRoutes,
}

#[derive(Deserialize)]
struct UncheckedTable {
    root: ScopeRoutes,
    bucket: ScopeRoutes,
    object: ScopeRoutes,
}

impl TryFrom<UncheckedTable> for RoutingTable {
    type Error = TableError;

    fn try_from(raw: UncheckedTable) -> Result<Self, Self::Error> {
        Self::new(raw.root, raw.bucket, raw.object)
    }
}

impl RoutingTable {
    /// Build a table, checking that every scope defines a default route.
    pub fn new(
        root: ScopeRoutes,
        bucket: ScopeRoutes,
        object: ScopeRoutes,
    ) -> Result<Self, TableError> {
        let table = Self {
            root,
            bucket,
            object,
        };
        for scope in Scope::ALL {
            if table.scope(scope).get(DEFAULT_SUBRESOURCE).is_none() {
                return Err(TableError::MissingDefault(scope));
            }
        }
        Ok(table)
    }

    /// The routes of one scope.
    #[must_use]
    pub fn scope(&self, scope: Scope) -> &ScopeRoutes {
        match scope {
            Scope::Root => &self.root,
            Scope::Bucket => &self.bucket,
            Scope::Object => &self.object,
        }
    }

    /// The S3 REST API routing table.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(root_routes(), bucket_routes(), object_routes())
            .expect("built-in routing table defines a default route for every scope")
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn fixed(action: Action) -> Selector {
    Selector::fixed(action)
}

fn by_configuration_id(get: Action, list: Action) -> Selector {
    Selector::on_query(CONFIGURATION_ID_QUERY, get, list)
}

fn by_copy_source(copy: Action, plain: Action) -> Selector {
    Selector::on_header(COPY_SOURCE_HEADER, copy, plain)
}

fn root_routes() -> ScopeRoutes {
    use http::Method;

    ScopeRoutes::new().route("", &Method::GET, fixed(Action::ListBuckets))
}

#[allow(clippy::too_many_lines)]
fn bucket_routes() -> ScopeRoutes {
    use http::Method;

    ScopeRoutes::new()
        .route("", &Method::DELETE, fixed(Action::DeleteBucket))
        .route("", &Method::GET, fixed(Action::ListObjects))
        .route("", &Method::HEAD, fixed(Action::HeadBucket))
        .route("", &Method::PUT, fixed(Action::CreateBucket))
        // accelerate
        .route("accelerate", &Method::GET, fixed(Action::GetBucketAccelerateConfiguration))
        .route("accelerate", &Method::PUT, fixed(Action::PutBucketAccelerateConfiguration))
        // acl
        .route("acl", &Method::GET, fixed(Action::GetBucketAcl))
        .route("acl", &Method::PUT, fixed(Action::PutBucketAcl))
        // analytics
        .route("analytics", &Method::DELETE, fixed(Action::DeleteBucketAnalyticsConfiguration))
        .route(
            "analytics",
            &Method::GET,
            by_configuration_id(
                Action::GetBucketAnalyticsConfiguration,
                Action::ListBucketAnalyticsConfigurations,
            ),
        )
        .route("analytics", &Method::PUT, fixed(Action::PutBucketAnalyticsConfiguration))
        // cors
        .route("cors", &Method::DELETE, fixed(Action::DeleteBucketCors))
        .route("cors", &Method::GET, fixed(Action::GetBucketCors))
        .route("cors", &Method::PUT, fixed(Action::PutBucketCors))
        // delete
        .route("delete", &Method::POST, fixed(Action::DeleteObjects))
        // encryption
        .route("encryption", &Method::DELETE, fixed(Action::DeleteBucketEncryption))
        .route("encryption", &Method::GET, fixed(Action::GetBucketEncryption))
        .route("encryption", &Method::PUT, fixed(Action::PutBucketEncryption))
        // intelligent-tiering
        .route(
            "intelligent-tiering",
            &Method::DELETE,
            fixed(Action::DeleteBucketIntelligentTieringConfiguration),
        )
        .route(
            "intelligent-tiering",
            &Method::GET,
            by_configuration_id(
                Action::GetBucketIntelligentTieringConfiguration,
                Action::ListBucketIntelligentTieringConfigurations,
            ),
        )
        .route(
            "intelligent-tiering",
            &Method::PUT,
            fixed(Action::PutBucketIntelligentTieringConfiguration),
        )
        // inventory
        .route("inventory", &Method::DELETE, fixed(Action::DeleteBucketInventoryConfiguration))
        .route(
            "inventory",
            &Method::GET,
            by_configuration_id(
                Action::GetBucketInventoryConfiguration,
                Action::ListBucketInventoryConfigurations,
            ),
        )
        .route("inventory", &Method::PUT, fixed(Action::PutBucketInventoryConfiguration))
        // lifecycle
        .route("lifecycle", &Method::DELETE, fixed(Action::DeleteBucketLifecycle))
        .route("lifecycle", &Method::GET, fixed(Action::GetBucketLifecycleConfiguration))
        .route("lifecycle", &Method::PUT, fixed(Action::PutBucketLifecycleConfiguration))
        // location
        .route("location", &Method::GET, fixed(Action::GetBucketLocation))
        // logging
        .route("logging", &Method::GET, fixed(Action::GetBucketLogging))
        .route("logging", &Method::PUT, fixed(Action::PutBucketLogging))
        // metrics
        .route("metrics", &Method::DELETE, fixed(Action::DeleteBucketMetricsConfiguration))
        .route(
            "metrics",
            &Method::GET,
            by_configuration_id(
                Action::GetBucketMetricsConfiguration,
                Action::ListBucketMetricsConfigurations,
            ),
        )
        .route("metrics", &Method::PUT, fixed(Action::PutBucketMetricsConfiguration))
        // notification
        .route("notification", &Method::GET, fixed(Action::GetBucketNotificationConfiguration))
        .route("notification", &Method::PUT, fixed(Action::PutBucketNotificationConfiguration))
        // object-lock
        .route("object-lock", &Method::GET, fixed(Action::GetObjectLockConfiguration))
        .route("object-lock", &Method::PUT, fixed(Action::PutObjectLockConfiguration))
        // ownershipControls
        .route("ownershipControls", &Method::DELETE, fixed(Action::DeleteBucketOwnershipControls))
        .route("ownershipControls", &Method::GET, fixed(Action::GetBucketOwnershipControls))
        .route("ownershipControls", &Method::PUT, fixed(Action::PutBucketOwnershipControls))
        // policy
        .route("policy", &Method::DELETE, fixed(Action::DeleteBucketPolicy))
        .route("policy", &Method::GET, fixed(Action::GetBucketPolicy))
        .route("policy", &Method::PUT, fixed(Action::PutBucketPolicy))
        // policyStatus
        .route("policyStatus", &Method::GET, fixed(Action::GetBucketPolicyStatus))
        // publicAccessBlock
        .route("publicAccessBlock", &Method::DELETE, fixed(Action::DeletePublicAccessBlock))
        .route("publicAccessBlock", &Method::GET, fixed(Action::GetPublicAccessBlock))
        .route("publicAccessBlock", &Method::PUT, fixed(Action::PutPublicAccessBlock))
        // replication
        .route("replication", &Method::DELETE, fixed(Action::DeleteBucketReplication))
        .route("replication", &Method::GET, fixed(Action::GetBucketReplication))
        .route("replication", &Method::PUT, fixed(Action::PutBucketReplication))
        // requestPayment
        .route("requestPayment", &Method::GET, fixed(Action::GetBucketRequestPayment))
        .route("requestPayment", &Method::PUT, fixed(Action::PutBucketRequestPayment))
        // tagging
        .route("tagging", &Method::DELETE, fixed(Action::DeleteBucketTagging))
        .route("tagging", &Method::GET, fixed(Action::GetBucketTagging))
        .route("tagging", &Method::PUT, fixed(Action::PutBucketTagging))
        // uploads
        .route("uploads", &Method::GET, fixed(Action::ListMultipartUploads))
        // versioning
        .route("versioning", &Method::GET, fixed(Action::GetBucketVersioning))
        .route("versioning", &Method::PUT, fixed(Action::PutBucketVersioning))
        // versions
        .route("versions", &Method::GET, fixed(Action::ListObjectVersions))
        // website
        .route("website", &Method::DELETE, fixed(Action::DeleteBucketWebsite))
        .route("website", &Method::GET, fixed(Action::GetBucketWebsite))
        .route("website", &Method::PUT, fixed(Action::PutBucketWebsite))
}

fn object_routes() -> ScopeRoutes {
    use http::Method;

    ScopeRoutes::new()
        .route("", &Method::DELETE, fixed(Action::DeleteObject))
        .route("", &Method::GET, fixed(Action::GetObject))
        .route("", &Method::HEAD, fixed(Action::HeadObject))
        .route(
            "",
            &Method::PUT,
            by_copy_source(Action::CopyObject, Action::PutObject),
        )
        // acl
        .route("acl", &Method::GET, fixed(Action::GetObjectAcl))
        .route("acl", &Method::PUT, fixed(Action::PutObjectAcl))
        // attributes
        .route("attributes", &Method::GET, fixed(Action::GetObjectAttributes))
        // legal-hold
        .route("legal-hold", &Method::GET, fixed(Action::GetObjectLegalHold))
        .route("legal-hold", &Method::PUT, fixed(Action::PutObjectLegalHold))
        // restore
        .route("restore", &Method::POST, fixed(Action::RestoreObject))
        // retention
        .route("retention", &Method::GET, fixed(Action::GetObjectRetention))
        .route("retention", &Method::PUT, fixed(Action::PutObjectRetention))
        // select
        .route("select", &Method::POST, fixed(Action::SelectObjectContent))
        // tagging
        .route("tagging", &Method::DELETE, fixed(Action::DeleteObjectTagging))
        .route("tagging", &Method::GET, fixed(Action::GetObjectTagging))
        .route("tagging", &Method::PUT, fixed(Action::PutObjectTagging))
        // torrent
        .route("torrent", &Method::GET, fixed(Action::GetObjectTorrent))
        // uploadId
        .route("uploadId", &Method::DELETE, fixed(Action::AbortMultipartUpload))
        .route("uploadId", &Method::GET, fixed(Action::ListParts))
        .route("uploadId", &Method::POST, fixed(Action::CompleteMultipartUpload))
        .route(
            "uploadId",
            &Method::PUT,
            by_copy_source(Action::UploadPartCopy, Action::UploadPart),
        )
        // uploads
        .route("uploads", &Method::POST, fixed(Action::CreateMultipartUpload))
}
