//! The closed set of S3 operations a request can resolve to.
//!
//! Every variant has a stable name (the AWS operation name) used for logging,
//! assertions and serialization. Ordinals are never exposed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown operation name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown S3 action: {}", self.0)
    }
}

impl std::error::Error for UnknownAction {}

macro_rules! actions {
    ($($variant:ident => $name:literal,)+) => {
        /// All S3 operations known to the router.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum Action {
            $(
                #[doc = concat!("The `", $name, "` operation.")]
                $variant,
            )+
        }

        impl Action {
            /// Every action, in declaration order.
            pub const ALL: &'static [Action] = &[$(Self::$variant,)+];

            /// Returns the AWS operation name.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            /// Parse an AWS operation name into an [`Action`].
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

actions! {
    AbortMultipartUpload => "AbortMultipartUpload",
    CompleteMultipartUpload => "CompleteMultipartUpload",
    CopyObject => "CopyObject",
    CorsPreflightRequest => "CorsPreflightRequest",
    CreateBucket => "CreateBucket",
    CreateMultipartUpload => "CreateMultipartUpload",
    DeleteBucket => "DeleteBucket",
    DeleteBucketAnalyticsConfiguration => "DeleteBucketAnalyticsConfiguration",
    DeleteBucketCors => "DeleteBucketCors",
    DeleteBucketEncryption => "DeleteBucketEncryption",
    DeleteBucketIntelligentTieringConfiguration => "DeleteBucketIntelligentTieringConfiguration",
    DeleteBucketInventoryConfiguration => "DeleteBucketInventoryConfiguration",
    DeleteBucketLifecycle => "DeleteBucketLifecycle",
    DeleteBucketMetricsConfiguration => "DeleteBucketMetricsConfiguration",
    DeleteBucketOwnershipControls => "DeleteBucketOwnershipControls",
    DeleteBucketPolicy => "DeleteBucketPolicy",
    DeleteBucketReplication => "DeleteBucketReplication",
    DeleteBucketTagging => "DeleteBucketTagging",
    DeleteBucketWebsite => "DeleteBucketWebsite",
    DeleteObject => "DeleteObject",
    DeleteObjects => "DeleteObjects",
    DeleteObjectTagging => "DeleteObjectTagging",
    DeletePublicAccessBlock => "DeletePublicAccessBlock",
    GetBucketAccelerateConfiguration => "GetBucketAccelerateConfiguration",
    GetBucketAcl => "GetBucketAcl",
    GetBucketAnalyticsConfiguration => "GetBucketAnalyticsConfiguration",
    GetBucketCors => "GetBucketCors",
    GetBucketEncryption => "GetBucketEncryption",
    GetBucketIntelligentTieringConfiguration => "GetBucketIntelligentTieringConfiguration",
    GetBucketInventoryConfiguration => "GetBucketInventoryConfiguration",
    GetBucketLifecycleConfiguration => "GetBucketLifecycleConfiguration",
    GetBucketLocation => "GetBucketLocation",
    GetBucketLogging => "GetBucketLogging",
    GetBucketMetricsConfiguration => "GetBucketMetricsConfiguration",
    GetBucketNotificationConfiguration => "GetBucketNotificationConfiguration",
    GetBucketOwnershipControls => "GetBucketOwnershipControls",
    GetBucketPolicy => "GetBucketPolicy",
    GetBucketPolicyStatus => "GetBucketPolicyStatus",
    GetBucketReplication => "GetBucketReplication",
    GetBucketRequestPayment => "GetBucketRequestPayment",
    GetBucketTagging => "GetBucketTagging",
    GetBucketVersioning => "GetBucketVersioning",
    GetBucketWebsite => "GetBucketWebsite",
    GetObject => "GetObject",
    GetObjectAcl => "GetObjectAcl",
    GetObjectAttributes => "GetObjectAttributes",
    GetObjectLegalHold => "GetObjectLegalHold",
    GetObjectLockConfiguration => "GetObjectLockConfiguration",
    GetObjectRetention => "GetObjectRetention",
    GetObjectTagging => "GetObjectTagging",
    GetObjectTorrent => "GetObjectTorrent",
    GetPublicAccessBlock => "GetPublicAccessBlock",
    HeadBucket => "HeadBucket",
    HeadObject => "HeadObject",
    ListBucketAnalyticsConfigurations => "ListBucketAnalyticsConfigurations",
    ListBucketIntelligentTieringConfigurations => "ListBucketIntelligentTieringConfigurations",
    ListBucketInventoryConfigurations => "ListBucketInventoryConfigurations",
    ListBucketMetricsConfigurations => "ListBucketMetricsConfigurations",
    ListBuckets => "ListBuckets",
    ListMultipartUploads => "ListMultipartUploads",
    ListObjects => "ListObjects",
    ListObjectVersions => "ListObjectVersions",
    ListParts => "ListParts",
    PutBucketAccelerateConfiguration => "PutBucketAccelerateConfiguration",
    PutBucketAcl => "PutBucketAcl",
    PutBucketAnalyticsConfiguration => "PutBucketAnalyticsConfiguration",
    PutBucketCors => "PutBucketCors",
    PutBucketEncryption => "PutBucketEncryption",
    PutBucketIntelligentTieringConfiguration => "PutBucketIntelligentTieringConfiguration",
    PutBucketInventoryConfiguration => "PutBucketInventoryConfiguration",
    PutBucketLifecycleConfiguration => "PutBucketLifecycleConfiguration",
    PutBucketLogging => "PutBucketLogging",
    PutBucketMetricsConfiguration => "PutBucketMetricsConfiguration",
    PutBucketNotificationConfiguration => "PutBucketNotificationConfiguration",
    PutBucketOwnershipControls => "PutBucketOwnershipControls",
    PutBucketPolicy => "PutBucketPolicy",
    PutBucketReplication => "PutBucketReplication",
    PutBucketRequestPayment => "PutBucketRequestPayment",
    PutBucketTagging => "PutBucketTagging",
    PutBucketVersioning => "PutBucketVersioning",
    PutBucketWebsite => "PutBucketWebsite",
    PutObject => "PutObject",
    PutObjectAcl => "PutObjectAcl",
    PutObjectLegalHold => "PutObjectLegalHold",
    PutObjectLockConfiguration => "PutObjectLockConfiguration",
    PutObjectRetention => "PutObjectRetention",
    PutObjectTagging => "PutObjectTagging",
    PutPublicAccessBlock => "PutPublicAccessBlock",
    RestoreObject => "RestoreObject",
    SelectObjectContent => "SelectObjectContent",
    UploadPart => "UploadPart",
    UploadPartCopy => "UploadPartCopy",
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownAction(s.to_owned()))
    }
}

impl TryFrom<String> for Action {
    type Error = UnknownAction;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Action> for &'static str {
    fn from(action: Action) -> Self {
        action.as_str()
    }
}
