//! Shared data model for the s3gate request-classification layer.
//!
//! - [`Action`]: the closed set of S3 operations a request can resolve to.
//! - [`RequestStyle`], [`Target`] and [`Route`]: how a request addressed its bucket and key.
//! - [`S3Error`] and [`S3ErrorCode`]: the structured error handed to the error responder.

pub mod action;
pub mod error;
pub mod route;

pub use action::{Action, UnknownAction};
pub use error::{S3Error, S3ErrorCode};
pub use route::{RequestStyle, Route, Target};
