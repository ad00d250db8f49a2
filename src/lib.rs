//! Signed direct-to-bucket uploads.
//!
//! Hands a browser everything it needs to POST a file straight into an
//! S3-compatible bucket: a unique key under a configured prefix, a base64
//! policy document pinning bucket, ACL, size and key prefix, and the
//! HMAC-SHA1 signature of that policy. The application server never sees the
//! file bytes.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use config::{SuccessPolicy, UploaderConfig};
pub use services::{
    key_generator::{FILENAME_WILDCARD, KeyGenerator},
    policy_builder::{PolicyBuilder, PolicyError, sign},
    uploader::DirectUploader,
};
