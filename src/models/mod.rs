//! Core data models for direct-to-bucket uploads.
//!
//! These types describe the policy document, the form fields handed to the
//! browser, and the derived versions that share the main upload's key. They
//! serialize as JSON via `serde`.

pub mod form;
pub mod policy;
pub mod version;
