//! Key generation, policy signing, and the per-upload uploader built on them.

pub mod key_generator;
pub mod policy_builder;
pub mod upload_service;
pub mod uploader;
