//! src/services/upload_service.rs
//!
//! UploadService — shared HTTP state. Holds the immutable uploader
//! configuration and hands every request its own [`DirectUploader`], so keys
//! are never shared between upload attempts.

use crate::{
    config::UploaderConfig,
    models::{form::UploadForm, version::VersionInfo},
    services::{policy_builder::PolicyResult, uploader::DirectUploader},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of resolving a key against a remote source.
#[derive(Debug, Serialize)]
pub struct ResolvedUpload {
    pub key: String,
    /// `{uuid}/{filename}`, or `None` while no filename is known.
    pub filename: Option<String>,
    pub versions: Vec<VersionInfo>,
}

#[derive(Clone)]
pub struct UploadService {
    pub config: Arc<UploaderConfig>,
}

impl UploadService {
    pub fn new(config: UploaderConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// A fresh uploader for one upload attempt.
    pub fn uploader(&self) -> DirectUploader {
        DirectUploader::new(self.config.clone())
    }

    /// Form fields for a new upload under a freshly generated key.
    pub fn authorize(&self, success_action_redirect: Option<String>) -> PolicyResult<UploadForm> {
        let mut uploader = self.uploader();
        if success_action_redirect.is_some() {
            uploader.set_success_action_redirect(success_action_redirect);
        }
        let form = uploader.form_fields()?;
        info!("authorized direct upload for key {}", form.key);
        Ok(form)
    }

    /// Apply an explicit key (if any), then try to resolve the filename from
    /// `remote_url`. Versions receive whatever key results.
    pub fn resolve(&self, key: Option<String>, remote_url: Option<&str>) -> ResolvedUpload {
        let mut uploader = self.uploader();
        if let Some(key) = key {
            uploader.set_key(key);
        }
        let filename = uploader.filename(remote_url);
        debug!("resolved filename {:?} for key {}", filename, uploader.key());

        ResolvedUpload {
            key: uploader.key().to_string(),
            filename,
            versions: uploader.versions(),
        }
    }

    /// Whether `key` matches the configured store dir and extension whitelist.
    pub fn verify(&self, key: &str) -> bool {
        self.uploader().valid_key(key)
    }
}
