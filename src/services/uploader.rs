//! src/services/uploader.rs
//!
//! DirectUploader — one upload attempt. Owns a [`KeyGenerator`] and a
//! [`PolicyBuilder`] over a shared, immutable [`UploaderConfig`]. A host
//! attachment type holds one of these and delegates to it; create a fresh
//! instance per upload so the memoized key is never shared.

use crate::{
    config::UploaderConfig,
    models::{
        form::UploadForm,
        policy::{Acl, SuccessAction},
        version::{DerivedVersion, VersionInfo, VersionKey},
    },
    services::{
        key_generator::KeyGenerator,
        policy_builder::{PolicyBuilder, PolicyError, PolicyResult},
    },
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;
use url::Url;

pub struct DirectUploader {
    keys: KeyGenerator,
    policy: PolicyBuilder,
}

impl DirectUploader {
    /// Create an uploader with one [`DerivedVersion`] per configured version name.
    pub fn new(config: Arc<UploaderConfig>) -> Self {
        let mut keys = KeyGenerator::new(config.store_dir.clone());
        for name in &config.versions {
            keys.register_version(Box::new(DerivedVersion::new(name.clone())));
        }
        Self {
            keys,
            policy: PolicyBuilder::new(config),
        }
    }

    /// Attach another version that must share this upload's key.
    pub fn with_version(mut self, version: Box<dyn VersionKey>) -> Self {
        self.keys.register_version(version);
        self
    }

    pub fn config(&self) -> &UploaderConfig {
        self.policy.config()
    }

    pub fn key(&mut self) -> &str {
        self.keys.current_key()
    }

    pub fn set_key(&mut self, key: impl Into<String>) {
        self.keys.set_key(key);
    }

    pub fn has_key(&self) -> bool {
        self.keys.has_resolved_key()
    }

    pub fn acl(&self) -> Acl {
        self.policy.acl()
    }

    pub fn success_action_redirect(&self) -> Option<&str> {
        self.policy.success_action_redirect()
    }

    pub fn set_success_action_redirect(&mut self, url: Option<String>) {
        self.policy.set_success_action_redirect(url);
    }

    /// Encoded policy for this uploader's `store_dir`.
    pub fn policy(&self) -> PolicyResult<String> {
        self.policy.build_policy_document(self.keys.store_dir())
    }

    /// Signature of a freshly built policy.
    pub fn signature(&self) -> PolicyResult<String> {
        self.policy.sign(&self.policy()?)
    }

    /// Filename shown for this upload, as `{uuid}/{filename}`.
    ///
    /// A pending key is first resolved from `remote_url`, when the host model
    /// has one. `None` means no filename is known yet.
    pub fn filename(&mut self, remote_url: Option<&str>) -> Option<String> {
        if !self.keys.has_resolved_key() {
            self.keys.resolve_from_remote_url(remote_url)?;
        }
        self.keys.display_filename()
    }

    /// Whether `key` could have been produced by this uploader.
    pub fn valid_key(&self, key: &str) -> bool {
        let config = self.config();
        match KeyGenerator::key_match_pattern(&config.store_dir, &config.extension_whitelist) {
            Ok(pattern) => pattern.is_match(key),
            Err(err) => {
                warn!("could not build key pattern for {}: {}", config.store_dir, err);
                false
            }
        }
    }

    /// Public URL of the bucket, or of this upload's object when `with_path`
    /// is set. Each key segment is escaped on its own, `%` included, so the
    /// URL names exactly the stored key.
    pub fn direct_url(&mut self, with_path: bool) -> PolicyResult<Url> {
        let base = self.config().bucket_url();
        let mut url = Url::parse(&base).map_err(|err| PolicyError::InvalidBucketUrl {
            url: base.clone(),
            reason: err.to_string(),
        })?;
        if with_path {
            let key = self.keys.current_key().to_string();
            url.path_segments_mut()
                .map_err(|_| PolicyError::InvalidBucketUrl {
                    url: base.clone(),
                    reason: "cannot hold a path".into(),
                })?
                .clear()
                .extend(key.split('/'));
        }
        Ok(url)
    }

    /// All hidden fields for the upload form, from a single clock read.
    pub fn form_fields(&mut self) -> PolicyResult<UploadForm> {
        self.form_fields_at(Utc::now())
    }

    pub fn form_fields_at(&mut self, now: DateTime<Utc>) -> PolicyResult<UploadForm> {
        if self.config().access_key_id.trim().is_empty() {
            return Err(PolicyError::MissingAccessKeyId);
        }

        let store_dir = self.keys.store_dir().to_string();
        let policy = self.policy.build_policy_document_at(&store_dir, now)?;
        let signature = self.policy.sign(&policy)?;

        let (success_action_redirect, success_action_status) =
            match self.policy.success_action()? {
                SuccessAction::None => (None, None),
                SuccessAction::Status(status) => (None, Some(status.to_string())),
                SuccessAction::Redirect(url) => (Some(url), None),
            };

        Ok(UploadForm {
            action: self.direct_url(false)?.to_string(),
            key: self.keys.current_key().to_string(),
            aws_access_key_id: self.config().access_key_id.clone(),
            acl: self.acl().to_string(),
            policy,
            signature,
            success_action_redirect,
            success_action_status,
            utf8: "\u{2713}".into(),
        })
    }

    pub fn versions(&self) -> Vec<VersionInfo> {
        self.keys.versions().map(VersionInfo::of).collect()
    }
}
