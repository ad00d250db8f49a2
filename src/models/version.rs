//! Represents derived versions (thumbnails and the like) of an upload.

use serde::Serialize;

/// Anything that must share the main upload's key.
///
/// The key generator pushes every key assignment through this trait so the
/// main file and its versions never diverge in storage location.
pub trait VersionKey: Send {
    fn name(&self) -> &str;
    fn key(&self) -> Option<&str>;
    fn set_key(&mut self, key: &str);

    /// The object key this version is written under: the shared key with the
    /// version name appended to the filename, e.g. `uploads/<id>/photo_thumb.jpg`.
    fn storage_key(&self) -> Option<String> {
        let key = self.key()?;
        let (dir, filename) = match key.rsplit_once('/') {
            Some((dir, filename)) => (Some(dir), filename),
            None => (None, key),
        };
        let versioned = versioned_filename(filename, self.name());
        Some(match dir {
            Some(dir) => format!("{}/{}", dir, versioned),
            None => versioned,
        })
    }
}

/// A named secondary output stored next to the main object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DerivedVersion {
    name: String,
    key: Option<String>,
}

impl DerivedVersion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
        }
    }
}

impl VersionKey for DerivedVersion {
    fn name(&self) -> &str {
        &self.name
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn set_key(&mut self, key: &str) {
        self.key = Some(key.to_string());
    }
}

/// Snapshot of a version returned to clients.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct VersionInfo {
    pub name: String,
    pub key: Option<String>,
    pub storage_key: Option<String>,
}

impl VersionInfo {
    pub fn of(version: &dyn VersionKey) -> Self {
        Self {
            name: version.name().to_string(),
            key: version.key().map(str::to_string),
            storage_key: version.storage_key(),
        }
    }
}

/// Append the version name before the extension: `photo.jpg` -> `photo_thumb.jpg`.
///
/// The unique id already lives in the directory, so the version goes at the
/// end of the filename rather than as a prefix.
pub fn versioned_filename(filename: &str, version: &str) -> String {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => {
            let (stem, ext) = filename.split_at(dot);
            format!("{}_{}{}", stem, version, ext)
        }
        _ => format!("{}_{}", filename, version),
    }
}
