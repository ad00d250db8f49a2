//! src/services/key_generator.rs
//!
//! KeyGenerator — owns the object key of one upload attempt. Keys have the
//! shape `{store_dir}/{uuid}/{filename}`; until the filename is known the last
//! segment is the `${filename}` placeholder, which the storage provider fills
//! in with the submitted filename at upload time.

use crate::models::version::VersionKey;
use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Placeholder the storage provider replaces with the client-side filename.
pub const FILENAME_WILDCARD: &str = "${filename}";

/// Produces and tracks the storage key for a single upload attempt.
///
/// The key is generated lazily and memoized. Every assignment through
/// [`KeyGenerator::set_key`] is pushed to all registered versions before the
/// call returns, so a thumbnail can never end up under a different unique id
/// than its original.
pub struct KeyGenerator {
    store_dir: String,
    key: Option<String>,
    versions: Vec<Box<dyn VersionKey>>,
}

impl KeyGenerator {
    pub fn new(store_dir: impl Into<String>) -> Self {
        Self {
            store_dir: store_dir.into(),
            key: None,
            versions: Vec::new(),
        }
    }

    pub fn store_dir(&self) -> &str {
        &self.store_dir
    }

    /// Register a version that must follow this generator's key.
    pub fn register_version(&mut self, version: Box<dyn VersionKey>) {
        self.versions.push(version);
    }

    pub fn versions(&self) -> impl Iterator<Item = &dyn VersionKey> {
        self.versions.iter().map(|v| v.as_ref())
    }

    /// Return the key, generating `{store_dir}/{uuid}/${filename}` on first use.
    pub fn current_key(&mut self) -> &str {
        let store_dir = &self.store_dir;
        self.key.get_or_insert_with(|| {
            format!("{}/{}/{}", store_dir, Uuid::new_v4(), FILENAME_WILDCARD)
        })
    }

    /// Overwrite the key and hand the identical value to every version.
    pub fn set_key(&mut self, key: impl Into<String>) {
        let key = key.into();
        for version in self.versions.iter_mut() {
            version.set_key(&key);
        }
        debug!(
            "assigned key {} to upload and {} version(s)",
            key,
            self.versions.len()
        );
        self.key = Some(key);
    }

    /// True once the key names a concrete file instead of the placeholder.
    pub fn has_resolved_key(&self) -> bool {
        match self.key.as_deref() {
            Some(key) => !key.is_empty() && !key.ends_with(FILENAME_WILDCARD),
            None => false,
        }
    }

    /// Resolve a pending key from the URL of a remote source file.
    ///
    /// Replaces the placeholder with the last path segment of `remote_url`
    /// (query stripped, percent-decoded) and returns that filename. Returns
    /// `None` without touching the key when it is already resolved, when no
    /// URL is known, or when the URL yields no usable filename.
    pub fn resolve_from_remote_url(&mut self, remote_url: Option<&str>) -> Option<String> {
        if self.has_resolved_key() {
            return None;
        }
        let filename = filename_from_url(remote_url?)?;

        let new_key = match self.current_key().rsplit_once('/') {
            Some((dir, _)) => format!("{}/{}", dir, filename),
            None => filename.clone(),
        };
        self.set_key(new_key);

        Some(filename)
    }

    /// The resolved key collapsed to its last two segments: `{uuid}/{filename}`.
    ///
    /// Any deeper directory structure is dropped. `None` while the key is
    /// still pending.
    pub fn display_filename(&self) -> Option<String> {
        if !self.has_resolved_key() {
            return None;
        }
        let key = self.key.as_deref()?;
        let mut segments = key.rsplit('/');
        let filename = segments.next()?;
        Some(match segments.next() {
            Some(unique) => format!("{}/{}", unique, filename),
            None => filename.to_string(),
        })
    }

    /// Pattern every key produced under `store_dir` must match.
    ///
    /// `{store_dir}/{hex-ish id}/{anything}.{ext}` where `ext` is one of
    /// `allowed_extensions`, or any word when the list is empty.
    pub fn key_match_pattern(
        store_dir: &str,
        allowed_extensions: &[String],
    ) -> Result<Regex, regex::Error> {
        let extension = if allowed_extensions.is_empty() {
            r"\w+".to_string()
        } else {
            let alternation = allowed_extensions
                .iter()
                .map(|ext| regex::escape(ext))
                .collect::<Vec<_>>()
                .join("|");
            format!("({})", alternation)
        };

        Regex::new(&format!(
            r"\A{}/[a-f\d\-]+/.+\.{}\z",
            regex::escape(store_dir),
            extension
        ))
    }
}

/// Base that relative remote paths such as `/images/photo.jpg` are read against.
const RELATIVE_BASE: &str = "http://localhost/";

/// Extract a filename from the last path segment of a URL.
///
/// Relative paths are accepted. The segment is form-decoded, so `+` becomes a
/// space and `%2B` a literal plus. Malformed URLs, URLs without a path, and
/// segments that are empty, `.`, `..`, or carry control characters give `None`.
pub fn filename_from_url(remote_url: &str) -> Option<String> {
    let parsed = match parse_remote_url(remote_url) {
        Ok(url) => url,
        Err(err) => {
            debug!("ignoring unparsable remote url {:?}: {}", remote_url, err);
            return None;
        }
    };

    let segment = parsed.path_segments()?.last()?.replace('+', " ");
    let decoded = percent_decode_str(&segment).decode_utf8().ok()?;
    // An encoded slash must not smuggle extra directories into the key.
    let filename = decoded.rsplit('/').next()?.trim();

    if filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.chars().any(char::is_control)
    {
        debug!("remote url {:?} has no usable filename", remote_url);
        return None;
    }
    Some(filename.to_string())
}

fn parse_remote_url(remote_url: &str) -> Result<Url, url::ParseError> {
    match Url::parse(remote_url) {
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(RELATIVE_BASE)?.join(remote_url)
        }
        parsed => parsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::version::DerivedVersion;

    fn generator_with_versions(names: &[&str]) -> KeyGenerator {
        let mut generator = KeyGenerator::new("uploads");
        for name in names {
            generator.register_version(Box::new(DerivedVersion::new(*name)));
        }
        generator
    }

    #[test]
    fn current_key_is_generated_once() {
        let mut generator = KeyGenerator::new("uploads");
        let first = generator.current_key().to_string();
        let second = generator.current_key().to_string();

        assert_eq!(first, second);
        assert!(first.starts_with("uploads/"));
        assert!(first.ends_with("/${filename}"));

        let unique = first.split('/').nth(1).unwrap();
        assert!(Uuid::parse_str(unique).is_ok());
    }

    #[test]
    fn separate_generators_get_distinct_ids() {
        let a = KeyGenerator::new("uploads").current_key().to_string();
        let b = KeyGenerator::new("uploads").current_key().to_string();
        assert_ne!(a, b);
    }

    #[test]
    fn set_key_propagates_to_every_version() {
        let mut generator = generator_with_versions(&["thumb", "large"]);
        generator.set_key("uploads/abc/photo.jpg");

        assert_eq!(generator.current_key(), "uploads/abc/photo.jpg");
        let keys: Vec<_> = generator.versions().map(|v| v.key()).collect();
        assert_eq!(
            keys,
            vec![Some("uploads/abc/photo.jpg"), Some("uploads/abc/photo.jpg")]
        );
    }

    #[test]
    fn has_resolved_key_tracks_placeholder() {
        let mut generator = KeyGenerator::new("uploads");
        assert!(!generator.has_resolved_key());

        generator.current_key();
        assert!(!generator.has_resolved_key());

        generator.set_key("uploads/abc/photo.jpg");
        assert!(generator.has_resolved_key());

        generator.set_key("");
        assert!(!generator.has_resolved_key());
    }

    #[test]
    fn resolve_from_remote_url_replaces_placeholder() {
        let mut generator = generator_with_versions(&["thumb"]);
        let pending = generator.current_key().to_string();

        let filename = generator.resolve_from_remote_url(Some("https://host/path/photo.jpg?x=1"));
        assert_eq!(filename.as_deref(), Some("photo.jpg"));

        let expected = pending.replace(FILENAME_WILDCARD, "photo.jpg");
        assert_eq!(generator.current_key(), expected);
        assert!(generator.has_resolved_key());

        let version = generator.versions().next().unwrap();
        assert_eq!(version.key(), Some(expected.as_str()));
    }

    #[test]
    fn resolve_decodes_and_flattens() {
        let mut generator = KeyGenerator::new("uploads");
        let filename =
            generator.resolve_from_remote_url(Some("https://host/a/b/c/my%20photo.png#frag"));
        assert_eq!(filename.as_deref(), Some("my photo.png"));

        let display = generator.display_filename().unwrap();
        let unique = generator.current_key().split('/').nth(1).unwrap().to_string();
        assert_eq!(display, format!("{}/my photo.png", unique));
    }

    #[test]
    fn resolve_is_noop_once_resolved() {
        let mut generator = KeyGenerator::new("uploads");
        generator.set_key("uploads/abc/original.jpg");

        assert_eq!(
            generator.resolve_from_remote_url(Some("https://host/other.jpg")),
            None
        );
        assert_eq!(generator.current_key(), "uploads/abc/original.jpg");
    }

    #[test]
    fn resolve_without_source_is_none() {
        let mut generator = KeyGenerator::new("uploads");
        assert_eq!(generator.resolve_from_remote_url(None), None);
        assert_eq!(generator.resolve_from_remote_url(Some("https://[broken")), None);
        assert_eq!(generator.resolve_from_remote_url(Some("https://host/")), None);
        assert!(!generator.has_resolved_key());
        assert_eq!(generator.display_filename(), None);
    }

    #[test]
    fn filename_from_url_rejects_traversal() {
        assert_eq!(filename_from_url("https://host/dir/..%2F..%2Fetc"), Some("etc".into()));
        assert_eq!(filename_from_url("https://host/dir/%2E%2E"), None);
        assert_eq!(filename_from_url("mailto:someone@example.com"), None);
    }

    #[test]
    fn filename_from_relative_path() {
        assert_eq!(filename_from_url("/images/photo.jpg"), Some("photo.jpg".into()));
        assert_eq!(filename_from_url("images/photo.jpg?v=3"), Some("photo.jpg".into()));
        assert_eq!(filename_from_url("photo.jpg"), Some("photo.jpg".into()));
        assert_eq!(filename_from_url("/images/"), None);

        let mut generator = KeyGenerator::new("uploads");
        let filename = generator.resolve_from_remote_url(Some("/images/cat.png"));
        assert_eq!(filename.as_deref(), Some("cat.png"));
        assert!(generator.current_key().ends_with("/cat.png"));
    }

    #[test]
    fn filename_from_url_decodes_plus_as_space() {
        assert_eq!(
            filename_from_url("https://host/a/my+photo%2B1.jpg"),
            Some("my photo+1.jpg".into())
        );
        assert_eq!(
            filename_from_url("/images/summer+2026.png"),
            Some("summer 2026.png".into())
        );
    }

    #[test]
    fn display_filename_keeps_last_two_segments() {
        let mut generator = KeyGenerator::new("uploads");
        generator.set_key("uploads/abc/photo.jpg");
        assert_eq!(generator.display_filename().as_deref(), Some("abc/photo.jpg"));

        generator.set_key("photo.jpg");
        assert_eq!(generator.display_filename().as_deref(), Some("photo.jpg"));
    }

    #[test]
    fn key_pattern_with_whitelist() {
        let pattern =
            KeyGenerator::key_match_pattern("uploads", &["jpg".into(), "png".into()]).unwrap();

        assert!(pattern.is_match("uploads/0f8e2a4c-1b3d-4e5f-8a9b-0c1d2e3f4a5b/photo.jpg"));
        assert!(pattern.is_match("uploads/abc123/nested/dir/photo.png"));
        assert!(!pattern.is_match("uploads/abc123/photo.gif"));
        assert!(!pattern.is_match("uploads/XYZ/photo.jpg"));
        assert!(!pattern.is_match("other/abc123/photo.jpg"));
        assert!(!pattern.is_match("uploads/abc123/${filename}"));
    }

    #[test]
    fn key_pattern_without_whitelist_allows_word_extension() {
        let pattern = KeyGenerator::key_match_pattern("a.b", &[]).unwrap();

        assert!(pattern.is_match("a.b/abc/file.tiff"));
        assert!(!pattern.is_match("axb/abc/file.tiff"));
        assert!(!pattern.is_match("a.b/abc/file"));
    }
}
