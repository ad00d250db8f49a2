use crate::models::policy::Condition;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::{env, fmt, str::FromStr};

/// Seconds a signed policy stays valid when nothing else is configured.
pub const DEFAULT_EXPIRATION_SECONDS: i64 = 10 * 60;

/// Upper bound on the upload size when nothing else is configured (5 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Which success clause goes into the policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SuccessPolicy {
    /// No clause.
    #[default]
    Default,
    /// `{"success_action_status": "201"}`
    Status,
    /// `{"success_action_redirect": <url>}`
    Redirect,
}

/// Immutable settings for one kind of direct uploader.
///
/// Credentials are plain fields; nothing is looked up at call time.
#[derive(Clone)]
pub struct UploaderConfig {
    /// Directory prefix every key starts with, e.g. `uploads`.
    pub store_dir: String,
    pub expiration_seconds: i64,
    /// `None` or zero fails policy construction.
    pub max_file_size: Option<u64>,
    /// Selects `public-read` over `private`.
    pub public: bool,
    /// Allowed file extensions; empty allows any word extension.
    pub extension_whitelist: Vec<String>,
    pub extra_policy_conditions: Vec<Condition>,
    pub success_policy: SuccessPolicy,
    /// Default redirect target for [`SuccessPolicy::Redirect`].
    pub success_action_redirect: Option<String>,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Base URL of the bucket; defaults to the virtual-hosted S3 endpoint.
    pub asset_host: Option<String>,
    /// Names of derived versions that share the main key.
    pub versions: Vec<String>,
}

impl UploaderConfig {
    pub fn new(
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            store_dir: "uploads".into(),
            expiration_seconds: DEFAULT_EXPIRATION_SECONDS,
            max_file_size: Some(DEFAULT_MAX_FILE_SIZE),
            public: true,
            extension_whitelist: Vec::new(),
            extra_policy_conditions: Vec::new(),
            success_policy: SuccessPolicy::Default,
            success_action_redirect: None,
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            asset_host: None,
            versions: Vec::new(),
        }
    }

    pub fn bucket_url(&self) -> String {
        match &self.asset_host {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => format!("https://{}.s3.amazonaws.com", self.bucket),
        }
    }
}

impl fmt::Debug for UploaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploaderConfig")
            .field("store_dir", &self.store_dir)
            .field("expiration_seconds", &self.expiration_seconds)
            .field("max_file_size", &self.max_file_size)
            .field("public", &self.public)
            .field("extension_whitelist", &self.extension_whitelist)
            .field("extra_policy_conditions", &self.extra_policy_conditions)
            .field("success_policy", &self.success_policy)
            .field("success_action_redirect", &self.success_action_redirect)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("asset_host", &self.asset_host)
            .field("versions", &self.versions)
            .finish()
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub uploader: UploaderConfig,
}

/// Command-line + environment configuration.
///
/// Credentials are read from the environment only.
#[derive(Parser, Debug)]
#[command(author, version, about = "Signed direct-to-bucket upload policies")]
pub struct Args {
    /// Host to bind to (overrides DIRECT_UPLOAD_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides DIRECT_UPLOAD_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Key prefix for uploaded objects (overrides DIRECT_UPLOAD_STORE_DIR)
    #[arg(long)]
    pub store_dir: Option<String>,

    /// Destination bucket (overrides DIRECT_UPLOAD_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Policy lifetime in seconds (overrides DIRECT_UPLOAD_EXPIRATION_SECONDS)
    #[arg(long)]
    pub expiration_seconds: Option<i64>,

    /// Largest accepted upload in bytes (overrides DIRECT_UPLOAD_MAX_FILE_SIZE)
    #[arg(long)]
    pub max_file_size: Option<u64>,

    /// Upload objects with the `private` ACL (overrides DIRECT_UPLOAD_PUBLIC)
    #[arg(long)]
    pub private: bool,

    /// Success clause (overrides DIRECT_UPLOAD_SUCCESS_POLICY)
    #[arg(long, value_enum)]
    pub success_policy: Option<SuccessPolicy>,

    /// Redirect target for the redirect success policy
    /// (overrides DIRECT_UPLOAD_SUCCESS_ACTION_REDIRECT)
    #[arg(long)]
    pub success_action_redirect: Option<String>,

    /// Bucket base URL (overrides DIRECT_UPLOAD_ASSET_HOST)
    #[arg(long)]
    pub asset_host: Option<String>,

    /// Comma-separated allowed extensions (overrides DIRECT_UPLOAD_EXTENSION_WHITELIST)
    #[arg(long, value_delimiter = ',')]
    pub extension_whitelist: Option<Vec<String>>,

    /// Comma-separated derived version names (overrides DIRECT_UPLOAD_VERSIONS)
    #[arg(long, value_delimiter = ',')]
    pub versions: Option<Vec<String>>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::merge(Args::parse())
    }

    fn merge(args: Args) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = env::var("DIRECT_UPLOAD_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = env_parse("DIRECT_UPLOAD_PORT", 3000u16)?;
        let env_store_dir =
            env::var("DIRECT_UPLOAD_STORE_DIR").unwrap_or_else(|_| "uploads".into());
        let env_bucket = env::var("DIRECT_UPLOAD_BUCKET").unwrap_or_default();
        let env_expiration =
            env_parse("DIRECT_UPLOAD_EXPIRATION_SECONDS", DEFAULT_EXPIRATION_SECONDS)?;
        let env_max_size = env_parse("DIRECT_UPLOAD_MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE)?;
        let env_public = env_parse("DIRECT_UPLOAD_PUBLIC", true)?;
        let env_success_policy = match env::var("DIRECT_UPLOAD_SUCCESS_POLICY") {
            Ok(value) => <SuccessPolicy as ValueEnum>::from_str(&value, true)
                .map_err(anyhow::Error::msg)
                .with_context(|| {
                    format!("parsing DIRECT_UPLOAD_SUCCESS_POLICY value `{}`", value)
                })?,
            Err(_) => SuccessPolicy::Default,
        };
        let env_extra_conditions = match env::var("DIRECT_UPLOAD_EXTRA_POLICY_CONDITIONS") {
            Ok(value) => parse_conditions(&value)?,
            Err(_) => Vec::new(),
        };

        let access_key_id = env::var("DIRECT_UPLOAD_ACCESS_KEY_ID").unwrap_or_default();
        let secret_access_key = env::var("DIRECT_UPLOAD_SECRET_ACCESS_KEY").unwrap_or_default();

        // --- Merge ---
        let uploader = UploaderConfig {
            store_dir: args.store_dir.unwrap_or(env_store_dir),
            expiration_seconds: args.expiration_seconds.unwrap_or(env_expiration),
            max_file_size: Some(args.max_file_size.unwrap_or(env_max_size)),
            public: !args.private && env_public,
            extension_whitelist: args.extension_whitelist.unwrap_or_else(|| {
                split_list(&env::var("DIRECT_UPLOAD_EXTENSION_WHITELIST").unwrap_or_default())
            }),
            extra_policy_conditions: env_extra_conditions,
            success_policy: args.success_policy.unwrap_or(env_success_policy),
            success_action_redirect: args
                .success_action_redirect
                .or_else(|| env::var("DIRECT_UPLOAD_SUCCESS_ACTION_REDIRECT").ok()),
            bucket: args.bucket.unwrap_or(env_bucket),
            access_key_id,
            secret_access_key,
            asset_host: args
                .asset_host
                .or_else(|| env::var("DIRECT_UPLOAD_ASSET_HOST").ok()),
            versions: args.versions.unwrap_or_else(|| {
                split_list(&env::var("DIRECT_UPLOAD_VERSIONS").unwrap_or_default())
            }),
        };

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            uploader,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

/// Parse a JSON array of policy condition clauses.
pub fn parse_conditions(raw: &str) -> Result<Vec<Condition>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).context("parsing extra policy conditions as a JSON array")
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
