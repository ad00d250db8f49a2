//! Hidden form fields handed to the browser for a direct POST upload.

use serde::Serialize;

/// Everything a browser needs to POST a file straight to the bucket.
///
/// Field names follow the POST Object form, so the JSON can be spread into
/// the form as-is.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct UploadForm {
    /// Form action: the bucket's base URL.
    pub action: String,

    /// Object key template, usually ending in `${filename}`.
    pub key: String,

    #[serde(rename = "AWSAccessKeyId")]
    pub aws_access_key_id: String,

    pub acl: String,

    /// Base64 policy document.
    pub policy: String,

    /// Base64 HMAC-SHA1 of `policy`.
    pub signature: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_action_redirect: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_action_status: Option<String>,

    /// Matches the `$utf8` starts-with condition of the policy.
    pub utf8: String,
}
