//! Represents the upload policy document a POST upload endpoint enforces.

use serde::{
    Deserialize, Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};
use serde_json::Value;
use std::fmt;

/// Canned ACL applied to the uploaded object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Acl {
    #[serde(rename = "public-read")]
    PublicRead,
    #[serde(rename = "private")]
    Private,
}

impl Acl {
    pub fn from_public(public: bool) -> Self {
        if public { Acl::PublicRead } else { Acl::Private }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Acl::PublicRead => "public-read",
            Acl::Private => "private",
        }
    }
}

impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule within the policy's `conditions` list.
///
/// Serializes to the shapes the storage API expects: an exact match is a
/// single-entry map (`{"bucket":"photos"}`), the other operators are arrays
/// (`["starts-with","$key","uploads"]`).
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// `["starts-with", "$field", prefix]`
    StartsWith { field: String, prefix: String },

    /// `{field: value}`
    Exact { field: String, value: Value },

    /// `["content-length-range", min, max]`
    ContentLengthRange { min: u64, max: u64 },

    /// A caller-supplied clause copied into the document verbatim.
    Raw(Value),
}

impl Condition {
    pub fn starts_with(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Condition::StartsWith {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    pub fn exact(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Exact {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl Serialize for Condition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Condition::StartsWith { field, prefix } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element("starts-with")?;
                seq.serialize_element(&format!("${}", field))?;
                seq.serialize_element(prefix)?;
                seq.end()
            }
            Condition::Exact { field, value } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(field, value)?;
                map.end()
            }
            Condition::ContentLengthRange { min, max } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element("content-length-range")?;
                seq.serialize_element(min)?;
                seq.serialize_element(max)?;
                seq.end()
            }
            Condition::Raw(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Extra conditions come from configuration and are kept as written.
        Value::deserialize(deserializer).map(Condition::Raw)
    }
}

/// What the storage provider does once the upload succeeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SuccessAction {
    /// No clause; the provider answers with its default status.
    None,

    /// `{"success_action_status": "201"}`
    Status(u16),

    /// `{"success_action_redirect": url}`
    Redirect(String),
}

impl SuccessAction {
    pub fn condition(&self) -> Option<Condition> {
        match self {
            SuccessAction::None => None,
            SuccessAction::Status(status) => Some(Condition::exact(
                "success_action_status",
                status.to_string(),
            )),
            SuccessAction::Redirect(url) => {
                Some(Condition::exact("success_action_redirect", url.as_str()))
            }
        }
    }
}

/// The document that gets base64-encoded and signed.
///
/// Field order matters for readability of the decoded policy, so it is fixed
/// by the struct layout: `expiration` first, then `conditions`.
#[derive(Clone, Debug, Serialize)]
pub struct PolicyDocument {
    /// ISO-8601 UTC timestamp after which the provider rejects the form.
    pub expiration: String,

    /// Ordered condition clauses.
    pub conditions: Vec<Condition>,
}
