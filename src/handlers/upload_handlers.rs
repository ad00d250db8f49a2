//! HTTP handlers for direct-upload authorization.
//! Each request gets its own uploader; nothing here stores or proxies file
//! bytes, the browser posts those straight to the bucket.

use crate::{
    errors::AppError,
    models::form::UploadForm,
    services::upload_service::{ResolvedUpload, UploadService},
};
use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

/// Optional body for `POST /uploads`.
#[derive(Debug, Default, Deserialize)]
pub struct AuthorizeUploadReq {
    /// Per-upload redirect target, overriding the configured one.
    pub success_action_redirect: Option<String>,
}

/// Body for `POST /uploads/resolve`.
#[derive(Debug, Deserialize)]
pub struct ResolveUploadReq {
    pub key: Option<String>,
    pub remote_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyKeyQuery {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyKeyResp {
    pub key: String,
    pub valid: bool,
}

/// POST `/uploads` — fresh key, policy and signature for one browser upload.
pub async fn authorize_upload(
    State(service): State<UploadService>,
    payload: Option<Json<AuthorizeUploadReq>>,
) -> Result<Json<UploadForm>, AppError> {
    let req = payload.map(|Json(req)| req).unwrap_or_default();
    let form = service.authorize(req.success_action_redirect)?;
    Ok(Json(form))
}

/// POST `/uploads/resolve` — settle the filename of a key from a remote url.
pub async fn resolve_upload(
    State(service): State<UploadService>,
    Json(req): Json<ResolveUploadReq>,
) -> Json<ResolvedUpload> {
    Json(service.resolve(req.key, req.remote_url.as_deref()))
}

/// GET `/uploads/verify?key=` — check a submitted key against the key pattern.
pub async fn verify_key(
    State(service): State<UploadService>,
    Query(q): Query<VerifyKeyQuery>,
) -> Result<Json<VerifyKeyResp>, AppError> {
    if q.key.trim().is_empty() {
        return Err(AppError::bad_request("key must not be empty"));
    }
    let valid = service.verify(&q.key);
    Ok(Json(VerifyKeyResp { key: q.key, valid }))
}
