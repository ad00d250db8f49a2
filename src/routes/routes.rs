//! Defines routes for direct-upload authorization.
//!
//! ## Structure
//! - **Health endpoints**
//!   - `GET  /healthz` — liveness
//!   - `GET  /readyz` — credentials + policy signing
//!
//! - **Upload endpoints**
//!   - `POST /uploads` — key, policy and signature for a new browser upload
//!   - `POST /uploads/resolve` — resolve a pending key from a remote url
//!   - `GET  /uploads/verify?key=` — check a key against the key pattern

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        upload_handlers::{authorize_upload, resolve_upload, verify_key},
    },
    services::upload_service::UploadService,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for all upload routes.
///
/// The router carries shared state (`UploadService`) to all handlers.
pub fn routes() -> Router<UploadService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // upload endpoints
        .route("/uploads", post(authorize_upload))
        .route("/uploads/resolve", post(resolve_upload))
        .route("/uploads/verify", get(verify_key))
}
