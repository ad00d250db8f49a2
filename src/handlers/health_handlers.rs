//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks credentials and policy signing

use crate::services::upload_service::UploadService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that:
/// 1. Confirms an access key id and secret access key are configured.
/// 2. Builds and signs a throwaway policy with the live configuration.
///
/// Returns JSON describing each check. HTTP 200 when all checks pass,
/// HTTP 503 when any check fails.
pub async fn readyz(State(service): State<UploadService>) -> impl IntoResponse {
    // 1) Credentials check
    let credentials_check = match (
        service.config.access_key_id.trim().is_empty(),
        service.config.secret_access_key.is_empty(),
    ) {
        (false, false) => (true, None::<String>),
        (true, _) => (false, Some("access key id is not configured".to_string())),
        (false, true) => (false, Some("secret access key is not configured".to_string())),
    };

    // 2) Policy build + sign check
    let policy_check = match service.uploader().form_fields() {
        Ok(_) => (true, None::<String>),
        Err(e) => (false, Some(format!("error: {}", e))),
    };

    // Build response JSON
    let credentials_ok = credentials_check.0;
    let policy_ok = policy_check.0;
    let overall_ok = credentials_ok && policy_ok;

    let mut checks = HashMap::new();
    checks.insert(
        "credentials",
        CheckStatus {
            ok: credentials_ok,
            error: credentials_check.1,
        },
    );
    checks.insert(
        "policy",
        CheckStatus {
            ok: policy_ok,
            error: policy_check.1,
        },
    );

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
