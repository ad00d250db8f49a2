use anyhow::Result;
use axum::Router;
use direct_upload::{config::AppConfig, routes, services::upload_service::UploadService};
use std::io::ErrorKind;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting direct-upload with config: {:?}", cfg);

    if cfg.uploader.bucket.is_empty() {
        tracing::warn!("No bucket configured; upload authorization will fail until one is set");
    }
    if cfg.uploader.secret_access_key.is_empty() {
        tracing::warn!("DIRECT_UPLOAD_SECRET_ACCESS_KEY is not set; policies cannot be signed");
    }

    // --- Initialize core service ---
    let service = UploadService::new(cfg.uploader.clone());

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(service);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
