//! # tgbed: Telegram-backed file hosting gateway
//!
//! `tgbed` is a small HTTP gateway that uses a Telegram channel as a backing
//! object store. Clients upload a file over HTTP multipart, the gateway
//! forwards it to the channel through the Bot API, and later serves the same
//! bytes back from a stable URL.
//!
//! The whole system is a request-translation layer: validate an inbound
//! multipart upload, delegate storage to Telegram, translate the returned
//! opaque `file_id` into a retrieval URL, and resolve that identifier back
//! into bytes with content-type negotiation. There is no local persistence -
//! the only durable record of a stored object lives in Telegram.
//!
//! ## Request flow
//!
//! `POST /upload/` checks the optional shared-secret bearer, buffers the body
//! (20 MiB ceiling), submits it as a photo (`image/*` declared types) or a
//! document (everything else), and answers with
//! `{base_url}/file/{file_id}/{encoded_filename}`.
//!
//! `GET /image/{file_id}{.ext}` strips the synthetic extension, resolves the
//! identifier to a short-lived download URL via `getFile`, and serves the
//! bytes inline. `GET /file/{file_id}/{filename}` does the same with the raw
//! identifier and serves the bytes as an attachment under the original name.
//!
//! ## Lifecycle
//!
//! A single [`telegram::StorageHandle`] is created at startup (the bot token
//! is verified with `getMe`), injected into handlers through [`AppState`],
//! and dropped at shutdown. Retrieval handlers rebuild a missing handle
//! lazily; the rebuild is idempotent and race-safe.

pub mod api;
pub mod config;
pub mod content_type;
pub mod errors;
mod static_assets;
pub mod telegram;
pub mod telemetry;

pub use config::Config;

use crate::telegram::StorageHandle;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, error, info};

/// Headroom above the upload ceiling for multipart framing, so the handler's
/// own strict-`>` check is what rejects oversized files (with the JSON
/// envelope), not the framework's body limit.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<StorageHandle>,
}

/// Build the application router with all endpoints and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes as usize + MULTIPART_OVERHEAD;

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/", get(api::handlers::static_assets::landing_page))
        .route("/static/{*path}", get(api::handlers::static_assets::serve_asset))
        .route(
            "/upload/",
            post(api::handlers::upload::upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/image/{file_id}", get(api::handlers::fetch::get_image))
        .route("/file/{file_id}/{filename}", get(api::handlers::fetch::get_file))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns the router, configuration, and the
/// storage client lifecycle.
pub struct Application {
    router: Router,
    config: Config,
    storage: Arc<StorageHandle>,
}

impl Application {
    /// Create a new application instance.
    ///
    /// The bot token is verified with `getMe`; a failed probe is logged but
    /// not fatal - the handle stays empty and retrieval handlers rebuild it
    /// on demand, while uploads answer 500 until the token works.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let storage = Arc::new(StorageHandle::new(config.telegram()));

        match storage.connect().await {
            Ok(username) => info!(bot = %username, "bot initialized successfully"),
            Err(e) => error!("failed to initialize bot: {e}"),
        }

        let state = AppState {
            config: config.clone(),
            storage: storage.clone(),
        };
        let router = build_router(state);

        Ok(Self { router, config, storage })
    }

    /// Start serving the application until the shutdown future resolves.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("tgbed listening on http://{bind_addr}");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing storage client...");
        self.storage.close();

        Ok(())
    }
}
