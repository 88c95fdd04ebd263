//! Typed client for the Telegram Bot API, used purely as an object store.
//!
//! The gateway never interprets `file_id` values - they are opaque,
//! origin-assigned identifiers that must round-trip byte-for-byte. The API
//! base URL is configurable so tests (and self-hosted Bot API servers) can
//! point the client elsewhere.

use arc_swap::ArcSwapOption;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Connection settings for the storage client.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
    pub api_url: Url,
}

#[derive(Debug, Error)]
pub enum TelegramError {
    /// The Bot API answered, but with `ok: false` or an unusable payload
    #[error("Telegram API error: {0}")]
    Api(String),

    /// Transport failure talking to the API or the download host. The source
    /// error is stored with its URL stripped - request URLs embed the bot
    /// token, which must never reach logs or response envelopes.
    #[error("network error: {0}")]
    Http(reqwest::Error),

    /// The download host answered with a non-success status
    #[error("upstream status {status}: {body}")]
    Status { status: u16, body: String },

    /// The download host answered 200 but the body read failed mid-stream
    #[error("failed to read upstream body: {0}")]
    Read(#[source] reqwest::Error),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        TelegramError::Http(e.without_url())
    }
}

/// Generic Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BotInfo {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Message {
    photo: Option<Vec<PhotoSize>>,
    document: Option<Document>,
}

/// One resolution variant of a stored photo. Telegram orders these smallest
/// to largest.
#[derive(Debug, Deserialize)]
struct PhotoSize {
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct Document {
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

/// A downloaded object, buffered in full.
#[derive(Debug)]
pub struct FetchedFile {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// Thin reqwest-based client over the Bot API methods the gateway needs.
pub struct TelegramClient {
    http: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_url.as_str().trim_end_matches('/'),
            self.config.token,
            method
        )
    }

    /// Short-lived download URL for a `file_path` returned by `getFile`.
    fn download_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.config.api_url.as_str().trim_end_matches('/'),
            self.config.token,
            file_path
        )
    }

    async fn into_result<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TelegramError> {
        let status = response.status();
        let body: ApiResponse<T> = response.json().await.map_err(|e| {
            TelegramError::Api(format!(
                "unparseable API response (HTTP {status}): {}",
                e.without_url()
            ))
        })?;

        if !body.ok {
            return Err(TelegramError::Api(
                body.description.unwrap_or_else(|| format!("HTTP {status}")),
            ));
        }
        body.result
            .ok_or_else(|| TelegramError::Api("API response missing result".to_string()))
    }

    /// Verify the bot token by fetching the bot's own account info.
    pub async fn get_me(&self) -> Result<BotInfo, TelegramError> {
        let response = self.http.get(self.method_url("getMe")).send().await?;
        Self::into_result(response).await
    }

    /// Store bytes as a photo message; returns the `file_id` of the largest
    /// size variant (the last entry, by the Bot API's ordering).
    pub async fn send_photo(&self, data: Vec<u8>) -> Result<String, TelegramError> {
        let form = Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .part("photo", Part::bytes(data).file_name("upload"));

        let response = self.http.post(self.method_url("sendPhoto")).multipart(form).send().await?;
        let message: Message = Self::into_result(response).await?;

        largest_photo_file_id(&message)
            .map(str::to_owned)
            .ok_or_else(|| TelegramError::Api("sendPhoto response contained no photo sizes".to_string()))
    }

    /// Store bytes as a document message, preserving the original filename.
    pub async fn send_document(&self, data: Vec<u8>, filename: &str) -> Result<String, TelegramError> {
        let form = Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .part("document", Part::bytes(data).file_name(filename.to_owned()));

        let response = self.http.post(self.method_url("sendDocument")).multipart(form).send().await?;
        let message: Message = Self::into_result(response).await?;

        message
            .document
            .map(|d| d.file_id)
            .ok_or_else(|| TelegramError::Api("sendDocument response contained no document".to_string()))
    }

    /// Resolve an opaque `file_id` to a short-lived download URL.
    pub async fn get_file(&self, file_id: &str) -> Result<String, TelegramError> {
        debug!(file_id, "resolving file via getFile");
        let response = self
            .http
            .get(self.method_url("getFile"))
            .query(&[("file_id", file_id)])
            .send()
            .await?;
        let info: FileInfo = Self::into_result(response).await?;

        let file_path = info
            .file_path
            .ok_or_else(|| TelegramError::Api("getFile response missing file_path".to_string()))?;
        Ok(self.download_url(&file_path))
    }

    /// Fetch the object bytes from a resolved download URL.
    ///
    /// The three failure classes are kept distinct: transport failure on send
    /// ([`TelegramError::Http`]), non-success upstream status
    /// ([`TelegramError::Status`]), and a failed body read
    /// ([`TelegramError::Read`]).
    pub async fn fetch_url(&self, url: &str) -> Result<FetchedFile, TelegramError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelegramError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await.map_err(|e| TelegramError::Read(e.without_url()))?;

        debug!(size = bytes.len(), "downloaded file from upstream");
        Ok(FetchedFile { bytes, content_type })
    }
}

/// Photo messages carry one `file_id` per resolution; the last is the largest.
fn largest_photo_file_id(message: &Message) -> Option<&str> {
    message
        .photo
        .as_ref()
        .and_then(|sizes| sizes.last())
        .map(|p| p.file_id.as_str())
}

/// Process-wide storage client handle.
///
/// Created once at startup and dropped at shutdown. Retrieval handlers call
/// [`ensure_ready`](StorageHandle::ensure_ready) to lazily rebuild a handle
/// that was never established; two racing rebuilds are both fine - the
/// contract is only that afterwards the handle is non-null and usable.
pub struct StorageHandle {
    client: ArcSwapOption<TelegramClient>,
    config: TelegramConfig,
}

impl StorageHandle {
    /// Create an empty (unconnected) handle.
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            client: ArcSwapOption::empty(),
            config,
        }
    }

    /// Build a client and verify the token with `getMe`. Returns the bot username.
    pub async fn connect(&self) -> Result<String, TelegramError> {
        let client = Arc::new(TelegramClient::new(self.config.clone())?);
        let me = client.get_me().await?;
        self.client.store(Some(client));

        let username = me.username.unwrap_or_else(|| "<unknown>".to_string());
        info!(bot = %username, "storage client connected");
        Ok(username)
    }

    /// The current client, if one was established.
    pub fn get(&self) -> Option<Arc<TelegramClient>> {
        self.client.load_full()
    }

    /// Return the current client, rebuilding it if absent.
    ///
    /// Idempotent and race-safe: concurrent callers may each build a client,
    /// and whichever store lands last wins. No network round-trip is made
    /// here, matching the scoped-lifecycle design where token verification
    /// happens once at startup.
    pub fn ensure_ready(&self) -> Result<Arc<TelegramClient>, TelegramError> {
        if let Some(client) = self.client.load_full() {
            return Ok(client);
        }

        info!("storage client not initialized, rebuilding");
        let client = Arc::new(TelegramClient::new(self.config.clone())?);
        self.client.store(Some(client.clone()));
        Ok(client)
    }

    /// Drop the client on shutdown.
    pub fn close(&self) {
        self.client.store(None);
    }
}
