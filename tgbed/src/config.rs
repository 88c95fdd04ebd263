//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The
//! configuration file path defaults to `config.yaml` but can be specified via `-f` flag or
//! `TGBED_CONFIG` environment variable.
//!
//! Sources are merged in order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `TGBED_` override YAML values
//!
//! For nested values, use double underscores in environment variables, e.g.
//! `TGBED_UPLOAD_PASSWORD=hunter2` or `TGBED_PORT=8080`.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::telegram::TelegramConfig;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "TGBED_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// Loaded from YAML and environment variables; all fields have defaults so a
/// minimal config file only needs `bot_token`, `chat_id` and `base_url`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Public base URL used when constructing retrieval URLs
    /// (e.g., "https://files.example.com")
    pub base_url: String,
    /// Telegram bot token
    pub bot_token: String,
    /// Target channel identifier the bot stores files in
    pub chat_id: String,
    /// Optional shared secret; when set, uploads require `Authorization: Bearer <secret>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_password: Option<String>,
    /// Telegram Bot API base URL. Overridable for self-hosted API servers and tests.
    pub telegram_api_url: Url,
    /// Upload size ceiling in bytes, strict greater-than
    pub max_upload_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 21351,
            base_url: "http://localhost:21351".to_string(),
            bot_token: String::new(),
            chat_id: String::new(),
            upload_password: None,
            telegram_api_url: Url::parse("https://api.telegram.org").unwrap(),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // Retrieval URLs are built by appending path segments; a trailing
        // slash in base_url would produce double slashes.
        while config.base_url.ends_with('/') {
            config.base_url.pop();
        }

        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("TGBED_").split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The subset of configuration the storage client needs.
    pub fn telegram(&self) -> TelegramConfig {
        TelegramConfig {
            token: self.bot_token.clone(),
            chat_id: self.chat_id.clone(),
            api_url: self.telegram_api_url.clone(),
        }
    }
}
