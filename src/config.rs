// runtime configuration, built once at startup and shared read-only

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::Error;
use crate::core::{RetryPolicy, SCHEMA};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub referer: String,
    pub app_title: String,
    pub schema: Arc<str>,
    pub denied_columns: Vec<String>,
}

impl Config {
    /// Config with defaults for everything but the credential.
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            referer: "http://localhost:8080/ai/chat".to_string(),
            app_title: "HayMart AI".to_string(),
            schema: Arc::from(SCHEMA),
            denied_columns: Vec::new(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Result<Self, Error> {
        let url = url.into();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::Config(format!("base url must be http(s): {url}")));
        }
        self.base_url = url.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, Error> {
        if timeout.is_zero() {
            return Err(Error::Config("timeout must be greater than zero".into()));
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_schema_file(mut self, path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read schema {}: {e}", path.display())))?;
        if text.trim().is_empty() {
            return Err(Error::Config(format!("schema {} is empty", path.display())));
        }
        self.schema = Arc::from(text);
        Ok(self)
    }

    pub fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn key_url(&self) -> String {
        format!("{}/key", self.base_url)
    }
}
