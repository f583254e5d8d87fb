// llm gateway - chat completions and rate limit introspection
// stateless: every call is one http request, retries are the caller's business

use std::fmt;

use crate::{Config, Error};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[async_trait]
pub trait Llm: Send + Sync {
    /// Send one system + user exchange, get the model's text back.
    async fn complete(&self, system: &str, user: &str) -> Result<String, Error>;

    /// Remaining request/token allowance for the configured key.
    async fn check_quota(&self) -> Result<QuotaReport, Error>;
}

/// OpenAI-compatible chat completion endpoint (OpenRouter by default).
pub struct OpenRouter {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    chat_url: String,
    key_url: String,
    referer: String,
    title: String,
}

// what we send
#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: u8,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

// what comes back
#[derive(Deserialize)]
struct Response {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct KeyInfo {
    rate_limits: QuotaReport,
}

/// One rate limit window as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub limit: u64,
    pub remaining: u64,
    pub reset_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaReport {
    pub requests: Window,
    pub tokens: Window,
}

impl fmt::Display for QuotaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let QuotaReport { requests: r, tokens: t } = self;
        writeln!(f, "🔑 API Key Limit:")?;
        writeln!(
            f,
            "- Requests: {} total, {} tersisa (reset {} detik)",
            r.limit, r.remaining, r.reset_seconds
        )?;
        write!(
            f,
            "- Tokens: {} total, {} tersisa (reset {} detik)",
            t.limit, t.remaining, t.reset_seconds
        )
    }
}

impl OpenRouter {
    pub fn new(config: &Config) -> Result<Self, Error> {
        if config.api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            chat_url: config.chat_url(),
            key_url: config.key_url(),
            referer: config.referer.clone(),
            title: config.app_title.clone(),
        })
    }

    async fn read_body(response: reqwest::Response) -> Result<String, Error> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl Llm for OpenRouter {
    async fn complete(&self, system: &str, user: &str) -> Result<String, Error> {
        let request = Request {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.chat_url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&request)
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        debug!(bytes = body.len(), "chat completion received");

        let response: Response = serde_json::from_str(&body)
            .map_err(|e| Error::MalformedResponse(format!("chat completion: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::MalformedResponse("missing choices[0].message.content".into()))
    }

    async fn check_quota(&self) -> Result<QuotaReport, Error> {
        let response = self
            .client
            .get(&self.key_url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        debug!(bytes = body.len(), "key info received");

        // every field is required, a missing one is a provider contract change
        let info: KeyInfo = serde_json::from_str(&body)
            .map_err(|e| Error::MalformedResponse(format!("key info: {e}")))?;

        Ok(info.rate_limits)
    }
}
