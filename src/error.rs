use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    #[diagnostic(code(haymart::database))]
    Database(#[from] sqlx::Error),

    #[error("LLM provider returned {status}: {body}")]
    #[diagnostic(code(haymart::upstream))]
    Upstream { status: u16, body: String },

    #[error("LLM provider response is malformed: {0}")]
    #[diagnostic(code(haymart::upstream::malformed))]
    MalformedResponse(String),

    #[error("Missing API key. Set OPENROUTER_API_KEY or pass --api-key")]
    #[diagnostic(code(haymart::config::api_key))]
    MissingApiKey,

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(haymart::config))]
    Config(String),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(haymart::http), help("check network access to the LLM provider"))]
    Http(#[from] reqwest::Error),

    #[error("Server error: {0}")]
    #[diagnostic(code(haymart::server))]
    Server(String),
}

impl Error {
    /// Failures worth another attempt: transport faults, timeouts, 429 and 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// True for anything that came from talking to the LLM provider.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Upstream { .. } | Error::MalformedResponse(_) | Error::Http(_)
        )
    }
}
