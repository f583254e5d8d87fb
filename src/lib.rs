// haymart-ai library - ask the store database questions in plain language

pub mod cli;
mod config;
mod core;
mod error;
mod server;

pub use crate::core::{
    Assistant, Db, FALLBACK_MESSAGES, Fallback, HEADER, Llm, NO_DATA, OpenRouter, Outcome, Picker,
    QueryExecutor, QueryResult, QuotaReport, REFUSAL, Rejection, RetryPolicy, SCHEMA, SafeSelect,
    Safety, Stage, Statement, ThreadRandom, Turn, Window, classify, format_rows, format_value,
    generation_prompt, narration_prompt, no_data_message, strip_code_fence,
};
pub use config::Config;
pub use error::Error;
pub use server::Server;
