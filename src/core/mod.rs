// core logic - llm gateway, safety gate, execution and the chat pipeline

mod ai;
mod chat;
mod db;
mod fallback;
mod format;
mod prompt;
mod retry;
mod safety;

pub use ai::{Llm, OpenRouter, QuotaReport, Window};
pub use chat::{Assistant, Outcome, REFUSAL, Stage, Turn, no_data_message};
pub use db::{Db, QueryExecutor, QueryResult};
pub use fallback::{FALLBACK_MESSAGES, Fallback, Picker, ThreadRandom};
pub use format::{HEADER, NO_DATA, format_rows, format_value};
pub use prompt::{SCHEMA, generation_prompt, narration_prompt, strip_code_fence};
pub use retry::RetryPolicy;
pub use safety::{Rejection, SafeSelect, Safety, Statement, classify};
