// chat orchestration
//
// generate sql -> gate -> execute -> format -> narrate. every failure along
// the way turns into a fallback reply; refusals and empty results are normal
// outcomes with their own fixed text.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{Config, Error};

use super::ai::{Llm, QuotaReport};
use super::db::{QueryExecutor, QueryResult};
use super::fallback::Fallback;
use super::format::format_rows;
use super::prompt::{self, NARRATOR_SYSTEM, SQL_SYSTEM};
use super::retry::RetryPolicy;
use super::safety::{Safety, Statement};

pub const REFUSAL: &str = "❌ Demi keamanan, hanya query SELECT yang diizinkan.";

/// The message for a query that ran fine but matched nothing.
pub fn no_data_message(prompt: &str) -> String {
    format!("📭 Tidak ada data ditemukan (no data found) untuk pertanyaan: \"{prompt}\"")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Answered,
    Refused,
    NoData,
    Degraded,
}

/// Everything a chat turn produced, for adapters that want more than the text.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Generating,
    Executing,
    Narrating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Generating => "generating",
            Stage::Executing => "executing",
            Stage::Narrating => "narrating",
        };
        f.write_str(name)
    }
}

struct StageError {
    stage: Stage,
    sql: Option<String>,
    source: Error,
}

pub struct Assistant {
    llm: Arc<dyn Llm>,
    executor: Arc<dyn QueryExecutor>,
    safety: Safety,
    fallback: Fallback,
    retry: RetryPolicy,
    schema: Arc<str>,
}

impl Assistant {
    pub fn new(llm: Arc<dyn Llm>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            llm,
            executor,
            safety: Safety::new(),
            fallback: Fallback::default(),
            retry: RetryPolicy::default(),
            schema: Arc::from(prompt::SCHEMA),
        }
    }

    pub fn from_config(
        config: &Config,
        llm: Arc<dyn Llm>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        Self::new(llm, executor)
            .with_safety(Safety::with_denied_columns(&config.denied_columns))
            .with_retry(config.retry)
            .with_schema(config.schema.clone())
    }

    pub fn with_safety(mut self, safety: Safety) -> Self {
        self.safety = safety;
        self
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_schema(mut self, schema: Arc<str>) -> Self {
        self.schema = schema;
        self
    }

    /// Answer a question. Never fails: degraded turns get a fallback reply.
    pub async fn chat(&self, prompt: &str) -> String {
        self.turn(prompt).await.answer
    }

    pub async fn turn(&self, prompt: &str) -> Turn {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            warn!("empty prompt reached the assistant");
            return self.degraded(None);
        }

        match self.run(prompt).await {
            Ok(turn) => turn,
            Err(StageError { stage, sql, source }) => {
                error!(%stage, sql = sql.as_deref().unwrap_or(""), "chat turn degraded: {source}");
                self.degraded(sql)
            }
        }
    }

    async fn run(&self, prompt: &str) -> Result<Turn, StageError> {
        info!("generating sql");
        let generation = prompt::generation_prompt(&self.schema, prompt);
        let raw = self
            .retry
            .run("sql generation", || self.llm.complete(SQL_SYSTEM, &generation))
            .await
            .map_err(|source| StageError {
                stage: Stage::Generating,
                sql: None,
                source,
            })?;

        let select = match self.safety.classify(prompt::strip_code_fence(&raw)) {
            Statement::SafeSelect(select) => select,
            Statement::Rejected { sql, reason } => {
                warn!(%sql, "refusing generated statement: {reason}");
                return Ok(Turn {
                    answer: REFUSAL.to_string(),
                    sql: Some(sql),
                    outcome: Outcome::Refused,
                });
            }
        };
        let sql = select.as_str().to_string();
        debug!(%sql, "executing");

        let result: QueryResult =
            self.executor
                .execute(&select)
                .await
                .map_err(|source| StageError {
                    stage: Stage::Executing,
                    sql: Some(sql.clone()),
                    source,
                })?;

        if result.is_empty() {
            info!("query returned no rows");
            return Ok(Turn {
                answer: no_data_message(prompt),
                sql: Some(sql),
                outcome: Outcome::NoData,
            });
        }

        info!(rows = result.row_count, "narrating result");
        let narration = prompt::narration_prompt(prompt, &format_rows(&result));
        let answer = self
            .retry
            .run("narration", || self.llm.complete(NARRATOR_SYSTEM, &narration))
            .await
            .map_err(|source| StageError {
                stage: Stage::Narrating,
                sql: Some(sql.clone()),
                source,
            })?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(StageError {
                stage: Stage::Narrating,
                sql: Some(sql),
                source: Error::MalformedResponse("empty narration".into()),
            });
        }

        Ok(Turn {
            answer: answer.to_string(),
            sql: Some(sql),
            outcome: Outcome::Answered,
        })
    }

    fn degraded(&self, sql: Option<String>) -> Turn {
        Turn {
            answer: self.fallback.pick().to_string(),
            sql,
            outcome: Outcome::Degraded,
        }
    }

    /// Diagnostic call, so failures are handed back instead of papered over.
    pub async fn check_quota(&self) -> Result<QuotaReport, Error> {
        self.llm.check_quota().await
    }
}
