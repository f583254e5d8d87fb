// command line interface

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::{Assistant, Config, Db, Error, Llm, OpenRouter, RetryPolicy, SCHEMA, Server};
use crate::config::{DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use clap::{Args, Parser, Subcommand};
use miette::Result;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "haymart-ai", about = "Ask the HayMart database questions in plain language")]
struct Cli {
    /// database connection url
    #[arg(long, short, env = "DATABASE_URL", global = true)]
    db: Option<String>,

    /// debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(flatten)]
    llm: LlmArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LlmArgs {
    /// api key for the llm provider
    #[arg(long, short = 'k', env = "OPENROUTER_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// provider base url, /chat/completions and /key are appended
    #[arg(long, env = "LLM_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    #[arg(long, env = "LLM_MODEL", default_value = DEFAULT_MODEL, global = true)]
    model: String,

    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS, global = true)]
    max_tokens: u32,

    /// per request timeout
    #[arg(long, default_value_t = 30, global = true)]
    timeout_secs: u64,

    /// attempts per llm call, first one included
    #[arg(long, default_value_t = 3, global = true)]
    max_attempts: u32,

    /// first retry delay, doubles each time
    #[arg(long, default_value_t = 500, global = true)]
    retry_delay_ms: u64,

    #[arg(long, default_value = "http://localhost:8080/ai/chat", global = true)]
    referer: String,

    #[arg(long, default_value = "HayMart AI", global = true)]
    app_title: String,

    /// replace the built-in schema description
    #[arg(long, global = true)]
    schema_file: Option<PathBuf>,

    /// column the generated sql may never read (repeatable)
    #[arg(long = "deny-column", global = true)]
    deny_columns: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// ask one question and print the answer
    Ask {
        prompt: String,

        /// also print the generated sql
        #[arg(long)]
        show_sql: bool,
    },

    /// show the provider rate limits for the api key
    Quota,

    /// start as http server
    Serve {
        /// port number
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// print the schema description given to the model
    Schema,
}

impl LlmArgs {
    fn into_config(self) -> Result<Config, Error> {
        let mut config = Config::new(self.api_key.unwrap_or_default())?
            .with_base_url(self.base_url)?
            .with_timeout(Duration::from_secs(self.timeout_secs))?
            .with_retry(RetryPolicy::new(
                self.max_attempts,
                Duration::from_millis(self.retry_delay_ms),
            ));

        if let Some(path) = &self.schema_file {
            config = config.with_schema_file(path)?;
        }

        config.model = self.model;
        config.max_tokens = self.max_tokens;
        config.referer = self.referer;
        config.app_title = self.app_title;
        config.denied_columns = self.deny_columns;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "haymart_ai=debug" } else { "haymart_ai=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn assistant(db: Option<String>, config: &Config) -> Result<Assistant> {
    let db = db.ok_or_else(|| miette::miette!("database url required (--db or DATABASE_URL)"))?;
    let llm = OpenRouter::new(config)?;
    let db = Db::connect(&db).await?;
    Ok(Assistant::from_config(config, Arc::new(llm), Arc::new(db)))
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Schema => {
            match &cli.llm.schema_file {
                Some(path) => {
                    let text = std::fs::read_to_string(path)
                        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
                    println!("{text}");
                }
                None => println!("{SCHEMA}"),
            }
            Ok(())
        }

        Commands::Quota => {
            let config = cli.llm.into_config()?;
            let llm = OpenRouter::new(&config)?;
            let report = llm.check_quota().await?;
            println!("{report}");
            Ok(())
        }

        Commands::Ask { prompt, show_sql } => {
            if prompt.trim().is_empty() {
                return Err(miette::miette!("prompt must not be empty"));
            }
            let config = cli.llm.into_config()?;
            let assistant = assistant(cli.db, &config).await?;
            let turn = assistant.turn(&prompt).await;

            if show_sql && let Some(sql) = &turn.sql {
                println!("sql: {sql}\n");
            }
            println!("{}", turn.answer);
            Ok(())
        }

        Commands::Serve { port, host } => {
            let config = cli.llm.into_config()?;
            let assistant = assistant(cli.db, &config).await?;
            Ok(Server::run(assistant, &host, port).await?)
        }
    }
}
