// haymart-ai - ask the store database questions in plain language

use haymart_ai::cli;

#[tokio::main]
async fn main() -> miette::Result<()> {
    cli::run().await
}
