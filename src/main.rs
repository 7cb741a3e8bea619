//! # Meal Advisor Gateway
//!
//! Administrative command line for the multi-provider LLM gateway used by
//! the meal and mood backend.
//!
//! ## Usage
//!
//! ```bash
//! # Seed providers from a config file, then list them
//! meal-gateway --config gateway.yaml --database-url sqlite://gateway.db providers seed
//! meal-gateway --database-url sqlite://gateway.db providers list
//!
//! # Route one prompt through the fallback chain
//! meal-gateway --config gateway.yaml call --task emotion --prompt "rate my mood"
//!
//! # Inspect recent attempts as JSON
//! meal-gateway --json logs --limit 20
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod context;
mod output;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; a broken one is reported once logging is up
    let env_file = cli::env_file_error(dotenvy::dotenv());

    let cli = Cli::parse();
    cli.execute(env_file).await
}
