//! Catalog CLI - Database migrations and development tools.
//!
//! # Usage
//!
//! ```bash
//! # Run catalog database migrations
//! catalog-cli migrate
//!
//! # Mint a bearer token for user 42, valid for one hour
//! catalog-cli token --user 42 --ttl-secs 3600
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `token` - Print a signed bearer token for local testing

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(author, version, about = "Catalog service CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Print a bearer token signed with `JWT_SECRET`
    Token {
        /// User ID to place in the `sub` claim
        #[arg(short, long)]
        user: i64,

        /// Token lifetime in seconds (omit for a token without expiry)
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Token { user, ttl_secs } => {
            let token = commands::token::issue(user, ttl_secs)?;
            #[allow(clippy::print_stdout)]
            {
                println!("{token}");
            }
        }
    }
    Ok(())
}
