#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for Letterboxd dissident scores.
//!
//! Every operation the API server exposes is also available here as a
//! subcommand, printing the same JSON payloads. Run without a subcommand
//! for an interactive menu.
//!
//! Uses `indicatif-log-bridge` (via [`dissident_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod commands;
mod interactive;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dissident_pipeline::{Metric, PipelineConfig};

/// Scrape Letterboxd ratings and compute dissident scores.
#[derive(Parser)]
#[command(name = "dissident")]
#[command(about = "Scrape Letterboxd ratings and compute dissident scores")]
struct Cli {
    /// Pipeline config file (TOML). Falls back to `DISSIDENT_CONFIG`, then
    /// the built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute. Omit for the interactive menu.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Scrape a user's rated films and print the result as JSON.
    Scrape {
        /// Letterboxd username.
        username: String,

        /// Metric to compute (`plain` or `dissident`).
        #[arg(long)]
        metric: Option<Metric>,

        /// Samples to collect: `all`, `none` or a comma-separated list.
        #[arg(long)]
        samples: Option<String>,

        /// Print films as `{name, rating}` pairs.
        #[arg(long)]
        simple: bool,
    },

    /// Print a user's film count from their profile page.
    Count {
        /// Letterboxd username.
        username: String,
    },

    /// Check whether a profile exists.
    Check {
        /// Letterboxd username.
        username: String,
    },

    /// Start the API server.
    Serve,

    /// Parse the bundled listing fixture and report the result.
    SelfTest,
}

/// Top-level tool selection for the interactive menu.
enum Tool {
    Scrape,
    Count,
    Check,
    Server,
    SelfTest,
}

impl Tool {
    const ALL: &[Self] = &[
        Self::Scrape,
        Self::Count,
        Self::Check,
        Self::Server,
        Self::SelfTest,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Scrape => "Scrape a user's ratings",
            Self::Count => "Look up a film count",
            Self::Check => "Check a username",
            Self::Server => "Start server",
            Self::SelfTest => "Run parser self-test",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = dissident_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = PipelineConfig::load(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        return run_menu(&multi, config).await;
    };

    match command {
        Commands::Scrape {
            username,
            metric,
            samples,
            simple,
        } => {
            let config = commands::with_overrides(config, metric, samples.as_deref())?;
            commands::scrape(&multi, config, &username, simple).await?;
        }
        Commands::Count { username } => commands::count(config, &username).await?,
        Commands::Check { username } => commands::check(config, &username).await?,
        Commands::Serve => commands::serve(config).await?,
        Commands::SelfTest => commands::self_test()?,
    }

    Ok(())
}

async fn run_menu(
    multi: &dissident_cli_utils::MultiProgress,
    config: PipelineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Letterboxd Dissident Scores");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = dialoguer::Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Scrape => interactive::scrape(multi, config).await?,
        Tool::Count => {
            let username = interactive::username()?;
            commands::count(config, &username).await?;
        }
        Tool::Check => {
            let username = interactive::username()?;
            commands::check(config, &username).await?;
        }
        Tool::Server => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(dissident_server::interactive::run(config))
            })
            .await??;
        }
        Tool::SelfTest => commands::self_test()?,
    }

    Ok(())
}
