//! Subcommand implementations.
//!
//! Each prints the same JSON document the matching API endpoint returns.

use std::sync::Arc;

use dissident_cli_utils::{IndicatifProgress, MultiProgress};
use dissident_pipeline::{Metric, Pipeline, PipelineConfig, parse_samples};
use dissident_scraper::HttpFetcher;
use dissident_server_models::{ApiCount, ApiScrapeSummary, ApiUserCheck};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Applies command-line overrides on top of the loaded config.
///
/// # Errors
///
/// Returns an error if `samples` does not parse or the result is invalid.
pub fn with_overrides(
    mut config: PipelineConfig,
    metric: Option<Metric>,
    samples: Option<&str>,
) -> Result<PipelineConfig, dissident_pipeline::ConfigError> {
    if let Some(metric) = metric {
        config.metric = metric;
    }
    if let Some(samples) = samples {
        config.samples = parse_samples(samples)?;
    }
    config.validate()?;
    Ok(config)
}

fn pipeline(config: PipelineConfig) -> Result<Pipeline<HttpFetcher>, Box<dyn std::error::Error>> {
    let fetcher = HttpFetcher::new(&config.fetcher)?;
    Ok(Pipeline::new(Arc::new(fetcher), config))
}

fn print_json(value: &impl serde::Serialize) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Scrapes `username` behind a progress bar and prints the summary.
pub async fn scrape(
    multi: &MultiProgress,
    config: PipelineConfig,
    username: &str,
    simple: bool,
) -> CommandResult {
    let metric = config.metric;
    let pipeline = pipeline(config)?;
    let progress = IndicatifProgress::scrape_bar(multi, &format!("Scraping {username}"));

    match pipeline.scrape(username, &progress).await {
        Ok(outcome) => {
            progress.finish(format!(
                "Collected {} films ({metric}) in {}ms",
                outcome.count(),
                outcome.execution_time_ms()
            ));
            print_json(&ApiScrapeSummary::from_outcome(outcome, simple))
        }
        Err(e) => {
            progress.finish_and_clear();
            log::error!("Scrape of {username} failed: {e}");
            Err(e.into())
        }
    }
}

/// Prints the film count for `username`.
pub async fn count(config: PipelineConfig, username: &str) -> CommandResult {
    let outcome = pipeline(config)?.count(username).await?;
    print_json(&ApiCount::from(outcome))
}

/// Prints whether `username` has a profile.
pub async fn check(config: PipelineConfig, username: &str) -> CommandResult {
    let check = pipeline(config)?.check_user(username).await?;
    print_json(&ApiUserCheck::from(check))
}

/// Runs the API server until it is stopped.
pub async fn serve(config: PipelineConfig) -> CommandResult {
    // The server uses actix-web's runtime, so we need to run it
    // in a blocking task to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(|| {
        actix_web::rt::System::new().block_on(dissident_server::run_server(config))
    })
    .await??;
    Ok(())
}

/// Parses the bundled listing fixture.
///
/// # Errors
///
/// Returns an error if the parser no longer finds every fixture record.
pub fn self_test() -> CommandResult {
    let report = dissident_letterboxd::self_test();
    println!(
        "Parsed {} containers, kept {} records",
        report.containers, report.records
    );
    if report.passed() {
        println!("Self-test passed");
        Ok(())
    } else {
        Err("self-test failed: listing markup no longer parses".into())
    }
}
