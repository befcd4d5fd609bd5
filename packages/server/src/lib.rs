#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for Letterboxd dissident scores.
//!
//! `/scrape` streams progress as server-sent events while a pipeline pages
//! through a user's listing, finishing with the full payload.
//! `/scrape/summary` returns the same result as one JSON document, and
//! `/count` and `/check-user` answer from the profile page alone. Each
//! request builds its own pipeline; the HTTP client is shared.

mod handlers;
pub mod interactive;
pub mod sse;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use dissident_pipeline::PipelineConfig;
use dissident_scraper::{Fetcher, HttpFetcher};

/// Shared application state.
pub struct AppState<F = HttpFetcher> {
    /// HTTP client shared by every request.
    pub fetcher: Arc<F>,
    /// Base configuration; requests may override the metric and samples.
    pub config: PipelineConfig,
}

/// Registers every route for a server backed by `F`.
pub fn configure<F: Fetcher + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/scrape", web::get().to(handlers::scrape::<F>))
        .route(
            "/scrape/summary",
            web::get().to(handlers::scrape_summary::<F>),
        )
        .route("/count", web::get().to(handlers::count::<F>))
        .route("/check-user", web::get().to(handlers::check_user::<F>));
}

/// Bind address and port from `BIND_ADDR` and `PORT`, defaulting to
/// `127.0.0.1:8080`.
#[must_use]
pub fn bind_address() -> (String, u16) {
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    (bind_addr, port)
}

/// Starts the API server.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`) and the logger.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP client cannot be built,
/// the server fails to bind, or it encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: PipelineConfig) -> std::io::Result<()> {
    let fetcher = HttpFetcher::new(&config.fetcher).map_err(std::io::Error::other)?;

    let state = web::Data::new(AppState {
        fetcher: Arc::new(fetcher),
        config,
    });

    let (bind_addr, port) = bind_address();
    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure::<HttpFetcher>)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
