//! HTTP handler functions for the dissident score API.
//!
//! Handlers are generic over the [`Fetcher`] so the whole request path can
//! run against canned pages in tests.

use std::sync::Arc;
use std::time::Instant;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use dissident_letterboxd::Username;
use dissident_pipeline::{
    ConfigError, ErrorKind, NullSink, Pipeline, PipelineConfig, PipelineError, parse_samples,
};
use dissident_scraper::Fetcher;
use dissident_server_models::{
    ApiCount, ApiError, ApiHealth, ApiScrapeSummary, ApiUserCheck, ScrapeQueryParams,
    StreamEvent, UsernameQueryParams,
};
use tokio::sync::mpsc;

use crate::AppState;
use crate::sse::{self, ChannelSink};

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /scrape`
///
/// Streams `progress` events while the run pages through the listing,
/// then one `complete` or `error` event.
pub async fn scrape<F: Fetcher + 'static>(
    state: web::Data<AppState<F>>,
    params: web::Query<ScrapeQueryParams>,
) -> HttpResponse {
    let username = match require_username(params.username.as_deref()) {
        Ok(username) => username,
        Err(response) => return response,
    };
    let config = match run_config(&state.config, &params) {
        Ok(config) => config,
        Err(e) => return error_response(&e),
    };

    log::info!("Streaming {} scrape for {username}", config.metric);

    let (tx, mut rx) = mpsc::unbounded_channel::<StreamEvent>();
    let pipeline = Pipeline::new(Arc::clone(&state.fetcher), config);

    actix_web::rt::spawn(async move {
        let sink = ChannelSink::new(tx.clone());
        let last = match pipeline.scrape(username.as_str(), &sink).await {
            Ok(outcome) => StreamEvent::from(outcome),
            Err(PipelineError::Cancelled) => return,
            Err(e) => StreamEvent::error(e.to_string()),
        };
        if tx.send(last).is_err() {
            log::debug!("{username}: client left before the final event");
        }
    });

    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            match sse::frame(&event) {
                Ok(bytes) => yield Ok::<_, actix_web::Error>(bytes),
                Err(e) => log::error!("Failed to encode stream event: {e}"),
            }
        }
    };

    HttpResponse::Ok()
        .insert_header(("Content-Type", "text/event-stream"))
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}

/// `GET /scrape/summary`
///
/// Runs the same scrape without streaming and returns one JSON document.
pub async fn scrape_summary<F: Fetcher + 'static>(
    state: web::Data<AppState<F>>,
    params: web::Query<ScrapeQueryParams>,
) -> HttpResponse {
    let username = match require_username(params.username.as_deref()) {
        Ok(username) => username,
        Err(response) => return response,
    };
    let config = match run_config(&state.config, &params) {
        Ok(config) => config,
        Err(e) => return error_response(&e),
    };

    let pipeline = Pipeline::new(Arc::clone(&state.fetcher), config);

    match pipeline.scrape(username.as_str(), &NullSink).await {
        Ok(outcome) => {
            HttpResponse::Ok().json(ApiScrapeSummary::from_outcome(outcome, params.is_simple()))
        }
        Err(e) => error_response(&e),
    }
}

/// `GET /count`
///
/// Reads the film count from the profile page only.
pub async fn count<F: Fetcher + 'static>(
    state: web::Data<AppState<F>>,
    params: web::Query<UsernameQueryParams>,
) -> HttpResponse {
    let username = match require_username(params.username.as_deref()) {
        Ok(username) => username,
        Err(response) => return response,
    };

    let started = Instant::now();
    let pipeline = Pipeline::new(Arc::clone(&state.fetcher), state.config.clone());

    match pipeline.count(username.as_str()).await {
        Ok(outcome) => HttpResponse::Ok().json(ApiCount::from(outcome)),
        Err(e) => {
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            let message = if matches!(e, PipelineError::ProfileNotFound { .. }) {
                "User not found or no access".to_string()
            } else {
                e.to_string()
            };
            HttpResponse::build(status_for(&e)).json(ApiCount::failure(
                username.as_str(),
                message,
                elapsed_ms,
            ))
        }
    }
}

/// `GET /check-user`
///
/// Probes the profile page with a `HEAD` request.
pub async fn check_user<F: Fetcher + 'static>(
    state: web::Data<AppState<F>>,
    params: web::Query<UsernameQueryParams>,
) -> HttpResponse {
    let Some(raw) = params.username.as_deref() else {
        return HttpResponse::BadRequest().json(ApiUserCheck::failure("No username provided"));
    };

    let pipeline = Pipeline::new(Arc::clone(&state.fetcher), state.config.clone());

    match pipeline.check_user(raw).await {
        Ok(check) => HttpResponse::Ok().json(ApiUserCheck::from(check)),
        Err(e) => HttpResponse::build(status_for(&e)).json(ApiUserCheck::failure(e.to_string())),
    }
}

/// Sanitizes the `username` parameter, or builds the 400 response.
fn require_username(raw: Option<&str>) -> Result<Username, HttpResponse> {
    let Some(raw) = raw else {
        return Err(HttpResponse::BadRequest().json(ApiError::new("No username provided")));
    };
    Username::parse(raw).map_err(|e| HttpResponse::BadRequest().json(ApiError::new(e.to_string())))
}

/// Applies per-request `metric` and `samples` overrides to the server's
/// configuration.
fn run_config(
    base: &PipelineConfig,
    params: &ScrapeQueryParams,
) -> Result<PipelineConfig, PipelineError> {
    let mut config = base.clone();

    if let Some(metric) = params.metric.as_deref() {
        config.metric = metric.parse().map_err(|_| ConfigError::Invalid {
            message: format!("unknown metric '{metric}'"),
        })?;
    }
    if let Some(samples) = params.samples.as_deref() {
        config.samples = parse_samples(samples)?;
    }

    Ok(config)
}

fn status_for(error: &PipelineError) -> StatusCode {
    match (error, error.kind()) {
        (PipelineError::ProfileNotFound { .. }, _) | (_, ErrorKind::EmptyResult) => {
            StatusCode::NOT_FOUND
        }
        (_, ErrorKind::Input | ErrorKind::Config) => StatusCode::BAD_REQUEST,
        (_, ErrorKind::UpstreamUnavailable) => StatusCode::BAD_GATEWAY,
        (_, ErrorKind::Budget) => StatusCode::GATEWAY_TIMEOUT,
        (_, ErrorKind::Cancelled) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &PipelineError) -> HttpResponse {
    let status = status_for(error);
    if status.is_server_error() {
        log::error!("Request failed: {error}");
    } else {
        log::info!("Request rejected: {error}");
    }
    HttpResponse::build(status).json(ApiError::new(error.to_string()))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};
    use dissident_film_models::ListingOrder;
    use dissident_letterboxd::LISTING_FIXTURE;
    use dissident_letterboxd::urls::listing_url;
    use dissident_scraper::memory::StaticFetcher;
    use serde_json::Value;

    use super::*;
    use crate::configure;

    const PROFILE: &str = "https://letterboxd.com/fixture/";

    fn state(
        fetcher: StaticFetcher,
    ) -> (Arc<StaticFetcher>, web::Data<AppState<StaticFetcher>>) {
        let fetcher = Arc::new(fetcher);
        let config = PipelineConfig {
            page_delay_ms: 0,
            ..PipelineConfig::default()
        };
        let state = web::Data::new(AppState {
            fetcher: Arc::clone(&fetcher),
            config,
        });
        (fetcher, state)
    }

    fn fixture_fetcher() -> StaticFetcher {
        let user = Username::parse("fixture").unwrap();
        StaticFetcher::new()
            .with_page(PROFILE, "<p>4 films watched</p>")
            .with_page(
                &listing_url(&user, ListingOrder::EntryRating, 1),
                LISTING_FIXTURE,
            )
    }

    fn parse_frames(body: &[u8]) -> Vec<Value> {
        std::str::from_utf8(body)
            .unwrap()
            .split("\n\n")
            .filter(|frame| !frame.is_empty())
            .map(|frame| serde_json::from_str(frame.strip_prefix("data: ").unwrap()).unwrap())
            .collect()
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let (_, state) = state(StaticFetcher::new());
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(configure::<StaticFetcher>),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn scrape_streams_progress_then_complete() {
        let (_, state) = state(fixture_fetcher());
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(configure::<StaticFetcher>),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/scrape?username=fixture")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "text/event-stream"
        );

        let frames = parse_frames(&test::read_body(resp).await);
        let (last, progress) = frames.split_last().unwrap();
        assert!(progress.iter().all(|f| f["type"] == "progress"));
        assert!(progress
            .windows(2)
            .all(|w| w[0]["progress"].as_f64() <= w[1]["progress"].as_f64()));
        assert_eq!(last["type"], "complete");
        assert_eq!(last["username"], "fixture");
        assert_eq!(last["total_movies"], 4);
        assert_eq!(last["count"], 4);
        assert_eq!(last["all_movies"][1]["title"], "The Thing");
    }

    #[actix_web::test]
    async fn scrape_streams_error_for_unknown_user() {
        let (_, state) = state(StaticFetcher::new());
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(configure::<StaticFetcher>),
        )
        .await;

        let req = test::TestRequest::get().uri("/scrape?username=ghost").to_request();
        let frames = parse_frames(&test::call_and_read_body(&app, req).await);

        let last = frames.last().unwrap();
        assert_eq!(last["type"], "error");
        assert_eq!(last["error"], "User 'ghost' not found");
    }

    #[actix_web::test]
    async fn invalid_username_is_rejected_without_fetching() {
        let (fetcher, state) = state(StaticFetcher::new());
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(configure::<StaticFetcher>),
        )
        .await;

        let req = test::TestRequest::get().uri("/scrape?username=%21%21").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/scrape/summary").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert!(fetcher.requests().is_empty());
    }

    #[actix_web::test]
    async fn unknown_metric_is_bad_request() {
        let (_, state) = state(fixture_fetcher());
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(configure::<StaticFetcher>),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/scrape/summary?username=fixture&metric=graph")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn summary_returns_simple_records() {
        let (_, state) = state(fixture_fetcher());
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(configure::<StaticFetcher>),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/scrape/summary?username=fixture&simple=1")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 4);
        assert_eq!(body["pages_scraped"], 1);
        assert_eq!(body["progress_percentage"], 100.0);
        assert_eq!(body["movies"][0]["name"], "Heat");
        assert_eq!(body["movies"][0]["rating"], 5.0);
    }

    #[actix_web::test]
    async fn count_reports_failure_for_missing_profile() {
        let (_, state) = state(fixture_fetcher());
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(configure::<StaticFetcher>),
        )
        .await;

        let req = test::TestRequest::get().uri("/count?username=fixture").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_movies"], 4);
        assert_eq!(body["success"], true);
        assert_eq!(body["source"], "films_watched");

        let req = test::TestRequest::get().uri("/count?username=ghost").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "User not found or no access");
    }

    #[actix_web::test]
    async fn check_user_reports_existence() {
        let (_, state) = state(fixture_fetcher());
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(configure::<StaticFetcher>),
        )
        .await;

        let req = test::TestRequest::get().uri("/check-user?username=fixture").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["exists"], true);
        assert_eq!(body["url"], PROFILE);

        let req = test::TestRequest::get().uri("/check-user?username=ghost").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["exists"], false);
        assert!(body.get("url").is_none());
    }
}
