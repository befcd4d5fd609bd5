//! The scrape driver.
//!
//! One [`Pipeline`] run walks `Init → FetchingCount → Paging → Done`:
//! read the film count from the profile page, derive the page total once,
//! fetch listing pages sequentially with a short pause between them, then
//! post-process (scoring and samples) inside the 90–100% progress band.
//! Any unrecoverable failure moves the run to `Error` and discards what
//! was collected so far.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dissident_analytics::samples::select_sample;
use dissident_analytics::{aggregate, aggregate_tail, mean_dissidence};
use dissident_film_models::{FilmEntry, FilmRecord, SampleCategory, SampleEnd};
use dissident_letterboxd::count::{CountExtractor, CountMatch, default_extractors, extract_count};
use dissident_letterboxd::urls::{listing_url, profile_url};
use dissident_letterboxd::{Username, parse_listing};
use dissident_scraper::{FetchError, Fetcher};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::outcome::{CountOutcome, ScrapeOutcome, UserCheck};
use crate::pagination::{PaginationState, Phase};
use crate::progress::{ProgressEmitter, ProgressSink};

/// Listing pages fetched during a run, keyed by URL, so samples drawn
/// from an already-fetched page cost no extra request.
type PageCache = BTreeMap<String, Vec<FilmRecord>>;

/// A configured scrape driver.
///
/// Cheap to build per request: the fetcher is shared, the configuration
/// is owned.
pub struct Pipeline<F> {
    fetcher: Arc<F>,
    config: PipelineConfig,
    extractors: Vec<Box<dyn CountExtractor>>,
}

impl<F: Fetcher> Pipeline<F> {
    /// Creates a driver using the default count extractors.
    #[must_use]
    pub fn new(fetcher: Arc<F>, config: PipelineConfig) -> Self {
        Self {
            fetcher,
            config,
            extractors: default_extractors(),
        }
    }

    /// Scrapes every listing page for `raw_username` and post-processes
    /// the result according to the configured metric.
    ///
    /// # Errors
    ///
    /// * [`PipelineError::InvalidUsername`] before any request is made
    /// * [`PipelineError::ProfileNotFound`] / [`PipelineError::Upstream`]
    ///   when a required page cannot be fetched
    /// * [`PipelineError::NoRatedFilms`] when paging yields nothing
    /// * [`PipelineError::TimedOut`] when the wall-clock budget runs out
    /// * [`PipelineError::Cancelled`] when `sink` stops accepting events
    pub async fn scrape(
        &self,
        raw_username: &str,
        sink: &dyn ProgressSink,
    ) -> Result<ScrapeOutcome, PipelineError> {
        let username = Username::parse(raw_username)?;
        let secs = self.config.overall_timeout_secs;

        if let Ok(result) =
            tokio::time::timeout(Duration::from_secs(secs), self.run(&username, sink)).await
        {
            result
        } else {
            log::warn!("{username}: scrape exceeded {secs}s budget");
            Err(PipelineError::TimedOut { secs })
        }
    }

    /// Reads only the film count from the profile page.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidUsername`],
    /// [`PipelineError::ProfileNotFound`] or [`PipelineError::Upstream`].
    pub async fn count(&self, raw_username: &str) -> Result<CountOutcome, PipelineError> {
        let username = Username::parse(raw_username)?;
        let started = Instant::now();
        let found = self.fetch_count(&username).await?;

        Ok(CountOutcome {
            username,
            found,
            elapsed: started.elapsed(),
        })
    }

    /// Checks whether the profile page exists.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidUsername`], or
    /// [`PipelineError::Upstream`] if no response was received.
    pub async fn check_user(&self, raw_username: &str) -> Result<UserCheck, PipelineError> {
        let username = Username::parse(raw_username)?;
        let url = profile_url(&username);
        let status = self.fetcher.head_status(&url).await?;
        log::debug!("{username}: profile answered {status}");

        Ok(UserCheck {
            exists: status == 200,
            url,
        })
    }

    async fn run(
        &self,
        username: &Username,
        sink: &dyn ProgressSink,
    ) -> Result<ScrapeOutcome, PipelineError> {
        let mut run = Run {
            username,
            phase: Phase::Init,
            emitter: ProgressEmitter::new(sink),
        };

        let result = self.drive(&mut run).await;
        if let Err(e) = &result {
            if !run.phase.is_terminal() {
                run.enter(Phase::Error);
            }
            log::warn!("{username}: scrape failed: {e}");
        }
        result
    }

    async fn drive(&self, run: &mut Run<'_>) -> Result<ScrapeOutcome, PipelineError> {
        let started = Instant::now();
        let config = &self.config;
        let username = run.username;
        let baseline = config.progress_baseline;

        run.enter(Phase::FetchingCount);
        run.emit(0.0, 0, 0, format!("Looking up {username}'s profile"))?;

        let found = self.fetch_count(username).await?;
        let total_movies = found.map_or(0, |m| m.count);
        let mut state =
            PaginationState::new(total_movies, config.records_per_page, config.max_pages);

        run.enter(Phase::Paging);
        if state.is_unbounded() {
            run.emit(
                baseline,
                0,
                0,
                format!(
                    "Film count unavailable for {username}; reading up to {} pages",
                    state.page_limit
                ),
            )?;
        } else if state.is_truncated() {
            let limit = u64::from(state.total_pages) * u64::from(config.records_per_page);
            run.emit(
                baseline,
                0,
                state.total_pages,
                format!("User has {total_movies} films. Limiting to the first {limit} films."),
            )?;
        } else {
            run.emit(
                baseline,
                0,
                state.total_pages,
                format!("Found {total_movies} films for {username}"),
            )?;
        }

        let order = config.metric.listing_order();
        let mut cache = PageCache::new();
        let mut films = Vec::new();
        let mut pages_scraped = 0;

        for page in 1..=state.page_limit {
            run.ensure_listening()?;
            if page > 1 {
                self.pause().await;
            }
            state.current_page = page;

            let url = listing_url(username, order, page);
            let html = match self.fetcher.get_text(&url).await {
                Ok(html) => html,
                Err(FetchError::NotFound { .. }) => {
                    log::info!("{username}: page {page} not found, paging complete");
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            let listing = parse_listing(&html);
            if listing.is_empty() {
                log::info!(
                    "{username}: page {page} has no films ({} containers), paging complete",
                    listing.container_count
                );
                break;
            }

            log::debug!(
                "{username}: page {page}: {} containers, {} retained",
                listing.container_count,
                listing.films.len()
            );

            pages_scraped = page;
            films.extend(listing.films.iter().cloned());
            cache.insert(url, listing.films);

            let message = if state.is_unbounded() {
                format!("Analyzed page {page}")
            } else {
                format!("Analyzed page {page} of {}", state.total_pages)
            };
            run.emit(
                state.percent_after(page, baseline, config.progress_span),
                page,
                state.total_pages,
                message,
            )?;
        }

        if films.is_empty() {
            return Err(PipelineError::NoRatedFilms {
                username: username.to_string(),
            });
        }

        log::info!(
            "{username}: {} films from {pages_scraped} pages",
            films.len()
        );

        let post = config.post_processing_start();
        let (entries, mean_dissident_score) = if config.metric.scores() {
            run.emit(post, pages_scraped, state.total_pages, "Computing dissident scores")?;
            let scored = aggregate(&films);
            let mean = mean_dissidence(&scored);
            (scored.into_iter().map(FilmEntry::from).collect(), mean)
        } else {
            (films.into_iter().map(FilmEntry::from).collect(), None)
        };

        let categories = config.effective_samples();
        let last_page = if state.is_unbounded() {
            pages_scraped.max(1)
        } else {
            state.estimated_pages.max(1)
        };
        let mut samples = BTreeMap::new();
        #[allow(clippy::cast_precision_loss)]
        let step = (100.0 - post) / (categories.len() + 1) as f64;

        for (i, category) in categories.iter().copied().enumerate() {
            let sample = self
                .fetch_sample(username, category, last_page, total_movies, &mut cache)
                .await;
            samples.insert(category, sample);

            #[allow(clippy::cast_precision_loss)]
            let percent = step.mul_add((i + 1) as f64, post);
            run.emit(
                percent,
                pages_scraped,
                state.total_pages,
                format!("Collected {category} sample"),
            )?;
        }

        run.enter(Phase::Done);

        Ok(ScrapeOutcome {
            username: username.clone(),
            metric: config.metric,
            total_movies,
            count_source: found.map(|m| m.source),
            total_pages: state.total_pages,
            pages_scraped,
            films: entries,
            samples,
            mean_dissident_score,
            elapsed: started.elapsed(),
        })
    }

    async fn fetch_count(&self, username: &Username) -> Result<Option<CountMatch>, PipelineError> {
        let url = profile_url(username);
        let html = self.fetcher.get_text(&url).await.map_err(|e| {
            if e.is_not_found() {
                PipelineError::ProfileNotFound {
                    username: username.to_string(),
                }
            } else {
                e.into()
            }
        })?;

        let found = extract_count(&html, &self.extractors);
        if found.is_none() {
            log::warn!("{username}: no film count found on profile page");
        }
        Ok(found)
    }

    /// Fetches one sample. Failures are logged and yield an empty sample.
    async fn fetch_sample(
        &self,
        username: &Username,
        category: SampleCategory,
        last_page: u32,
        total_known: u64,
        cache: &mut PageCache,
    ) -> Vec<FilmEntry> {
        let page = match category.end() {
            SampleEnd::Head => 1,
            SampleEnd::Tail => last_page,
        };
        let url = listing_url(username, category.order(), page);

        let films = if let Some(films) = cache.get(&url) {
            films.clone()
        } else {
            self.pause().await;
            match self.fetcher.get_text(&url).await {
                Ok(html) => {
                    let films = parse_listing(&html).films;
                    cache.insert(url, films.clone());
                    films
                }
                Err(e) => {
                    log::warn!("{username}: {category} sample unavailable: {e}");
                    return Vec::new();
                }
            }
        };

        let picked = select_sample(&films, category, self.config.sample_size);

        if self.config.metric.scores() && category == SampleCategory::LeastPopular {
            aggregate_tail(&picked, total_known)
                .into_iter()
                .map(FilmEntry::from)
                .collect()
        } else {
            picked.into_iter().map(FilmEntry::from).collect()
        }
    }

    async fn pause(&self) {
        if self.config.page_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.page_delay_ms)).await;
        }
    }
}

/// Per-run state: the phase and the progress bookkeeping.
struct Run<'a> {
    username: &'a Username,
    phase: Phase,
    emitter: ProgressEmitter<'a>,
}

impl Run<'_> {
    fn enter(&mut self, next: Phase) {
        if !self.phase.can_advance_to(next) {
            log::warn!(
                "{}: unexpected phase change {} -> {next}",
                self.username,
                self.phase
            );
        }
        log::debug!("{}: {} -> {next}", self.username, self.phase);
        self.phase = next;
    }

    /// Fails with [`PipelineError::Cancelled`] once the sink is closed, so
    /// no further page is requested for a consumer that left.
    fn ensure_listening(&self) -> Result<(), PipelineError> {
        if self.emitter.is_closed() {
            log::info!("{}: progress consumer gone, stopping", self.username);
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }

    fn emit(
        &mut self,
        percent: f64,
        page: u32,
        total_pages: u32,
        message: impl Into<String>,
    ) -> Result<(), PipelineError> {
        self.emitter
            .emit(percent, page, total_pages, message)
            .map_err(|_| {
                log::info!("{}: progress consumer gone, stopping", self.username);
                PipelineError::Cancelled
            })
    }
}

#[cfg(test)]
mod tests {
    use dissident_film_models::ListingOrder;
    use dissident_scraper::memory::StaticFetcher;

    use super::*;
    use crate::config::Metric;
    use crate::progress::{CollectingSink, NullSink};

    const PROFILE: &str = "https://letterboxd.com/fixture/";

    fn user() -> Username {
        Username::parse("fixture").unwrap()
    }

    fn page_url(order: ListingOrder, page: u32) -> String {
        listing_url(&user(), order, page)
    }

    fn profile_html(count: u64) -> String {
        format!("<html><body><h4>Stats</h4><p>{count} films watched</p></body></html>")
    }

    /// A listing page of `n` films named `{prefix}{i}`, all rated three
    /// stars except every fourth, which is unrated.
    fn listing_html(prefix: &str, n: usize) -> String {
        let items: String = (0..n)
            .map(|i| {
                let rating = if i % 4 == 3 {
                    String::new()
                } else {
                    r#"<p class="poster-viewingdata"><span class="rating">★★★</span></p>"#
                        .to_string()
                };
                format!(
                    r#"<li class="poster-container"><div class="film-poster" data-target-link="/film/{prefix}{i}/"><img alt="{prefix}{i}"></div>{rating}</li>"#
                )
            })
            .collect();
        format!(r#"<html><body><ul class="poster-list">{items}</ul></body></html>"#)
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            page_delay_ms: 0,
            ..PipelineConfig::default()
        }
    }

    fn pipeline(fetcher: StaticFetcher, config: PipelineConfig) -> (Arc<StaticFetcher>, Pipeline<StaticFetcher>) {
        let fetcher = Arc::new(fetcher);
        (fetcher.clone(), Pipeline::new(fetcher, config))
    }

    fn four_page_fetcher(order: ListingOrder) -> StaticFetcher {
        StaticFetcher::new()
            .with_page(PROFILE, &profile_html(250))
            .with_page(&page_url(order, 1), &listing_html("a", 72))
            .with_page(&page_url(order, 2), &listing_html("b", 72))
            .with_page(&page_url(order, 3), &listing_html("c", 72))
            .with_page(&page_url(order, 4), &listing_html("d", 34))
    }

    #[tokio::test]
    async fn pages_through_every_planned_page() {
        let (_, pipeline) = pipeline(four_page_fetcher(ListingOrder::EntryRating), config());
        let sink = CollectingSink::new();

        let outcome = pipeline.scrape("fixture", &sink).await.unwrap();

        assert_eq!(outcome.total_movies, 250);
        assert_eq!(outcome.total_pages, 4);
        assert_eq!(outcome.pages_scraped, 4);
        assert_eq!(outcome.count(), 250);
        assert_eq!(outcome.count_source, Some("films_watched"));
        assert!(outcome.films.iter().all(|f| f.score.is_none()));
        assert_eq!(outcome.films[0].film.title, "a0");
        assert_eq!(outcome.films[249].film.title, "d33");
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_between_sequential_page_fetches() {
        let config = PipelineConfig {
            page_delay_ms: 100,
            ..config()
        };
        let (recorded, pipeline) = pipeline(four_page_fetcher(ListingOrder::EntryRating), config);

        let started = tokio::time::Instant::now();
        let outcome = pipeline.scrape("fixture", &NullSink).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(outcome.pages_scraped, 4);
        assert_eq!(recorded.requests().len(), 5);
        assert!(elapsed >= Duration::from_millis(300), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_in_post_band() {
        let (_, pipeline) = pipeline(four_page_fetcher(ListingOrder::EntryRating), config());
        let sink = CollectingSink::new();

        pipeline.scrape("fixture", &sink).await.unwrap();

        let events = sink.events();
        assert!(events.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert!((events[1].percent - 5.0).abs() < 1e-9);
        let pages: Vec<u32> = events.iter().filter(|e| e.page > 0).map(|e| e.page).collect();
        assert_eq!(pages, vec![1, 2, 3, 4]);
        assert!((events.last().unwrap().percent - 90.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn empty_page_ends_paging_but_keeps_upfront_count() {
        let order = ListingOrder::EntryRating;
        let fetcher = StaticFetcher::new()
            .with_page(PROFILE, &profile_html(250))
            .with_page(&page_url(order, 1), &listing_html("a", 72))
            .with_page(&page_url(order, 2), r#"<ul class="poster-list"></ul>"#);
        let (recorded, pipeline) = pipeline(fetcher, config());

        let outcome = pipeline.scrape("fixture", &NullSink).await.unwrap();

        assert_eq!(outcome.total_movies, 250);
        assert_eq!(outcome.pages_scraped, 1);
        assert_eq!(outcome.count(), 72);
        assert!(!recorded.requests().contains(&page_url(order, 3)));
    }

    #[tokio::test]
    async fn missing_page_ends_paging() {
        let order = ListingOrder::EntryRating;
        let fetcher = StaticFetcher::new()
            .with_page(PROFILE, &profile_html(250))
            .with_page(&page_url(order, 1), &listing_html("a", 72));
        let (_, pipeline) = pipeline(fetcher, config());

        let outcome = pipeline.scrape("fixture", &NullSink).await.unwrap();
        assert_eq!(outcome.pages_scraped, 1);
    }

    #[tokio::test]
    async fn mid_run_failure_discards_partial_results() {
        let order = ListingOrder::EntryRating;
        let fetcher = StaticFetcher::new()
            .with_page(PROFILE, &profile_html(250))
            .with_page(&page_url(order, 1), &listing_html("a", 72))
            .with_failure(&page_url(order, 2), "connection reset");
        let (_, pipeline) = pipeline(fetcher, config());

        let err = pipeline.scrape("fixture", &NullSink).await.unwrap_err();
        assert!(matches!(err, PipelineError::Upstream { ref reason, .. } if reason == "connection reset"));
    }

    #[tokio::test]
    async fn missing_profile_is_profile_not_found() {
        let (recorded, pipeline) = pipeline(StaticFetcher::new(), config());

        let err = pipeline.scrape("ghost", &NullSink).await.unwrap_err();
        assert!(matches!(err, PipelineError::ProfileNotFound { ref username } if username == "ghost"));
        assert_eq!(recorded.requests().len(), 1);
    }

    #[tokio::test]
    async fn profile_outage_is_upstream_error() {
        let fetcher = StaticFetcher::new().with_status(PROFILE, 503);
        let (_, pipeline) = pipeline(fetcher, config());

        let err = pipeline.scrape("fixture", &NullSink).await.unwrap_err();
        assert!(matches!(err, PipelineError::Upstream { .. }));
    }

    #[tokio::test]
    async fn sanitizes_username_before_any_request() {
        let fetcher = StaticFetcher::new().with_page(
            "https://letterboxd.com/baduser/",
            &profile_html(10),
        );
        let (recorded, pipeline) = pipeline(fetcher, config());

        let _ = pipeline.count("bad user!").await.unwrap();
        assert_eq!(recorded.requests(), vec!["https://letterboxd.com/baduser/".to_string()]);
    }

    #[tokio::test]
    async fn invalid_username_makes_no_request() {
        let (recorded, pipeline) = pipeline(StaticFetcher::new(), config());

        let err = pipeline.scrape("!!!", &NullSink).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidUsername(_)));
        assert!(recorded.requests().is_empty());
    }

    #[tokio::test]
    async fn empty_first_page_is_no_rated_films() {
        let fetcher = StaticFetcher::new()
            .with_page(PROFILE, &profile_html(5))
            .with_page(&page_url(ListingOrder::EntryRating, 1), "<html></html>");
        let (_, pipeline) = pipeline(fetcher, config());

        let err = pipeline.scrape("fixture", &NullSink).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoRatedFilms { .. }));
    }

    #[tokio::test]
    async fn large_profiles_are_truncated_with_a_notice() {
        let order = ListingOrder::EntryRating;
        let fetcher = StaticFetcher::new()
            .with_page(PROFILE, &profile_html(1000))
            .with_page(&page_url(order, 1), &listing_html("a", 72))
            .with_page(&page_url(order, 2), &listing_html("b", 72))
            .with_page(&page_url(order, 3), &listing_html("c", 72));
        let config = PipelineConfig {
            max_pages: 2,
            ..config()
        };
        let (recorded, pipeline) = pipeline(fetcher, config);
        let sink = CollectingSink::new();

        let outcome = pipeline.scrape("fixture", &sink).await.unwrap();

        assert_eq!(outcome.total_pages, 2);
        assert_eq!(outcome.pages_scraped, 2);
        assert!(!recorded.requests().contains(&page_url(order, 3)));
        assert!(sink
            .events()
            .iter()
            .any(|e| e.message == "User has 1000 films. Limiting to the first 144 films."));
    }

    #[tokio::test]
    async fn unknown_count_pages_until_empty_at_baseline() {
        let order = ListingOrder::EntryRating;
        let fetcher = StaticFetcher::new()
            .with_page(PROFILE, "<html><body>private</body></html>")
            .with_page(&page_url(order, 1), &listing_html("a", 72))
            .with_page(&page_url(order, 2), &listing_html("b", 10));
        let (_, pipeline) = pipeline(fetcher, config());
        let sink = CollectingSink::new();

        let outcome = pipeline.scrape("fixture", &sink).await.unwrap();

        assert_eq!(outcome.total_movies, 0);
        assert_eq!(outcome.total_pages, 0);
        assert_eq!(outcome.pages_scraped, 2);
        assert_eq!(outcome.count(), 82);
        let events = sink.events();
        assert!(events[1].message.starts_with("Film count unavailable"));
        assert!(events.iter().skip(1).all(|e| (e.percent - 5.0).abs() < 1e-9));
    }

    #[tokio::test]
    async fn closed_sink_cancels_before_next_page() {
        let (recorded, pipeline) = pipeline(four_page_fetcher(ListingOrder::EntryRating), config());
        // start, count notice, page 1
        let sink = CollectingSink::closing_after(3);

        let err = pipeline.scrape("fixture", &sink).await.unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled));
        assert!(recorded.requests().contains(&page_url(ListingOrder::EntryRating, 1)));
        assert!(!recorded.requests().contains(&page_url(ListingOrder::EntryRating, 2)));
    }

    #[tokio::test]
    async fn dissident_metric_scores_in_community_order() {
        let order = ListingOrder::CommunityRating;
        let fetcher = StaticFetcher::new()
            .with_page(PROFILE, &profile_html(3))
            .with_page(&page_url(order, 1), &listing_html("a", 3))
            .with_page(&page_url(ListingOrder::Popular, 1), &listing_html("p", 3));
        let config = PipelineConfig {
            metric: Metric::Dissident,
            ..config()
        };
        let (recorded, pipeline) = pipeline(fetcher, config);

        let outcome = pipeline.scrape("fixture", &NullSink).await.unwrap();

        assert!(recorded.requests().contains(&page_url(order, 1)));
        let scores: Vec<_> = outcome.films.iter().map(|f| f.score.clone().unwrap()).collect();
        assert!((scores[0].expected_score - 5.0).abs() < 1e-9);
        assert!((scores[2].expected_score - 1.0).abs() < 1e-9);
        assert!((scores[1].dissident_score).abs() < 1e-9);
        assert!(outcome.mean_dissident_score.is_some());

        let tail = &outcome.samples[&SampleCategory::LeastPopular];
        let positions: Vec<u32> = tail
            .iter()
            .map(|f| f.score.as_ref().unwrap().community_position)
            .collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn single_film_profile_scores_without_dividing_by_zero() {
        let order = ListingOrder::CommunityRating;
        let fetcher = StaticFetcher::new()
            .with_page(PROFILE, &profile_html(1))
            .with_page(&page_url(order, 1), &listing_html("a", 1));
        let config = PipelineConfig {
            metric: Metric::Dissident,
            ..config()
        };
        let (_, pipeline) = pipeline(fetcher, config);

        let outcome = pipeline.scrape("fixture", &NullSink).await.unwrap();

        let score = outcome.films[0].score.clone().unwrap();
        assert!((score.expected_score - 5.0).abs() < f64::EPSILON);
        assert!((score.dissident_score - -2.0).abs() < 1e-9);
        assert!(outcome.samples[&SampleCategory::LeastPopular].is_empty());
    }

    #[tokio::test]
    async fn samples_reuse_fetched_pages_and_tolerate_failures() {
        let config = PipelineConfig {
            samples: vec![
                SampleCategory::BestUserRate,
                SampleCategory::WorstUserRate,
                SampleCategory::MostPopular,
            ],
            ..config()
        };
        let fetcher = four_page_fetcher(ListingOrder::EntryRating).with_failure(
            &page_url(ListingOrder::Popular, 1),
            "timed out",
        );
        let (recorded, pipeline) = pipeline(fetcher, config);

        let outcome = pipeline.scrape("fixture", &NullSink).await.unwrap();

        let best: Vec<&str> = outcome.samples[&SampleCategory::BestUserRate]
            .iter()
            .map(|f| f.film.title.as_str())
            .collect();
        assert_eq!(best, vec!["a0", "a1", "a2", "a4", "a5"]);

        let worst: Vec<&str> = outcome.samples[&SampleCategory::WorstUserRate]
            .iter()
            .map(|f| f.film.title.as_str())
            .collect();
        assert_eq!(worst, vec!["d28", "d29", "d30", "d32", "d33"]);

        assert!(outcome.samples[&SampleCategory::MostPopular].is_empty());
        let entry_page_one = page_url(ListingOrder::EntryRating, 1);
        assert_eq!(
            recorded.requests().iter().filter(|u| **u == entry_page_one).count(),
            1
        );
    }

    #[tokio::test]
    async fn count_reports_source_and_zero_when_missing() {
        let fetcher = StaticFetcher::new()
            .with_page(PROFILE, &profile_html(250))
            .with_page("https://letterboxd.com/quiet/", "<html></html>");
        let (_, pipeline) = pipeline(fetcher, config());

        let found = pipeline.count("fixture").await.unwrap();
        assert_eq!(found.total_movies(), 250);
        assert_eq!(found.found.map(|m| m.source), Some("films_watched"));

        let quiet = pipeline.count("quiet").await.unwrap();
        assert_eq!(quiet.total_movies(), 0);
        assert!(quiet.found.is_none());
    }

    #[tokio::test]
    async fn check_user_reflects_head_status() {
        let fetcher = StaticFetcher::new().with_page(PROFILE, &profile_html(1));
        let (_, pipeline) = pipeline(fetcher, config());

        let found = pipeline.check_user("fixture").await.unwrap();
        assert!(found.exists);
        assert_eq!(found.url, PROFILE);

        assert!(!pipeline.check_user("ghost").await.unwrap().exists);
    }

    struct StalledFetcher;

    impl Fetcher for StalledFetcher {
        async fn get_text(&self, _url: &str) -> Result<String, FetchError> {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            Ok(String::new())
        }

        async fn head_status(&self, _url: &str) -> Result<u16, FetchError> {
            Ok(200)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_are_bounded_by_the_overall_budget() {
        let config = PipelineConfig {
            overall_timeout_secs: 2,
            ..config()
        };
        let pipeline = Pipeline::new(Arc::new(StalledFetcher), config);

        let err = pipeline.scrape("fixture", &NullSink).await.unwrap_err();
        assert!(matches!(err, PipelineError::TimedOut { secs: 2 }));
    }
}
