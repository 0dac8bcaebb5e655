// src/driver.rs
use crate::config::{DelayRanges, RunEnvironment, SessionBackend, Settings};
use crate::description::DescriptionFetcher;
use crate::listing::{ListingParser, JOB_CARD_SELECTOR};
use crate::session::{ChromeSession, HttpSession, PageSession};
use crate::types::{RawListing, Sentinel};
use anyhow::{Context, Result};
use chrono::Local;
use rand::Rng;
use reqwest::Url;
use std::time::Duration;
use tracing::{error, info, warn};

/// Closes the session when dropped, whichever way the scrape ends.
struct SessionGuard<'a>(&'a mut dyn PageSession);

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Walks result pages, parses every card and fetches its description.
pub struct SessionDriver {
    settings: Settings,
    delays: DelayRanges,
    parser: ListingParser,
    fetcher: DescriptionFetcher,
}

impl SessionDriver {
    pub fn new(settings: Settings, env: RunEnvironment) -> Result<Self> {
        let parser = ListingParser::new(&settings.search.base_url, Local::now().date_naive())?;
        let fetcher = DescriptionFetcher::new(
            settings.timeouts.description_wait(),
            settings.timeouts.min_description_len,
        );
        Ok(Self {
            delays: settings.delay_ranges(env),
            settings,
            parser,
            fetcher,
        })
    }

    pub fn with_delays(mut self, delays: DelayRanges) -> Self {
        self.delays = delays;
        self
    }

    /// Opens the configured session backend.
    pub fn open_session(&self, env: RunEnvironment) -> Result<Box<dyn PageSession>> {
        let browser = &self.settings.browser;
        Ok(match browser.backend {
            SessionBackend::Chrome => {
                Box::new(ChromeSession::launch(browser, self.settings.headless(env))?)
            }
            SessionBackend::Http => Box::new(HttpSession::new(
                browser,
                Duration::from_secs(self.settings.timeouts.http_timeout_secs),
            )?),
        })
    }

    /// Scrapes up to `max_pages` result pages.
    ///
    /// Never fails: a run-level error is logged and whatever was collected
    /// before it is returned. The session is closed before returning.
    pub fn run(
        &self,
        session: &mut dyn PageSession,
        search_query: &str,
        location: &str,
        max_pages: usize,
    ) -> Vec<RawListing> {
        let mut listings = Vec::new();
        let guard = SessionGuard(session);

        if let Err(e) = self.scrape_pages(&mut *guard.0, search_query, location, max_pages, &mut listings) {
            error!("An error occurred during scraping: {:#}", e);
        }
        drop(guard);

        info!("Scraping complete: {} listings collected", listings.len());
        listings
    }

    fn scrape_pages(
        &self,
        session: &mut dyn PageSession,
        search_query: &str,
        location: &str,
        max_pages: usize,
        listings: &mut Vec<RawListing>,
    ) -> Result<()> {
        for page in 0..max_pages {
            let url = self.page_url(search_query, location, page)?;
            info!("Scraping search results page {}: {}", page + 1, url);
            session.navigate(url.as_str())?;

            if !session.wait_for(JOB_CARD_SELECTOR, self.settings.timeouts.card_wait())? {
                warn!("No job cards appeared on page {}. Stopping.", page + 1);
                break;
            }

            let cards = self.parser.parse_results_page(&session.page_source()?);
            if cards.is_empty() {
                warn!("Found no jobs on page {}. Stopping.", page + 1);
                break;
            }
            info!("Found {} jobs on this page", cards.len());

            for card in cards {
                let description = if card.has_link() {
                    info!("  Getting description for: {}", card.title);
                    self.fetcher.fetch_description(session, &card.link)
                } else {
                    Sentinel::NotAvailable.as_str().to_string()
                };
                listings.push(card.with_description(description));
                pause(self.delays.per_job_secs);
            }

            if page + 1 < max_pages {
                pause(self.delays.per_page_secs);
            }
        }
        Ok(())
    }

    /// Results URL for a zero-based page index.
    pub fn page_url(&self, search_query: &str, location: &str, page: usize) -> Result<Url> {
        let search = &self.settings.search;
        let start = (page * search.page_size).to_string();
        let base = format!("{}/jobs", search.base_url.trim_end_matches('/'));
        Url::parse_with_params(
            &base,
            &[("q", search_query), ("l", location), ("start", start.as_str())],
        )
        .with_context(|| format!("Invalid search URL base: {}", base))
    }
}

/// Uniformly random duration within `(min, max)` seconds.
pub fn random_delay((min, max): (f64, f64)) -> Duration {
    let min = min.max(0.0);
    if max <= min {
        return Duration::from_secs_f64(min);
    }
    Duration::from_secs_f64(rand::thread_rng().gen_range(min..max))
}

fn pause(range: (f64, f64)) {
    let delay = random_delay(range);
    if delay.is_zero() {
        return;
    }
    info!("    ... waiting for {:.2} seconds ...", delay.as_secs_f64());
    std::thread::sleep(delay);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSession;

    const DESCRIPTION: &str = "Experience with Python, SQL and AWS required for this data science role.";

    fn driver() -> SessionDriver {
        SessionDriver::new(Settings::default(), RunEnvironment::default())
            .unwrap()
            .with_delays(DelayRanges::NONE)
    }

    fn results_page(cards: &[(&str, Option<&str>)]) -> String {
        let cards: String = cards
            .iter()
            .map(|(title, href)| {
                let href = href.map(|h| format!(r#" href="{}""#, h)).unwrap_or_default();
                format!(
                    r#"<div class="job_seen_beacon"><h2 class="jobTitle"><a{}>{}</a></h2><span data-testid="company-name">Acme</span></div>"#,
                    href, title
                )
            })
            .collect();
        format!("<html><body>{}</body></html>", cards)
    }

    fn detail_page() -> String {
        format!(r#"<html><body><div id="jobDescriptionText">{}</div></body></html>"#, DESCRIPTION)
    }

    fn url(driver: &SessionDriver, page: usize) -> String {
        driver.page_url("data scientist", "New York, NY", page).unwrap().to_string()
    }

    #[test]
    fn test_page_url_encodes_query_and_offset() {
        let driver = driver();
        let url = driver.page_url("data scientist", "New York, NY", 2).unwrap();
        assert_eq!(url.path(), "/jobs");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "data scientist".to_string()),
                ("l".to_string(), "New York, NY".to_string()),
                ("start".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn test_stops_on_empty_page_and_keeps_prior_listings() {
        let driver = driver();
        let mut session = FakeSession::default()
            .with_page(&url(&driver, 0), &results_page(&[("Data Scientist", Some("/job/1")), ("No Link", None)]))
            .with_page("https://www.indeed.com/job/1", &detail_page())
            .with_page(&url(&driver, 1), &results_page(&[]));

        let listings = driver.run(&mut session, "data scientist", "New York, NY", 3);

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title, "Data Scientist");
        assert_eq!(listings[0].description, DESCRIPTION);
        assert_eq!(listings[1].title, "No Link");
        assert_eq!(listings[1].description, "N/A");
        // The linkless card never triggers navigation, and page 3 is never requested.
        assert_eq!(session.visited.len(), 3);
        assert!(session.closed);
    }

    #[test]
    fn test_empty_first_page_returns_nothing() {
        let driver = driver();
        let mut session = FakeSession::default().with_page(&url(&driver, 0), "<html><body></body></html>");

        let listings = driver.run(&mut session, "data scientist", "New York, NY", 3);
        assert!(listings.is_empty());
        assert!(session.closed);
    }

    #[test]
    fn test_card_wait_uses_configured_timeout() {
        let mut settings = Settings::default();
        settings.timeouts.card_wait_secs = 7;
        let driver = SessionDriver::new(settings, RunEnvironment::default())
            .unwrap()
            .with_delays(DelayRanges::NONE);
        let mut session = FakeSession::default().with_page(&url(&driver, 0), &results_page(&[]));

        driver.run(&mut session, "data scientist", "New York, NY", 1);
        assert_eq!(
            session.waits,
            vec![(JOB_CARD_SELECTOR.to_string(), Duration::from_secs(7))]
        );
    }

    #[test]
    fn test_run_level_failure_keeps_partial_results() {
        let driver = driver();
        // Page 2 is unreachable, which aborts the run.
        let mut session = FakeSession::default()
            .with_page(&url(&driver, 0), &results_page(&[("First", Some("/job/1"))]))
            .with_page("https://www.indeed.com/job/1", &detail_page());

        let listings = driver.run(&mut session, "data scientist", "New York, NY", 2);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "First");
        assert!(session.closed);
    }

    #[test]
    fn test_unreachable_detail_page_is_recorded_as_error() {
        let driver = driver();
        let mut session = FakeSession::default()
            .with_page(&url(&driver, 0), &results_page(&[("Broken", Some("/job/404"))]));

        let listings = driver.run(&mut session, "data scientist", "New York, NY", 1);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].description, "Error loading description");
    }

    #[test]
    fn test_random_delay_stays_in_range() {
        for _ in 0..100 {
            let delay = random_delay((1.0, 2.0)).as_secs_f64();
            assert!((1.0..2.0).contains(&delay));
        }
        assert!(random_delay((0.0, 0.0)).is_zero());
    }
}
