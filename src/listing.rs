// src/listing.rs
use crate::types::{RawListing, Sentinel};
use anyhow::Result;
use chrono::{Days, NaiveDate};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

pub const JOB_CARD_SELECTOR: &str = "div.job_seen_beacon";

const TITLE_SELECTORS: &[&str] = &["h2.jobTitle a", "h2.jobTitle"];
const LINK_SELECTOR: &str = "h2.jobTitle a";
const COMPANY_SELECTORS: &[&str] = &["[data-testid='company-name']", "span.companyName"];
const LOCATION_SELECTORS: &[&str] = &["[data-testid='text-location']", "div.companyLocation"];
const DATE_SELECTORS: &[&str] = &["[data-testid='myJobsStateDate']", "span.date"];

/// Turns job cards from a rendered results page into [`RawListing`]s.
///
/// Every field is looked up on its own; a lookup that finds nothing leaves
/// that field at the "not available" sentinel and the others untouched.
pub struct ListingParser {
    base_url: String,
    today: NaiveDate,
    relative_date: Regex,
}

impl ListingParser {
    /// `today` anchors relative dates such as "Posted 3 days ago".
    pub fn new(base_url: &str, today: NaiveDate) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            today,
            relative_date: Regex::new(r"(?i)(\d+)\+?\s*(minute|hour|day)s?\s+ago")?,
        })
    }

    /// All cards on a results page, in document order.
    pub fn parse_results_page(&self, html: &str) -> Vec<RawListing> {
        let document = Html::parse_document(html);
        match Selector::parse(JOB_CARD_SELECTOR) {
            Ok(selector) => document
                .select(&selector)
                .map(|card| self.parse_card(card))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Parses a card given as an HTML fragment.
    pub fn parse_card_html(&self, fragment: &str) -> RawListing {
        let fragment = Html::parse_fragment(fragment);
        self.parse_card(fragment.root_element())
    }

    /// The returned listing has the "not available" sentinel as description;
    /// the driver fills it in after visiting the link.
    pub fn parse_card(&self, card: ElementRef) -> RawListing {
        let fallback = || Sentinel::NotAvailable.as_str().to_string();

        RawListing {
            title: first_text(card, TITLE_SELECTORS).unwrap_or_else(fallback),
            company: first_text(card, COMPANY_SELECTORS).unwrap_or_else(fallback),
            location: first_text(card, LOCATION_SELECTORS).unwrap_or_else(fallback),
            link: self.link_of(card).unwrap_or_else(fallback),
            date_posted: first_text(card, DATE_SELECTORS)
                .map(|text| self.resolve_date(&text))
                .unwrap_or_else(fallback),
            description: fallback(),
        }
    }

    fn link_of(&self, card: ElementRef) -> Option<String> {
        let selector = Selector::parse(LINK_SELECTOR).ok()?;
        let href = card.select(&selector).next()?.value().attr("href")?.trim();

        if href.is_empty() {
            None
        } else if href.starts_with("http://") || href.starts_with("https://") {
            Some(href.to_string())
        } else if href.starts_with('/') {
            Some(format!("{}{}", self.base_url, href))
        } else {
            Some(format!("{}/{}", self.base_url, href))
        }
    }

    /// ISO date for phrases the site uses for recency, otherwise `text` as is.
    pub fn resolve_date(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        if lower.contains("just posted") || lower.contains("today") {
            return self.today.format("%Y-%m-%d").to_string();
        }

        let resolved = self.relative_date.captures(&lower).and_then(|caps| {
            let amount: u64 = caps.get(1)?.as_str().parse().ok()?;
            match caps.get(2)?.as_str() {
                "day" => self.today.checked_sub_days(Days::new(amount)),
                _ => Some(self.today),
            }
        });

        match resolved {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => text.to_string(),
        }
    }
}

/// Whitespace-collapsed text of the first selector that yields any.
fn first_text(scope: ElementRef, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        let element = scope.select(&selector).next()?;
        let text = clean_text(&element.text().collect::<Vec<_>>().join(" "));
        (!text.is_empty()).then_some(text)
    })
}

pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.indeed.com";

    fn parser() -> ListingParser {
        ListingParser::new(BASE, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()).unwrap()
    }

    const FULL_CARD: &str = r#"
        <div class="job_seen_beacon">
          <h2 class="jobTitle"><a href="/rc/clk?jk=abc123"><span title="Data Scientist">Data
              Scientist</span></a></h2>
          <span data-testid="company-name"> Acme Corp </span>
          <div data-testid="text-location">New York, NY</div>
          <span data-testid="myJobsStateDate">Posted 3 days ago</span>
        </div>"#;

    #[test]
    fn test_parses_all_fields() {
        let listing = parser().parse_card_html(FULL_CARD);
        assert_eq!(listing.title, "Data Scientist");
        assert_eq!(listing.company, "Acme Corp");
        assert_eq!(listing.location, "New York, NY");
        assert_eq!(listing.link, "https://www.indeed.com/rc/clk?jk=abc123");
        assert_eq!(listing.date_posted, "2024-05-17");
        assert_eq!(listing.description, "N/A");
    }

    #[test]
    fn test_missing_fields_fall_back_independently() {
        let card = r#"<div class="job_seen_beacon">
            <h2 class="jobTitle"><a>Analyst</a></h2>
            <div data-testid="text-location">Remote</div>
        </div>"#;
        let listing = parser().parse_card_html(card);
        assert_eq!(listing.title, "Analyst");
        assert_eq!(listing.link, "N/A");
        assert_eq!(listing.company, "N/A");
        assert_eq!(listing.location, "Remote");
        assert_eq!(listing.date_posted, "N/A");
    }

    #[test]
    fn test_malformed_card_is_all_sentinels() {
        for fragment in ["", "<div><p>nothing here", "<<>>"] {
            assert_eq!(parser().parse_card_html(fragment), RawListing::unavailable());
        }
    }

    #[test]
    fn test_absolute_links_are_kept() {
        let card = r#"<h2 class="jobTitle"><a href="https://jobs.example.com/1">Role</a></h2>"#;
        assert_eq!(parser().parse_card_html(card).link, "https://jobs.example.com/1");
    }

    #[test]
    fn test_resolves_relative_dates() {
        let parser = parser();
        assert_eq!(parser.resolve_date("Just posted"), "2024-05-20");
        assert_eq!(parser.resolve_date("Today"), "2024-05-20");
        assert_eq!(parser.resolve_date("Active 5 hours ago"), "2024-05-20");
        assert_eq!(parser.resolve_date("30+ days ago"), "2024-04-20");
        assert_eq!(parser.resolve_date("Posted 1 day ago"), "2024-05-19");
        assert_eq!(parser.resolve_date("Hiring ongoing"), "Hiring ongoing");
    }

    #[test]
    fn test_results_page_keeps_card_order() {
        let page = format!(
            "<html><body>{}<div class=\"job_seen_beacon\"><h2 class=\"jobTitle\"><a href=\"/two\">Second</a></h2></div></body></html>",
            FULL_CARD
        );
        let listings = parser().parse_results_page(&page);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title, "Data Scientist");
        assert_eq!(listings[1].title, "Second");
        assert_eq!(listings[1].link, "https://www.indeed.com/two");
    }
}
