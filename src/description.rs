// src/description.rs
use crate::listing::clean_text;
use crate::session::PageSession;
use crate::types::Sentinel;
use anyhow::Result;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Ways of locating the description element on a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Id(&'static str),
    ClassName(&'static str),
    /// `tag` whose `attr` contains `fragment`.
    AttributeContains {
        tag: &'static str,
        attr: &'static str,
        fragment: &'static str,
    },
    Css(&'static str),
}

impl Locator {
    pub fn to_css(&self) -> String {
        match self {
            Locator::Id(id) => format!("#{}", id),
            Locator::ClassName(class) => format!(".{}", class),
            Locator::AttributeContains {
                tag,
                attr,
                fragment,
            } => format!("{}[{}*='{}']", tag, attr, fragment),
            Locator::Css(css) => css.to_string(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "id={}", id),
            Locator::ClassName(class) => write!(f, "class={}", class),
            Locator::AttributeContains { .. } | Locator::Css(_) => {
                write!(f, "css={}", self.to_css())
            }
        }
    }
}

/// Most specific first; `body` catches pages whose markup changed.
pub const DESCRIPTION_LOCATORS: &[Locator] = &[
    Locator::Id("jobDescriptionText"),
    Locator::ClassName("jobsearch-jobDescriptionText"),
    Locator::ClassName("job-description"),
    Locator::AttributeContains {
        tag: "div",
        attr: "class",
        fragment: "description",
    },
    Locator::Css("body"),
];

pub struct DescriptionFetcher {
    locators: Vec<Locator>,
    wait: Duration,
    min_len: usize,
}

impl DescriptionFetcher {
    pub fn new(wait: Duration, min_len: usize) -> Self {
        Self {
            locators: DESCRIPTION_LOCATORS.to_vec(),
            wait,
            min_len,
        }
    }

    /// Description text for `link`, or a sentinel. Never fails.
    pub fn fetch_description(&self, session: &mut dyn PageSession, link: &str) -> String {
        if link.trim() == Sentinel::NotAvailable.as_str() {
            return Sentinel::NotAvailable.as_str().to_string();
        }

        match self.try_fetch(session, link) {
            Ok(Some(text)) => text,
            Ok(None) => {
                info!("    No description strategy matched for {}", link);
                Sentinel::DescriptionNotFound.as_str().to_string()
            }
            Err(e) => {
                warn!("Error extracting description from {}: {:#}", link, e);
                Sentinel::DescriptionLoadError.as_str().to_string()
            }
        }
    }

    fn try_fetch(&self, session: &mut dyn PageSession, link: &str) -> Result<Option<String>> {
        session.navigate(link)?;

        for locator in &self.locators {
            let raw = match session.find_text(&locator.to_css(), self.wait) {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    debug!("    {} not found", locator);
                    continue;
                }
                Err(e) => {
                    debug!("    {} failed: {:#}", locator, e);
                    continue;
                }
            };
            let text = clean_text(&raw);
            let len = text.chars().count();
            if len >= self.min_len {
                debug!("    Description found via {}", locator);
                return Ok(Some(text));
            }
            debug!("    {} matched but text too short ({} chars)", locator, len);
        }

        Ok(None)
    }
}
