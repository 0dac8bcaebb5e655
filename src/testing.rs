// src/testing.rs
use crate::listing::clean_text;
use crate::session::PageSession;
use anyhow::{bail, Result};
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// In-memory session serving canned pages. Unknown URLs fail to navigate.
#[derive(Default)]
pub struct FakeSession {
    pages: HashMap<String, String>,
    current: Option<String>,
    broken: HashSet<String>,
    pub visited: Vec<String>,
    /// Every selector waited on or looked up, with the timeout it was given.
    pub waits: Vec<(String, Duration)>,
    pub closed: bool,
}

impl FakeSession {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Makes `find_text` fail for `css`, as a stale node would.
    pub fn with_broken_selector(mut self, css: &str) -> Self {
        self.broken.insert(css.to_string());
        self
    }

    fn document(&self) -> Result<Html> {
        match &self.current {
            Some(html) => Ok(Html::parse_document(html)),
            None => bail!("no page loaded"),
        }
    }
}

impl PageSession for FakeSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.visited.push(url.to_string());
        match self.pages.get(url) {
            Some(html) => {
                self.current = Some(html.clone());
                Ok(())
            }
            None => {
                self.current = None;
                bail!("connection refused: {}", url)
            }
        }
    }

    fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<bool> {
        self.waits.push((css.to_string(), timeout));
        let selector = Selector::parse(css).map_err(|e| anyhow::anyhow!("{:?}", e))?;
        Ok(self.document()?.select(&selector).next().is_some())
    }

    fn page_source(&mut self) -> Result<String> {
        match &self.current {
            Some(html) => Ok(html.clone()),
            None => bail!("no page loaded"),
        }
    }

    fn find_text(&mut self, css: &str, timeout: Duration) -> Result<Option<String>> {
        self.waits.push((css.to_string(), timeout));
        if self.broken.contains(css) {
            bail!("node for {} is no longer attached", css);
        }
        let selector = Selector::parse(css).map_err(|e| anyhow::anyhow!("{:?}", e))?;
        Ok(self
            .document()?
            .select(&selector)
            .next()
            .map(|element| clean_text(&element.text().collect::<Vec<_>>().join(" "))))
    }

    fn close(&mut self) {
        self.closed = true;
        self.current = None;
    }
}
