// src/session.rs
use crate::config::BrowserSettings;
use crate::listing::clean_text;
use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use std::ffi::{OsStr, OsString};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A page-at-a-time browsing session driven from a single thread.
///
/// Waits block the calling thread for at most the given timeout. A lookup
/// that times out is `Ok(None)`/`Ok(false)`; `Err` is reserved for failures
/// of the session itself.
pub trait PageSession {
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Waits until an element matching `css` exists on the current page.
    fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<bool>;

    /// HTML of the current page as rendered.
    fn page_source(&mut self) -> Result<String>;

    /// Text of the first element matching `css`, waiting up to `timeout`.
    fn find_text(&mut self, css: &str, timeout: Duration) -> Result<Option<String>>;

    /// Releases the session. Calling it more than once is harmless.
    fn close(&mut self);
}

/// Headless (or visible) Chrome with automation fingerprints masked.
pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

impl ChromeSession {
    pub fn launch(settings: &BrowserSettings, headless: bool) -> Result<Self> {
        info!("Starting stealth Chrome session (headless: {})", headless);

        let user_agent = OsString::from(format!("--user-agent={}", settings.user_agent));
        let lang = OsString::from(format!("--lang={}", settings.accept_language));
        let args: Vec<&OsStr> = vec![
            user_agent.as_os_str(),
            lang.as_os_str(),
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--start-maximized"),
        ];

        let browser = Browser::new(LaunchOptions {
            headless,
            sandbox: false,
            window_size: Some(settings.window_size),
            idle_browser_timeout: Duration::from_secs(600),
            args,
            ..Default::default()
        })
        .context("Failed to launch Chrome")?;

        let tab = browser.new_tab().context("Failed to open browser tab")?;
        // Patches navigator.webdriver, plugins, permissions and WebGL vendor/renderer.
        tab.enable_stealth_mode()
            .context("Failed to enable stealth mode")?;
        tab.set_user_agent(
            &settings.user_agent,
            Some(&settings.accept_language),
            Some(&settings.platform),
        )
        .context("Failed to override user agent")?;

        Ok(Self {
            browser: Some(browser),
            tab,
        })
    }
}

impl PageSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .with_context(|| format!("Failed to navigate to {}", url))?
            .wait_until_navigated()
            .with_context(|| format!("Navigation to {} did not complete", url))?;
        Ok(())
    }

    fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<bool> {
        match self.tab.wait_for_element_with_custom_timeout(css, timeout) {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!("No element for '{}' within {:?}: {}", css, timeout, e);
                Ok(false)
            }
        }
    }

    fn page_source(&mut self) -> Result<String> {
        self.tab.get_content().context("Failed to read page content")
    }

    fn find_text(&mut self, css: &str, timeout: Duration) -> Result<Option<String>> {
        let element = match self.tab.wait_for_element_with_custom_timeout(css, timeout) {
            Ok(element) => element,
            Err(e) => {
                debug!("No element for '{}' within {:?}: {}", css, timeout, e);
                return Ok(None);
            }
        };
        let text = element
            .get_inner_text()
            .with_context(|| format!("Failed to read text of '{}'", css))?;
        Ok(Some(text))
    }

    fn close(&mut self) {
        if let Some(browser) = self.browser.take() {
            info!("Closing Chrome session");
            if let Err(e) = self.tab.close(true) {
                warn!("Failed to close tab cleanly: {}", e);
            }
            // Dropping the browser terminates the Chrome process.
            drop(browser);
        }
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Plain HTTP fetching without JavaScript; waits resolve immediately
/// against the downloaded document.
pub struct HttpSession {
    client: Client,
    html: Option<String>,
}

impl HttpSession {
    pub fn new(settings: &BrowserSettings, timeout: Duration) -> Result<Self> {
        info!("Starting plain HTTP session");
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, html: None })
    }

    fn document(&self) -> Result<Html> {
        let html = self
            .html
            .as_deref()
            .context("No page loaded in HTTP session")?;
        Ok(Html::parse_document(html))
    }
}

impl PageSession for HttpSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.html = None;
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        self.html = Some(response.text().context("Failed to read response body")?);
        Ok(())
    }

    fn wait_for(&mut self, css: &str, _timeout: Duration) -> Result<bool> {
        let document = self.document()?;
        Ok(match Selector::parse(css) {
            Ok(selector) => document.select(&selector).next().is_some(),
            Err(_) => false,
        })
    }

    fn page_source(&mut self) -> Result<String> {
        self.html.clone().context("No page loaded in HTTP session")
    }

    fn find_text(&mut self, css: &str, _timeout: Duration) -> Result<Option<String>> {
        let document = self.document()?;
        let Ok(selector) = Selector::parse(css) else {
            return Ok(None);
        };
        Ok(document
            .select(&selector)
            .next()
            .map(|element| clean_text(&element.text().collect::<Vec<_>>().join(" "))))
    }

    fn close(&mut self) {
        self.html = None;
    }
}
