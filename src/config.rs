// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "jobscope.toml";

/// Everything a run needs. Defaults reproduce the stock search; a TOML file
/// may override any subset of fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search: SearchSettings,
    pub timeouts: TimeoutSettings,
    pub delays: DelaySettings,
    pub browser: BrowserSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub query: String,
    pub location: String,
    pub max_pages: usize,
    pub page_size: usize,
    pub base_url: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            query: "data scientist".to_string(),
            location: "New York, NY".to_string(),
            max_pages: 3,
            page_size: 10,
            base_url: "https://www.indeed.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub card_wait_secs: u64,
    pub description_wait_secs: u64,
    pub min_description_len: usize,
    pub http_timeout_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            card_wait_secs: 20,
            description_wait_secs: 10,
            min_description_len: 50,
            http_timeout_secs: 30,
        }
    }
}

impl TimeoutSettings {
    pub fn card_wait(&self) -> Duration {
        Duration::from_secs(self.card_wait_secs)
    }

    pub fn description_wait(&self) -> Duration {
        Duration::from_secs(self.description_wait_secs)
    }
}

/// Delay ranges in seconds, `(min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayRanges {
    pub per_job_secs: (f64, f64),
    pub per_page_secs: (f64, f64),
}

impl DelayRanges {
    pub const NONE: DelayRanges = DelayRanges {
        per_job_secs: (0.0, 0.0),
        per_page_secs: (0.0, 0.0),
    };
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelaySettings {
    pub local: DelayRanges,
    pub unattended: DelayRanges,
}

impl Default for DelaySettings {
    fn default() -> Self {
        Self {
            local: DelayRanges {
                per_job_secs: (3.0, 8.0),
                per_page_secs: (8.0, 15.0),
            },
            unattended: DelayRanges {
                per_job_secs: (5.0, 12.0),
                per_page_secs: (15.0, 25.0),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Chrome,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub backend: SessionBackend,
    /// `None` lets the environment decide.
    pub headless: Option<bool>,
    pub window_size: (u32, u32),
    pub user_agent: String,
    pub accept_language: String,
    pub platform: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Chrome,
            headless: None,
            window_size: (1920, 1080),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept_language: "en-US,en".to_string(),
            platform: "Win32".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub data_dir: PathBuf,
    pub raw_file: String,
    pub processed_file: String,
    pub summary_file: String,
    pub top_n: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            raw_file: "raw_job_data.csv".to_string(),
            processed_file: "processed_job_data.csv".to_string(),
            summary_file: "skill_summary.json".to_string(),
            top_n: 10,
        }
    }
}

impl OutputSettings {
    pub fn raw_path(&self) -> PathBuf {
        self.data_dir.join(&self.raw_file)
    }

    pub fn processed_path(&self) -> PathBuf {
        self.data_dir.join(&self.processed_file)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.data_dir.join(&self.summary_file)
    }
}

impl Settings {
    /// Loads `path`, or `jobscope.toml` in the working directory when it
    /// exists, or the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default_path.exists() {
                    return Ok(Self::default());
                }
                default_path
            }
        };

        info!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn headless(&self, env: RunEnvironment) -> bool {
        env.unattended || self.browser.headless.unwrap_or(false)
    }

    pub fn delay_ranges(&self, env: RunEnvironment) -> DelayRanges {
        if env.unattended {
            self.delays.unattended
        } else {
            self.delays.local
        }
    }
}

/// Whether the run is unattended (CI), read once from the environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunEnvironment {
    pub unattended: bool,
}

impl RunEnvironment {
    pub fn detect() -> Self {
        Self::from_ci_flag(std::env::var("CI").ok().as_deref())
    }

    pub fn from_ci_flag(value: Option<&str>) -> Self {
        let unattended = match value.map(|v| v.trim().to_lowercase()) {
            None => false,
            Some(v) => !(v.is_empty() || v == "0" || v == "false"),
        };
        Self { unattended }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ci_flag_detection() {
        assert!(!RunEnvironment::from_ci_flag(None).unattended);
        assert!(!RunEnvironment::from_ci_flag(Some("")).unattended);
        assert!(!RunEnvironment::from_ci_flag(Some("false")).unattended);
        assert!(!RunEnvironment::from_ci_flag(Some("0")).unattended);
        assert!(RunEnvironment::from_ci_flag(Some("true")).unattended);
        assert!(RunEnvironment::from_ci_flag(Some("1")).unattended);
    }

    #[test]
    fn test_unattended_forces_headless_and_wider_delays() {
        let settings = Settings::default();
        let ci = RunEnvironment { unattended: true };
        let local = RunEnvironment::default();

        assert!(settings.headless(ci));
        assert!(!settings.headless(local));
        assert!(settings.delay_ranges(ci).per_job_secs.1 > settings.delay_ranges(local).per_job_secs.1);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            [search]
            query = "data engineer"
            max_pages = 1

            [browser]
            backend = "http"
            headless = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.search.query, "data engineer");
        assert_eq!(settings.search.max_pages, 1);
        assert_eq!(settings.search.location, "New York, NY");
        assert_eq!(settings.browser.backend, SessionBackend::Http);
        assert_eq!(settings.timeouts.description_wait_secs, 10);
        assert_eq!(settings.output.raw_path(), PathBuf::from("./raw_job_data.csv"));
    }
}
