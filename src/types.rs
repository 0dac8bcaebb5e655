// src/types.rs
use serde::{Deserialize, Serialize};

/// Literal values standing in for data that could not be extracted.
///
/// Downstream consumers read these as ordinary strings, so a table row never
/// has an empty or null cell where a sentinel is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// Field missing from a card, or a card without a link.
    NotAvailable,
    /// Every description strategy was tried without a match.
    DescriptionNotFound,
    /// Navigation or extraction of the detail page failed.
    DescriptionLoadError,
}

impl Sentinel {
    pub const ALL: [Sentinel; 3] = [
        Sentinel::NotAvailable,
        Sentinel::DescriptionNotFound,
        Sentinel::DescriptionLoadError,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Sentinel::NotAvailable => "N/A",
            Sentinel::DescriptionNotFound => "Description not found.",
            Sentinel::DescriptionLoadError => "Error loading description",
        }
    }

    /// True when `value` (ignoring surrounding whitespace) is any sentinel.
    pub fn matches_any(value: &str) -> bool {
        let value = value.trim();
        Self::ALL.iter().any(|s| s.as_str() == value)
    }
}

fn not_available() -> String {
    Sentinel::NotAvailable.as_str().to_string()
}

/// One job card as scraped, before any cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
    #[serde(default = "not_available")]
    pub date_posted: String,
    pub description: String,
}

impl RawListing {
    /// A listing with every field set to the "not available" sentinel.
    pub fn unavailable() -> Self {
        Self {
            title: not_available(),
            company: not_available(),
            location: not_available(),
            link: not_available(),
            date_posted: not_available(),
            description: not_available(),
        }
    }

    pub fn has_link(&self) -> bool {
        let link = self.link.trim();
        !link.is_empty() && link != Sentinel::NotAvailable.as_str()
    }

    pub fn with_description(self, description: String) -> Self {
        Self {
            description,
            ..self
        }
    }

    /// Copy with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            company: self.company.trim().to_string(),
            location: self.location.trim().to_string(),
            link: self.link.trim().to_string(),
            date_posted: self.date_posted.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }
}

/// A cleaned listing with its extracted skills.
///
/// Fields are private so `skill_count` can only ever equal `skills.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedListing {
    listing: RawListing,
    skills: Vec<String>,
}

impl ProcessedListing {
    /// `skills` is sorted and deduplicated here, whatever order it arrives in.
    pub fn new(listing: RawListing, mut skills: Vec<String>) -> Self {
        skills.sort();
        skills.dedup();
        Self { listing, skills }
    }

    pub fn listing(&self) -> &RawListing {
        &self.listing
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_matching() {
        assert!(Sentinel::matches_any("N/A"));
        assert!(Sentinel::matches_any("  Description not found. "));
        assert!(Sentinel::matches_any("Error loading description"));
        assert!(!Sentinel::matches_any("n/a is not a sentinel"));
        assert!(!Sentinel::matches_any(""));
    }

    #[test]
    fn test_unavailable_listing_uses_sentinels() {
        let listing = RawListing::unavailable();
        assert_eq!(listing.title, "N/A");
        assert_eq!(listing.date_posted, "N/A");
        assert!(!listing.has_link());
    }

    #[test]
    fn test_processed_listing_count_matches_skills() {
        let skills = vec!["sql".to_string(), "aws".to_string(), "sql".to_string()];
        let processed = ProcessedListing::new(RawListing::unavailable(), skills);
        assert_eq!(processed.skills(), ["aws", "sql"]);
        assert_eq!(processed.skill_count(), processed.skills().len());
    }
}
