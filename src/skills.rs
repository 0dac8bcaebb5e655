// src/skills.rs
use crate::types::Sentinel;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

/// Terms scanned for in descriptions. Synonym sources are listed too so they
/// get matched before being folded into their canonical form.
pub const SKILL_TERMS: &[&str] = &[
    "python", "r", "sql", "java", "c++", "scala", "julia",
    "pandas", "numpy", "scipy", "matplotlib", "seaborn", "plotly",
    "scikit-learn", "sklearn", "tensorflow", "keras", "pytorch", "torch",
    "spark", "pyspark", "hadoop", "mapreduce", "hive",
    "aws", "s3", "lambda", "azure", "gcp", "google cloud",
    "docker", "kubernetes",
    "git", "github",
    "tableau", "power bi", "powerbi", "looker",
    "excel", "statistics", "machine learning", "deep learning", "neural network",
    "nlp", "natural language processing", "computer vision",
    "etl", "data warehousing", "data modeling", "data mining",
];

/// Surface term -> canonical skill.
///
/// Deep learning and neural networks deliberately fold into machine learning.
pub const SKILL_SYNONYMS: &[(&str, &str)] = &[
    ("sklearn", "scikit-learn"),
    ("torch", "pytorch"),
    ("powerbi", "power bi"),
    ("google cloud", "gcp"),
    ("natural language processing", "nlp"),
    ("deep learning", "machine learning"),
    ("neural network", "machine learning"),
];

struct SkillTerm {
    canonical: String,
    pattern: Regex,
}

/// Immutable skill vocabulary with precompiled whole-word matchers.
///
/// Build it once at startup and share it by reference.
pub struct SkillVocabulary {
    terms: Vec<SkillTerm>,
    synonyms: HashMap<String, String>,
}

impl SkillVocabulary {
    /// The curated vocabulary shipped with the crate.
    pub fn standard() -> Result<Self> {
        Self::new(SKILL_TERMS, SKILL_SYNONYMS)
    }

    /// Builds a vocabulary, rejecting synonym tables that would not resolve
    /// to a canonical term in one step.
    pub fn new(terms: &[&str], synonyms: &[(&str, &str)]) -> Result<Self> {
        let known: BTreeSet<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        let synonyms: HashMap<String, String> = synonyms
            .iter()
            .map(|(from, to)| (from.to_lowercase(), to.to_lowercase()))
            .collect();

        for (from, to) in &synonyms {
            if !known.contains(from) {
                bail!("Synonym source '{}' is not a vocabulary term", from);
            }
            if !known.contains(to) {
                bail!("Synonym '{}' maps to unknown term '{}'", from, to);
            }
            if synonyms.contains_key(to) {
                bail!("Synonym '{}' maps to '{}', which is not canonical", from, to);
            }
        }

        let terms = known
            .iter()
            .map(|term| {
                let pattern = Regex::new(&whole_word_pattern(term))
                    .with_context(|| format!("Invalid skill pattern for '{}'", term))?;
                let canonical = synonyms.get(term).cloned().unwrap_or_else(|| term.clone());
                Ok(SkillTerm { canonical, pattern })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { terms, synonyms })
    }

    /// Resolves a term to its canonical skill. Applying it twice is the same
    /// as applying it once.
    pub fn canonical(&self, term: &str) -> String {
        let term = term.to_lowercase();
        self.synonyms.get(&term).cloned().unwrap_or(term)
    }

    /// Canonical skills mentioned in `text`, sorted and without duplicates.
    ///
    /// Empty text and sentinel values yield an empty list.
    pub fn extract_skills(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() || Sentinel::matches_any(text) {
            return Vec::new();
        }

        let found: BTreeSet<&str> = self
            .terms
            .iter()
            .filter(|term| term.pattern.is_match(text))
            .map(|term| term.canonical.as_str())
            .collect();

        found.into_iter().map(String::from).collect()
    }
}

/// Case-insensitive match of `term` not embedded in a larger token.
///
/// Boundaries are checked by hand instead of `\b` so terms ending in
/// punctuation (`c++`) still match before a space.
fn whole_word_pattern(term: &str) -> String {
    let body = term
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    format!(r"(?i)(?:^|[^\w]){}(?:[^\w]|$)", body)
}
