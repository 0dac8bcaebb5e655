// src/pipeline.rs
use crate::skills::SkillVocabulary;
use crate::types::{ProcessedListing, RawListing, Sentinel};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillFrequency {
    pub skill: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub total_input: usize,
    pub surviving: usize,
    pub distinct_companies: usize,
    pub distinct_skills: usize,
    pub mean_skills_per_job: f64,
    pub top_skills: Vec<SkillFrequency>,
}

/// Cleans raw listings, attaches skills and computes summary statistics.
pub fn process(
    vocabulary: &SkillVocabulary,
    raw: &[RawListing],
    top_n: usize,
) -> (Vec<ProcessedListing>, PipelineSummary) {
    let processed: Vec<ProcessedListing> = raw
        .iter()
        .map(RawListing::trimmed)
        .filter(is_usable)
        .map(|listing| {
            let skills = vocabulary.extract_skills(&listing.description);
            ProcessedListing::new(listing, skills)
        })
        .collect();

    let summary = summarize(raw.len(), &processed, top_n);
    (processed, summary)
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || Sentinel::matches_any(value)
}

/// A trimmed listing survives when title, company and description all hold
/// real content.
fn is_usable(listing: &RawListing) -> bool {
    !is_missing(&listing.title) && !is_missing(&listing.company) && !is_missing(&listing.description)
}

fn summarize(total_input: usize, processed: &[ProcessedListing], top_n: usize) -> PipelineSummary {
    let companies: HashSet<&str> = processed.iter().map(|p| p.listing().company.as_str()).collect();
    let frequencies = count_skills(processed);
    let total_skills: usize = processed.iter().map(ProcessedListing::skill_count).sum();

    let mean_skills_per_job = if processed.is_empty() {
        0.0
    } else {
        total_skills as f64 / processed.len() as f64
    };

    PipelineSummary {
        total_input,
        surviving: processed.len(),
        distinct_companies: companies.len(),
        distinct_skills: frequencies.len(),
        mean_skills_per_job,
        top_skills: frequencies.into_iter().take(top_n).collect(),
    }
}

/// Skill counts, most frequent first; equal counts keep first-seen order.
fn count_skills(processed: &[ProcessedListing]) -> Vec<SkillFrequency> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut frequencies: Vec<SkillFrequency> = Vec::new();

    for skill in processed.iter().flat_map(|p| p.skills()) {
        match index.get(skill.as_str()) {
            Some(&i) => frequencies[i].count += 1,
            None => {
                index.insert(skill.as_str(), frequencies.len());
                frequencies.push(SkillFrequency {
                    skill: skill.clone(),
                    count: 1,
                });
            }
        }
    }

    // Stable sort keeps first-seen order among ties.
    frequencies.sort_by(|a, b| b.count.cmp(&a.count));
    frequencies
}
