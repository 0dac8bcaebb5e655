// src/table.rs
use crate::pipeline::PipelineSummary;
use crate::types::{ProcessedListing, RawListing};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Column order of the processed table read by the dashboard.
pub const PROCESSED_COLUMNS: [&str; 7] = [
    "title",
    "company",
    "location",
    "link",
    "description",
    "skills",
    "skill_count",
];

/// Row layout of the processed table read by the dashboard.
#[derive(Serialize)]
struct ProcessedRow<'a> {
    title: &'a str,
    company: &'a str,
    location: &'a str,
    link: &'a str,
    description: &'a str,
    /// JSON array, which also parses as a Python list literal.
    skills: String,
    skill_count: usize,
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display())),
        _ => Ok(()),
    }
}

pub fn write_raw(path: &Path, listings: &[RawListing]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for listing in listings {
        wtr.serialize(listing)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Reads the raw table; `Ok(None)` when the file does not exist.
pub fn read_raw(path: &Path) -> Result<Option<Vec<RawListing>>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let listings = rdr
        .deserialize()
        .collect::<Result<Vec<RawListing>, _>>()
        .with_context(|| format!("Malformed row in {}", path.display()))?;
    Ok(Some(listings))
}

/// Writes the processed table. The header row is always present, even
/// when no listing survived cleaning.
pub fn write_processed(path: &Path, listings: &[ProcessedListing]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    wtr.write_record(PROCESSED_COLUMNS)?;
    for processed in listings {
        let listing = processed.listing();
        wtr.serialize(ProcessedRow {
            title: &listing.title,
            company: &listing.company,
            location: &listing.location,
            link: &listing.link,
            description: &listing.description,
            skills: serde_json::to_string(processed.skills())?,
            skill_count: processed.skill_count(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_summary(path: &Path, summary: &PipelineSummary) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
