// src/lib.rs
use anyhow::Result;
use tracing::{error, info, warn};

pub mod config;
pub mod description;
pub mod driver;
pub mod listing;
pub mod pipeline;
pub mod session;
pub mod skills;
pub mod table;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::{RunEnvironment, Settings};
pub use driver::SessionDriver;
pub use pipeline::{process, PipelineSummary};
pub use skills::SkillVocabulary;
pub use types::{ProcessedListing, RawListing, Sentinel};

/// Scrapes with the configured search and writes the raw table.
///
/// Partial results are written too; only an empty scrape skips the file.
pub fn scrape(settings: &Settings, env: RunEnvironment) -> Result<Vec<RawListing>> {
    let driver = SessionDriver::new(settings.clone(), env)?;
    let mut session = driver.open_session(env)?;

    let search = &settings.search;
    let listings = driver.run(
        session.as_mut(),
        &search.query,
        &search.location,
        search.max_pages,
    );

    if listings.is_empty() {
        warn!("No jobs were scraped.");
        return Ok(listings);
    }

    let raw_path = settings.output.raw_path();
    table::write_raw(&raw_path, &listings)?;
    info!("Saved {} raw listings to {}", listings.len(), raw_path.display());

    let with_links = listings.iter().filter(|l| l.has_link()).count();
    let with_descriptions = listings
        .iter()
        .filter(|l| !Sentinel::matches_any(&l.description))
        .count();
    info!("Jobs with valid links: {}", with_links);
    info!("Jobs with descriptions: {}", with_descriptions);

    Ok(listings)
}

/// Turns the raw table into the processed table and summary.
///
/// Returns `Ok(None)` when the raw table is missing; the operator is told
/// to run the scrape first.
pub fn process_tables(settings: &Settings, vocabulary: &SkillVocabulary) -> Result<Option<PipelineSummary>> {
    let output = &settings.output;
    let raw_path = output.raw_path();

    let Some(raw) = table::read_raw(&raw_path)? else {
        error!(
            "{} not found. Please run `jobscope scrape` first.",
            raw_path.display()
        );
        return Ok(None);
    };
    info!("Loaded {} with {} records", raw_path.display(), raw.len());

    let (processed, summary) = pipeline::process(vocabulary, &raw, output.top_n);

    table::write_processed(&output.processed_path(), &processed)?;
    table::write_summary(&output.summary_path(), &summary)?;

    info!(
        "Processed {} of {} job listings ({} companies, {} distinct skills, {:.2} skills per job)",
        summary.surviving,
        summary.total_input,
        summary.distinct_companies,
        summary.distinct_skills,
        summary.mean_skills_per_job
    );
    for frequency in &summary.top_skills {
        info!("  {}: {}", frequency.skill, frequency.count);
    }
    info!("Saved processed data to {}", output.processed_path().display());

    Ok(Some(summary))
}
