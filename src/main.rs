use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use jobscope::config::SessionBackend;
use jobscope::{RunEnvironment, Settings, SkillVocabulary};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jobscope")]
#[command(about = "Scrape job listings and extract the skills they ask for")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// TOML settings file (defaults to ./jobscope.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the raw/processed tables
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape result pages and write the raw table
    Scrape(ScrapeArgs),
    /// Clean the raw table, extract skills and write the processed table
    Process,
    /// Scrape, then process
    Run(ScrapeArgs),
}

#[derive(Args)]
struct ScrapeArgs {
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    pages: Option<usize>,
    /// Fetch pages over plain HTTP instead of driving Chrome
    #[arg(long)]
    http: bool,
}

impl ScrapeArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(query) = &self.query {
            settings.search.query = query.clone();
        }
        if let Some(location) = &self.location {
            settings.search.location = location.clone();
        }
        if let Some(pages) = self.pages {
            settings.search.max_pages = pages;
        }
        if self.http {
            settings.browser.backend = SessionBackend::Http;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobscope=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        settings.output.data_dir = dir;
    }

    let env = RunEnvironment::detect();
    if env.unattended {
        info!("Unattended environment detected; running headless with longer delays");
    }

    match cli.command {
        Command::Scrape(args) => {
            args.apply(&mut settings);
            jobscope::scrape(&settings, env)?;
        }
        Command::Process => {
            let vocabulary = SkillVocabulary::standard()?;
            jobscope::process_tables(&settings, &vocabulary)?;
        }
        Command::Run(args) => {
            args.apply(&mut settings);
            let vocabulary = SkillVocabulary::standard()?;
            if jobscope::scrape(&settings, env)?.is_empty() {
                return Ok(());
            }
            jobscope::process_tables(&settings, &vocabulary)?;
        }
    }

    Ok(())
}
