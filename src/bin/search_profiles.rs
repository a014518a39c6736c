//! Searches a JSONL profile export offline and prints matching candidates.
//!
//! Usage: search_profiles data/profiles.jsonl --company acme --years 5

use anyhow::Context;
use clap::Parser;
use gauge_api::candidate_mapper::{self, SearchFilters};
use gauge_api::mock_data::UuidEntropy;
use serde_json::Value;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Search a JSONL profile export for candidates")]
struct Args {
    /// One JSON profile per line
    file: PathBuf,

    /// Case-insensitive substring of the current company
    #[arg(long)]
    company: Option<String>,

    /// Minimum years of experience, loosened by one
    #[arg(long)]
    years: Option<u32>,

    #[arg(long)]
    location: Option<String>,

    #[arg(long)]
    school: Option<String>,

    #[arg(long)]
    role: Option<String>,

    /// Stop after this many matches
    #[arg(long, default_value_t = 5)]
    limit: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let file = std::fs::File::open(&args.file)
        .with_context(|| format!("Error reading profiles file {}", args.file.display()))?;

    let filters = SearchFilters {
        company: args.company,
        min_years: args.years,
        max_years: None,
        location: args.location,
        school: args.school,
        role: args.role,
    };
    let current_year = candidate_mapper::current_year();
    let mut entropy = UuidEntropy;
    let mut found = 0;

    for (number, line) in BufReader::new(file).lines().enumerate() {
        if found >= args.limit {
            break;
        }
        let line = line.context("Error reading profiles file")?;
        if line.trim().is_empty() {
            continue;
        }

        let profile: Value = match serde_json::from_str(&line) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Skipping line {}: {}", number + 1, e);
                continue;
            }
        };

        let candidate = candidate_mapper::map_export_profile(&profile, current_year, &mut entropy);
        if filters.matches(&candidate) {
            println!("{}", serde_json::to_string(&candidate)?);
            found += 1;
        }
    }

    tracing::info!("{} matching candidates", found);
    Ok(())
}
