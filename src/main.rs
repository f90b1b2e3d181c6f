//! CLI entry point for exploring near-Earth objects and their close approaches.
//!
//! `inspect` looks up a single NEO by designation or name; `query` filters
//! close approaches and prints them or writes them to a CSV / JSON file.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand};
use neo_explorer::{
    config::Settings,
    database::{NeoDatabase, OrphanPolicy},
    extract::{load_approaches, load_neos},
    filters::{FilterOptions, create_filters, limit},
    logging::init_logging,
    write::write_results,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};

/// Number of results printed when no `--limit` is given and no output file is used.
const DEFAULT_PRINT_LIMIT: usize = 10;

#[derive(Parser)]
#[command(name = "neo_explorer")]
#[command(about = "Explore past and future close approaches of near-Earth objects", long_about = None)]
struct Cli {
    /// CSV file of near-Earth objects (overrides NEO_CSV_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    neofile: Option<PathBuf>,

    /// JSON file of close approaches (overrides CAD_JSON_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    cadfile: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a single near-Earth object
    #[command(group(ArgGroup::new("target").required(true).args(["pdes", "name"])))]
    Inspect {
        /// Primary designation of the NEO
        #[arg(short, long)]
        pdes: Option<String>,

        /// IAU name of the NEO
        #[arg(short, long)]
        name: Option<String>,

        /// Also list the NEO's close approaches
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },
    /// Find close approaches matching the given criteria
    Query {
        /// Only approaches on this date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Only approaches on or after this date (YYYY-MM-DD)
        #[arg(short, long)]
        start_date: Option<NaiveDate>,

        /// Only approaches on or before this date (YYYY-MM-DD)
        #[arg(short, long)]
        end_date: Option<NaiveDate>,

        /// Minimum approach distance in au
        #[arg(long)]
        min_distance: Option<f64>,

        /// Maximum approach distance in au
        #[arg(long)]
        max_distance: Option<f64>,

        /// Minimum relative velocity in km/s
        #[arg(long)]
        min_velocity: Option<f64>,

        /// Maximum relative velocity in km/s
        #[arg(long)]
        max_velocity: Option<f64>,

        /// Minimum NEO diameter in km
        #[arg(long)]
        min_diameter: Option<f64>,

        /// Maximum NEO diameter in km
        #[arg(long)]
        max_diameter: Option<f64>,

        /// Only potentially hazardous NEOs
        #[arg(long, conflicts_with = "not_hazardous")]
        hazardous: bool,

        /// Only NEOs not marked potentially hazardous
        #[arg(long)]
        not_hazardous: bool,

        /// Maximum number of results (0 = no limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Write results to this .csv or .json file instead of printing them
        #[arg(short, long, value_name = "PATH")]
        outfile: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok(); // Load .env file

    // --help and usage errors exit here, before settings are read or logs/ is created
    let cli = Cli::parse();

    let settings = Settings::from_env()?;
    let _log_guard = init_logging(&settings.log_file_path);

    let neo_path = cli.neofile.unwrap_or(settings.neo_path);
    let cad_path = cli.cadfile.unwrap_or(settings.cad_path);
    let db = load_database(&neo_path, &cad_path, settings.orphan_policy)?;

    match cli.command {
        Commands::Inspect {
            pdes,
            name,
            verbose,
        } => {
            let found = match (pdes.as_deref(), name.as_deref()) {
                (Some(pdes), _) => db.get_neo_by_designation(pdes),
                (None, Some(name)) => db.get_neo_by_name(name),
                (None, None) => None,
            };

            let Some(neo) = found else {
                eprintln!("No matching NEOs exist in the database.");
                return Ok(ExitCode::FAILURE);
            };

            println!("{neo}");
            if verbose {
                for approach in neo.approaches() {
                    println!("- {approach}");
                }
            }
        }
        Commands::Query {
            date,
            start_date,
            end_date,
            min_distance,
            max_distance,
            min_velocity,
            max_velocity,
            min_diameter,
            max_diameter,
            hazardous,
            not_hazardous,
            limit: max_results,
            outfile,
        } => {
            let options = FilterOptions {
                date,
                start_date,
                end_date,
                distance_min: min_distance,
                distance_max: max_distance,
                velocity_min: min_velocity,
                velocity_max: max_velocity,
                diameter_min: min_diameter,
                diameter_max: max_diameter,
                hazardous: match (hazardous, not_hazardous) {
                    (true, _) => Some(true),
                    (false, true) => Some(false),
                    (false, false) => None,
                },
            };

            let filters = create_filters(&options);
            for filter in &filters {
                debug!(%filter, "Applying filter");
            }

            let results = db.query(&filters);

            match outfile {
                Some(path) => {
                    let written = write_results(limit(results, max_results), &path)?;
                    if written == 0 {
                        warn!(path = %path.display(), "No close approaches matched");
                    }
                }
                None => {
                    let shown = max_results.or(Some(DEFAULT_PRINT_LIMIT));
                    let mut count = 0;
                    for approach in limit(results, shown) {
                        println!("{approach}");
                        count += 1;
                    }
                    info!(count, "Query complete");
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Loads both data files and links them into a database.
#[tracing::instrument(fields(neo_path = %neo_path.display(), cad_path = %cad_path.display()), skip_all)]
fn load_database(neo_path: &Path, cad_path: &Path, policy: OrphanPolicy) -> Result<NeoDatabase> {
    let neos = load_neos(neo_path)
        .with_context(|| format!("failed to load NEOs from {}", neo_path.display()))?;
    let approaches = load_approaches(cad_path)
        .with_context(|| format!("failed to load close approaches from {}", cad_path.display()))?;

    let skipped = neos.skipped.len() + approaches.skipped.len();
    if skipped > 0 {
        warn!(skipped, "Some input rows were skipped");
    }

    let db = NeoDatabase::with_policy(neos.records, approaches.records, policy)?;
    info!(
        neos = db.neo_count(),
        approaches = db.approach_count(),
        "Database ready"
    );

    Ok(db)
}
