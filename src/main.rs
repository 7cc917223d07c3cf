use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use annotation_graph::query::{run_catalogue, write_results, QueryParams};
use annotation_graph::utils::config::{resolve_paths, Overrides, StorageLocation};
use annotation_graph::{DocumentStream, Store};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of annotation JSON documents
    #[arg(short, long)]
    json_dir: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long)]
    db_path: Option<PathBuf>,

    /// Use a transient in-memory database instead of a file
    #[arg(long)]
    in_memory: bool,

    /// Keep existing tables instead of recreating them empty
    #[arg(long)]
    keep_existing: bool,

    /// Label mid for the label-filtered queries
    #[arg(long, default_value = "/m/015kr")]
    label_mid: String,

    /// Landmark description left out of the landmark query (repeatable)
    #[arg(long = "exclude-landmark", default_values = ["New York", "New York City"])]
    exclude_landmarks: Vec<String>,

    /// Rows returned by the top-K queries
    #[arg(short, long, default_value_t = 10)]
    limit: u32,

    /// Settings file consulted for paths not given on the command line
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    info!("Annotation graph starting...");

    let overrides = Overrides {
        json_dir: args.json_dir.clone(),
        db_path: args.db_path.clone(),
        in_memory: args.in_memory,
    };
    let paths = resolve_paths(&args.env_file, &overrides)?;
    info!("Input: {:?}", paths.json_dir);

    let mut store = match &paths.storage {
        StorageLocation::File(path) => {
            info!("DB: {:?}", path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
            Store::open(path).context("Failed to open database")?
        }
        StorageLocation::Memory => {
            info!("DB: in memory");
            Store::open_in_memory().context("Failed to open in-memory database")?
        }
    };

    store
        .create_schema(!args.keep_existing)
        .context("Failed to initialize schema")?;

    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::with_template("{spinner} {pos} documents loaded")?);
    progress.enable_steady_tick(Duration::from_millis(120));

    let loaded = store
        .load(DocumentStream::open(&paths.json_dir), &progress)
        .context("Failed to load documents")?;
    info!("Loaded {} JSON documents", loaded);

    let params = QueryParams {
        label_mid: args.label_mid,
        excluded_landmarks: args.exclude_landmarks,
        limit: args.limit,
    };
    let results = run_catalogue(store.conn(), &params).context("Query failed")?;
    write_results(&mut io::stdout().lock(), &results)?;

    info!("Pipeline completed.");
    Ok(())
}
