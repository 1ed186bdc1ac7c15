//! `nfse-build` — Builds a city's schema tree, sample payload and requirement
//! partition from its extracted field records.
//!
//! **Input:**
//! - `<guides>/<slug>/<slug>-fields.json` — JSON array of field records
//!
//! **Outputs:**
//! - `<guides>/<slug>/<slug>-schema.json` — schema tree
//! - `<guides>/<slug>/<slug>-json-fake.json` — sample payload
//! - `<guides>/<slug>/<slug>-json-docs.json` — required/ignored/optional paths
//!
//! **Usage:**
//! ```
//! nfse-build <slug> [--base-path <path>] [--guides-dir <path>] [--title <text>]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nfse_clients::{init_logging, load_settings};
use nfse_schema::build_city_artifacts;

/// Build a city's schema artifacts from its field records.
#[derive(Parser)]
#[command(name = "nfse-build", about = "Build NFSe city schema artifacts")]
struct Args {
    /// City slug (directory name under the guides directory).
    slug: String,

    /// Base directory holding `data/` and the guides directory.
    #[arg(long, default_value = ".")]
    base_path: PathBuf,

    /// Guides directory, relative to the base path (overrides nfse.toml).
    #[arg(long)]
    guides_dir: Option<PathBuf>,

    /// Title written at the schema root (the guide page title).
    #[arg(long)]
    title: Option<String>,

    /// Only log warnings and errors.
    #[arg(long, short)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.quiet);

    let settings = load_settings(&args.base_path, args.guides_dir.as_deref())?;
    let artifacts = build_city_artifacts(&args.slug, &settings, args.title.as_deref())
        .with_context(|| format!("Failed to build artifacts for {}", args.slug))?;

    let partition = &artifacts.tree.partition;
    println!(
        "{}: {} required, {} ignored, {} optional",
        args.slug,
        partition.required.len(),
        partition.ignored.len(),
        partition.optional.len()
    );
    if artifacts.skipped > 0 {
        println!("  Skipped: {} unreadable record(s)", artifacts.skipped);
    }
    println!("  Written: {}", artifacts.paths.schema.display());
    println!("  Written: {}", artifacts.paths.sample.display());
    println!("  Written: {}", artifacts.paths.partition.display());
    Ok(())
}
