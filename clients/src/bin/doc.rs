//! `nfse-doc` — Generates a city's coverage document: every schema field
//! classified against the city's partition and the municipal and national
//! standards.
//!
//! **Inputs:**
//! - `<guides>/<slug>/<slug>-schema.json`
//! - `<guides>/<slug>/<slug>-json-docs.json`
//! - `data/padrao-municipal.json`, `data/padrao-nacioanal.json`
//!
//! **Output:**
//! - `<guides>/<slug>/doc.json`
//!
//! **Usage:**
//! ```
//! nfse-doc <slug> [--base-path <path>] [--guides-dir <path>] [--quiet]
//! ```
//!
//! Exits non-zero if a city input is missing or the schema has no fields.

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
use nfse_schema::generate_city_doc;

/// Generate the coverage document for one city.
#[derive(Parser)]
#[command(name = "nfse-doc", about = "Generate an NFSe city coverage document")]
struct Args {
    /// City slug (directory name under the guides directory).
    slug: String,

    /// Base directory holding `data/` and the guides directory.
    #[arg(long, default_value = ".")]
    base_path: PathBuf,

    /// Guides directory, relative to the base path (overrides nfse.toml).
    #[arg(long)]
    guides_dir: Option<PathBuf>,

    /// Only log warnings and errors, and skip the statistics summary.
    #[arg(long, short)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.quiet);

    let settings = load_settings(&args.base_path, args.guides_dir.as_deref())?;
    let doc = generate_city_doc(&args.slug, &settings)
        .with_context(|| format!("Failed to generate documentation for {}", args.slug))?;

    if !args.quiet {
        println!("Estatísticas ({})", args.slug);
        println!("================");
        println!("{}", doc.stats);
        println!();
    }
    println!("Written: {}", doc.output.display());
    Ok(())
}
