//! Color Facet Engine - color family classification for product catalogs
//!
//! This binary provides scriptable access to the classification engine:
//! previewing classifications, applying colors to variants, pinning and
//! clearing overrides, and reporting facet counts.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use colorfacet::cli::{
    ApplyArgs, ClassifyArgs, FacetsArgs, FamiliesArgs, PinArgs, ShowArgs, UnpinArgs,
};
use colorfacet::constants::{APP_BINARY_NAME, APP_NAME};

/// Color Facet Engine - classify variant colors into families
#[derive(Parser, Debug)]
#[command(name = APP_BINARY_NAME, author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a hex color without persisting anything
    Classify(ClassifyArgs),
    /// List the active family catalog
    Families(FamiliesArgs),
    /// Set a variant's color
    Apply(ApplyArgs),
    /// Pin a variant to a family
    Pin(PinArgs),
    /// Clear a variant's override
    Unpin(UnpinArgs),
    /// Show one variant's effective state
    Show(ShowArgs),
    /// Show per-family facet counts
    Facets(FacetsArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Classify(args) => args.execute(),
        Commands::Families(args) => args.execute(),
        Commands::Apply(args) => args.execute(),
        Commands::Pin(args) => args.execute(),
        Commands::Unpin(args) => args.execute(),
        Commands::Show(args) => args.execute(),
        Commands::Facets(args) => args.execute(),
    };

    if let Err(err) = result {
        eprintln!("{APP_NAME}: {err}");
        std::process::exit(err.exit_code());
    }
}
