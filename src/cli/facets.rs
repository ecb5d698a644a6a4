//! Facet count and variant inspection commands.

use clap::Args;
use std::path::PathBuf;

use crate::cli::apply::print_state;
use crate::cli::common::{build_engine, CliError, CliResult};
use crate::models::VariantId;

/// Show per-family facet counts for the catalog
#[derive(Debug, Clone, Args)]
pub struct FacetsArgs {
    /// Path to the variant state JSON file
    #[arg(short, long, value_name = "FILE", default_value = "variants.json")]
    pub state: PathBuf,

    /// Path to engine config TOML
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl FacetsArgs {
    /// Execute the facets command
    pub fn execute(&self) -> CliResult<()> {
        let engine = build_engine(self.config.as_deref(), &self.state)?;

        // A fresh process has no incremental history; counts always come
        // from a full rebuild over the loaded snapshot.
        let counts = engine.service.rebuild_facets()?;

        if self.json {
            let as_strings: std::collections::BTreeMap<&str, u64> = counts
                .iter()
                .map(|(family, count)| (family.as_str(), *count))
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&as_strings)
                    .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?
            );
        } else if counts.is_empty() {
            println!("No classified variants");
        } else {
            for (family, count) in &counts {
                println!("{:<8} {}", family.as_str(), count);
            }
            let total: u64 = counts.values().sum();
            println!("total    {total}");
        }
        Ok(())
    }
}

/// Show one variant's effective color state
#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    /// Path to the variant state JSON file
    #[arg(short, long, value_name = "FILE", default_value = "variants.json")]
    pub state: PathBuf,

    /// Variant id
    #[arg(short, long, value_name = "ID")]
    pub variant: String,

    /// Path to engine config TOML
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ShowArgs {
    /// Execute the show command
    pub fn execute(&self) -> CliResult<()> {
        let engine = build_engine(self.config.as_deref(), &self.state)?;
        let variant = VariantId::new(self.variant.clone());
        let state = engine.service.variant_state(&variant)?;
        print_state(&state, self.json)
    }
}
