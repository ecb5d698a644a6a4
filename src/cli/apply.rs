//! Apply-color command: persist a variant's color and report the
//! resulting effective state.

use clap::Args;
use std::path::PathBuf;

use crate::cli::common::{build_engine, save_engine, CliError, CliResult};
use crate::models::{VariantColorState, VariantId};

/// Set a variant's color, reclassifying unless an override is pinned
#[derive(Debug, Clone, Args)]
pub struct ApplyArgs {
    /// Path to the variant state JSON file
    #[arg(short, long, value_name = "FILE", default_value = "variants.json")]
    pub state: PathBuf,

    /// Variant id
    #[arg(short, long, value_name = "ID")]
    pub variant: String,

    /// Hex color (e.g. "#0000FF")
    #[arg(short, long, value_name = "HEX")]
    pub color: String,

    /// Path to engine config TOML
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ApplyArgs {
    /// Execute the apply command
    pub fn execute(&self) -> CliResult<()> {
        let engine = build_engine(self.config.as_deref(), &self.state)?;
        let variant = VariantId::new(self.variant.clone());

        let result = engine.service.apply_color(&variant, &self.color)?;
        save_engine(&engine, &self.state)?;
        print_state(&result, self.json)
    }
}

/// Prints a variant state in text or JSON form.
pub fn print_state(state: &VariantColorState, json: bool) -> CliResult<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(state)
                .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?
        );
    } else {
        println!("Variant:  {}", state.variant_id());
        println!("Color:    {}", state.color());
        println!("Family:   {}", state.effective_family());
        println!(
            "Source:   {}",
            if state.is_manual() { "manual" } else { "auto" }
        );
    }
    Ok(())
}
