//! Override commands: pin a variant to a family, or clear the pin.

use clap::Args;
use std::path::PathBuf;

use crate::cli::apply::print_state;
use crate::cli::common::{build_engine, save_engine, CliResult};
use crate::models::{FamilyId, VariantId};

/// Pin a variant to a family, overriding automatic classification
#[derive(Debug, Clone, Args)]
pub struct PinArgs {
    /// Path to the variant state JSON file
    #[arg(short, long, value_name = "FILE", default_value = "variants.json")]
    pub state: PathBuf,

    /// Variant id
    #[arg(short, long, value_name = "ID")]
    pub variant: String,

    /// Family id to pin (must exist in the active catalog)
    #[arg(short, long, value_name = "FAMILY")]
    pub family: String,

    /// Path to engine config TOML
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PinArgs {
    /// Execute the pin command
    pub fn execute(&self) -> CliResult<()> {
        let engine = build_engine(self.config.as_deref(), &self.state)?;
        let variant = VariantId::new(self.variant.clone());
        let family = FamilyId::new(self.family.clone());

        let result = engine.service.set_override(&variant, &family)?;
        save_engine(&engine, &self.state)?;
        print_state(&result, self.json)
    }
}

/// Clear a variant's override, reverting to automatic classification
#[derive(Debug, Clone, Args)]
pub struct UnpinArgs {
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

impl UnpinArgs {
    /// Execute the unpin command
    pub fn execute(&self) -> CliResult<()> {
        let engine = build_engine(self.config.as_deref(), &self.state)?;
        let variant = VariantId::new(self.variant.clone());

        let result = engine.service.clear_override(&variant)?;
        save_engine(&engine, &self.state)?;
        print_state(&result, self.json)
    }
}
