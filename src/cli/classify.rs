//! Classification preview command.

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::classifier::Classifier;
use crate::cli::common::{CliError, CliResult};
use crate::config::EngineConfig;
use crate::models::FamilyCatalog;

/// Classify a hex color without persisting anything
#[derive(Debug, Clone, Args)]
pub struct ClassifyArgs {
    /// Hex color to classify (e.g. "#2C2C2C")
    #[arg(short, long, value_name = "HEX")]
    pub color: String,

    /// Path to engine config TOML
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct PreviewOutput {
    input: String,
    family: String,
    label: String,
    distance: f32,
    special_case: bool,
}

impl ClassifyArgs {
    /// Execute the classify command
    pub fn execute(&self) -> CliResult<()> {
        let config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        let catalog = Arc::new(config.build_catalog()?);
        let classifier = Classifier::new(Arc::clone(&catalog), config.tuning);

        let color = crate::models::ColorValue::parse(&self.color)?;
        let result = classifier.classify(color);
        let label = catalog
            .get(&result.family)
            .map(|family| family.label.clone())
            .ok_or_else(|| CliError::not_found(format!("family '{}' not in catalog", result.family)))?;

        let output = PreviewOutput {
            input: color.to_hex(),
            family: result.family.as_str().to_string(),
            label,
            distance: result.distance,
            special_case: result.matched_by_special_case,
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&output)
                    .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?
            );
        } else {
            println!("Color:    {}", output.input);
            println!("Family:   {} ({})", output.family, output.label);
            println!("Distance: {:.2}", output.distance);
            if output.special_case {
                println!("Matched via near-neutral special case");
            }
        }
        Ok(())
    }
}

/// List the active family catalog
#[derive(Debug, Clone, Args)]
pub struct FamiliesArgs {
    /// Path to engine config TOML
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl FamiliesArgs {
    /// Execute the families command
    pub fn execute(&self) -> CliResult<()> {
        let config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        let catalog: FamilyCatalog = config.build_catalog()?;

        if self.json {
            let families: Vec<_> = catalog.iter().map(|(family, _)| family.clone()).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&families)
                    .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?
            );
        } else {
            for (family, _) in catalog.iter() {
                let special = family
                    .special_case
                    .map_or(String::new(), |_| "  (special case)".to_string());
                println!(
                    "{:<8} {:<8} {}{}",
                    family.id.as_str(),
                    family.label,
                    family.reference_color.to_hex(),
                    special
                );
            }
        }
        Ok(())
    }
}
