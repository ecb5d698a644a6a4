//! Shared CLI plumbing: exit codes, error mapping, and state-file I/O.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::models::VariantColorState;
use crate::services::{ClassificationService, FacetAggregator};
use crate::store::{InMemoryVariantStore, VariantStore};

/// Exit codes for scriptable use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed.
    Success = 0,
    /// Bad input: malformed color, unknown family, invalid config.
    InvalidInput = 1,
    /// Referenced variant or resource does not exist.
    NotFound = 2,
    /// File or store I/O failed.
    Io = 3,
}

/// CLI-level error carrying a message and an exit code.
#[derive(Debug)]
pub struct CliError {
    message: String,
    exit_code: ExitCode,
}

impl CliError {
    /// Bad user input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::InvalidInput,
        }
    }

    /// Missing variant or resource.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::NotFound,
        }
    }

    /// I/O failure.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::Io,
        }
    }

    /// Exit code to terminate the process with.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.exit_code as i32
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        let exit_code = match &err {
            EngineError::InvalidColorFormat { .. }
            | EngineError::UnknownFamily { .. }
            | EngineError::CatalogInvalid { .. } => ExitCode::InvalidInput,
            EngineError::UnknownVariant { .. } | EngineError::CatalogMismatch { .. } => {
                ExitCode::NotFound
            }
            EngineError::PersistenceFailed { .. } => ExitCode::Io,
        };
        Self {
            message: err.to_string(),
            exit_code,
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        Self::invalid_input(format!("{err:#}"))
    }
}

/// Result type for CLI command execution.
pub type CliResult<T> = Result<T, CliError>;

/// Loads variant states from a JSON state file. A missing file is an
/// empty catalog, so first use needs no setup step.
pub fn load_variants(path: &Path) -> CliResult<Vec<VariantColorState>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("Failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&contents)
        .map_err(|e| CliError::invalid_input(format!("Invalid state file {}: {e}", path.display())))
}

/// Saves variant states to a JSON state file with a temp-file + rename so
/// the file is never left half-written. Output is sorted by variant id
/// for stable diffs.
pub fn save_variants(path: &Path, states: &[VariantColorState]) -> CliResult<()> {
    let mut sorted: Vec<_> = states.to_vec();
    sorted.sort_by(|a, b| a.variant_id().cmp(b.variant_id()));

    let contents = serde_json::to_string_pretty(&sorted)
        .map_err(|e| CliError::io(format!("Failed to serialize state: {e}")))?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .map_err(|e| CliError::io(format!("Failed to write {}: {e}", tmp_path.display())))?;
    fs::rename(&tmp_path, path)
        .map_err(|e| CliError::io(format!("Failed to rename into {}: {e}", path.display())))
}

/// A wired engine plus a handle on its concrete store, so commands can
/// snapshot and save after mutating.
pub struct CliEngine {
    /// The classification service over the loaded state.
    pub service: ClassificationService,
    /// The backing store, for snapshot-and-save.
    pub store: Arc<InMemoryVariantStore>,
}

/// Builds an engine from the optional config file and the state file.
pub fn build_engine(config_path: Option<&Path>, state_path: &Path) -> CliResult<CliEngine> {
    let config = match config_path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let catalog = config.build_catalog()?;

    let store = Arc::new(InMemoryVariantStore::with_records(load_variants(state_path)?));
    let service = ClassificationService::new(
        catalog,
        config.tuning,
        Arc::clone(&store) as Arc<dyn VariantStore>,
        Arc::new(FacetAggregator::new()),
    );
    Ok(CliEngine { service, store })
}

/// Snapshots the store back to the state file.
pub fn save_engine(engine: &CliEngine, state_path: &Path) -> CliResult<()> {
    let snapshot = engine.store.snapshot()?;
    save_variants(state_path, &snapshot)
}
