//! CLI command implementations for Blue.

pub(crate) mod batch;
pub(crate) mod generate;
pub(crate) mod replay;
pub(crate) mod run;
pub(crate) mod validate;

mod output;

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use blue::error::BlueError;
use blue::instructions::Instructions;
use blue::scenario::Scenario;
use clap::ValueEnum;

/// Output format for the `run` and `replay` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `batch` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum BatchFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<BlueError> for CliError {
    fn from(e: BlueError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<blue::replay::ReplayError> for CliError {
    fn from(e: blue::replay::ReplayError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}

/// Load a scenario file, naming the file on failure.
pub(crate) fn load_scenario(path: &Path) -> Result<Scenario, CliError> {
    Scenario::load(path).map_err(|e| CliError::new(format!("Failed to load scenario {}: {e}", path.display())))
}

/// Assemble a program from a source file.
pub(crate) fn load_program(path: &Path) -> Result<Instructions, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))?;
    text.parse().map_err(|e| CliError::new(format!("Failed to assemble {}: {e}", path.display())))
}
