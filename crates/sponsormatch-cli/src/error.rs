// crates/sponsormatch-cli/src/error.rs
// ============================================================================
// Module: CLI Error
// Description: The one error type every subcommand's `run` function returns.
// Purpose: Let `main` print one line to stderr and pick an exit code, no
//   matter which layer (config, core, store, I/O) the failure came from.
// Dependencies: sponsormatch-config, sponsormatch-core, sponsormatch-store, thiserror
// ============================================================================

use std::path::PathBuf;

use thiserror::Error;

/// Errors a subcommand can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration failed to load or validate.
    #[error("config error: {0}")]
    Config(#[from] sponsormatch_config::ConfigError),

    /// The match pipeline or a capability adapter returned an error.
    #[error("{0}")]
    Match(#[from] sponsormatch_core::error::MatchError),

    /// A catalog or report file could not be read or parsed.
    #[error("io error reading {path}: {source}")]
    CatalogIo {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A catalog file was not valid JSON.
    #[error("malformed catalog at {path}: {source}")]
    CatalogParse {
        /// The path that failed to parse.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A `--boost key=value` or timestamp argument was malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A response value could not be serialized for output.
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing a result to stdout or stderr failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
