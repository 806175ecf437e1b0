//! Error types emitted by the dispersion CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use dispersion_core::{ParseModelTypeError, SolveError};
use dispersion_data::InstanceReadError;
use thiserror::Error;

/// Errors emitted by the dispersion CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The requested operation requires a missing compile-time feature.
    #[error("{action} requires the `{feature}` feature to be enabled")]
    MissingFeature {
        feature: &'static str,
        action: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The requested model formulation is not known.
    #[error(transparent)]
    ModelType(#[from] ParseModelTypeError),
    /// The instance file could not be read or parsed.
    #[error(transparent)]
    ReadInstance(#[from] InstanceReadError),
    /// The backend rejected the model.
    #[error("solver failed: {source}")]
    Solve {
        #[source]
        source: SolveError,
    },
    /// Serializing the solve result failed.
    #[error("failed to serialize solve result: {0}")]
    SerialiseResult(#[source] serde_json::Error),
    /// Writing the result to the output stream failed.
    #[error("failed to write solve output: {0}")]
    WriteOutput(#[source] std::io::Error),
    /// Writing the result file failed.
    #[error("failed to write solve result to {path:?}: {source}")]
    WriteResultFile {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
