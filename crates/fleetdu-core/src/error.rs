//! Error types for configuration loading and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised before any scanning starts.
///
/// Everything that goes wrong during a scan is recorded on the result model
/// instead; this is the only error class that aborts a run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more settings are out of range or inconsistent.
    #[error("Invalid configuration:\n{}", bullet_list(.problems))]
    Invalid { problems: Vec<String> },

    /// Config file does not exist.
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    /// Config file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or has the wrong shape.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Create a validation error from a single problem.
    pub fn invalid(problem: impl Into<String>) -> Self {
        Self::Invalid {
            problems: vec![problem.into()],
        }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Validation problems carried by this error, if any.
    pub fn problems(&self) -> &[String] {
        match self {
            Self::Invalid { problems } => problems,
            _ => &[],
        }
    }
}

impl From<derive_builder::UninitializedFieldError> for ConfigError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        Self::invalid(format!("{} is required", err.field_name()))
    }
}

fn bullet_list(problems: &[String]) -> String {
    problems
        .iter()
        .map(|p| format!("  - {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}
