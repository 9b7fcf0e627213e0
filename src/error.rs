//! Error types for the feature registry.
//!
//! Library operations return [`RegistryError`] for single failures. Scans and
//! prunes that keep going past per-record failures collect them and hand them
//! back as an [`AggregateError`].

use std::fmt;
use std::path::PathBuf;

/// Broad classification of a [`RegistryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required input (the branch name) was not provided
    NotFound,
    /// An argument had an unsupported value
    InvalidArgument,
    /// A record could not be parsed or serialized
    ParseError,
    /// Reading, writing or deleting a file failed
    IoError,
}

/// Errors that can occur while generating, listing or pruning records
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("could not determine the branch name: pass --branch or set {var}")]
    BranchNotFound { var: &'static str },

    #[error("component must be one of appserver|ui")]
    ComponentRequired,

    #[error("component must be one of appserver|ui, got '{value}'")]
    InvalidComponent { value: String },

    #[error("failed to parse feature record {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize feature record '{identifier}': {source}")]
    Serialize {
        identifier: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RegistryError {
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        RegistryError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::BranchNotFound { .. } => ErrorKind::NotFound,
            RegistryError::ComponentRequired | RegistryError::InvalidComponent { .. } => {
                ErrorKind::InvalidArgument
            }
            RegistryError::Parse { .. } | RegistryError::Serialize { .. } => ErrorKind::ParseError,
            RegistryError::Io { .. } => ErrorKind::IoError,
        }
    }
}

/// Every per-record failure from one scan or prune
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<RegistryError>,
}

impl AggregateError {
    /// Returns `None` when there is nothing to report
    pub fn from_failures(errors: Vec<RegistryError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn errors(&self) -> &[RegistryError] {
        &self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 { "failure" } else { "failures" };
        write!(f, "{} record {}", self.errors.len(), noun)?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}
