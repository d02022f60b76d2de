//! Error types for pom.xml editing.

use crate::model::FileHandle;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PomError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to parse pom.xml: {message}")]
    ParseError { message: String },

    #[error("Invalid Maven coordinates '{coordinates}': expected '[groupId:]artifactId[:version]'")]
    InvalidCoordinates { coordinates: String },

    #[error("Failed to acquire model for '{file}': {source}")]
    ModelAcquisition {
        file: FileHandle,
        #[source]
        source: Box<PomError>,
    },

    #[error("Operation on '{file}' failed: {source}")]
    Operation {
        file: FileHandle,
        #[source]
        source: Box<PomError>,
    },

    #[error("Failed to save '{file}': {source}")]
    Persistence {
        file: FileHandle,
        #[source]
        source: std::io::Error,
    },

    #[error("{} of {total} work items failed: {}", .failures.len(), summarize(.failures))]
    WorkItems {
        total: usize,
        failures: Vec<WorkItemFailure>,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, PomError>;

/// A single failure recorded while applying a batch of work items.
#[derive(Debug)]
pub struct WorkItemFailure {
    /// Position of the work item in the submitted batch.
    pub index: usize,
    pub file: FileHandle,
    pub error: PomError,
}

fn summarize(failures: &[WorkItemFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("[#{} {}] {}", f.index, f.file, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

impl PomError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns the innermost error, unwrapping acquisition and operation wrappers.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::ModelAcquisition { source, .. } | Self::Operation { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}
