use std::path::PathBuf;

use paperspace_core::ProjectorError;

use crate::paper::{PaperId, PaperKind};

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A paper callback failed. Caught by the [`Space`](crate::Space), never
/// propagated past it.
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct PaperError {
    message: String,
    #[source]
    source: Option<BoxedSource>,
}

impl PaperError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Structural errors when assembling a [`Space`](crate::Space).
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SpaceError {
    #[error("paper {0} is already registered")]
    DuplicatePaper(PaperId),
}

/// Configuration loading and validation errors.
///
/// Errors tied to a single paper record are reported and the record skipped;
/// only file-level errors stop the load.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("paper list must be a JSON array")]
    NotAList,
    #[error("record {index}: unknown paper type {kind:?}")]
    UnknownPaperType { index: usize, kind: String },
    #[error("record {index}: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("paper {id} ({kind}) needs {expected} markers, got {got}")]
    MarkerCount {
        id: PaperId,
        kind: PaperKind,
        expected: usize,
        got: usize,
    },
    #[error("paper {id}: invalid {field}")]
    InvalidValue { id: PaperId, field: &'static str },
    #[error("paper {id} ({kind}) needs a {what} but none was provided")]
    MissingCollaborator {
        id: PaperId,
        kind: PaperKind,
        what: &'static str,
    },
    #[error(transparent)]
    Space(#[from] SpaceError),
    #[error("invalid calibration: {0}")]
    Calibration(#[from] ProjectorError),
}

/// Failures while setting up a [`Session`](crate::Session) from disk.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("{}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

impl SessionError {
    pub(crate) fn load(path: impl Into<PathBuf>) -> impl FnOnce(ConfigError) -> Self {
        let path = path.into();
        move |source| SessionError::Load { path, source }
    }
}
