//! Error types for content loading and cache builds

use std::path::PathBuf;
use thiserror::Error;

/// Why a single post source was excluded from the corpus.
///
/// These never abort a build. The loader logs them and the snapshot keeps
/// them around for diagnostics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("{path:?}: failed to read source: {message}")]
    Io { path: PathBuf, message: String },

    #[error("{path:?}: no front-matter block found")]
    MissingFrontMatter { path: PathBuf },

    #[error("{path:?}: malformed front-matter: {message}")]
    MalformedFrontMatter { path: PathBuf, message: String },

    #[error("{path:?}: missing required field `{field}`")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("{path:?}: field `{field}` is not a valid date: {value:?}")]
    InvalidDate {
        path: PathBuf,
        field: &'static str,
        value: String,
    },

    #[error("{path:?}: `updated` is earlier than `created`")]
    UpdatedBeforeCreated { path: PathBuf },

    #[error("{path:?}: cannot derive a slug from the file path")]
    InvalidSlug { path: PathBuf },

    #[error("{path:?}: slug `{slug}` is already used by {existing:?}")]
    DuplicateSlug {
        path: PathBuf,
        slug: String,
        existing: PathBuf,
    },
}

impl LoadError {
    /// Source file the error refers to
    pub fn path(&self) -> &PathBuf {
        match self {
            LoadError::Io { path, .. }
            | LoadError::MissingFrontMatter { path }
            | LoadError::MalformedFrontMatter { path, .. }
            | LoadError::MissingField { path, .. }
            | LoadError::InvalidDate { path, .. }
            | LoadError::UpdatedBeforeCreated { path }
            | LoadError::InvalidSlug { path }
            | LoadError::DuplicateSlug { path, .. } => path,
        }
    }
}

/// Fatal failure of a cache build. No snapshot is installed when this occurs.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    #[error("content directory {0:?} does not exist")]
    ContentRootMissing(PathBuf),

    #[error("content path {0:?} is not a directory")]
    ContentRootNotDir(PathBuf),

    #[error("failed to read content directory {path:?}: {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("content load task failed: {0}")]
    Task(String),
}
