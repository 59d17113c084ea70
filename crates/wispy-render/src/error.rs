//! Error types for template rendering and engine configuration.
//!
//! Rendering never fails as a whole. Every problem found while walking a
//! template becomes a [`TemplateError`] pushed onto the list returned next to
//! the (possibly partial) output, and [`TemplateError::kind`] tells callers
//! how far the damage reached.
//!
//! Building an [`Engine`](crate::Engine) or loading an
//! [`EngineConfig`](crate::EngineConfig) can fail up front; those failures are
//! [`ConfigError`]s.

use std::path::PathBuf;

use thiserror::Error;
use wispy_scan::DelimiterError;

use crate::assets::AssetError;

/// Broad classification of a [`TemplateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Broken template structure: missing delimiter, unbalanced block, runaway recursion.
    Structural,
    /// Unknown tag or filter, or a filter that failed.
    Dispatch,
    /// A variable path that does not resolve, or a value of the wrong shape.
    Resolution,
    /// A template, data or asset file that could not be found or read.
    Io,
    /// Malformed tag arguments.
    Usage,
}

/// A recoverable problem found while rendering.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("missing closing delimiter {delimiter:?} for tag opened at byte {position}")]
    UnclosedDelimiter { position: usize, delimiter: String },

    #[error("unclosed `{tag}` block: expected {expected:?}")]
    UnclosedBlock { tag: String, expected: String },

    #[error("render depth limit of {max} exceeded in {template}")]
    DepthExceeded { max: usize, template: String },

    #[error("{template} includes itself: {chain}")]
    Cycle { template: String, chain: String },

    #[error("unknown tag `{0}`")]
    UnknownTag(String),

    #[error("unknown filter `{0}`")]
    UnknownFilter(String),

    #[error("filter `{name}` failed: {message}")]
    FilterFailed { name: String, message: String },

    #[error("variable not found: {0}")]
    NotFound(String),

    #[error("value at `{path}` is not iterable")]
    NotIterable { path: String },

    #[error("cannot compare {left} {op} {right}")]
    Incomparable {
        left: String,
        op: String,
        right: String,
    },

    #[error("{what} `{name}` not found (tried {tried})")]
    TemplateNotFound {
        what: &'static str,
        name: String,
        tried: String,
    },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid data file {}: {source}", path.display())]
    Data {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{tag}`: {message}")]
    Usage { tag: String, message: String },

    #[error(transparent)]
    Asset(#[from] AssetError),
}

impl TemplateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TemplateError::UnclosedDelimiter { .. }
            | TemplateError::UnclosedBlock { .. }
            | TemplateError::DepthExceeded { .. }
            | TemplateError::Cycle { .. } => ErrorKind::Structural,
            TemplateError::UnknownTag(_)
            | TemplateError::UnknownFilter(_)
            | TemplateError::FilterFailed { .. } => ErrorKind::Dispatch,
            TemplateError::NotFound(_)
            | TemplateError::NotIterable { .. }
            | TemplateError::Incomparable { .. } => ErrorKind::Resolution,
            TemplateError::TemplateNotFound { .. }
            | TemplateError::Read { .. }
            | TemplateError::Data { .. } => ErrorKind::Io,
            TemplateError::Usage { .. } | TemplateError::Asset(_) => ErrorKind::Usage,
        }
    }

    pub(crate) fn usage(tag: &str, message: impl Into<String>) -> Self {
        TemplateError::Usage {
            tag: tag.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TemplateError::Read {
            path: path.into(),
            source,
        }
    }
}

/// Error building an engine or loading its configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid delimiters: {0}")]
    Delimiters(#[from] DelimiterError),

    #[error("max_depth must be at least 1")]
    ZeroDepth,

    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}
