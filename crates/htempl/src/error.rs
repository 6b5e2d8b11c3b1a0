/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for document resolution and rendering.

use thiserror::Error;

/// Errors that can occur while resolving, compiling or rendering a document.
///
/// Every variant names the source that caused it. None of them is
/// recoverable for the document being processed.
#[derive(Debug, Error)]
pub enum HtemplError {
    /// A source or referenced file could not be opened or read.
    #[error("{source_id}: {source}")]
    Io {
        source_id: String,
        source: std::io::Error,
    },

    /// The metadata of a source is not valid YAML or not a mapping.
    #[error("{source_id}: invalid metadata: {message}")]
    Decode { source_id: String, message: String },

    /// The metadata start marker was found but its end marker never was.
    #[error("{source_id}: metadata block started with '---' is missing its closing '...' line")]
    UnterminatedHeader { source_id: String },

    /// A reserved key holds something other than a file reference.
    #[error("{source_id}: '{key}' {message}")]
    InvalidReference {
        source_id: String,
        key: &'static str,
        message: String,
    },

    /// Metadata files include each other.
    #[error("include cycle detected: {}", chain.join(" -> "))]
    IncludeCycle { chain: Vec<String> },

    /// The body or a fragment has a template syntax error.
    #[error("{name}: template compile error: {source}")]
    Compile {
        name: String,
        source: minijinja::Error,
    },

    /// Executing the compiled template failed.
    ///
    /// Output written before the failure is not retracted.
    #[error("{name}: template render error: {source}")]
    Render {
        name: String,
        source: minijinja::Error,
    },
}

impl HtemplError {
    pub(crate) fn io(source_id: impl Into<String>, source: std::io::Error) -> Self {
        HtemplError::Io {
            source_id: source_id.into(),
            source,
        }
    }

    pub(crate) fn decode(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        HtemplError::Decode {
            source_id: source_id.into(),
            message: message.into(),
        }
    }
}

/// Result type for htempl operations.
pub type Result<T> = std::result::Result<T, HtemplError>;
