//! Error handling for the client generator.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. It uses `thiserror` for easy
//! error handling and implements conversions from common error types.
//!
//! # Examples
//!
//! ```
//! use clientgen_core::error::{Error, Result};
//!
//! fn emit_section() -> Result<()> {
//!     Err(Error::unsupported("Status", "top-level string schemas are not supported"))
//! }
//!
//! let err = emit_section().map_err(|e| e.context("unable to emit types")).unwrap_err();
//! assert!(err.to_string().starts_with("unable to emit types: "));
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for generator operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Template engine error
    #[error("Template engine error: {0}")]
    Template(#[from] tera::Error),

    /// Writing into the source buffer failed
    #[error("formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// The document could not be read or one of its references could not be followed
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    /// A schema has a shape the emitter cannot express
    #[error("unsupported schema '{name}': {reason}")]
    UnsupportedSchema { name: String, reason: String },

    /// The accumulated source text is not valid Rust
    #[error("unable to format generated source: {message}")]
    Format {
        message: String,
        /// The unformatted file, kept for diagnosis
        source_text: String,
    },

    /// No `Cargo.toml` between the working directory and the filesystem root
    #[error("{} is not within a cargo package", cwd.display())]
    ModuleRoot { cwd: PathBuf },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error wrapped with the generation step it happened in
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new OpenAPI error
    pub fn openapi<S: Into<String>>(msg: S) -> Self {
        Self::OpenApi(msg.into())
    }

    /// Create a new unsupported schema error
    pub fn unsupported<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::UnsupportedSchema {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Wrap this error with the step it happened in
    pub fn context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the unformatted source text if this is (or wraps) a formatting failure
    pub fn source_text(&self) -> Option<&str> {
        match self {
            Self::Format { source_text, .. } => Some(source_text),
            Self::Context { source, .. } => source.source_text(),
            _ => None,
        }
    }
}
