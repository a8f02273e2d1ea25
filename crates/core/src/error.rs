//! Error types for loading and validating workflow documents.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for workflow loading operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a workflow document.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Failed to read a workflow file.
    #[error("Failed to read workflow at {path}: {source}")]
    #[diagnostic(
        code(flowgate::core::io),
        help("Check that the workflow file exists and is readable")
    )]
    Io {
        /// Path to the workflow file
        path: PathBuf,
        /// The underlying source error
        #[source]
        source: std::io::Error,
    },

    /// The document has no frontmatter block, or it is not terminated.
    #[error("Invalid frontmatter: {message}")]
    #[diagnostic(
        code(flowgate::core::frontmatter),
        help("Start the file with a '---' line and close the YAML block with another '---' line")
    )]
    Frontmatter {
        /// The error message
        message: String,
    },

    /// The frontmatter YAML did not match the workflow schema.
    #[error("Failed to parse workflow frontmatter: {source}")]
    #[diagnostic(code(flowgate::core::yaml))]
    Yaml {
        /// The underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// The frontmatter parsed but describes an unsupported configuration.
    #[error("Invalid workflow configuration: {message}")]
    #[diagnostic(code(flowgate::core::config), help("{help}"))]
    Config {
        /// The error message
        message: String,
        /// Help text for the user
        help: String,
    },
}

impl Error {
    /// Create an IO error for the given path
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a frontmatter error
    #[must_use]
    pub fn frontmatter(message: impl Into<String>) -> Self {
        Self::Frontmatter {
            message: message.into(),
        }
    }

    /// Create a configuration error with help text
    #[must_use]
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Yaml { source }
    }
}
