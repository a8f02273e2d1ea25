//! Errors raised while compiling a workflow document.

use crate::expression::ExprError;
use miette::Diagnostic;
use thiserror::Error;

/// Error types for workflow compilation
#[derive(Debug, Error, Diagnostic)]
pub enum CompileError {
    /// A gating condition could not be constructed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Expression(#[from] ExprError),

    /// The workflow document is invalid
    #[error(transparent)]
    #[diagnostic(transparent)]
    Workflow(#[from] flowgate_core::Error),

    /// A permission override names an unknown scope or level
    #[error("Invalid permission '{scope}: {level}'")]
    #[diagnostic(
        code(flowgate::github::permission),
        help("Scopes: contents, issues, pull-requests, actions. Levels: read, write, none")
    )]
    Permission {
        /// The permission scope as written
        scope: String,
        /// The permission level as written
        level: String,
    },

    /// YAML serialization failed
    #[error("Serialization failed: {0}")]
    #[diagnostic(code(flowgate::github::serialization))]
    Serialization(String),
}

/// Result type for workflow compilation
pub type CompileResult<T> = std::result::Result<T, CompileError>;
