//! Core types for flowgate.
//!
//! This crate owns the workflow-level facts that the condition compiler and
//! the GitHub Actions emitter consume:
//! - [`document::WorkflowDocument`]: a markdown workflow split into frontmatter and prompt body
//! - [`config::WorkflowConfig`]: the declarative frontmatter (triggers, user `if`, safe outputs)
//! - [`Error`]: diagnostics for loading and validating workflows

pub mod config;
pub mod document;
pub mod error;

pub use config::{LabelScope, WorkflowConfig};
pub use document::WorkflowDocument;
pub use error::{Error, Result};
