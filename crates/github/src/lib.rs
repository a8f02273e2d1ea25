//! GitHub Actions support for flowgate.
//!
//! This crate provides:
//! - [`expression`]: a typed model of GitHub Actions `if:` expressions and its renderer
//! - [`policy`]: gating policies (command mention, label filter, safe-output context)
//! - [`merge`]: folding policies into one job condition
//! - [`workflow::WorkflowCompiler`] for workflow file generation

#![warn(missing_docs)]

pub mod error;
pub mod expression;
pub mod merge;
pub mod policy;
pub mod workflow;

// Re-exports for convenience
pub use error::{CompileError, CompileResult};
pub use expression::{Expr, ExprError};
pub use merge::{GatingCondition, merge};
pub use workflow::WorkflowCompiler;
