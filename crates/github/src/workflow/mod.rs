//! GitHub Actions Workflow Generator
//!
//! Compiles markdown workflow documents into committed workflow files under
//! `.github/workflows/`. The agent job runs unprivileged; each enabled safe
//! output gets its own privileged job that consumes the agent's output artifact.
//!
//! # Example
//!
//! ```ignore
//! use flowgate_core::WorkflowDocument;
//! use flowgate_github::workflow::WorkflowCompiler;
//!
//! let document = WorkflowDocument::load(path)?;
//! let yaml = WorkflowCompiler::new()
//!     .with_runner("ubuntu-latest")
//!     .emit(&document, path)?;
//!
//! std::fs::write(WorkflowCompiler::output_path(path), yaml)?;
//! ```

pub mod emitter;
pub mod safe_outputs;
pub mod schema;

pub use emitter::WorkflowCompiler;
pub use safe_outputs::{OutputJob, OutputKind, plan_output_jobs};
pub use schema::*;
