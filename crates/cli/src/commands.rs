//! Subcommand implementations.

use flowgate_core::{LabelScope, WorkflowDocument};
use flowgate_github::GatingCondition;
use flowgate_github::policy::{event_aware_command, label_gate};
use flowgate_github::workflow::WorkflowCompiler;
use std::path::{Path, PathBuf};

/// Options for `flowgate compile`.
#[derive(Debug)]
pub struct CompileOptions {
    /// Source documents
    pub files: Vec<PathBuf>,
    /// Directory for compiled output; beside each source when unset
    pub output_dir: Option<PathBuf>,
    /// Return compiled YAML instead of writing files
    pub stdout: bool,
    /// Runner label
    pub runner: String,
}

/// Result of compiling one document.
#[derive(Debug)]
pub enum Compiled {
    /// Written to disk
    Written(PathBuf),
    /// Held for printing
    Yaml(String),
}

/// Compile every file, stopping at the first failure.
pub fn compile(options: &CompileOptions) -> miette::Result<Vec<Compiled>> {
    let compiler = WorkflowCompiler::new().with_runner(options.runner.clone());
    let mut results = Vec::with_capacity(options.files.len());

    for source in &options.files {
        let document = WorkflowDocument::load(source)?;
        let yaml = compiler.emit(&document, source)?;

        if options.stdout {
            results.push(Compiled::Yaml(yaml));
            continue;
        }

        let target = output_path(source, options.output_dir.as_deref());
        std::fs::write(&target, yaml).map_err(|e| flowgate_core::Error::io(&target, e))?;
        tracing::info!(source = %source.display(), target = %target.display(), "Wrote workflow");
        results.push(Compiled::Written(target));
    }

    Ok(results)
}

fn output_path(source: &Path, output_dir: Option<&Path>) -> PathBuf {
    let compiled = WorkflowCompiler::output_path(source);
    match (output_dir, compiled.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => compiled,
    }
}

/// Options for `flowgate gate`.
#[derive(Debug, Default)]
pub struct GateOptions {
    /// Command word
    pub command: Option<String>,
    /// Workflow also runs on events without a comment body
    pub other_events: bool,
    /// Label names
    pub labels: Vec<String>,
    /// Triggers mix labeling actions with other events
    pub mixed_labels: bool,
    /// User condition
    pub if_condition: Option<String>,
}

/// Render the gating condition for the given policies.
///
/// Returns `None` when no policy applies and the job is unconditional.
pub fn gate(options: &GateOptions) -> miette::Result<Option<String>> {
    let command = options
        .command
        .as_deref()
        .map(|name| event_aware_command(name, options.other_events))
        .transpose()?;

    let labels = if options.labels.is_empty() {
        None
    } else {
        let scope = if options.mixed_labels {
            LabelScope::Mixed
        } else {
            LabelScope::LabelEventsOnly
        };
        Some(label_gate(&options.labels, scope)?)
    };

    let condition = GatingCondition::new()
        .and_raw(options.if_condition.as_deref().unwrap_or_default())?
        .and_opt(command)
        .and_opt(labels);

    Ok(condition.finalize())
}
