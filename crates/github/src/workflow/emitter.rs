//! GitHub Actions Workflow Emitter
//!
//! Compiles a markdown workflow document into a GitHub Actions workflow.
//!
//! # Document to GitHub Actions Mapping
//!
//! | Frontmatter | GitHub Actions |
//! |-------------|----------------|
//! | `name` | Workflow `name:` |
//! | `on.command` | `issues`, `issue_comment`, `pull_request`, `pull_request_review_comment` triggers plus a command gate |
//! | `on.<event>.names` | Label gate on the agent job (not emitted as a trigger filter) |
//! | `if` | First clause of the agent job's `if:` |
//! | `runs-on` | `runs-on:` of every job |
//! | `permissions` | Agent job `permissions:` overrides |
//! | `safe-outputs.*` | One privileged job per output kind, `needs: agent` |

use super::safe_outputs::{AGENT_JOB, OUTPUT_ARTIFACT, OUTPUT_DIR, OUTPUT_FILE, plan_output_jobs};
use super::schema::{
    ActivityTrigger, Concurrency, Job, PermissionLevel, Permissions, PushTrigger, RunsOn,
    ScheduleTrigger, Step, Workflow, WorkflowDispatchTrigger, WorkflowTriggers,
};
use crate::error::{CompileError, CompileResult};
use crate::expression::Expr;
use crate::merge::GatingCondition;
use crate::policy::{event_aware_command, label_gate};
use flowgate_core::config::{self, Triggers};
use flowgate_core::{WorkflowConfig, WorkflowDocument};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Activity types a command trigger listens to, per comment-bearing event.
const COMMAND_ACTIVITY: [(&str, &[&str]); 4] = [
    ("issues", &["opened", "edited", "reopened"]),
    ("issue_comment", &["created", "edited"]),
    ("pull_request", &["opened", "edited", "reopened"]),
    ("pull_request_review_comment", &["created", "edited"]),
];

const PROMPT_FILE: &str = "prompt.md";
const PROMPT_TEXT_ENV: &str = "FLOWGATE_PROMPT_TEXT";

/// Workflow compiler.
///
/// Engine installation and execution steps come from an external engine
/// backend and are inserted verbatim after the prompt is written.
#[derive(Debug, Clone)]
pub struct WorkflowCompiler {
    /// Default runner for jobs
    pub runner: String,
    /// Agent job timeout in minutes
    pub timeout_minutes: u32,
    /// Steps that run the agent
    pub engine_steps: Vec<Step>,
}

impl Default for WorkflowCompiler {
    fn default() -> Self {
        Self {
            runner: "ubuntu-latest".to_string(),
            timeout_minutes: 20,
            engine_steps: Vec::new(),
        }
    }
}

impl WorkflowCompiler {
    /// Create a compiler with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default runner for jobs
    #[must_use]
    pub fn with_runner(mut self, runner: impl Into<String>) -> Self {
        self.runner = runner.into();
        self
    }

    /// Set the agent job timeout
    #[must_use]
    pub const fn with_timeout_minutes(mut self, minutes: u32) -> Self {
        self.timeout_minutes = minutes;
        self
    }

    /// Set the steps that run the agent
    #[must_use]
    pub fn with_engine_steps(mut self, steps: Vec<Step>) -> Self {
        self.engine_steps = steps;
        self
    }

    /// Where the compiled workflow for `source` is written: `<stem>.lock.yml`.
    #[must_use]
    pub fn output_path(source: &Path) -> PathBuf {
        source.with_extension("lock.yml")
    }

    /// Gating condition of the agent job.
    ///
    /// Policies are merged in a fixed order: user `if`, command gate, label gate.
    /// `None` means the job runs for every triggering event.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Expression`] when any policy cannot be built.
    pub fn agent_condition(config: &WorkflowConfig) -> CompileResult<Option<String>> {
        let gate = GatingCondition::new()
            .and_raw(config.if_condition.as_deref().unwrap_or_default())?
            .and_opt(Self::command_gate(config)?)
            .and_opt(Self::label_gate(config)?);
        Ok(gate.finalize())
    }

    fn command_gate(config: &WorkflowConfig) -> CompileResult<Option<Expr>> {
        config
            .command_name()
            .map(|name| event_aware_command(name, config.has_other_events()))
            .transpose()
            .map_err(CompileError::from)
    }

    fn label_gate(config: &WorkflowConfig) -> CompileResult<Option<Expr>> {
        let names = config.label_names();
        if names.is_empty() {
            return Ok(None);
        }
        Ok(Some(label_gate(&names, config.label_scope())?))
    }

    /// Compile a document into a workflow.
    ///
    /// `default_name` is used when the frontmatter has no `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] when a gate cannot be built or a permission
    /// override is invalid. No partial workflow is produced.
    pub fn compile(
        &self,
        document: &WorkflowDocument,
        default_name: &str,
    ) -> CompileResult<Workflow> {
        let config = &document.frontmatter;
        let name = config
            .name
            .clone()
            .unwrap_or_else(|| default_name.to_string());
        let runs_on = self.runs_on(config);

        let mut jobs = IndexMap::new();
        jobs.insert(
            AGENT_JOB.to_string(),
            self.build_agent_job(document, runs_on.clone())?,
        );

        let command = Self::command_gate(config)?;
        for output in plan_output_jobs(&config.safe_outputs)? {
            let job = output.build(command.as_ref(), &runs_on)?;
            jobs.insert(output.kind.job_id().to_string(), job);
        }

        tracing::info!(workflow = %name, jobs = jobs.len(), "Compiled workflow");

        Ok(Workflow {
            name,
            on: Self::build_triggers(&config.on),
            permissions: Some(Permissions::default()),
            concurrency: Some(Concurrency {
                group: "flowgate-${{ github.workflow }}-${{ github.event.issue.number || github.event.pull_request.number || github.ref }}".to_string(),
                cancel_in_progress: None,
            }),
            jobs,
        })
    }

    /// Compile a document and serialize it to YAML with a generation header.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] from [`WorkflowCompiler::compile`] or
    /// [`CompileError::Serialization`] when YAML output fails.
    pub fn emit(&self, document: &WorkflowDocument, source: &Path) -> CompileResult<String> {
        let default_name = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("workflow");
        let workflow = self.compile(document, default_name)?;
        Self::serialize_workflow(&workflow, source)
    }

    fn serialize_workflow(workflow: &Workflow, source: &Path) -> CompileResult<String> {
        let yaml = serde_yaml::to_string(workflow)
            .map_err(|e| CompileError::Serialization(e.to_string()))?;

        let header = format!(
            "# Generated by flowgate from {source} - do not edit manually\n# Regenerate with: flowgate compile {source}\n\n",
            source = source.display()
        );

        Ok(format!("{header}{yaml}"))
    }

    fn runs_on(&self, config: &WorkflowConfig) -> RunsOn {
        match config.runs_on.as_ref().map(config::StringOrVec::to_vec) {
            Some(labels) if labels.len() == 1 => RunsOn::Label(labels[0].clone()),
            Some(labels) if !labels.is_empty() => RunsOn::Labels(labels),
            _ => RunsOn::Label(self.runner.clone()),
        }
    }

    fn build_agent_job(&self, document: &WorkflowDocument, runs_on: RunsOn) -> CompileResult<Job> {
        let config = &document.frontmatter;
        let if_condition = Self::agent_condition(config)?;
        tracing::debug!(job = AGENT_JOB, condition = ?if_condition, "Gated agent job");

        let mut steps = vec![
            Step::uses("actions/checkout@v4").with_name("Checkout"),
            // The body travels as data in `env:`; the script never interpolates it.
            Step::run(format!(
                "mkdir -p \"{OUTPUT_DIR}\"\ntouch \"{OUTPUT_DIR}/{OUTPUT_FILE}\"\nprintf '%s\\n' \"${PROMPT_TEXT_ENV}\" > \"$FLOWGATE_PROMPT\"\n"
            ))
            .with_name("Write prompt")
            .with_env(PROMPT_TEXT_ENV, document.body.clone()),
        ];
        steps.extend(self.engine_steps.iter().cloned());

        if !config.safe_outputs.is_empty() {
            steps.push(
                Step::uses("actions/upload-artifact@v4")
                    .with_name("Upload agent output")
                    .with_if("always()")
                    .with_input("name", OUTPUT_ARTIFACT)
                    .with_input("path", format!("{OUTPUT_DIR}/"))
                    .with_input("if-no-files-found", "ignore"),
            );
        }

        let mut env = IndexMap::new();
        env.insert(
            "FLOWGATE_PROMPT".to_string(),
            format!("{OUTPUT_DIR}/{PROMPT_FILE}"),
        );
        env.insert(
            "FLOWGATE_OUTPUT".to_string(),
            format!("{OUTPUT_DIR}/{OUTPUT_FILE}"),
        );

        Ok(Job {
            name: None,
            runs_on,
            needs: Vec::new(),
            if_condition,
            permissions: Some(Self::agent_permissions(config)?),
            timeout_minutes: Some(self.timeout_minutes),
            env,
            steps,
        })
    }

    /// Read-only permissions with frontmatter overrides applied.
    fn agent_permissions(config: &WorkflowConfig) -> CompileResult<Permissions> {
        let mut permissions = Permissions::read_only();

        for (scope, level) in &config.permissions {
            let invalid = || CompileError::Permission {
                scope: scope.clone(),
                level: level.clone(),
            };
            let parsed = PermissionLevel::parse(level).ok_or_else(invalid)?;
            match scope.as_str() {
                "contents" => permissions.contents = Some(parsed),
                "issues" => permissions.issues = Some(parsed),
                "pull-requests" => permissions.pull_requests = Some(parsed),
                "actions" => permissions.actions = Some(parsed),
                _ => return Err(invalid()),
            }
        }

        Ok(permissions)
    }

    /// Build workflow triggers, expanding the command pseudo-event.
    fn build_triggers(triggers: &Triggers) -> WorkflowTriggers {
        let command = triggers.command.is_some();
        let command_types = |event: &str| {
            COMMAND_ACTIVITY
                .iter()
                .find(|(name, _)| *name == event)
                .map(|(_, types)| *types)
                .filter(|_| command)
        };

        WorkflowTriggers {
            issues: merge_activity(triggers.issues.as_ref(), command_types("issues")),
            issue_comment: merge_activity(
                triggers.issue_comment.as_ref(),
                command_types("issue_comment"),
            ),
            pull_request: merge_activity(
                triggers.pull_request.as_ref(),
                command_types("pull_request"),
            ),
            pull_request_review_comment: merge_activity(
                triggers.pull_request_review_comment.as_ref(),
                command_types("pull_request_review_comment"),
            ),
            push: triggers.push.as_ref().map(|push| PushTrigger {
                branches: push.branches.clone(),
                tags: push.tags.clone(),
            }),
            schedule: (!triggers.schedule.is_empty()).then(|| {
                triggers
                    .schedule
                    .iter()
                    .map(|s| ScheduleTrigger {
                        cron: s.cron.clone(),
                    })
                    .collect()
            }),
            workflow_dispatch: triggers
                .workflow_dispatch
                .then(WorkflowDispatchTrigger::default),
        }
    }
}

/// Union of explicitly configured activity types and those a command needs.
///
/// An explicit trigger with no types already listens to every activity type.
fn merge_activity(
    explicit: Option<&config::ActivityTrigger>,
    command_types: Option<&[&str]>,
) -> Option<ActivityTrigger> {
    let has_command = command_types.is_some();
    let required = || {
        command_types
            .unwrap_or_default()
            .iter()
            .map(|t| (*t).to_string())
    };
    match explicit {
        None if !has_command => None,
        None => Some(ActivityTrigger {
            types: required().collect(),
            branches: Vec::new(),
        }),
        Some(explicit) => {
            let mut types = explicit.types.clone();
            if has_command && !types.is_empty() {
                for ty in required() {
                    if !types.contains(&ty) {
                        types.push(ty);
                    }
                }
            }
            Some(ActivityTrigger {
                types,
                branches: explicit.branches.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(source: &str) -> WorkflowDocument {
        WorkflowDocument::parse(source).unwrap()
    }

    #[test]
    fn test_command_expands_triggers() {
        let doc = document("---\non:\n  command: deploy\n---\nDeploy.\n");
        let workflow = WorkflowCompiler::new().compile(&doc, "deploy").unwrap();

        let issues = workflow.on.issues.unwrap();
        assert_eq!(issues.types, vec!["opened", "edited", "reopened"]);
        assert_eq!(
            workflow.on.issue_comment.unwrap().types,
            vec!["created", "edited"]
        );
        assert!(workflow.on.pull_request.is_some());
        assert!(workflow.on.pull_request_review_comment.is_some());
        assert!(workflow.on.push.is_none());
    }

    #[test]
    fn test_command_merges_with_explicit_types() {
        let doc = document(
            "---\non:\n  command: deploy\n  issues:\n    types: [closed]\n  schedule:\n    - cron: '0 0 * * *'\n---\nBody\n",
        );
        let workflow = WorkflowCompiler::new().compile(&doc, "x").unwrap();
        assert_eq!(
            workflow.on.issues.unwrap().types,
            vec!["closed", "opened", "edited", "reopened"]
        );
        assert_eq!(workflow.on.schedule.map(|s| s.len()), Some(1));
    }

    #[test]
    fn test_explicit_all_types_stays_unfiltered() {
        let merged = merge_activity(
            Some(&config::ActivityTrigger::default()),
            Some(&["opened"]),
        )
        .unwrap();
        assert!(merged.types.is_empty());
    }

    #[test]
    fn test_label_names_not_emitted_as_trigger_filter() {
        let doc = document(
            "---\non:\n  issues:\n    types: [labeled]\n    names: [bug]\n---\nTriage\n",
        );
        let yaml = WorkflowCompiler::new()
            .emit(&doc, Path::new("triage.md"))
            .unwrap();
        assert!(!yaml.contains("names:"));
        assert!(yaml.contains("contains(github.event.label.name, 'bug')"));
    }

    #[test]
    fn test_agent_condition_merge_order() {
        let doc = document(
            "---\non:\n  command: deploy\n  push:\nif: github.actor != 'bot'\n---\nBody\n",
        );
        let condition = WorkflowCompiler::agent_condition(&doc.frontmatter)
            .unwrap()
            .unwrap();
        assert!(condition.starts_with("(github.actor != 'bot') && ("));
        assert!(condition.contains("!(github.event_name == 'issues'"));
    }

    #[test]
    fn test_unconditional_agent_job() {
        let doc = document("---\non: push\n---\nBody\n");
        let workflow = WorkflowCompiler::new().compile(&doc, "x").unwrap();
        assert_eq!(workflow.jobs[AGENT_JOB].if_condition, None);
    }

    #[test]
    fn test_output_jobs_follow_agent() {
        let doc = document(
            "---\non:\n  command: fix\nsafe-outputs:\n  add-comment:\n  push-to-pr-branch:\n---\nFix it.\n",
        );
        let workflow = WorkflowCompiler::new().compile(&doc, "fix").unwrap();
        let keys: Vec<&str> = workflow.jobs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["agent", "add_comment", "push_to_pr_branch"]);
        assert!(
            workflow.jobs["add_comment"]
                .if_condition
                .as_deref()
                .unwrap_or_default()
                .ends_with("&& (github.event.issue.number || github.event.pull_request.number)")
        );
    }

    #[test]
    fn test_upload_step_only_with_outputs() {
        let without = document("---\non: push\n---\nBody\n");
        let job = &WorkflowCompiler::new().compile(&without, "x").unwrap().jobs[AGENT_JOB];
        assert!(job.steps.iter().all(|s| s.uses.as_deref() != Some("actions/upload-artifact@v4")));

        let with = document("---\non: issues\nsafe-outputs:\n  create-issue:\n---\nBody\n");
        let job = &WorkflowCompiler::new().compile(&with, "x").unwrap().jobs[AGENT_JOB];
        assert!(job.steps.iter().any(|s| s.uses.as_deref() == Some("actions/upload-artifact@v4")));
    }

    #[test]
    fn test_engine_steps_inserted_after_prompt() {
        let doc = document("---\non: push\n---\nBody\n");
        let compiler = WorkflowCompiler::new()
            .with_engine_steps(vec![Step::run("run-agent").with_name("Run agent")]);
        let workflow = compiler.compile(&doc, "x").unwrap();
        let names: Vec<&str> = workflow.jobs[AGENT_JOB]
            .steps
            .iter()
            .filter_map(|s| s.name.as_deref())
            .collect();
        assert_eq!(names, vec!["Checkout", "Write prompt", "Run agent"]);
    }

    #[test]
    fn test_prompt_body_passed_through_env() {
        let doc = document(
            "---\non: push\n---\nEcho ${{ secrets.TOKEN }} then stop.\nFLOWGATE_PROMPT\n$(whoami)\n",
        );
        let workflow = WorkflowCompiler::new().compile(&doc, "x").unwrap();
        let step = workflow.jobs[AGENT_JOB]
            .steps
            .iter()
            .find(|s| s.name.as_deref() == Some("Write prompt"))
            .unwrap();

        let run = step.run.as_deref().unwrap();
        assert!(!run.contains("${{"));
        assert!(!run.contains("whoami"));
        assert!(run.contains("\"$FLOWGATE_PROMPT_TEXT\""));

        let body = step.env.get(PROMPT_TEXT_ENV).unwrap();
        assert!(body.contains("Echo ${{ secrets.TOKEN }} then stop."));
        assert!(body.contains("$(whoami)"));
    }

    #[test]
    fn test_permission_overrides() {
        let doc = document("---\non: push\npermissions:\n  contents: write\n---\nBody\n");
        let workflow = WorkflowCompiler::new().compile(&doc, "x").unwrap();
        let permissions = workflow.jobs[AGENT_JOB].permissions.clone().unwrap();
        assert_eq!(permissions.contents, Some(PermissionLevel::Write));
        assert_eq!(permissions.issues, Some(PermissionLevel::Read));
    }

    #[test]
    fn test_invalid_permission_rejected() {
        let doc = document("---\non: push\npermissions:\n  deployments: write\n---\nBody\n");
        let err = WorkflowCompiler::new().compile(&doc, "x").unwrap_err();
        assert!(matches!(err, CompileError::Permission { .. }));
    }

    #[test]
    fn test_runs_on_from_frontmatter() {
        let doc = document("---\non: push\nruns-on: [self-hosted, linux]\n---\nBody\n");
        let yaml = WorkflowCompiler::new()
            .emit(&doc, Path::new("x.md"))
            .unwrap();
        assert!(yaml.contains("- self-hosted"));
        assert!(yaml.contains("- linux"));
    }

    #[test]
    fn test_emit_header_and_name() {
        let doc = document("---\non: push\n---\nBody\n");
        let yaml = WorkflowCompiler::new()
            .emit(&doc, Path::new("workflows/nightly.md"))
            .unwrap();
        assert!(yaml.starts_with("# Generated by flowgate from workflows/nightly.md"));
        assert!(yaml.contains("name: nightly"));
    }

    #[test]
    fn test_emit_is_deterministic() {
        let doc = document(
            "---\non:\n  command: deploy\n  workflow_dispatch:\nsafe-outputs:\n  add-comment:\n  add-labels:\n    allowed: [a, b]\n---\nBody\n",
        );
        let compiler = WorkflowCompiler::new();
        let first = compiler.emit(&doc, Path::new("d.md")).unwrap();
        let second = compiler.emit(&doc, Path::new("d.md")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            WorkflowCompiler::output_path(Path::new(".github/workflows/triage.md")),
            PathBuf::from(".github/workflows/triage.lock.yml")
        );
    }
}
