//! Privileged output jobs.
//!
//! The agent job runs with a read-only token and records what it wants done
//! as JSON lines in an artifact. Each configured output kind gets its own job
//! with the narrowest write permission it needs, gated on a base condition
//! (the event context the job requires) and, for command workflows, the
//! command gate.

use super::schema::{Job, PermissionLevel, Permissions, RunsOn, Step};
use crate::expression::{Expr, ExprError, equals, literal, property};
use crate::policy::{ALWAYS, compose_command_and_base, context_available};
use flowgate_core::config::{OutputTarget, SafeOutputsConfig};
use indexmap::IndexMap;

/// Job key of the agent job every output job depends on.
pub const AGENT_JOB: &str = "agent";
/// Artifact carrying the agent's requested outputs.
pub const OUTPUT_ARTIFACT: &str = "agent-output";
/// Runner directory shared by the agent and output jobs.
pub const OUTPUT_DIR: &str = "/tmp/flowgate";
/// JSON-lines file of requested outputs, relative to [`OUTPUT_DIR`].
pub const OUTPUT_FILE: &str = "output.jsonl";
/// Patch file consumed by `push_to_pr_branch`, relative to [`OUTPUT_DIR`].
pub const PATCH_FILE: &str = "changes.patch";

const AGENT_RESULT: &str = "needs.agent.result";

const ISSUE_NUMBER: &str = "github.event.issue.number";
const PULL_REQUEST_NUMBER: &str = "github.event.pull_request.number";

const GITHUB_SCRIPT: &str = "actions/github-script@v7";
const DOWNLOAD_ARTIFACT: &str = "actions/download-artifact@v4";
const CHECKOUT: &str = "actions/checkout@v4";

/// Kinds of privileged output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Comment on an issue or pull request
    AddComment,
    /// Edit an issue
    UpdateIssue,
    /// Label the triggering issue or pull request
    AddLabels,
    /// Push a patch to the triggering pull request's head branch
    PushToPrBranch,
    /// Open an issue
    CreateIssue,
}

impl OutputKind {
    /// Job key in the generated workflow.
    #[must_use]
    pub const fn job_id(self) -> &'static str {
        match self {
            Self::AddComment => "add_comment",
            Self::UpdateIssue => "update_issue",
            Self::AddLabels => "add_labels",
            Self::PushToPrBranch => "push_to_pr_branch",
            Self::CreateIssue => "create_issue",
        }
    }

    /// `type` field of matching entries in the output file.
    #[must_use]
    pub const fn output_type(self) -> &'static str {
        match self {
            Self::AddComment => "add-comment",
            Self::UpdateIssue => "update-issue",
            Self::AddLabels => "add-labels",
            Self::PushToPrBranch => "push-to-pr-branch",
            Self::CreateIssue => "create-issue",
        }
    }

    const fn permissions(self) -> Permissions {
        let write = Some(PermissionLevel::Write);
        match self {
            Self::AddComment | Self::AddLabels => Permissions {
                contents: None,
                issues: write,
                pull_requests: write,
                actions: None,
            },
            Self::UpdateIssue | Self::CreateIssue => Permissions {
                contents: None,
                issues: write,
                pull_requests: None,
                actions: None,
            },
            Self::PushToPrBranch => Permissions {
                contents: write,
                issues: None,
                pull_requests: None,
                actions: None,
            },
        }
    }

    const fn script(self) -> Option<&'static str> {
        match self {
            Self::AddComment => Some(ADD_COMMENT_SCRIPT),
            Self::UpdateIssue => Some(UPDATE_ISSUE_SCRIPT),
            Self::AddLabels => Some(ADD_LABELS_SCRIPT),
            Self::CreateIssue => Some(CREATE_ISSUE_SCRIPT),
            Self::PushToPrBranch => None,
        }
    }
}

/// An output job before gating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputJob {
    /// What the job does
    pub kind: OutputKind,
    /// Event context the job needs, or [`ALWAYS`]
    pub base_condition: String,
    /// Settings passed to the job's script
    pub env: IndexMap<String, String>,
}

impl OutputJob {
    /// Build the job, gated on `command` (if any) and the base condition.
    ///
    /// A bare `always()` gate would also run after a skipped or failed agent
    /// job, so it is replaced by a check that the agent succeeded.
    ///
    /// # Errors
    ///
    /// Propagates [`ExprError`] from composing the gate.
    pub fn build(&self, command: Option<&Expr>, runs_on: &RunsOn) -> Result<Job, ExprError> {
        let mut if_condition = compose_command_and_base(command, &self.base_condition)?;
        if if_condition == ALWAYS {
            if_condition = agent_succeeded()?.render();
        }
        tracing::debug!(
            job = self.kind.job_id(),
            condition = %if_condition,
            "Gated output job"
        );

        let mut env = self.env.clone();
        env.insert(
            "FLOWGATE_OUTPUT".to_string(),
            format!("{OUTPUT_DIR}/{OUTPUT_FILE}"),
        );
        env.insert(
            "FLOWGATE_OUTPUT_TYPE".to_string(),
            self.kind.output_type().to_string(),
        );

        Ok(Job {
            name: None,
            runs_on: runs_on.clone(),
            needs: vec![AGENT_JOB.to_string()],
            if_condition: Some(if_condition),
            permissions: Some(self.kind.permissions()),
            timeout_minutes: Some(10),
            env,
            steps: self.steps(),
        })
    }

    fn steps(&self) -> Vec<Step> {
        let download = Step::uses(DOWNLOAD_ARTIFACT)
            .with_name("Download agent output")
            .with_input("name", OUTPUT_ARTIFACT)
            .with_input("path", OUTPUT_DIR);

        match self.kind.script() {
            Some(script) => vec![
                download,
                Step::uses(GITHUB_SCRIPT)
                    .with_name(format!("Apply {}", self.kind.output_type()))
                    .with_input("script", format!("{SCRIPT_PRELUDE}{script}")),
            ],
            None => vec![
                Step::uses(CHECKOUT)
                    .with_name("Checkout pull request branch")
                    .with_input("ref", "${{ github.event.pull_request.head.ref }}"),
                download,
                Step::run(PUSH_SCRIPT)
                    .with_name("Push changes")
                    .with_env("PATCH", format!("{OUTPUT_DIR}/{PATCH_FILE}"))
                    .with_env("HEAD_REF", "${{ github.event.pull_request.head.ref }}"),
            ],
        }
    }
}

fn agent_succeeded() -> Result<Expr, ExprError> {
    Ok(equals(property(AGENT_RESULT)?, literal("success")))
}

/// Plan the output jobs for a configuration, in a fixed order.
///
/// # Errors
///
/// Propagates [`ExprError`] from building base conditions.
pub fn plan_output_jobs(config: &SafeOutputsConfig) -> Result<Vec<OutputJob>, ExprError> {
    let mut jobs = Vec::new();

    if let Some(output) = &config.add_comment {
        jobs.push(OutputJob {
            kind: OutputKind::AddComment,
            base_condition: targeted_base(output.target, &[ISSUE_NUMBER, PULL_REQUEST_NUMBER])?,
            env: target_env(output.target),
        });
    }

    if let Some(output) = &config.update_issue {
        jobs.push(OutputJob {
            kind: OutputKind::UpdateIssue,
            base_condition: targeted_base(output.target, &[ISSUE_NUMBER])?,
            env: target_env(output.target),
        });
    }

    if let Some(output) = &config.add_labels {
        let mut env = IndexMap::new();
        env.insert(
            "FLOWGATE_ALLOWED_LABELS".to_string(),
            output.allowed.join(","),
        );
        if let Some(max) = output.max {
            env.insert("FLOWGATE_MAX_LABELS".to_string(), max.to_string());
        }
        jobs.push(OutputJob {
            kind: OutputKind::AddLabels,
            base_condition: context_available(&[ISSUE_NUMBER, PULL_REQUEST_NUMBER])?.render(),
            env,
        });
    }

    if config.push_to_pr_branch.is_some() {
        jobs.push(OutputJob {
            kind: OutputKind::PushToPrBranch,
            base_condition: context_available(&[PULL_REQUEST_NUMBER])?.render(),
            env: IndexMap::new(),
        });
    }

    if let Some(output) = &config.create_issue {
        let mut env = IndexMap::new();
        if let Some(prefix) = &output.title_prefix {
            env.insert("FLOWGATE_TITLE_PREFIX".to_string(), prefix.clone());
        }
        if !output.labels.is_empty() {
            env.insert("FLOWGATE_ISSUE_LABELS".to_string(), output.labels.join(","));
        }
        jobs.push(OutputJob {
            kind: OutputKind::CreateIssue,
            base_condition: ALWAYS.to_string(),
            env,
        });
    }

    Ok(jobs)
}

/// Explicit targets do not depend on the triggering event.
fn targeted_base(target: OutputTarget, paths: &[&str]) -> Result<String, ExprError> {
    if target.is_explicit() {
        Ok(ALWAYS.to_string())
    } else {
        Ok(context_available(paths)?.render())
    }
}

fn target_env(target: OutputTarget) -> IndexMap<String, String> {
    let value = match target {
        OutputTarget::Triggering => "triggering".to_string(),
        OutputTarget::Any => "*".to_string(),
        OutputTarget::Number(n) => n.to_string(),
    };
    IndexMap::from([("FLOWGATE_TARGET".to_string(), value)])
}

const SCRIPT_PRELUDE: &str = r"const fs = require('fs');
const file = process.env.FLOWGATE_OUTPUT;
const items = fs.existsSync(file)
  ? fs.readFileSync(file, 'utf8').split('\n').filter(Boolean).map((line) => JSON.parse(line))
      .filter((item) => item.type === process.env.FLOWGATE_OUTPUT_TYPE)
  : [];
const triggering = (context.payload.issue || context.payload.pull_request || {}).number;
const resolve = (item) => {
  const target = process.env.FLOWGATE_TARGET || 'triggering';
  if (target === 'triggering') return triggering;
  if (target === '*') return item.issue_number;
  return Number(target);
};
";

const ADD_COMMENT_SCRIPT: &str = r"for (const item of items) {
  const issue_number = resolve(item);
  if (!issue_number) { core.warning('add-comment: no target issue'); continue; }
  await github.rest.issues.createComment({ ...context.repo, issue_number, body: item.body });
}
";

const UPDATE_ISSUE_SCRIPT: &str = r"for (const item of items) {
  const issue_number = resolve(item);
  if (!issue_number) { core.warning('update-issue: no target issue'); continue; }
  const { title, body, state } = item;
  await github.rest.issues.update({ ...context.repo, issue_number, title, body, state });
}
";

const ADD_LABELS_SCRIPT: &str = r"const allowed = (process.env.FLOWGATE_ALLOWED_LABELS || '').split(',').filter(Boolean);
const max = Number(process.env.FLOWGATE_MAX_LABELS || 0);
let labels = [...new Set(items.flatMap((item) => item.labels || []))];
if (allowed.length > 0) labels = labels.filter((label) => allowed.includes(label));
if (max > 0) labels = labels.slice(0, max);
if (labels.length > 0 && triggering) {
  await github.rest.issues.addLabels({ ...context.repo, issue_number: triggering, labels });
}
";

const CREATE_ISSUE_SCRIPT: &str = r"const prefix = process.env.FLOWGATE_TITLE_PREFIX || '';
const labels = (process.env.FLOWGATE_ISSUE_LABELS || '').split(',').filter(Boolean);
for (const item of items) {
  await github.rest.issues.create({ ...context.repo, title: prefix + item.title, body: item.body, labels });
}
";

const PUSH_SCRIPT: &str = r#"if [ ! -s "$PATCH" ]; then
  echo "No changes to push"
  exit 0
fi
git config user.name "github-actions[bot]"
git config user.email "github-actions[bot]@users.noreply.github.com"
git apply --index "$PATCH"
git commit -m "Apply agent changes"
git push origin "HEAD:$HEAD_REF"
"#;
