//! GitHub Actions Workflow Schema Types
//!
//! Defines the data structures for GitHub Actions workflow YAML generation.
//! Maps use [`IndexMap`] so generated files are byte-for-byte reproducible.
//! See: <https://docs.github.com/en/actions/using-workflows/workflow-syntax-for-github-actions>

use indexmap::IndexMap;
use serde::Serialize;

/// A GitHub Actions workflow definition.
#[derive(Debug, Clone, Serialize)]
pub struct Workflow {
    /// Workflow name displayed in GitHub UI
    pub name: String,

    /// Trigger configuration
    #[serde(rename = "on")]
    pub on: WorkflowTriggers,

    /// Default permissions for `GITHUB_TOKEN`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,

    /// Concurrency settings to prevent duplicate runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<Concurrency>,

    /// Job definitions (order preserved via `IndexMap`)
    pub jobs: IndexMap<String, Job>,
}

/// Workflow trigger configuration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowTriggers {
    /// Trigger on issue events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<ActivityTrigger>,

    /// Trigger on issue and pull request comments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_comment: Option<ActivityTrigger>,

    /// Trigger on pull request events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<ActivityTrigger>,

    /// Trigger on pull request review comments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_review_comment: Option<ActivityTrigger>,

    /// Trigger on push events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push: Option<PushTrigger>,

    /// Scheduled trigger (cron expressions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<ScheduleTrigger>>,

    /// Manual trigger
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_dispatch: Option<WorkflowDispatchTrigger>,
}

/// Activity-type filtered event trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityTrigger {
    /// Activity types to trigger on (empty means all)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,

    /// Target branch patterns
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
}

/// Push event trigger configuration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PushTrigger {
    /// Branch patterns to trigger on
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,

    /// Tag patterns to trigger on
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Manual workflow dispatch trigger.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowDispatchTrigger {}

/// Schedule trigger using cron expressions.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleTrigger {
    /// Cron expression (e.g., "0 0 * * *" for daily at midnight)
    pub cron: String,
}

/// Concurrency configuration to prevent duplicate workflow runs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Concurrency {
    /// Concurrency group name
    pub group: String,

    /// Whether to cancel in-progress runs when a new run is triggered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_in_progress: Option<bool>,
}

/// `GITHUB_TOKEN` permissions configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Permissions {
    /// Repository contents permission
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<PermissionLevel>,

    /// Issues permission
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<PermissionLevel>,

    /// Pull requests permission
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_requests: Option<PermissionLevel>,

    /// GitHub Actions permission
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<PermissionLevel>,
}

impl Permissions {
    /// Read access to everything the agent needs to inspect.
    #[must_use]
    pub const fn read_only() -> Self {
        Self {
            contents: Some(PermissionLevel::Read),
            issues: Some(PermissionLevel::Read),
            pull_requests: Some(PermissionLevel::Read),
            actions: None,
        }
    }
}

/// Permission level for `GITHUB_TOKEN` scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// Read-only access
    Read,
    /// Read and write access
    Write,
    /// No access
    None,
}

impl PermissionLevel {
    /// Parse a level as written in frontmatter.
    #[must_use]
    pub fn parse(level: &str) -> Option<Self> {
        match level.trim().to_lowercase().as_str() {
            "write" => Some(Self::Write),
            "read" => Some(Self::Read),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// A job in a GitHub Actions workflow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Job {
    /// Job display name (shown in GitHub UI)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Runner label(s) specifying where to run
    pub runs_on: RunsOn,

    /// Job dependencies (these jobs must complete first)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,

    /// Conditional execution expression
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_condition: Option<String>,

    /// Job-scoped `GITHUB_TOKEN` permissions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,

    /// Job timeout in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<u32>,

    /// Job-level environment variables
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,

    /// Job steps (executed sequentially)
    pub steps: Vec<Step>,
}

/// Runner specification for where a job runs.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RunsOn {
    /// Single runner label (e.g., "ubuntu-latest")
    Label(String),
    /// Multiple runner labels (job runs on runner matching all labels)
    Labels(Vec<String>),
}

/// A step in a job.
///
/// Steps can either `uses` an action or `run` a shell command.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    /// Step display name (shown in GitHub UI)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Conditional execution expression
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_condition: Option<String>,

    /// Action to use (e.g., "actions/checkout@v4")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,

    /// Shell command(s) to run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,

    /// Action inputs (for `uses` steps)
    #[serde(rename = "with", skip_serializing_if = "IndexMap::is_empty")]
    pub with_inputs: IndexMap<String, serde_yaml::Value>,

    /// Step environment variables
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
}

impl Step {
    /// Create a step that uses an action
    pub fn uses(action: impl Into<String>) -> Self {
        Self {
            uses: Some(action.into()),
            ..Default::default()
        }
    }

    /// Create a step that runs a shell command
    pub fn run(command: impl Into<String>) -> Self {
        Self {
            run: Some(command.into()),
            ..Default::default()
        }
    }

    /// Set the step name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a with input
    #[must_use]
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<serde_yaml::Value>) -> Self {
        self.with_inputs.insert(key.into(), value.into());
        self
    }

    /// Add an environment variable
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set a condition
    #[must_use]
    pub fn with_if(mut self, condition: impl Into<String>) -> Self {
        self.if_condition = Some(condition.into());
        self
    }
}
