//! Workflow frontmatter types.
//!
//! These types describe the declarative part of a markdown workflow: which
//! repository events trigger it, the optional user-authored `if` condition,
//! and the privileged output jobs it may run.

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// Events that carry an issue, comment or pull request body a command can be mentioned in.
pub const COMMENT_EVENTS: [&str; 4] = [
    "issues",
    "issue_comment",
    "pull_request",
    "pull_request_review_comment",
];

/// Activity types that mark a labeling action.
pub const LABELING_ACTIONS: [&str; 2] = ["labeled", "unlabeled"];

/// Frontmatter of a workflow document.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Workflow display name (defaults to the file stem)
    #[serde(default)]
    pub name: Option<String>,

    /// Trigger configuration
    #[serde(default)]
    pub on: Triggers,

    /// User-authored gating condition for the agent job
    #[serde(default, rename = "if")]
    pub if_condition: Option<String>,

    /// Runner label(s) for generated jobs
    #[serde(default)]
    pub runs_on: Option<StringOrVec>,

    /// Permission overrides for the agent job (e.g. `contents: read`)
    #[serde(default)]
    pub permissions: IndexMap<String, String>,

    /// Privileged output jobs
    #[serde(default)]
    pub safe_outputs: SafeOutputsConfig,
}

impl WorkflowConfig {
    /// Parse and validate frontmatter YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] when the YAML does not match the schema and
    /// [`Error::Config`] when the combination of settings is unsupported.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        if let Some(command) = &self.on.command {
            if command.name.trim().trim_start_matches('/').is_empty() {
                return Err(Error::config(
                    "command trigger has an empty name",
                    "Set 'on.command.name' to the word users mention, e.g. 'deploy' for '/deploy'",
                ));
            }
            if !self.on.label_names().is_empty() {
                return Err(Error::config(
                    "label 'names' filters cannot be combined with a command trigger",
                    "Split the command-triggered and label-triggered automation into separate workflows",
                ));
            }
        }

        if self
            .if_condition
            .as_ref()
            .is_some_and(|c| c.trim().is_empty())
        {
            return Err(Error::config(
                "'if' is present but empty",
                "Remove the 'if' key or give it an expression",
            ));
        }

        Ok(())
    }

    /// Name of the command trigger, without a leading `/`.
    #[must_use]
    pub fn command_name(&self) -> Option<&str> {
        self.on
            .command
            .as_ref()
            .map(|c| c.name.trim().trim_start_matches('/'))
    }

    /// Whether the workflow reacts to events that carry no body to mention a command in.
    #[must_use]
    pub fn has_other_events(&self) -> bool {
        self.on.has_non_comment_events()
    }

    /// Label names that gate the workflow.
    #[must_use]
    pub fn label_names(&self) -> Vec<String> {
        self.on.label_names()
    }

    /// How far the declared triggers already restrict the workflow to labeling events.
    #[must_use]
    pub fn label_scope(&self) -> LabelScope {
        self.on.label_scope()
    }
}

/// Whether label gating is the whole story or must let other events through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelScope {
    /// Every declared trigger is a labeling action on an issue or pull request
    LabelEventsOnly,
    /// Triggers mix labeling actions with other events or activity types
    Mixed,
}

/// Workflow trigger configuration.
///
/// Accepts the same shapes as GitHub's `on:` key: a single event name, a list
/// of event names, or a map of event name to settings. `command` is an extra
/// pseudo-event that expands to the comment-bearing events.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "OnConfig")]
pub struct Triggers {
    /// Command mention trigger (`/name`)
    pub command: Option<CommandTrigger>,
    /// `issues` event
    pub issues: Option<ActivityTrigger>,
    /// `issue_comment` event
    pub issue_comment: Option<ActivityTrigger>,
    /// `pull_request` event
    pub pull_request: Option<ActivityTrigger>,
    /// `pull_request_review_comment` event
    pub pull_request_review_comment: Option<ActivityTrigger>,
    /// `push` event
    pub push: Option<PushTrigger>,
    /// Cron schedules
    pub schedule: Vec<ScheduleTrigger>,
    /// Manual `workflow_dispatch` trigger
    pub workflow_dispatch: bool,
}

impl Triggers {
    /// Whether any trigger besides the command and the comment-bearing events is declared.
    #[must_use]
    pub fn has_non_comment_events(&self) -> bool {
        self.push.is_some() || !self.schedule.is_empty() || self.workflow_dispatch
    }

    /// Union of the `names` label filters on `issues` and `pull_request`, in declaration order.
    #[must_use]
    pub fn label_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for trigger in [&self.issues, &self.pull_request].into_iter().flatten() {
            for name in &trigger.names {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Classify the declared triggers for label gating.
    #[must_use]
    pub fn label_scope(&self) -> LabelScope {
        if self.command.is_some()
            || self.issue_comment.is_some()
            || self.pull_request_review_comment.is_some()
            || self.has_non_comment_events()
        {
            return LabelScope::Mixed;
        }

        let label_triggers: Vec<&ActivityTrigger> =
            [&self.issues, &self.pull_request].into_iter().flatten().collect();

        let labeling_only = !label_triggers.is_empty()
            && label_triggers.iter().all(|t| {
                !t.types.is_empty()
                    && t.types
                        .iter()
                        .all(|ty| LABELING_ACTIONS.contains(&ty.as_str()))
            });

        if labeling_only {
            LabelScope::LabelEventsOnly
        } else {
            LabelScope::Mixed
        }
    }

    fn insert(&mut self, event: &str, value: serde_yaml::Value) -> std::result::Result<(), String> {
        let invalid = |e: serde_yaml::Error| format!("invalid '{event}' trigger: {e}");
        match event {
            "command" => {
                let spec: CommandSpec = serde_yaml::from_value(value).map_err(invalid)?;
                self.command = Some(spec.into());
            }
            "issues" => self.issues = Some(activity(value).map_err(invalid)?),
            "issue_comment" => self.issue_comment = Some(activity(value).map_err(invalid)?),
            "pull_request" => self.pull_request = Some(activity(value).map_err(invalid)?),
            "pull_request_review_comment" => {
                self.pull_request_review_comment = Some(activity(value).map_err(invalid)?);
            }
            "push" => {
                self.push = Some(if value.is_null() {
                    PushTrigger::default()
                } else {
                    serde_yaml::from_value(value).map_err(invalid)?
                });
            }
            "schedule" => {
                self.schedule = serde_yaml::from_value(value).map_err(invalid)?;
            }
            "workflow_dispatch" => self.workflow_dispatch = true,
            other => {
                return Err(format!(
                    "unknown event '{other}' (supported: command, issues, issue_comment, pull_request, pull_request_review_comment, push, schedule, workflow_dispatch)"
                ));
            }
        }
        Ok(())
    }
}

fn activity(value: serde_yaml::Value) -> std::result::Result<ActivityTrigger, serde_yaml::Error> {
    if value.is_null() {
        Ok(ActivityTrigger::default())
    } else {
        serde_yaml::from_value(value)
    }
}

/// Raw shapes accepted for `on:`.
#[derive(Deserialize)]
#[serde(untagged)]
enum OnConfig {
    Event(String),
    Events(Vec<String>),
    Map(IndexMap<String, serde_yaml::Value>),
}

impl TryFrom<OnConfig> for Triggers {
    type Error = String;

    fn try_from(raw: OnConfig) -> std::result::Result<Self, Self::Error> {
        let entries: Vec<(String, serde_yaml::Value)> = match raw {
            OnConfig::Event(event) => vec![(event, serde_yaml::Value::Null)],
            OnConfig::Events(events) => events
                .into_iter()
                .map(|e| (e, serde_yaml::Value::Null))
                .collect(),
            OnConfig::Map(map) => map.into_iter().collect(),
        };

        let mut triggers = Self::default();
        for (event, value) in entries {
            if event == "command" && value.is_null() {
                return Err("'command' trigger needs a name".to_string());
            }
            triggers.insert(&event, value)?;
        }
        Ok(triggers)
    }
}

/// Command mention trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTrigger {
    /// Command word, mentioned as `/name`
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CommandSpec {
    Name(String),
    Detailed { name: String },
}

impl From<CommandSpec> for CommandTrigger {
    fn from(spec: CommandSpec) -> Self {
        match spec {
            CommandSpec::Name(name) | CommandSpec::Detailed { name } => Self { name },
        }
    }
}

/// Settings for an issue, comment or pull request event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityTrigger {
    /// Activity types (e.g. "opened", "labeled")
    #[serde(default)]
    pub types: Vec<String>,

    /// Label names that must match for labeling actions
    #[serde(default)]
    pub names: Vec<String>,

    /// Target branch patterns (pull requests only)
    #[serde(default)]
    pub branches: Vec<String>,
}

/// Push event settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushTrigger {
    /// Branch patterns
    #[serde(default)]
    pub branches: Vec<String>,

    /// Tag patterns
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Cron schedule entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleTrigger {
    /// Cron expression
    pub cron: String,
}

/// Runner label(s).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StringOrVec {
    /// Single value
    String(String),
    /// Multiple values
    Vec(Vec<String>),
}

impl StringOrVec {
    /// Convert to a vector of strings
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::String(s) => vec![s.clone()],
            Self::Vec(v) => v.clone(),
        }
    }
}

/// Privileged output jobs a workflow may run after the agent job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SafeOutputsConfig {
    /// Post a comment on the triggering issue or pull request
    #[serde(default, deserialize_with = "present_or_default")]
    pub add_comment: Option<TargetedOutput>,

    /// Update the title, body or state of an issue
    #[serde(default, deserialize_with = "present_or_default")]
    pub update_issue: Option<TargetedOutput>,

    /// Add labels to the triggering issue or pull request
    #[serde(default, deserialize_with = "present_or_default")]
    pub add_labels: Option<AddLabelsOutput>,

    /// Push commits to the triggering pull request's branch
    #[serde(default, deserialize_with = "present_or_default")]
    pub push_to_pr_branch: Option<PushToPrBranchOutput>,

    /// Open a new issue
    #[serde(default, deserialize_with = "present_or_default")]
    pub create_issue: Option<CreateIssueOutput>,
}

impl SafeOutputsConfig {
    /// Whether no output job is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add_comment.is_none()
            && self.update_issue.is_none()
            && self.add_labels.is_none()
            && self.push_to_pr_branch.is_none()
            && self.create_issue.is_none()
    }
}

/// A key written as `add-comment:` with no value still enables the output.
fn present_or_default<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?.unwrap_or_default()))
}

/// Output job that acts on a single issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetedOutput {
    /// Which issue or pull request to act on
    #[serde(default)]
    pub target: OutputTarget,
}

/// Label output settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddLabelsOutput {
    /// Labels the agent may add (empty means any)
    #[serde(default)]
    pub allowed: Vec<String>,

    /// Maximum number of labels per run
    #[serde(default)]
    pub max: Option<u32>,
}

/// Branch push output settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushToPrBranchOutput {}

/// Issue creation output settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CreateIssueOutput {
    /// Prefix prepended to every created issue title
    #[serde(default)]
    pub title_prefix: Option<String>,

    /// Labels applied to created issues
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Target of a targeted output job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "RawTarget")]
pub enum OutputTarget {
    /// The issue or pull request that triggered the run
    #[default]
    Triggering,
    /// Any issue, chosen by the agent at run time (`"*"`)
    Any,
    /// A fixed issue number
    Number(u64),
}

impl OutputTarget {
    /// Whether the target is independent of the triggering event.
    #[must_use]
    pub const fn is_explicit(self) -> bool {
        !matches!(self, Self::Triggering)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Number(u64),
    Text(String),
}

impl TryFrom<RawTarget> for OutputTarget {
    type Error = String;

    fn try_from(raw: RawTarget) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawTarget::Number(0) => Err("target issue number must be positive".to_string()),
            RawTarget::Number(n) => Ok(Self::Number(n)),
            RawTarget::Text(text) => match text.trim() {
                "triggering" => Ok(Self::Triggering),
                "*" => Ok(Self::Any),
                other => other
                    .parse::<u64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .map(Self::Number)
                    .ok_or_else(|| {
                        format!(
                            "invalid target '{other}': expected 'triggering', '*', or an issue number"
                        )
                    }),
            },
        }
    }
}
