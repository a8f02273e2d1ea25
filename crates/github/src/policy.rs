//! Gating policies for generated jobs.
//!
//! Each policy encodes one rule about when a privileged job may run and
//! returns an [`Expr`]. Policies are combined per job with
//! [`GatingCondition`](crate::merge::GatingCondition).

use crate::expression::{
    COMMENT_BODY, Expr, ExprError, ISSUE_BODY, PULL_REQUEST_BODY, RawExpression, action_equals,
    all_of, any_of, contains, event_type_equals, known_property, label_contains, literal, not,
    property,
};
use flowgate_core::LabelScope;
use flowgate_core::config::{COMMENT_EVENTS, LABELING_ACTIONS};

/// Base condition of an output job whose target does not depend on the triggering event.
pub const ALWAYS: &str = "always()";

/// Events whose payload carries a label on an issue or pull request.
const LABEL_EVENTS: [&str; 2] = ["issues", "pull_request"];

/// True when `/name` is mentioned in the issue, comment or pull request body.
///
/// A triggering event fills exactly one of those bodies, so all three are checked.
///
/// # Errors
///
/// Returns [`ExprError::EmptyCommand`] when `name` is blank or only `/`.
pub fn command_only(name: &str) -> Result<Expr, ExprError> {
    let token = command_token(name)?;
    any_of(
        [ISSUE_BODY, COMMENT_BODY, PULL_REQUEST_BODY]
            .into_iter()
            .map(|body| contains(known_property(body), literal(token.as_str())))
            .collect(),
    )
}

/// True when the event is one of the comment-bearing events.
///
/// # Errors
///
/// Never fails in practice; the event list is fixed and non-empty.
pub fn comment_events() -> Result<Expr, ExprError> {
    any_of(COMMENT_EVENTS.into_iter().map(event_type_equals).collect())
}

/// Command gate that lets non-comment events through when the workflow has any.
///
/// With `has_other_events` false this is [`command_only`]. Otherwise:
/// `(commentEvents && commandOnly) || !(commentEvents)`.
///
/// # Errors
///
/// Returns [`ExprError::EmptyCommand`] when `name` is blank.
pub fn event_aware_command(name: &str, has_other_events: bool) -> Result<Expr, ExprError> {
    let command = command_only(name)?;
    if !has_other_events {
        return Ok(command);
    }

    let comment_events = comment_events()?;
    any_of(vec![
        all_of(vec![comment_events.clone(), command])?,
        not(comment_events),
    ])
}

/// True when the event's label name matches one of `names`.
///
/// This is the complete gate only when the declared triggers are labeling
/// actions exclusively. Use [`label_gate`] to pick the right form.
///
/// # Errors
///
/// Returns [`ExprError::EmptyLabels`] when `names` is empty or contains a blank name.
pub fn label_names_match<S: AsRef<str>>(names: &[S]) -> Result<Expr, ExprError> {
    if names.iter().any(|n| n.as_ref().trim().is_empty()) {
        return Err(ExprError::EmptyLabels);
    }
    any_of(names.iter().map(|n| label_contains(n.as_ref())).collect())
        .map_err(|_| ExprError::EmptyLabels)
}

/// Label gate for the given trigger scope.
///
/// For [`LabelScope::Mixed`] the label filter only applies when both the
/// event and the action are label related; everything else passes:
/// `!(isLabelEvent) || !(isLabelingAction) || (isLabelEvent && isLabelingAction && names)`.
///
/// # Errors
///
/// Returns [`ExprError::EmptyLabels`] when `names` is empty or contains a blank name.
pub fn label_gate<S: AsRef<str>>(names: &[S], scope: LabelScope) -> Result<Expr, ExprError> {
    let names_match = label_names_match(names)?;
    if scope == LabelScope::LabelEventsOnly {
        return Ok(names_match);
    }

    let is_label_event = any_of(LABEL_EVENTS.into_iter().map(event_type_equals).collect())?;
    let is_labeling_action = any_of(LABELING_ACTIONS.into_iter().map(action_equals).collect())?;

    any_of(vec![
        not(is_label_event.clone()),
        not(is_labeling_action.clone()),
        all_of(vec![is_label_event, is_labeling_action, names_match])?,
    ])
}

/// True when at least one of the context paths is set for the triggering event.
///
/// Used as the base condition of output jobs that need e.g. an issue number.
///
/// # Errors
///
/// Returns [`ExprError::EmptyTerms`] for no paths and
/// [`ExprError::InvalidPropertyPath`] for a malformed one.
pub fn context_available(paths: &[&str]) -> Result<Expr, ExprError> {
    let terms = paths
        .iter()
        .map(|path| property(*path))
        .collect::<Result<Vec<_>, _>>()?;
    any_of(terms)
}

/// Combine an optional command gate with an output job's base condition.
///
/// - no command: the base condition alone
/// - base is [`ALWAYS`]: the rendered command gate alone
/// - otherwise: `(<command>) && (<base>)`
///
/// # Errors
///
/// Returns the [`RawExpression::new`] errors for an empty or unbalanced base.
pub fn compose_command_and_base(command: Option<&Expr>, base: &str) -> Result<String, ExprError> {
    let base = RawExpression::new(base)?;
    let Some(command) = command else {
        return Ok(base.as_str().to_string());
    };

    if base.as_str() == ALWAYS {
        return Ok(command.render());
    }

    Ok(command.and_atoms(&Expr::Raw(base)).render())
}

/// `/name` for a configured command, tolerating a leading slash.
fn command_token(name: &str) -> Result<String, ExprError> {
    let name = name.trim().trim_start_matches('/');
    if name.is_empty() {
        return Err(ExprError::EmptyCommand);
    }
    Ok(format!("/{name}"))
}
