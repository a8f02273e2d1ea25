//! GitHub Actions expression trees.
//!
//! Gating conditions are assembled as [`Expr`] trees and lowered to the
//! `${{ }}` expression syntax by the renderer. Trees are only ever built and
//! rendered here; evaluation happens on the GitHub runner.
//!
//! ```
//! use flowgate_github::expression::{any_of, event_type_equals};
//!
//! let expr = any_of(vec![event_type_equals("issues"), event_type_equals("push")])?;
//! assert_eq!(
//!     expr.render(),
//!     "github.event_name == 'issues' || github.event_name == 'push'"
//! );
//! # Ok::<(), flowgate_github::expression::ExprError>(())
//! ```

mod builders;
mod render;

pub use builders::{
    action_equals, all_of, any_of, contains, equals, event_type_equals, label_contains, literal,
    not, property, raw,
};
pub(crate) use builders::known_property;

use miette::Diagnostic;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Context path of the triggering event's name.
pub const EVENT_NAME: &str = "github.event_name";
/// Context path of the triggering event's activity type.
pub const EVENT_ACTION: &str = "github.event.action";
/// Context path of the label added or removed by a labeling action.
pub const LABEL_NAME: &str = "github.event.label.name";
/// Context path of the issue body.
pub const ISSUE_BODY: &str = "github.event.issue.body";
/// Context path of the comment body.
pub const COMMENT_BODY: &str = "github.event.comment.body";
/// Context path of the pull request body.
pub const PULL_REQUEST_BODY: &str = "github.event.pull_request.body";

/// Errors raised while constructing an expression.
///
/// These are caller errors. A gate that cannot be built must abort
/// compilation rather than degrade to an always-true or always-false guard.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// A conjunction or disjunction was given no terms
    #[error("Cannot build an empty {operator} expression")]
    #[diagnostic(
        code(flowgate::expression::empty_terms),
        help("Callers must supply at least one term; there is no implicit true or false")
    )]
    EmptyTerms {
        /// `"and"` or `"or"`
        operator: &'static str,
    },

    /// A context path is empty or not dot-separated identifiers
    #[error("Invalid context path '{path}'")]
    #[diagnostic(
        code(flowgate::expression::invalid_path),
        help("Use dot-separated identifiers such as 'github.event.issue.body'")
    )]
    InvalidPropertyPath {
        /// The rejected path
        path: String,
    },

    /// A raw expression is empty after trimming and unwrapping `${{ }}`
    #[error("Raw expression is empty")]
    #[diagnostic(code(flowgate::expression::empty_raw))]
    EmptyRawExpression,

    /// A raw expression has unbalanced parentheses or an unterminated string
    #[error("Raw expression '{text}' is not balanced")]
    #[diagnostic(
        code(flowgate::expression::unbalanced_raw),
        help("Check parentheses and single-quoted strings")
    )]
    UnbalancedRawExpression {
        /// The rejected text
        text: String,
    },

    /// A raw expression still contains `${{` or `}}` after unwrapping
    #[error("Raw expression '{text}' contains embedded '${{{{' or '}}}}' delimiters")]
    #[diagnostic(
        code(flowgate::expression::embedded_delimiters),
        help("Wrap the whole condition in one expression block, or omit the wrapper")
    )]
    EmbeddedDelimiters {
        /// The rejected text
        text: String,
    },

    /// A command gate was requested for an empty command name
    #[error("Command name is empty")]
    #[diagnostic(code(flowgate::expression::empty_command))]
    EmptyCommand,

    /// A label gate was requested without any label names, or with a blank one
    #[error("Label gate needs at least one non-empty label name")]
    #[diagnostic(code(flowgate::expression::empty_labels))]
    EmptyLabels,
}

/// An immutable GitHub Actions expression tree.
///
/// Two structurally equal trees render identically and are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// A quoted string constant
    Literal(String),
    /// A dotted context path such as `github.event.issue.body`
    Property(PropertyPath),
    /// `left == right`
    Equality {
        /// Left operand
        left: Box<Self>,
        /// Right operand
        right: Box<Self>,
    },
    /// `contains(haystack, needle)`
    Contains {
        /// String or array searched
        haystack: Box<Self>,
        /// Value searched for
        needle: Box<Self>,
    },
    /// `!(child)`
    Negation(Box<Self>),
    /// AND of all terms, left to right
    Conjunction(Terms),
    /// OR of all terms, left to right
    Disjunction(Terms),
    /// An already-rendered expression treated as an opaque atom
    Raw(RawExpression),
}

impl Expr {
    /// Lower the tree to GitHub Actions expression syntax.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// `(self) && (other)`, with both sides rendered as opaque atoms.
    #[must_use]
    pub fn and_atoms(&self, other: &Self) -> Self {
        Self::Conjunction(Terms(vec![
            Self::Raw(RawExpression::of(self)),
            Self::Raw(RawExpression::of(other)),
        ]))
    }
}

/// A non-empty, ordered list of terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Terms(Vec<Expr>);

impl Terms {
    fn new(terms: Vec<Expr>, operator: &'static str) -> Result<Self, ExprError> {
        if terms.is_empty() {
            return Err(ExprError::EmptyTerms { operator });
        }
        Ok(Self(terms))
    }

    /// Borrow the terms in order.
    #[must_use]
    pub fn as_slice(&self) -> &[Expr] {
        &self.0
    }
}

#[allow(clippy::expect_used)]
static PROPERTY_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*(\.([A-Za-z_][A-Za-z0-9_-]*|\*))*$")
        .expect("static context path pattern")
});

/// A validated context path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath(String);

impl PropertyPath {
    /// Validate a dotted context path.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::InvalidPropertyPath`] for empty paths, empty
    /// segments, or characters outside identifiers and `*` filters.
    pub fn new(path: impl Into<String>) -> Result<Self, ExprError> {
        let path = path.into();
        if PROPERTY_PATH.is_match(&path) {
            Ok(Self(path))
        } else {
            Err(ExprError::InvalidPropertyPath { path })
        }
    }

    /// The path as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A pre-rendered expression, normalised and checked for balance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawExpression(String);

impl RawExpression {
    /// Normalise user or caller supplied expression text.
    ///
    /// Surrounding whitespace and an optional `${{ ... }}` wrapper are removed.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::EmptyRawExpression`] when nothing remains and
    /// [`ExprError::UnbalancedRawExpression`] when parentheses or quotes do not pair up.
    /// Text that still holds `${{` or `}}` outside a string after unwrapping is
    /// [`ExprError::EmbeddedDelimiters`].
    pub fn new(text: &str) -> Result<Self, ExprError> {
        let mut text = text.trim();
        if let Some(inner) = text
            .strip_prefix("${{")
            .and_then(|rest| rest.strip_suffix("}}"))
        {
            text = inner.trim();
        }
        if text.is_empty() {
            return Err(ExprError::EmptyRawExpression);
        }
        if has_delimiters(text) {
            return Err(ExprError::EmbeddedDelimiters {
                text: text.to_string(),
            });
        }
        if !is_balanced(text) {
            return Err(ExprError::UnbalancedRawExpression {
                text: text.to_string(),
            });
        }
        Ok(Self(text.to_string()))
    }

    /// Freeze an expression tree as an opaque atom.
    #[must_use]
    pub fn of(expr: &Expr) -> Self {
        match expr {
            Expr::Raw(raw) => raw.clone(),
            other => Self(other.render()),
        }
    }

    /// The normalised text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether `${{` or `}}` appears outside single-quoted strings.
fn has_delimiters(text: &str) -> bool {
    let mut in_string = false;
    for (i, c) in text.char_indices() {
        if c == '\'' {
            in_string = !in_string;
        } else if !in_string && (text[i..].starts_with("${{") || text[i..].starts_with("}}")) {
            return true;
        }
    }
    false
}

/// Parentheses outside single-quoted strings must pair up, and strings must close.
///
/// An escaped quote (`''`) toggles the string state twice, so it needs no special case.
fn is_balanced(text: &str) -> bool {
    let mut depth: usize = 0;
    let mut in_string = false;
    for c in text.chars() {
        match c {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0 && !in_string
}
