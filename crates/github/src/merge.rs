//! Folding of independent gating policies into one job condition.

use crate::expression::{Expr, ExprError, RawExpression};

/// Merge an existing condition with a new one.
///
/// A blank side means "unconditional" and yields the other side unchanged,
/// once that side has been checked. Otherwise both sides are parenthesised
/// and joined with `&&`, preserving their order.
///
/// # Errors
///
/// Returns [`ExprError::UnbalancedRawExpression`] or
/// [`ExprError::EmbeddedDelimiters`] when either side is malformed.
pub fn merge(existing: &str, new: &str) -> Result<String, ExprError> {
    if existing.trim().is_empty() {
        return identity(new);
    }
    if new.trim().is_empty() {
        return identity(existing);
    }

    let existing = Expr::Raw(RawExpression::new(existing)?);
    let new = Expr::Raw(RawExpression::new(new)?);
    Ok(existing.and_atoms(&new).render())
}

fn identity(text: &str) -> Result<String, ExprError> {
    if !text.trim().is_empty() {
        RawExpression::new(text)?;
    }
    Ok(text.to_string())
}

/// A job's gating condition under construction.
///
/// Starts unconditional; each policy contributes once, in a fixed order, and
/// the result is finalised into the job's `if:`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatingCondition {
    expr: Option<Expr>,
}

impl GatingCondition {
    /// An unconditional gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// AND a policy onto the gate.
    #[must_use]
    pub fn and(self, next: Expr) -> Self {
        let expr = match self.expr {
            None => next,
            Some(existing) => existing.and_atoms(&next),
        };
        Self { expr: Some(expr) }
    }

    /// AND an optional policy onto the gate.
    #[must_use]
    pub fn and_opt(self, next: Option<Expr>) -> Self {
        match next {
            Some(next) => self.and(next),
            None => self,
        }
    }

    /// AND pre-rendered text onto the gate. Blank text leaves the gate unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::UnbalancedRawExpression`] for malformed text.
    pub fn and_raw(self, text: &str) -> Result<Self, ExprError> {
        if text.trim().is_empty() {
            return Ok(self);
        }
        Ok(self.and(Expr::Raw(RawExpression::new(text)?)))
    }

    /// Whether no policy has contributed.
    #[must_use]
    pub fn is_unconditional(&self) -> bool {
        self.expr.is_none()
    }

    /// The rendered condition, or an empty string when unconditional.
    #[must_use]
    pub fn render(&self) -> String {
        self.expr.as_ref().map(Expr::render).unwrap_or_default()
    }

    /// Finish the gate: `None` means the job runs unconditionally.
    #[must_use]
    pub fn finalize(self) -> Option<String> {
        self.expr.map(|expr| expr.render())
    }
}
