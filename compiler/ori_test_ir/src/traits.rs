//! Traits attached to tests and suites.
//!
//! A trait is an annotation on a test or suite. Condition traits decide
//! whether the test is eligible to run; the other variants carry metadata
//! and are always eligible. Every variant answers [`Trait::evaluate`], so
//! the evaluator walks trait lists without knowing which kinds exist.
//!
//! # Condition phrasings
//!
//! | constructor                  | disables when          |
//! |------------------------------|------------------------|
//! | `enabled_if(cond)`           | `cond` is false        |
//! | `disabled_if(cond)`          | `cond` is true         |
//! | `enabled_when(predicate)`    | predicate returns false|
//! | `disabled_when(predicate)`   | predicate returns true |
//! | `disabled()`                 | always                 |

use std::fmt;
use std::sync::Arc;

use crate::{SkipInfo, SourceLocation, TestError};

/// Deferred condition, invoked once while building a plan.
///
/// Returns `Ok(true)` when the test may run.
pub type Predicate = Arc<dyn Fn() -> Result<bool, TestError> + Send + Sync>;

/// How a condition resolves.
#[derive(Clone)]
pub enum ConditionKind {
    /// Fixed outcome; reading it never runs user code.
    Constant(bool),
    /// Evaluated at plan-build time.
    Dynamic(Predicate),
}

impl fmt::Debug for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionKind::Constant(enabled) => f.debug_tuple("Constant").field(enabled).finish(),
            ConditionKind::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Eligibility condition with an optional comment.
#[derive(Clone, Debug)]
pub struct ConditionTrait {
    kind: ConditionKind,
    comment: Option<String>,
    source_location: SourceLocation,
}

impl ConditionTrait {
    #[track_caller]
    fn from_kind(kind: ConditionKind) -> Self {
        ConditionTrait {
            kind,
            comment: None,
            source_location: SourceLocation::caller(),
        }
    }

    /// Enabled only if `condition` holds.
    #[track_caller]
    pub fn enabled_if(condition: bool) -> Self {
        ConditionTrait::from_kind(ConditionKind::Constant(condition))
    }

    /// Disabled if `condition` holds.
    #[track_caller]
    pub fn disabled_if(condition: bool) -> Self {
        ConditionTrait::from_kind(ConditionKind::Constant(!condition))
    }

    /// Unconditionally disabled.
    #[track_caller]
    pub fn disabled() -> Self {
        ConditionTrait::from_kind(ConditionKind::Constant(false))
    }

    /// Enabled only if `predicate` returns `Ok(true)` at plan-build time.
    #[track_caller]
    pub fn enabled_when<F>(predicate: F) -> Self
    where
        F: Fn() -> Result<bool, TestError> + Send + Sync + 'static,
    {
        ConditionTrait::from_kind(ConditionKind::Dynamic(Arc::new(predicate)))
    }

    /// Disabled if `predicate` returns `Ok(true)` at plan-build time.
    #[track_caller]
    pub fn disabled_when<F>(predicate: F) -> Self
    where
        F: Fn() -> Result<bool, TestError> + Send + Sync + 'static,
    {
        ConditionTrait::from_kind(ConditionKind::Dynamic(Arc::new(move || {
            predicate().map(|disabled| !disabled)
        })))
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Override the captured declaration site.
    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.source_location = location;
        self
    }

    pub fn kind(&self) -> &ConditionKind {
        &self.kind
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn source_location(&self) -> SourceLocation {
        self.source_location
    }

    /// True iff the outcome is fixed and evaluating it invokes nothing.
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, ConditionKind::Constant(_))
    }

    /// Whether the condition allows the test to run.
    ///
    /// Dynamic conditions invoke their predicate on every call.
    pub fn is_enabled(&self) -> Result<bool, TestError> {
        match &self.kind {
            ConditionKind::Constant(enabled) => Ok(*enabled),
            ConditionKind::Dynamic(predicate) => predicate(),
        }
    }
}

/// Result of evaluating one trait.
#[derive(Clone, Debug)]
pub enum Eligibility {
    Enabled,
    Disabled(SkipInfo),
}

impl Eligibility {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Eligibility::Enabled)
    }
}

/// Annotation attached to a test or suite.
#[derive(Clone, Debug)]
pub enum Trait {
    Condition(ConditionTrait),
    /// Free-form comment shown by reporters.
    Comment(String),
    /// Label used by external tooling to group tests.
    Tag(String),
}

impl Trait {
    pub fn as_condition(&self) -> Option<&ConditionTrait> {
        match self {
            Trait::Condition(condition) => Some(condition),
            Trait::Comment(_) | Trait::Tag(_) => None,
        }
    }

    /// True if evaluating this trait can never run user code.
    pub fn is_constant(&self) -> bool {
        self.as_condition().map_or(true, ConditionTrait::is_constant)
    }

    /// Decide whether this trait lets the test run.
    pub fn evaluate(&self) -> Result<Eligibility, TestError> {
        match self {
            Trait::Condition(condition) => {
                if condition.is_enabled()? {
                    Ok(Eligibility::Enabled)
                } else {
                    Ok(Eligibility::Disabled(SkipInfo::at(
                        condition.comment.clone(),
                        condition.source_location,
                    )))
                }
            }
            Trait::Comment(_) | Trait::Tag(_) => Ok(Eligibility::Enabled),
        }
    }
}

impl From<ConditionTrait> for Trait {
    fn from(condition: ConditionTrait) -> Self {
        Trait::Condition(condition)
    }
}

#[cfg(test)]
mod tests;
