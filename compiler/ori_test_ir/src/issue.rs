//! Recorded failures.

use std::fmt;
use std::sync::Arc;

use crate::{SourceContext, TestError};

/// A caught error, shareable so issues stay cheap to clone into events.
#[derive(Clone)]
pub struct CaughtError(Arc<dyn std::error::Error + Send + Sync>);

impl CaughtError {
    pub fn new(error: TestError) -> Self {
        CaughtError(Arc::from(error))
    }

    pub fn error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.0
    }
}

impl fmt::Debug for CaughtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CaughtError({:?})", self.0)
    }
}

impl fmt::Display for CaughtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The outcome of one checked expectation, as reported by the assertion
/// layer.
#[derive(Clone, Debug)]
pub struct Expectation {
    pub passed: bool,
    pub source_context: SourceContext,
}

/// What went wrong.
#[derive(Clone, Debug)]
pub enum IssueKind {
    /// An error returned or a panic raised by a body or a condition predicate.
    ErrorCaught(CaughtError),
    /// A checked expectation that did not hold.
    ExpectationFailed(Expectation),
    /// Recorded explicitly from a test body.
    Unconditional,
}

/// One recorded failure.
#[derive(Clone, Debug)]
pub struct Issue {
    pub kind: IssueKind,
    pub comment: Option<String>,
    pub source_context: SourceContext,
}

impl Issue {
    #[cold]
    pub fn error_caught(error: TestError, source_context: SourceContext) -> Self {
        Issue {
            kind: IssueKind::ErrorCaught(CaughtError::new(error)),
            comment: None,
            source_context,
        }
    }

    #[cold]
    pub fn expectation_failed(expectation: Expectation) -> Self {
        let source_context = expectation.source_context.clone();
        Issue {
            kind: IssueKind::ExpectationFailed(expectation),
            comment: None,
            source_context,
        }
    }

    #[cold]
    pub fn unconditional(comment: impl Into<String>, source_context: SourceContext) -> Self {
        Issue {
            kind: IssueKind::Unconditional,
            comment: Some(comment.into()),
            source_context,
        }
    }

    pub fn is_error_caught(&self) -> bool {
        matches!(self.kind, IssueKind::ErrorCaught(_))
    }

    pub fn caught_error(&self) -> Option<&CaughtError> {
        match &self.kind {
            IssueKind::ErrorCaught(error) => Some(error),
            IssueKind::ExpectationFailed(_) | IssueKind::Unconditional => None,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::ErrorCaught(error) => write!(f, "caught error: {error}")?,
            IssueKind::ExpectationFailed(_) => f.write_str("expectation failed")?,
            IssueKind::Unconditional => f.write_str("issue recorded")?,
        }
        if let Some(comment) = &self.comment {
            write!(f, " ({comment})")?;
        }
        if let Some(location) = &self.source_context.location {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}
