//! Why a test did not run.

use crate::{SourceContext, SourceLocation};

/// Reason and attribution recorded when a step resolves to "skip".
#[derive(Clone, Debug, Default)]
pub struct SkipInfo {
    /// Human-readable reason, usually the disabling trait's comment.
    pub comment: Option<String>,
    pub source_context: SourceContext,
}

impl SkipInfo {
    pub fn new(comment: Option<String>, source_context: SourceContext) -> Self {
        SkipInfo {
            comment,
            source_context,
        }
    }

    /// Skip attributed to the trait declared at `location`.
    pub fn at(comment: Option<String>, location: SourceLocation) -> Self {
        SkipInfo::new(comment, SourceContext::at(location))
    }
}
