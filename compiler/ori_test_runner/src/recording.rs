//! Recording from inside test bodies.
//!
//! These functions find the run through the ambient context. Each returns
//! `false`, after logging a warning, when called with no run to report to.

use std::sync::Arc;

use ori_test_ir::{Expectation, Issue, SourceContext, Test, TestError};

use crate::config::Configuration;
use crate::context::{self, Ambient};
use crate::event::{EventContext, EventKind};

fn with_current(what: &str, f: impl FnOnce(&Ambient)) -> bool {
    match context::current() {
        Some(ambient) => {
            f(&ambient);
            true
        }
        None => {
            tracing::warn!("{what} outside of any run was dropped");
            false
        }
    }
}

/// Record an issue with `comment` against the current test.
#[track_caller]
pub fn record_issue(comment: impl Into<String>) -> bool {
    let issue = Issue::unconditional(comment, SourceContext::capture());
    with_current("issue", |ambient| ambient.attribute(|test| ambient.run.record(test, issue)))
}

/// Record a caught error against the current test.
#[track_caller]
pub fn record_error(error: impl Into<TestError>) -> bool {
    let issue = Issue::error_caught(error.into(), SourceContext::capture());
    with_current("error", |ambient| ambient.attribute(|test| ambient.run.record(test, issue)))
}

/// Report one checked expectation.
///
/// This is the entry point for assertion helpers. The check itself is only
/// delivered when the configuration asks for expectation events; a failed
/// expectation is always recorded as an issue.
pub fn report_checked_expectation(passed: bool, source_context: SourceContext) -> bool {
    let expectation = Expectation {
        passed,
        source_context,
    };
    with_current("expectation", |ambient| {
        ambient.attribute(|test| {
            let context = test.map_or_else(EventContext::empty, EventContext::for_test);
            ambient.run.post(EventKind::ExpectationChecked(expectation.clone()), &context);
            if !passed {
                ambient.run.record(test, Issue::expectation_failed(expectation));
            }
        });
    })
}

/// The running test the calling code is working for.
///
/// From a thread with no inherited context this is the only running test,
/// and `None` while several run at once.
pub fn current_test() -> Option<Arc<Test>> {
    context::current().and_then(|ambient| ambient.attribute(|test| test.cloned()))
}

/// Configuration of the run the calling code belongs to.
pub fn current_configuration() -> Option<Configuration> {
    context::current().map(|ambient| ambient.run.configuration().clone())
}
