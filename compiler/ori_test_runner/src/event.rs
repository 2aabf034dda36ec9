//! Lifecycle and diagnostic events.

use std::sync::Arc;
use std::time::Instant;

use ori_test_ir::{Expectation, Issue, SkipInfo, Test, TestId};

use crate::plan::Step;

/// What happened.
#[derive(Clone, Debug)]
pub enum EventKind {
    PlanStarted { step_count: usize },
    PlanStepStarted(Step),
    TestStarted,
    TestSkipped(SkipInfo),
    IssueRecorded(Issue),
    ExpectationChecked(Expectation),
    TestEnded,
    PlanStepEnded(Step),
    PlanEnded,
}

impl EventKind {
    /// Stable lowercase name, handy for logs and assertions.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::PlanStarted { .. } => "planStarted",
            EventKind::PlanStepStarted(_) => "planStepStarted",
            EventKind::TestStarted => "testStarted",
            EventKind::TestSkipped(_) => "testSkipped",
            EventKind::IssueRecorded(_) => "issueRecorded",
            EventKind::ExpectationChecked(_) => "expectationChecked",
            EventKind::TestEnded => "testEnded",
            EventKind::PlanStepEnded(_) => "planStepEnded",
            EventKind::PlanEnded => "planEnded",
        }
    }
}

/// An event stamped with the instant it was posted.
#[derive(Clone, Debug)]
pub struct Event {
    pub kind: EventKind,
    pub instant: Instant,
}

impl Event {
    pub fn now(kind: EventKind) -> Self {
        Event {
            kind,
            instant: Instant::now(),
        }
    }
}

/// The test an event is about. Empty for plan-level events.
#[derive(Clone, Debug, Default)]
pub struct EventContext {
    pub test: Option<Arc<Test>>,
}

impl EventContext {
    pub fn empty() -> Self {
        EventContext::default()
    }

    pub fn for_test(test: &Arc<Test>) -> Self {
        EventContext {
            test: Some(Arc::clone(test)),
        }
    }

    pub fn test_id(&self) -> Option<&TestId> {
        self.test.as_deref().map(Test::id)
    }

    /// Ids of the enclosing scopes, outermost first.
    pub fn ancestry(&self) -> Vec<TestId> {
        self.test_id()
            .map(|id| id.ancestors().collect())
            .unwrap_or_default()
    }
}
