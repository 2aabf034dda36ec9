//! Run configuration and test selection.

use std::num::NonZeroUsize;

use ori_test_ir::{Test, TestCatalog, TestId};
use rustc_hash::FxHashSet;

use crate::bus::EventHandler;
use crate::plan::Plan;

/// Which tests a plan should contain.
///
/// With no explicit ids every test is covered. Naming a suite covers all of
/// its descendants. Hidden tests are excluded unless `include_hidden` is
/// set, even when named explicitly.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    ids: Option<FxHashSet<TestId>>,
    pub include_hidden: bool,
}

impl Selection {
    /// Every non-hidden test.
    pub fn all() -> Self {
        Selection::default()
    }

    /// Exactly the named tests and suites (and the suites' descendants).
    pub fn of<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TestId>,
    {
        Selection {
            ids: Some(ids.into_iter().map(Into::into).collect()),
            include_hidden: false,
        }
    }

    /// Selection reproducing the tests of `plan`.
    pub fn from_plan(plan: &Plan) -> Self {
        Selection::of(plan.test_ids().cloned()).including_hidden(plan.includes_hidden())
    }

    #[must_use]
    pub fn including_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Explicitly named ids, or `None` when selecting everything.
    pub fn ids(&self) -> Option<&FxHashSet<TestId>> {
        self.ids.as_ref()
    }

    /// True if `id` itself is named.
    pub fn names(&self, id: &TestId) -> bool {
        self.ids.as_ref().is_some_and(|ids| ids.contains(id))
    }

    /// True if `id` is named or nested under a named suite.
    pub fn covers(&self, id: &TestId) -> bool {
        match &self.ids {
            None => true,
            Some(ids) => ids.contains(id) || id.ancestors().any(|a| ids.contains(&a)),
        }
    }

    /// Coverage plus the hidden-test rule, for a catalogued test.
    pub fn selects(&self, catalog: &TestCatalog, test: &Test) -> bool {
        if !self.covers(test.id()) {
            return false;
        }
        self.include_hidden || !is_hidden_in_lineage(catalog, test)
    }
}

/// A test is hidden if it, or any catalogued enclosing suite, is hidden.
fn is_hidden_in_lineage(catalog: &TestCatalog, test: &Test) -> bool {
    test.is_hidden()
        || test
            .id()
            .ancestors()
            .any(|id| catalog.get(&id).is_some_and(|t| t.is_hidden()))
}

/// Settings for one run, passed explicitly to the planner and the runner.
#[derive(Clone, Debug)]
pub struct Configuration {
    /// Receives every event, one at a time.
    pub event_handler: EventHandler,
    /// Dispatch steps onto a worker pool instead of one at a time.
    pub is_parallelization_enabled: bool,
    /// Worker count when parallel. `None` uses the available parallelism.
    pub max_parallelism: Option<NonZeroUsize>,
    /// Default selection used by [`Plan::build`](crate::Plan::build).
    pub test_filter: Selection,
    /// Forward per-assertion `ExpectationChecked` events to the handler.
    pub deliver_expectation_checked_events: bool,
    /// Run isolated bodies one at a time on the main lane.
    pub is_main_actor_isolation_enforced: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            event_handler: EventHandler::noop(),
            is_parallelization_enabled: true,
            max_parallelism: None,
            test_filter: Selection::all(),
            deliver_expectation_checked_events: false,
            is_main_actor_isolation_enforced: false,
        }
    }
}

impl Configuration {
    /// Default configuration delivering to `handler`.
    pub fn with_handler(handler: EventHandler) -> Self {
        Configuration {
            event_handler: handler,
            ..Default::default()
        }
    }

    /// Number of workers used in parallel mode.
    pub fn worker_count(&self) -> usize {
        self.max_parallelism
            .or_else(|| std::thread::available_parallelism().ok())
            .map_or(1, NonZeroUsize::get)
    }
}
