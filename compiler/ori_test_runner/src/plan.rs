//! Execution plans.
//!
//! A plan is the ordered list of steps a runner executes. Building one
//! applies the selection, evaluates condition traits, and fixes each step's
//! action. Once built, a plan never changes.

use std::sync::Arc;

use ori_test_ir::{SkipInfo, Test, TestCatalog, TestId};
use rustc_hash::FxHashSet;

use crate::bus::EventBus;
use crate::config::{Configuration, Selection};
use crate::evaluator::{Decision, TraitEvaluator};
use crate::event::{EventContext, EventKind};

/// What a step will do when executed.
#[derive(Clone, Debug)]
pub enum StepAction {
    Run,
    Skip(SkipInfo),
}

/// One test with its decided action.
#[derive(Clone, Debug)]
pub struct Step {
    pub test: Arc<Test>,
    pub action: StepAction,
}

impl Step {
    pub fn run(test: Arc<Test>) -> Self {
        Step {
            test,
            action: StepAction::Run,
        }
    }

    pub fn skip(test: Arc<Test>, info: SkipInfo) -> Self {
        Step {
            test,
            action: StepAction::Skip(info),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.action, StepAction::Skip(_))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Plan {
    steps: Vec<Step>,
    include_hidden: bool,
}

impl Plan {
    /// Plan the tests chosen by `configuration.test_filter`.
    pub fn build(catalog: &TestCatalog, configuration: &Configuration) -> Plan {
        Plan::build_selected(catalog, &configuration.test_filter, configuration)
    }

    /// Plan every visible test under the default configuration.
    ///
    /// Issues raised while evaluating conditions go to a no-op handler; they
    /// still turn the affected steps into skips.
    pub fn build_default(catalog: &TestCatalog) -> Plan {
        Plan::build(catalog, &Configuration::default())
    }

    /// Plan the tests chosen by `selection`.
    ///
    /// Condition predicates run here. A predicate that fails skips every test
    /// it governs, and its issue is delivered to the configuration's handler
    /// once, attributed to the scope that declared it.
    #[tracing::instrument(level = "debug", skip_all, fields(catalog = catalog.len()))]
    pub fn build_selected(
        catalog: &TestCatalog,
        selection: &Selection,
        configuration: &Configuration,
    ) -> Plan {
        let bus = EventBus::new(configuration);
        let selected: FxHashSet<&TestId> = catalog
            .iter()
            .filter(|t| selection.selects(catalog, t))
            .map(|t| t.id())
            .collect();

        let mut evaluator = TraitEvaluator::new();
        let mut reported: FxHashSet<TestId> = FxHashSet::default();
        let mut steps = Vec::new();

        for test in catalog.iter() {
            if !selected.contains(test.id()) {
                continue;
            }
            // Suites are planned only when named directly with nothing
            // beneath them selected.
            if test.is_suite()
                && (!selection.names(test.id())
                    || catalog
                        .descendants(test.id())
                        .any(|d| selected.contains(d.id())))
            {
                continue;
            }

            let action = match evaluator.evaluate(&catalog.lineage(test)) {
                Decision::Enabled => StepAction::Run,
                Decision::Disabled(info) => StepAction::Skip(info),
                Decision::Errored { owner, issue } => {
                    let info = SkipInfo::new(
                        issue.caught_error().map(ToString::to_string),
                        issue.source_context.clone(),
                    );
                    if reported.insert(owner.id().clone()) {
                        bus.post(EventKind::IssueRecorded(issue), &EventContext::for_test(&owner));
                    }
                    StepAction::Skip(info)
                }
            };
            steps.push(Step {
                test: Arc::clone(test),
                action,
            });
        }

        tracing::debug!(
            steps = steps.len(),
            skipped = steps.iter().filter(|s| s.is_skipped()).count(),
            "plan built"
        );
        Plan {
            steps,
            include_hidden: selection.include_hidden,
        }
    }

    /// A plan of hand-assembled steps, kept in the given order.
    pub fn from_steps(steps: impl IntoIterator<Item = Step>) -> Plan {
        Plan {
            steps: steps.into_iter().collect(),
            include_hidden: true,
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Ids of the planned tests, in step order.
    pub fn test_ids(&self) -> impl Iterator<Item = &TestId> {
        self.steps.iter().map(|s| s.test.id())
    }

    /// Whether hidden tests were eligible when this plan was built.
    pub fn includes_hidden(&self) -> bool {
        self.include_hidden
    }
}
