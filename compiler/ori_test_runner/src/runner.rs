//! Plan execution.
//!
//! Every step walks `Pending → Skipped` or `Pending → Running → Completed`
//! and always emits its full bracket of events, whatever its body does.
//! In serial mode steps run one at a time on the calling thread. In parallel
//! mode steps bound to the main lane run in order on one lane thread while
//! every other step is dispatched onto a scoped rayon pool up front.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ori_test_ir::{
    CatalogError, Issue, PanicError, SourceContext, Test, TestCatalog, TestError, TestId,
};
use parking_lot::Mutex;

use crate::config::{Configuration, Selection};
use crate::context::{Ambient, AmbientGuard, Registration, RunContext};
use crate::event::{EventContext, EventKind};
use crate::isolation::{is_lane_bound, on_main_lane, MainLaneGuard};
use crate::plan::{Plan, Step, StepAction};

/// Lifecycle of one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Skipped,
    Running,
    Completed,
}

impl StepState {
    pub fn can_transition_to(self, next: StepState) -> bool {
        matches!(
            (self, next),
            (StepState::Pending, StepState::Skipped | StepState::Running)
                | (StepState::Running, StepState::Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StepState::Skipped | StepState::Completed)
    }

    fn advance(&mut self, next: StepState) {
        debug_assert!(
            self.can_transition_to(next),
            "invalid step transition {self:?} -> {next:?}"
        );
        *self = next;
    }
}

/// Outcome of one executed step.
#[derive(Clone, Debug)]
pub struct StepResult {
    pub test: Arc<Test>,
    pub state: StepState,
    /// Issues attributed to the test while it ran.
    pub issues: Vec<Issue>,
    pub duration: Duration,
}

impl StepResult {
    pub fn passed(&self) -> bool {
        self.state == StepState::Completed && self.issues.is_empty()
    }

    pub fn failed(&self) -> bool {
        self.state == StepState::Completed && !self.issues.is_empty()
    }

    pub fn skipped(&self) -> bool {
        self.state == StepState::Skipped
    }
}

/// Outcome of a whole run, in plan order.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub results: Vec<StepResult>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Issues recorded while no single test could claim them.
    pub unattributed: Vec<Issue>,
    /// Total issues across all steps and the run itself.
    pub issues: usize,
    pub duration: Duration,
}

impl RunSummary {
    fn from_results(results: Vec<StepResult>, unattributed: Vec<Issue>, duration: Duration) -> Self {
        let mut summary = RunSummary {
            issues: unattributed.len(),
            unattributed,
            duration,
            ..RunSummary::default()
        };
        for result in &results {
            summary.issues += result.issues.len();
            if result.skipped() {
                summary.skipped += 1;
            } else if result.failed() {
                summary.failed += 1;
            } else {
                summary.passed += 1;
            }
        }
        summary.results = results;
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || !self.unattributed.is_empty()
    }

    /// Result for the step running `id`, if planned.
    pub fn result(&self, id: &TestId) -> Option<&StepResult> {
        self.results.iter().find(|r| r.test.id() == id)
    }
}

/// Executes a plan under a configuration.
pub struct Runner {
    plan: Plan,
    configuration: Configuration,
}

impl Runner {
    pub fn new(plan: Plan, configuration: Configuration) -> Self {
        Runner {
            plan,
            configuration,
        }
    }

    /// Runner over exactly `tests`, hidden ones included.
    ///
    /// Condition traits are evaluated here, while planning.
    pub fn for_tests(
        tests: impl IntoIterator<Item = Test>,
        configuration: Configuration,
    ) -> Result<Self, CatalogError> {
        let catalog = TestCatalog::new(tests)?;
        let plan = Plan::build_selected(
            &catalog,
            &Selection::all().including_hidden(true),
            &configuration,
        );
        Ok(Runner::new(plan, configuration))
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Execute every step and report the outcome.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            steps = self.plan.len(),
            parallel = self.configuration.is_parallelization_enabled
        )
    )]
    pub fn run(&self) -> RunSummary {
        let start = Instant::now();
        let run = RunContext::new(self.configuration.clone());
        let _registration = Registration::new(&run);

        run.post(
            EventKind::PlanStarted {
                step_count: self.plan.len(),
            },
            &EventContext::empty(),
        );
        let results = if self.configuration.is_parallelization_enabled {
            self.run_parallel(&run)
        } else {
            self.run_sequential(&run)
        };
        run.post(EventKind::PlanEnded, &EventContext::empty());

        let summary = RunSummary::from_results(results, run.take_unattributed(), start.elapsed());
        tracing::debug!(
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            "run finished"
        );
        summary
    }

    fn run_sequential(&self, run: &Arc<RunContext>) -> Vec<StepResult> {
        self.plan
            .steps()
            .iter()
            .map(|step| execute_step(run, step))
            .collect()
    }

    /// Dispatch every step without waiting on any body.
    ///
    /// Lane-bound steps run in plan order on one dedicated lane thread; the
    /// rest go to a scoped pool. `build_scoped` tears the pool down before
    /// returning, so no worker outlives the run.
    fn run_parallel(&self, run: &Arc<RunContext>) -> Vec<StepResult> {
        let steps = self.plan.steps();
        let enforced = self.configuration.is_main_actor_isolation_enforced;
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.configuration.worker_count())
            .thread_name(|i| format!("ori-test-worker-{i}"))
            .build_scoped(rayon::ThreadBuilder::run, |pool| {
                let slots: Vec<Mutex<Option<StepResult>>> =
                    steps.iter().map(|_| Mutex::new(None)).collect();
                let (lane_bound, free): (Vec<Slot<'_>>, Vec<Slot<'_>>) = steps
                    .iter()
                    .zip(&slots)
                    .partition(|(step, _)| is_lane_bound(enforced, step));

                thread::scope(|threads| {
                    // A nested run on the lane thread already holds the lane.
                    let lane = (!lane_bound.is_empty() && !on_main_lane()).then(|| {
                        thread::Builder::new()
                            .name("ori-test-main-lane".to_string())
                            .spawn_scoped(threads, || execute_in_order(run, &lane_bound))
                    });
                    pool.scope(|scope| {
                        for &(step, slot) in &free {
                            scope.spawn(move |_| {
                                *slot.lock() = Some(execute_step(run, step));
                            });
                        }
                    });
                    match lane {
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(
                                "failed to start main lane thread ({e}), running lane-bound tests here"
                            );
                            execute_in_order(run, &lane_bound);
                        }
                        None => execute_in_order(run, &lane_bound),
                    }
                });

                slots
                    .into_iter()
                    .filter_map(Mutex::into_inner)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_else(|e| {
                tracing::warn!("failed to create thread pool ({e}), running sequentially");
                self.run_sequential(run)
            })
    }
}

/// A step and the slot its result goes to.
type Slot<'a> = (&'a Step, &'a Mutex<Option<StepResult>>);

fn execute_in_order(run: &Arc<RunContext>, steps: &[Slot<'_>]) {
    for &(step, slot) in steps {
        *slot.lock() = Some(execute_step(run, step));
    }
}

#[tracing::instrument(level = "debug", skip_all, fields(test = %step.test.id()))]
fn execute_step(run: &Arc<RunContext>, step: &Step) -> StepResult {
    let start = Instant::now();
    let test = &step.test;
    let context = EventContext::for_test(test);
    let mut state = StepState::Pending;

    run.post(EventKind::PlanStepStarted(step.clone()), &context);
    match &step.action {
        StepAction::Skip(info) => {
            state.advance(StepState::Skipped);
            tracing::debug!(comment = ?info.comment, "skipped");
            run.post(EventKind::TestSkipped(info.clone()), &context);
        }
        StepAction::Run => {
            let _lane =
                MainLaneGuard::for_test(run.configuration().is_main_actor_isolation_enforced, test);
            state.advance(StepState::Running);
            run.test_started(test);
            invoke_body(run, test);
            run.test_ended(test);
            state.advance(StepState::Completed);
        }
    }
    let issues = run.take_issues(test.id());
    run.post(EventKind::PlanStepEnded(step.clone()), &context);

    StepResult {
        test: Arc::clone(test),
        state,
        issues,
        duration: start.elapsed(),
    }
}

/// Call the body with the ambient context installed, turning an `Err` or a
/// panic into an issue on `test`.
fn invoke_body(run: &Arc<RunContext>, test: &Arc<Test>) {
    let Some(body) = test.body() else {
        return;
    };
    let _ambient = AmbientGuard::install(Ambient::new(Arc::clone(run), Some(Arc::clone(test))));
    let error: TestError = match panic::catch_unwind(AssertUnwindSafe(|| body())) {
        Ok(Ok(())) => return,
        Ok(Err(error)) => error,
        Err(payload) => Box::new(PanicError::from_payload(&*payload)),
    };
    tracing::debug!(%error, "body failed");
    let source_context = SourceContext {
        location: test.source_location(),
        backtrace: None,
    };
    run.record(Some(test), Issue::error_caught(error, source_context));
}

#[cfg(test)]
mod tests;
