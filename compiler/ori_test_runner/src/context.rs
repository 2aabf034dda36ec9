//! Ambient execution context.
//!
//! While a body runs, its thread carries an [`Ambient`] naming the run and
//! the test, so recording functions called from the body need no explicit
//! handle. Threads started with [`task::spawn`](crate::task::spawn) inherit
//! it. Threads that did not inherit one fall back to the process-wide
//! registry of active runs.
//!
//! Attribution happens under the run's `running` lock, which is also held
//! while `testStarted` and `testEnded` are posted. An issue is therefore
//! either delivered inside its test's bracket or not attributed to that test
//! at all. Code with no claim on a test gets the sole running test, or the
//! run itself when none or several are running.

use std::cell::RefCell;
use std::ptr;
use std::sync::{Arc, Weak};

use ori_test_ir::{Issue, Test, TestId};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use rustc_hash::FxHashMap;

use crate::bus::EventBus;
use crate::config::Configuration;
use crate::event::{EventContext, EventKind};

/// Shared state of one run.
pub(crate) struct RunContext {
    configuration: Configuration,
    bus: EventBus,
    /// Tests between `testStarted` and `testEnded`. Taken before the bus.
    running: ReentrantMutex<RefCell<Vec<Arc<Test>>>>,
    issues: Mutex<FxHashMap<TestId, Vec<Issue>>>,
    unattributed: Mutex<Vec<Issue>>,
}

impl RunContext {
    pub(crate) fn new(configuration: Configuration) -> Arc<Self> {
        Arc::new(RunContext {
            bus: EventBus::new(&configuration),
            configuration,
            running: ReentrantMutex::new(RefCell::new(Vec::new())),
            issues: Mutex::new(FxHashMap::default()),
            unattributed: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub(crate) fn post(&self, kind: EventKind, context: &EventContext) {
        self.bus.post(kind, context);
    }

    /// Mark `test` as running and announce it.
    pub(crate) fn test_started(&self, test: &Arc<Test>) {
        let running = self.running.lock();
        running.borrow_mut().push(Arc::clone(test));
        self.post(EventKind::TestStarted, &EventContext::for_test(test));
    }

    /// Mark `test` as no longer running and announce it.
    pub(crate) fn test_ended(&self, test: &Arc<Test>) {
        let running = self.running.lock();
        running.borrow_mut().retain(|t| !Arc::ptr_eq(t, test));
        self.post(EventKind::TestEnded, &EventContext::for_test(test));
    }

    /// Attribute `issue` to `test`, or to the run, and deliver it.
    pub(crate) fn record(&self, test: Option<&Arc<Test>>, issue: Issue) {
        let context = match test {
            Some(test) => {
                self.issues
                    .lock()
                    .entry(test.id().clone())
                    .or_default()
                    .push(issue.clone());
                EventContext::for_test(test)
            }
            None => {
                self.unattributed.lock().push(issue.clone());
                EventContext::empty()
            }
        };
        self.post(EventKind::IssueRecorded(issue), &context);
    }

    /// Issues attributed to `id` so far, leaving none behind.
    pub(crate) fn take_issues(&self, id: &TestId) -> Vec<Issue> {
        self.issues.lock().remove(id).unwrap_or_default()
    }

    /// Issues recorded against no test.
    pub(crate) fn take_unattributed(&self) -> Vec<Issue> {
        std::mem::take(&mut *self.unattributed.lock())
    }
}

/// The run and test a thread is working for.
#[derive(Clone)]
pub(crate) struct Ambient {
    pub(crate) run: Arc<RunContext>,
    /// `None` on threads with no claim on any test.
    pub(crate) test: Option<Arc<Test>>,
}

impl Ambient {
    pub(crate) fn new(run: Arc<RunContext>, test: Option<Arc<Test>>) -> Self {
        Ambient { run, test }
    }

    /// Call `f` with the test this thread's work belongs to right now.
    ///
    /// A claimed test counts only while it is running. Without a claim, the
    /// sole running test is used. No test can start or end until `f`
    /// returns.
    pub(crate) fn attribute<R>(&self, f: impl FnOnce(Option<&Arc<Test>>) -> R) -> R {
        let running = self.run.running.lock();
        let test = {
            let running = running.borrow();
            match &self.test {
                Some(claimed) => running.iter().find(|t| Arc::ptr_eq(t, claimed)).cloned(),
                None => match running.as_slice() {
                    [sole] => Some(Arc::clone(sole)),
                    _ => None,
                },
            }
        };
        if test.is_none() {
            tracing::trace!(claimed = ?self.test.as_ref().map(|t| t.id()), "attributed to the run");
        }
        f(test.as_ref())
    }
}

thread_local! {
    static AMBIENT: RefCell<Option<Ambient>> = const { RefCell::new(None) };
}

/// Installs an ambient context for the current thread, restoring the
/// previous one on drop.
pub(crate) struct AmbientGuard {
    previous: Option<Ambient>,
}

impl AmbientGuard {
    pub(crate) fn install(ambient: Ambient) -> Self {
        let previous = AMBIENT.with(|slot| slot.replace(Some(ambient)));
        AmbientGuard { previous }
    }
}

impl Drop for AmbientGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        AMBIENT.with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Context installed on this thread, if any.
pub(crate) fn inherited() -> Option<Ambient> {
    AMBIENT.with(|slot| slot.borrow().clone())
}

/// Runs in progress, oldest first.
static ACTIVE_RUNS: RwLock<Vec<Weak<RunContext>>> = parking_lot::const_rwlock(Vec::new());

/// Keeps a run in the active registry until dropped.
pub(crate) struct Registration {
    run: Weak<RunContext>,
}

impl Registration {
    pub(crate) fn new(run: &Arc<RunContext>) -> Self {
        let run = Arc::downgrade(run);
        let mut runs = ACTIVE_RUNS.write();
        runs.retain(|r| r.strong_count() > 0);
        runs.push(Weak::clone(&run));
        Registration { run }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        ACTIVE_RUNS
            .write()
            .retain(|r| r.strong_count() > 0 && !ptr::eq(r.as_ptr(), self.run.as_ptr()));
    }
}

/// Inherited context, else the latest active run with no claimed test.
pub(crate) fn current() -> Option<Ambient> {
    inherited().or_else(|| {
        let run = ACTIVE_RUNS.read().iter().rev().find_map(Weak::upgrade)?;
        tracing::trace!("no inherited context, using active run");
        Some(Ambient::new(run, None))
    })
}
