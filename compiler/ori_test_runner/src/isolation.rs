//! The main lane.
//!
//! When isolation is enforced, bodies that are not flagged `NONISOLATED` run
//! while holding a single process-wide lane, so no two of them overlap. In
//! parallel mode such steps never go to the worker pool: they run one after
//! another on a dedicated lane thread, so a body waiting on nested rayon
//! work cannot have another lane-bound step scheduled onto its thread.
//!
//! The lock itself is not reentrant. A body that drives a nested run on the
//! thread already holding the lane keeps the lane it has instead of
//! acquiring it again.

use std::cell::Cell;

use parking_lot::{Mutex, MutexGuard};

use ori_test_ir::Test;

use crate::plan::{Step, StepAction};

static MAIN_LANE: Mutex<()> = parking_lot::const_mutex(());

thread_local! {
    static LANE_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Holds the main lane until dropped.
pub(crate) struct MainLaneGuard {
    /// `None` for a nested acquisition on the holding thread.
    _lane: Option<MutexGuard<'static, ()>>,
}

impl MainLaneGuard {
    pub(crate) fn acquire() -> Self {
        let lane = (!on_main_lane()).then(|| MAIN_LANE.lock());
        LANE_DEPTH.with(|depth| depth.set(depth.get() + 1));
        MainLaneGuard { _lane: lane }
    }

    /// Acquire the lane if `test` is bound to it under this setting.
    pub(crate) fn for_test(enforced: bool, test: &Test) -> Option<Self> {
        is_bound(enforced, test).then(MainLaneGuard::acquire)
    }
}

impl Drop for MainLaneGuard {
    fn drop(&mut self) {
        LANE_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

fn is_bound(enforced: bool, test: &Test) -> bool {
    enforced && !test.is_nonisolated()
}

/// True if executing `step` runs a body that must hold the lane.
pub(crate) fn is_lane_bound(enforced: bool, step: &Step) -> bool {
    matches!(step.action, StepAction::Run) && is_bound(enforced, &step.test)
}

/// True while the calling thread holds the main lane.
pub fn on_main_lane() -> bool {
    LANE_DEPTH.with(|depth| depth.get() > 0)
}
