//! Plan building and execution for the Ori test engine.
//!
//! The pipeline is:
//!
//! 1. A [`TestCatalog`](ori_test_ir::TestCatalog) of discovered tests.
//! 2. [`Plan::build`] selects tests, evaluates condition traits outer to
//!    inner, and decides whether each step runs or is skipped.
//! 3. [`Runner::run`] executes the plan serially or on a worker pool,
//!    delivering an ordered stream of [`Event`]s to the configured
//!    [`EventHandler`].
//!
//! Test bodies report through the free functions in this crate
//! ([`record_issue`], [`report_checked_expectation`], ...), which find the
//! current run through the ambient context.

mod bus;
mod config;
mod context;
mod evaluator;
mod event;
mod isolation;
mod plan;
mod recording;
mod runner;
pub mod task;

use std::sync::Once;

pub use bus::{EventBus, EventHandler, EventLog};
pub use config::{Configuration, Selection};
pub use evaluator::{evaluate_traits, Decision, ScopeOutcome, TraitEvaluator};
pub use event::{Event, EventContext, EventKind};
pub use isolation::on_main_lane;
pub use plan::{Plan, Step, StepAction};
pub use recording::{
    current_configuration, current_test, record_error, record_issue, report_checked_expectation,
};
pub use runner::{RunSummary, Runner, StepResult, StepState};

static TRACING_INIT: Once = Once::new();

/// Install a tracing subscriber for engine diagnostics.
///
/// Does nothing unless `RUST_LOG` is set. With `ORI_LOG_TREE` set, spans are
/// rendered as an indented tree. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        let registry = tracing_subscriber::registry().with(filter);
        let installed = if std::env::var_os("ORI_LOG_TREE").is_some() {
            registry
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .try_init()
        } else {
            registry
                .with(fmt::layer().with_target(true).with_level(true))
                .try_init()
        };
        if let Err(e) = installed {
            tracing::debug!("tracing subscriber already installed: {e}");
        }
    });
}
