//! Condition trait evaluation.
//!
//! A test runs only if every trait on every enclosing scope allows it. Scopes
//! are evaluated outermost first and evaluation stops at the first trait that
//! disables or fails, so predicates nested under a disabled suite are never
//! invoked.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use ori_test_ir::{
    Eligibility, Issue, PanicError, SkipInfo, SourceContext, Test, TestError, TestId, Trait,
};
use rustc_hash::FxHashMap;

/// Result of evaluating the traits declared on a single scope.
#[derive(Clone, Debug)]
pub enum ScopeOutcome {
    Enabled,
    Disabled(SkipInfo),
    /// A predicate returned an error or panicked.
    Errored(Issue),
}

impl ScopeOutcome {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ScopeOutcome::Enabled)
    }
}

/// Result of evaluating a whole ancestor chain.
#[derive(Clone, Debug)]
pub enum Decision {
    Enabled,
    Disabled(SkipInfo),
    Errored {
        /// Scope declaring the failing trait.
        owner: Arc<Test>,
        issue: Issue,
    },
}

/// Evaluate `traits` in declaration order, stopping at the first that does
/// not enable.
pub fn evaluate_traits(traits: &[Trait]) -> ScopeOutcome {
    for t in traits {
        match evaluate_one(t) {
            Ok(Eligibility::Enabled) => {}
            Ok(Eligibility::Disabled(info)) => return ScopeOutcome::Disabled(info),
            Err(error) => {
                let source_context = t
                    .as_condition()
                    .map(|c| SourceContext::at(c.source_location()))
                    .unwrap_or_default();
                return ScopeOutcome::Errored(Issue::error_caught(error, source_context));
            }
        }
    }
    ScopeOutcome::Enabled
}

fn evaluate_one(t: &Trait) -> Result<Eligibility, TestError> {
    if t.is_constant() {
        return t.evaluate();
    }
    match panic::catch_unwind(AssertUnwindSafe(|| t.evaluate())) {
        Ok(result) => result,
        Err(payload) => Err(Box::new(PanicError::from_payload(&*payload))),
    }
}

/// Evaluates ancestor chains, remembering each scope's outcome.
///
/// One evaluator lives for one plan build: a suite's predicates run once no
/// matter how many of its tests are planned.
#[derive(Debug, Default)]
pub struct TraitEvaluator {
    outcomes: FxHashMap<TestId, ScopeOutcome>,
}

impl TraitEvaluator {
    pub fn new() -> Self {
        TraitEvaluator::default()
    }

    /// Decide a chain of scopes, outermost first, ending with the test.
    pub fn evaluate(&mut self, chain: &[&Arc<Test>]) -> Decision {
        for &scope in chain {
            let outcome = self
                .outcomes
                .entry(scope.id().clone())
                .or_insert_with(|| evaluate_traits(scope.traits()));
            match outcome {
                ScopeOutcome::Enabled => {}
                ScopeOutcome::Disabled(info) => {
                    tracing::debug!(scope = %scope.id(), "disabled by condition");
                    return Decision::Disabled(info.clone());
                }
                ScopeOutcome::Errored(issue) => {
                    tracing::debug!(scope = %scope.id(), %issue, "condition failed");
                    return Decision::Errored {
                        owner: Arc::clone(scope),
                        issue: issue.clone(),
                    };
                }
            }
        }
        Decision::Enabled
    }

    /// Number of scopes evaluated so far.
    pub fn evaluated_scopes(&self) -> usize {
        self.outcomes.len()
    }
}
