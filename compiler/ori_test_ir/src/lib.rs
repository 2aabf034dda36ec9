//! Data model for the Ori test engine.
//!
//! Everything here is plain data handed to the engine by discovery:
//!
//! - [`TestId`]: hierarchical identity (`module/Suite/test()`)
//! - [`Test`]: a test or suite with its [`Trait`]s and optional body
//! - [`TestCatalog`]: the immutable, validated set of discovered tests
//! - [`SkipInfo`], [`Issue`]: why a test did not run, and what went wrong
//!
//! Planning and execution live in `ori_test_runner`.

mod catalog;
mod error;
mod id;
mod issue;
mod skip;
mod source;
mod test_def;
mod traits;

pub use catalog::{CatalogSource, Lineage, TestCatalog};
pub use error::{BodyResult, CatalogError, PanicError, TestError};
pub use id::TestId;
pub use issue::{CaughtError, Expectation, Issue, IssueKind};
pub use skip::SkipInfo;
pub use source::{SourceContext, SourceLocation};
pub use test_def::{Test, TestFlags, TestFunction};
pub use traits::{ConditionKind, ConditionTrait, Eligibility, Predicate, Trait};
