//! Test and suite definitions.

use std::fmt;
use std::sync::Arc;

use crate::{BodyResult, SourceLocation, TestId, Trait};

bitflags::bitflags! {
    /// Per-test properties relevant to planning and scheduling.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TestFlags: u8 {
        /// Contains other tests and suites.
        const SUITE = 1;
        /// Excluded from plans unless hidden tests are requested.
        const HIDDEN = 1 << 1;
        /// Body may run on any worker even when main-lane isolation is
        /// enforced.
        const NONISOLATED = 1 << 2;
    }
}

/// Callable test body.
pub type TestFunction = Arc<dyn Fn() -> BodyResult + Send + Sync>;

/// A discovered test or suite.
///
/// Built with the consuming `with_*` methods, then frozen by handing it to a
/// [`TestCatalog`](crate::TestCatalog). The parent is never stored: it is
/// looked up through [`Test::parent_id`].
#[derive(Clone)]
pub struct Test {
    id: TestId,
    display_name: Option<String>,
    flags: TestFlags,
    traits: Vec<Trait>,
    body: Option<TestFunction>,
    source_location: Option<SourceLocation>,
}

impl Test {
    /// A suite: a scope grouping tests, without a body of its own.
    #[track_caller]
    pub fn suite(id: impl Into<TestId>) -> Self {
        Test {
            id: id.into(),
            display_name: None,
            flags: TestFlags::SUITE,
            traits: Vec::new(),
            body: None,
            source_location: Some(SourceLocation::caller()),
        }
    }

    /// A test function.
    #[track_caller]
    pub fn function<F>(id: impl Into<TestId>, body: F) -> Self
    where
        F: Fn() -> BodyResult + Send + Sync + 'static,
    {
        Test {
            id: id.into(),
            display_name: None,
            flags: TestFlags::empty(),
            traits: Vec::new(),
            body: Some(Arc::new(body)),
            source_location: Some(SourceLocation::caller()),
        }
    }

    #[must_use]
    pub fn with_trait(mut self, t: impl Into<Trait>) -> Self {
        self.traits.push(t.into());
        self
    }

    #[must_use]
    pub fn with_traits<I>(mut self, traits: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Trait>,
    {
        self.traits.extend(traits.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.flags |= TestFlags::HIDDEN;
        self
    }

    #[must_use]
    pub fn nonisolated(mut self) -> Self {
        self.flags |= TestFlags::NONISOLATED;
        self
    }

    #[must_use]
    pub fn with_source_location(mut self, location: SourceLocation) -> Self {
        self.source_location = Some(location);
        self
    }

    pub fn id(&self) -> &TestId {
        &self.id
    }

    /// Declared name: the last id component.
    pub fn name(&self) -> &str {
        self.id.name()
    }

    /// Name for reports, falling back to [`Test::name`].
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_else(|| self.name())
    }

    pub fn flags(&self) -> TestFlags {
        self.flags
    }

    pub fn is_suite(&self) -> bool {
        self.flags.contains(TestFlags::SUITE)
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.contains(TestFlags::HIDDEN)
    }

    pub fn is_nonisolated(&self) -> bool {
        self.flags.contains(TestFlags::NONISOLATED)
    }

    /// Traits in declaration order.
    pub fn traits(&self) -> &[Trait] {
        &self.traits
    }

    pub fn body(&self) -> Option<&TestFunction> {
        self.body.as_ref()
    }

    pub fn parent_id(&self) -> Option<TestId> {
        self.id.parent()
    }

    pub fn source_location(&self) -> Option<SourceLocation> {
        self.source_location
    }
}

impl fmt::Debug for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Test")
            .field("id", &self.id)
            .field("flags", &self.flags)
            .field("traits", &self.traits)
            .field("has_body", &self.body.is_some())
            .finish_non_exhaustive()
    }
}
