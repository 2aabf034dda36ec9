//! Hierarchical test identifiers.
//!
//! A `TestId` is the path from the outermost scope (usually a module) down
//! to the test itself: `["math", "Arithmetic", "adds_two()"]`. The parent of a
//! test is therefore derivable from its id, which is how the catalog resolves
//! the suite chain without any test owning its parent.

use std::fmt;
use std::sync::Arc;

/// Stable, hierarchical identifier of a test or suite.
///
/// Cloning is cheap: the components are shared.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestId {
    components: Arc<[Box<str>]>,
}

impl TestId {
    /// Create an id from its path components, outermost first.
    pub fn new<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TestId {
            components: components
                .into_iter()
                .map(|c| c.into().into_boxed_str())
                .collect(),
        }
    }

    /// Parse an id written as `a/b/c`.
    ///
    /// Empty components are dropped, so `"a//b/"` is the same id as `"a/b"`.
    pub fn parse(path: &str) -> Self {
        TestId::new(path.split('/').filter(|c| !c.is_empty()))
    }

    /// Id of a direct child scope or test.
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut components: Vec<Box<str>> = self.components.to_vec();
        components.push(name.into().into_boxed_str());
        TestId {
            components: components.into(),
        }
    }

    /// Id of the enclosing scope, or `None` for a root id.
    pub fn parent(&self) -> Option<TestId> {
        match self.components.len() {
            0 | 1 => None,
            n => Some(TestId {
                components: self.components[..n - 1].into(),
            }),
        }
    }

    /// All proper ancestors, outermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = TestId> + '_ {
        let len = self.components.len();
        (1..len).map(move |n| TestId {
            components: self.components[..n].into(),
        })
    }

    /// True if `self` is a proper prefix of `other`.
    pub fn is_ancestor_of(&self, other: &TestId) -> bool {
        self.components.len() < other.components.len()
            && other.components.starts_with(&self.components)
    }

    /// The last component: the test's own name.
    pub fn name(&self) -> &str {
        match self.components.last() {
            Some(component) => &**component,
            None => "",
        }
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| &**c)
    }

    /// Number of components (nesting depth).
    pub fn depth(&self) -> usize {
        self.components.len()
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(component)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TestId({self})")
    }
}

impl From<&str> for TestId {
    fn from(path: &str) -> Self {
        TestId::parse(path)
    }
}
