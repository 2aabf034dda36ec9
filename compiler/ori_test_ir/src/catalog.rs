//! The immutable set of discovered tests.
//!
//! Discovery lives outside the engine. Whatever finds tests implements
//! [`CatalogSource`]; the catalog checks identity invariants and then serves
//! lookups by id and lineage walks for the planner.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{CatalogError, Test, TestId};

/// Lineage of a test: its catalogued ancestors then the test, outermost first.
pub type Lineage<'a> = SmallVec<[&'a Arc<Test>; 4]>;

/// Anything able to produce discovered tests.
pub trait CatalogSource {
    /// Tests in discovery order.
    fn tests(&self) -> Vec<Test>;
}

impl CatalogSource for Vec<Test> {
    fn tests(&self) -> Vec<Test> {
        self.clone()
    }
}

impl CatalogSource for [Test] {
    fn tests(&self) -> Vec<Test> {
        self.to_vec()
    }
}

/// Tests in discovery order, indexed by id.
#[derive(Clone, Debug, Default)]
pub struct TestCatalog {
    tests: Vec<Arc<Test>>,
    index: FxHashMap<TestId, usize>,
}

impl TestCatalog {
    /// Build a catalog, keeping the given order.
    ///
    /// Parents are optional: a test whose enclosing suite was not
    /// discovered simply has a shorter lineage.
    pub fn new(tests: impl IntoIterator<Item = Test>) -> Result<Self, CatalogError> {
        let mut catalog = TestCatalog::default();
        for test in tests {
            if catalog.index.contains_key(test.id()) {
                return Err(CatalogError::DuplicateId(test.id().clone()));
            }
            catalog.index.insert(test.id().clone(), catalog.tests.len());
            catalog.tests.push(Arc::new(test));
        }

        for test in &catalog.tests {
            if let Some(parent) = test.parent_id().and_then(|id| catalog.get(&id)) {
                if !parent.is_suite() {
                    return Err(CatalogError::ParentNotSuite {
                        parent: parent.id().clone(),
                        child: test.id().clone(),
                    });
                }
            }
        }

        Ok(catalog)
    }

    pub fn discover(source: &(impl CatalogSource + ?Sized)) -> Result<Self, CatalogError> {
        TestCatalog::new(source.tests())
    }

    pub fn get(&self, id: &TestId) -> Option<&Arc<Test>> {
        self.index.get(id).map(|&i| &self.tests[i])
    }

    pub fn contains(&self, id: &TestId) -> bool {
        self.index.contains_key(id)
    }

    /// Tests in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Test>> {
        self.tests.iter()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Catalogued ancestors of `test` followed by `test`, outermost first.
    pub fn lineage<'a>(&'a self, test: &'a Arc<Test>) -> Lineage<'a> {
        let mut lineage: Lineage<'a> = test
            .id()
            .ancestors()
            .filter_map(|id| self.get(&id))
            .collect();
        lineage.push(test);
        lineage
    }

    /// Direct children of `id`, in discovery order.
    pub fn children<'a>(&'a self, id: &'a TestId) -> impl Iterator<Item = &'a Arc<Test>> + 'a {
        self.tests
            .iter()
            .filter(move |t| t.parent_id().as_ref() == Some(id))
    }

    /// All tests nested anywhere below `id`, in discovery order.
    pub fn descendants<'a>(&'a self, id: &'a TestId) -> impl Iterator<Item = &'a Arc<Test>> + 'a {
        self.tests.iter().filter(move |t| id.is_ancestor_of(t.id()))
    }
}

#[cfg(test)]
mod tests;
