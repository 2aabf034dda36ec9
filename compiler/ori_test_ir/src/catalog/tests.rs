use super::*;
use pretty_assertions::assert_eq;

fn pass() -> crate::BodyResult {
    Ok(())
}

fn sample() -> Vec<Test> {
    vec![
        Test::suite("m"),
        Test::suite("m/Outer"),
        Test::function("m/Outer/a()", pass),
        Test::suite("m/Outer/Inner"),
        Test::function("m/Outer/Inner/b()", pass),
        Test::function("m/free()", pass),
    ]
}

fn ids<'a>(tests: impl Iterator<Item = &'a Arc<Test>>) -> Vec<String> {
    tests.map(|t| t.id().to_string()).collect()
}

#[test]
fn keeps_discovery_order() {
    let Ok(catalog) = TestCatalog::new(sample()) else {
        panic!("sample catalog is valid");
    };
    assert_eq!(catalog.len(), 6);
    assert_eq!(
        ids(catalog.iter()),
        vec![
            "m",
            "m/Outer",
            "m/Outer/a()",
            "m/Outer/Inner",
            "m/Outer/Inner/b()",
            "m/free()"
        ]
    );
}

#[test]
fn rejects_duplicate_ids() {
    let mut tests = sample();
    tests.push(Test::function("m/free()", pass));
    assert!(matches!(
        TestCatalog::new(tests),
        Err(CatalogError::DuplicateId(id)) if id == TestId::parse("m/free()")
    ));
}

#[test]
fn rejects_tests_nested_under_functions() {
    let tests = vec![
        Test::function("m/f()", pass),
        Test::function("m/f()/g()", pass),
    ];
    assert!(matches!(
        TestCatalog::new(tests),
        Err(CatalogError::ParentNotSuite { .. })
    ));
}

#[test]
fn lineage_is_outermost_first() {
    let Ok(catalog) = TestCatalog::discover(&sample()) else {
        panic!("sample catalog is valid");
    };
    let Some(leaf) = catalog.get(&TestId::parse("m/Outer/Inner/b()")) else {
        panic!("leaf is catalogued");
    };
    assert_eq!(
        ids(catalog.lineage(leaf).into_iter()),
        vec!["m", "m/Outer", "m/Outer/Inner", "m/Outer/Inner/b()"]
    );
}

#[test]
fn lineage_skips_undiscovered_parents() {
    let Ok(catalog) = TestCatalog::new(vec![Test::function("m/S/t()", pass)]) else {
        panic!("orphans are allowed");
    };
    let Some(leaf) = catalog.get(&TestId::parse("m/S/t()")) else {
        panic!("leaf is catalogued");
    };
    assert_eq!(catalog.lineage(leaf).len(), 1);
}

#[test]
fn children_and_descendants() {
    let Ok(catalog) = TestCatalog::discover(sample().as_slice()) else {
        panic!("sample catalog is valid");
    };
    let outer = TestId::parse("m/Outer");
    assert_eq!(
        ids(catalog.children(&outer)),
        vec!["m/Outer/a()", "m/Outer/Inner"]
    );
    assert_eq!(
        ids(catalog.descendants(&outer)),
        vec!["m/Outer/a()", "m/Outer/Inner", "m/Outer/Inner/b()"]
    );
    assert!(catalog.contains(&outer));
    assert!(!catalog.contains(&TestId::parse("m/Missing")));
}
