use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn skip_comment(eligibility: &Eligibility) -> Option<&str> {
    match eligibility {
        Eligibility::Disabled(info) => info.comment.as_deref(),
        Eligibility::Enabled => None,
    }
}

#[test]
fn constant_phrasings_agree() {
    let a = Trait::from(ConditionTrait::enabled_if(false).with_comment("off"));
    let b = Trait::from(ConditionTrait::disabled_if(true).with_comment("off"));

    for t in [&a, &b] {
        assert!(t.is_constant());
        let Ok(eligibility) = t.evaluate() else {
            panic!("constant conditions cannot fail");
        };
        assert_eq!(skip_comment(&eligibility), Some("off"));
    }
}

#[test]
fn enabled_constant_is_enabled() {
    let t = Trait::from(ConditionTrait::enabled_if(true));
    assert!(matches!(t.evaluate(), Ok(Eligibility::Enabled)));
}

#[test]
fn dynamic_phrasings_agree() {
    let a = Trait::from(ConditionTrait::enabled_when(|| Ok(false)).with_comment("dyn"));
    let b = Trait::from(ConditionTrait::disabled_when(|| Ok(true)).with_comment("dyn"));

    for t in [&a, &b] {
        assert!(!t.is_constant());
        let Ok(eligibility) = t.evaluate() else {
            panic!("predicate does not fail");
        };
        assert_eq!(skip_comment(&eligibility), Some("dyn"));
    }
}

#[test]
fn predicate_runs_on_each_evaluation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let t = Trait::from(ConditionTrait::enabled_when(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }));

    assert!(t.evaluate().is_ok());
    assert!(t.evaluate().is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn predicate_error_propagates() {
    let t = Trait::from(ConditionTrait::enabled_when(|| Err("no network".into())));
    match t.evaluate() {
        Err(error) => assert_eq!(error.to_string(), "no network"),
        Ok(_) => panic!("expected the predicate error"),
    }
}

#[test]
fn disabled_trait_records_declaration_site() {
    let expected_line = line!() + 1;
    let condition = ConditionTrait::disabled();
    assert_eq!(condition.source_location().line, expected_line);

    let Ok(Eligibility::Disabled(info)) = Trait::from(condition).evaluate() else {
        panic!("expected a skip");
    };
    assert_eq!(
        info.source_context.location.map(|l| l.line),
        Some(expected_line)
    );
    assert_eq!(info.comment, None);
}

#[test]
fn annotation_traits_are_always_enabled() {
    assert!(Trait::Comment("flaky on CI".into()).evaluate().is_ok_and(|e| e.is_enabled()));
    assert!(Trait::Tag("slow".into()).is_constant());
    assert!(Trait::Tag("slow".into()).as_condition().is_none());
}
