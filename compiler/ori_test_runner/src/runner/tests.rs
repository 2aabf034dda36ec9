use super::*;
use crate::bus::EventLog;
use crate::isolation::on_main_lane;
use crate::recording::record_issue;
use ori_test_ir::{BodyResult, ConditionTrait, SkipInfo};
use pretty_assertions::assert_eq;

fn pass() -> BodyResult {
    Ok(())
}

fn serial(log: &EventLog) -> Configuration {
    Configuration {
        is_parallelization_enabled: false,
        ..Configuration::with_handler(log.handler())
    }
}

fn runner(tests: Vec<Test>, configuration: Configuration) -> Runner {
    match Runner::for_tests(tests, configuration) {
        Ok(runner) => runner,
        Err(error) => panic!("invalid fixture: {error}"),
    }
}

#[test]
fn state_transitions() {
    use StepState::{Completed, Pending, Running, Skipped};
    assert!(Pending.can_transition_to(Skipped));
    assert!(Pending.can_transition_to(Running));
    assert!(Running.can_transition_to(Completed));
    assert!(!Skipped.can_transition_to(Running));
    assert!(!Completed.can_transition_to(Running));
    assert!(!Pending.can_transition_to(Completed));
    assert!(Skipped.is_terminal() && Completed.is_terminal());
    assert!(!Running.is_terminal());
}

#[test]
fn serial_event_order() {
    let log = EventLog::new();
    let runner = runner(
        vec![
            Test::function("m/a()", pass),
            Test::function("m/b()", pass).with_trait(ConditionTrait::disabled()),
        ],
        serial(&log),
    );
    let summary = runner.run();

    assert_eq!(
        log.kinds(),
        vec![
            "planStarted",
            "planStepStarted",
            "testStarted",
            "testEnded",
            "planStepEnded",
            "planStepStarted",
            "testSkipped",
            "planStepEnded",
            "planEnded",
        ]
    );
    assert_eq!((summary.passed, summary.skipped, summary.failed), (1, 1, 0));
}

#[test]
fn body_error_and_panic_are_isolated() {
    let log = EventLog::new();
    let runner = runner(
        vec![
            Test::function("m/err()", || Err("bad input".into())),
            Test::function("m/panic()", || panic!("exploded")),
            Test::function("m/ok()", pass),
        ],
        serial(&log),
    );
    let summary = runner.run();

    assert_eq!(summary.failed, 2);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.issues, 2);
    assert!(summary.has_failures());

    let Some(panicked) = summary.result(&TestId::parse("m/panic()")) else {
        panic!("panic() was planned");
    };
    assert_eq!(panicked.state, StepState::Completed);
    assert_eq!(
        panicked.issues[0].caught_error().map(ToString::to_string).as_deref(),
        Some("panicked: exploded")
    );
    assert_eq!(
        log.kinds_for(&TestId::parse("m/err()")),
        vec![
            "planStepStarted",
            "testStarted",
            "issueRecorded",
            "testEnded",
            "planStepEnded"
        ]
    );
}

#[test]
fn recorded_issues_fail_the_test() {
    let log = EventLog::new();
    let runner = runner(
        vec![Test::function("m/a()", || {
            record_issue("first");
            record_issue("second");
            Ok(())
        })],
        serial(&log),
    );
    let summary = runner.run();
    assert_eq!(summary.results[0].issues.len(), 2);
    assert!(summary.results[0].failed());
}

#[test]
fn for_tests_includes_hidden() {
    let log = EventLog::new();
    let runner = runner(vec![Test::function("m/h()", pass).hidden()], serial(&log));
    assert_eq!(runner.plan().len(), 1);
    assert_eq!(runner.run().passed, 1);
}

#[test]
fn planned_suite_completes_without_a_body() {
    let log = EventLog::new();
    let suite = Arc::new(Test::suite("m/S"));
    let plan = Plan::from_steps([Step::run(suite)]);
    let summary = Runner::new(plan, serial(&log)).run();
    assert!(summary.results[0].passed());
}

#[test]
fn skipped_step_never_runs_body() {
    let log = EventLog::new();
    let test = Arc::new(Test::function("m/a()", || panic!("must not run")));
    let plan = Plan::from_steps([Step::skip(test, SkipInfo::default())]);
    let summary = Runner::new(plan, serial(&log)).run();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.issues, 0);
}

#[test]
fn isolated_bodies_hold_the_main_lane() {
    let log = EventLog::new();
    let runner = runner(
        vec![
            Test::function("m/bound()", || {
                if on_main_lane() {
                    Ok(())
                } else {
                    Err("not on the main lane".into())
                }
            }),
            Test::function("m/free()", || {
                if on_main_lane() {
                    Err("unexpectedly on the main lane".into())
                } else {
                    Ok(())
                }
            })
            .nonisolated(),
        ],
        Configuration {
            is_main_actor_isolation_enforced: true,
            ..serial(&log)
        },
    );
    let summary = runner.run();
    assert_eq!(summary.passed, 2, "{:?}", summary.results);
}

#[test]
fn parallel_run_keeps_plan_order_in_results() {
    let log = EventLog::new();
    let tests = (0..16).map(|i| Test::function(format!("m/t{i}()").as_str(), pass));
    let runner = runner(
        tests.collect(),
        Configuration {
            max_parallelism: std::num::NonZeroUsize::new(4),
            ..Configuration::with_handler(log.handler())
        },
    );
    let summary = runner.run();
    let ids: Vec<String> = summary.results.iter().map(|r| r.test.id().to_string()).collect();
    let expected: Vec<String> = (0..16).map(|i| format!("m/t{i}()")).collect();
    assert_eq!(ids, expected);
    assert_eq!(log.kinds().first(), Some(&"planStarted"));
    assert_eq!(log.kinds().last(), Some(&"planEnded"));
}

#[test]
fn nested_parallel_run_on_the_lane_reuses_it() {
    let outer_log = EventLog::new();
    let runner = runner(
        vec![Test::function("m/outer()", || {
            let inner_log = EventLog::new();
            let inner = Runner::for_tests(
                (0..4).map(|i| Test::function(format!("n/t{i}()").as_str(), pass)),
                Configuration {
                    is_main_actor_isolation_enforced: true,
                    max_parallelism: std::num::NonZeroUsize::new(2),
                    ..Configuration::with_handler(inner_log.handler())
                },
            )?;
            let summary = inner.run();
            if summary.passed == 4 {
                Ok(())
            } else {
                Err(format!("inner run: {:?}", summary.results).into())
            }
        })],
        Configuration {
            is_main_actor_isolation_enforced: true,
            max_parallelism: std::num::NonZeroUsize::new(2),
            ..Configuration::with_handler(outer_log.handler())
        },
    );
    let summary = runner.run();
    assert_eq!(summary.passed, 1, "{:?}", summary.results);
}

#[test]
fn task_outliving_its_test_reports_to_the_run() {
    let log = EventLog::new();
    let pending: Arc<Mutex<Option<std::thread::JoinHandle<bool>>>> = Arc::default();
    let (release, gate) = std::sync::mpsc::channel::<()>();
    let gate = Mutex::new(Some(gate));

    let spawner = {
        let pending = Arc::clone(&pending);
        move || -> BodyResult {
            let gate = gate.lock().take().ok_or("gate already taken")?;
            let handle = crate::task::spawn(move || {
                let _ = gate.recv();
                record_issue("after its test ended")
            })?;
            *pending.lock() = Some(handle);
            Ok(())
        }
    };
    let joiner = {
        let pending = Arc::clone(&pending);
        move || -> BodyResult {
            let handle = pending.lock().take().ok_or("no pending task")?;
            release.send(()).map_err(|e| e.to_string())?;
            let delivered = handle.join().map_err(|_| "task panicked")?;
            if delivered {
                Ok(())
            } else {
                Err("issue was dropped".into())
            }
        }
    };
    let runner = runner(
        vec![
            Test::function("m/a()", spawner),
            Test::function("m/b()", joiner),
        ],
        serial(&log),
    );
    let summary = runner.run();

    assert_eq!(summary.passed, 2, "{:?}", summary.results);
    assert_eq!(summary.unattributed.len(), 1);
    assert_eq!(summary.issues, 1);
    assert!(summary.has_failures());
    assert!(!log.kinds_for(&"m/a()".into()).contains(&"issueRecorded"));
    assert!(!log.kinds_for(&"m/b()".into()).contains(&"issueRecorded"));
    assert!(log.kinds().contains(&"issueRecorded"));
}
