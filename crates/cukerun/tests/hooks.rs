//! Hook ordering and failure handling during a run.

use cukerun::{
    ExecutionError, Feature, HookContext, HookPhase, RunOptions, RunResult, Runner, Status, StepError,
    StepRegistry,
};
use rstest::{fixture, rstest};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

struct Trace(Log);

impl Trace {
    fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }
}

const FEATURE: &str = "Feature: Hooks
  @tagged
  Scenario: One
    Given a step
    When another step
";

#[fixture]
fn log() -> Log {
    Log::default()
}

fn registry() -> StepRegistry<Trace> {
    let mut steps = StepRegistry::new();
    steps
        .given("^a step$", |t: &mut Trace| t.push("step:a"))
        .unwrap_or_else(|err| panic!("{err}"));
    steps
        .when("^another step$", |t: &mut Trace| t.push("step:another"))
        .unwrap_or_else(|err| panic!("{err}"));
    steps
}

fn run(steps: StepRegistry<Trace>, log: &Log, source: &str) -> RunResult<Trace> {
    let feature = Feature::parse(source, "hooks.feature").unwrap_or_else(|err| panic!("{err}"));
    let world_log = Rc::clone(log);
    Runner::new(steps, move |_: &cukerun::WorldContext<'_>| Trace(Rc::clone(&world_log)))
        .run(&[feature], &RunOptions::default())
        .unwrap_or_else(|err| panic!("{err}"))
}

#[rstest]
fn hooks_wrap_steps_in_order(log: Log) {
    let mut steps = registry();
    steps
        .around(&[], |t, _, run| {
            t.push("around:enter");
            run(t);
            t.push("around:exit");
        })
        .unwrap_or_else(|err| panic!("{err}"));
    steps
        .before(&[], |t, ctx| t.push(format!("before:{}", ctx.scenario.name)))
        .unwrap_or_else(|err| panic!("{err}"));
    steps
        .after_step(&[], |t, ctx| {
            let text = ctx.step.map(|done| done.step.text.clone()).unwrap_or_default();
            t.push(format!("after_step:{text}"));
        })
        .unwrap_or_else(|err| panic!("{err}"));
    steps
        .after(&[], |t, ctx| t.push(format!("after:{}", ctx.status.map_or("none", Status::as_str))))
        .unwrap_or_else(|err| panic!("{err}"));
    let run = run(steps, &log, FEATURE);
    assert!(run.is_success());
    assert_eq!(
        *log.borrow(),
        [
            "around:enter",
            "before:One",
            "step:a",
            "after_step:a step",
            "step:another",
            "after_step:another step",
            "after:passed",
            "around:exit",
        ]
    );
}

#[rstest]
fn failing_before_hook_skips_steps_but_runs_after_hooks(log: Log) {
    let mut steps = registry();
    steps
        .before(&[], |_, _| Err::<(), _>(StepError::failed("no database")))
        .unwrap_or_else(|err| panic!("{err}"));
    steps
        .after(&[], |t, ctx| t.push(format!("after:{:?}", ctx.status)))
        .unwrap_or_else(|err| panic!("{err}"));
    let run = run(steps, &log, FEATURE);
    let scenarios = run.results.scenarios(None);
    let [scenario] = scenarios.as_slice() else {
        panic!("one scenario expected");
    };
    assert_eq!(scenario.status(), Status::Failed);
    assert!(scenario.steps().iter().all(|step| step.status() == Status::Skipped));
    assert!(matches!(
        scenario.first_error(),
        Some(ExecutionError::HookFailed { phase: HookPhase::Before, .. })
    ));
    assert_eq!(*log.borrow(), ["after:Some(Failed)"]);
    assert_eq!(run.exit_code, 1);
}

#[rstest]
fn panicking_after_hook_fails_a_passing_scenario(log: Log) {
    let mut steps = registry();
    steps
        .after(&[], |_: &mut Trace, _: &HookContext<'_>| -> Result<(), StepError> { panic!("cleanup failed") })
        .unwrap_or_else(|err| panic!("{err}"));
    let run = run(steps, &log, FEATURE);
    assert_eq!(run.step_counts.get(Status::Passed), 2);
    assert_eq!(run.scenario_counts.get(Status::Failed), 1);
    assert_eq!(run.exit_code, 1);
}

#[rstest]
fn around_hook_that_never_yields_leaves_steps_skipped(log: Log) {
    let mut steps = registry();
    steps
        .around(&[], |t, _, _run| t.push("swallowed"))
        .unwrap_or_else(|err| panic!("{err}"));
    let run = run(steps, &log, FEATURE);
    assert_eq!(run.step_counts.get(Status::Skipped), 2);
    assert_eq!(*log.borrow(), ["swallowed"]);
}

#[rstest]
#[case::matching("@tagged", true)]
#[case::negated("not @tagged", false)]
#[case::other("@elsewhere", false)]
fn tagged_hooks_fire_only_for_selected_scenarios(log: Log, #[case] expression: &str, #[case] fires: bool) {
    let mut steps = registry();
    steps
        .before(&[expression], |t, _| t.push("tagged"))
        .unwrap_or_else(|err| panic!("{err}"));
    run(steps, &log, FEATURE);
    assert_eq!(log.borrow().contains(&"tagged".to_owned()), fires);
}

#[rstest]
fn after_step_fires_only_for_invoked_steps(log: Log) {
    let mut steps = registry();
    steps
        .given("^a failing step$", |_: &mut Trace| -> Result<(), StepError> { Err("nope".into()) })
        .unwrap_or_else(|err| panic!("{err}"));
    steps
        .after_step(&[], |t, ctx| t.push(format!("after_step:{:?}", ctx.step.map(|done| done.status))))
        .unwrap_or_else(|err| panic!("{err}"));
    let source = "Feature: Hooks\n  Scenario: Broken\n    Given a failing step\n    When another step\n";
    run(steps, &log, source);
    assert_eq!(*log.borrow(), ["after_step:Some(Failed)"]);
}

#[rstest]
fn repeated_scenarios_run_their_hooks_once(log: Log) {
    let mut steps = registry();
    steps
        .before(&[], |t, _| t.push("before"))
        .unwrap_or_else(|err| panic!("{err}"));
    let feature = Feature::parse(FEATURE, "hooks.feature").unwrap_or_else(|err| panic!("{err}"));
    let world_log = Rc::clone(&log);
    let run = Runner::new(steps, move |_: &cukerun::WorldContext<'_>| Trace(Rc::clone(&world_log)))
        .run(&[feature.clone(), feature], &RunOptions::default())
        .unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(run.scenario_counts.get(Status::Passed), 2);
    assert_eq!(
        *log.borrow(),
        ["before", "step:a", "step:another", "step:a", "step:another"]
    );
}
