//! Run-level policies: wip verdicts, cancellation and operator prompts.

use cukerun::{
    AskError, CancellationToken, ExecutionError, Feature, Operator, RunOptions, Runner, Status, StepError,
    StepRegistry, WorldContext,
};
use rstest::rstest;
use std::io;
use std::time::Duration;

#[derive(Default)]
struct Desk {
    operator: Option<Operator>,
    answer: String,
}

fn parse(source: &str) -> Feature {
    Feature::parse(source, "desk.feature").unwrap_or_else(|err| panic!("{err}"))
}

fn steps() -> StepRegistry<Desk> {
    let mut steps = StepRegistry::new();
    steps
        .given("^it works$", |_: &mut Desk| {})
        .unwrap_or_else(|err| panic!("{err}"));
    steps
        .given("^it breaks$", |_: &mut Desk| -> Result<(), StepError> { Err("broken".into()) })
        .unwrap_or_else(|err| panic!("{err}"));
    steps
        .when(r#"^I ask "([^"]*)"$"#, |desk: &mut Desk, question: String| -> Result<(), StepError> {
            let Some(operator) = desk.operator.as_ref() else {
                return Err(StepError::failed("no operator"));
            };
            desk.answer = operator.ask(&question, Duration::from_millis(50))?;
            Ok(())
        })
        .unwrap_or_else(|err| panic!("{err}"));
    steps
        .then(r#"^the answer is "([^"]*)"$"#, |desk: &mut Desk, expected: String| {
            if desk.answer == expected { Ok(()) } else { Err(format!("got {:?}", desk.answer)) }
        })
        .unwrap_or_else(|err| panic!("{err}"));
    steps
}

#[rstest]
#[case::a_pass_fails_wip("Given it works", true, 1)]
#[case::no_pass_keeps_wip_green("Given it breaks", true, 0)]
#[case::normal_pass("Given it works", false, 0)]
#[case::normal_failure("Given it breaks", false, 1)]
fn wip_inverts_the_verdict(#[case] step: &str, #[case] wip: bool, #[case] exit_code: i32) {
    let feature = parse(&format!("Feature: Wip\n  Scenario: Only\n    {step}\n"));
    let run = Runner::with_default_world(steps())
        .run(&[feature], &RunOptions::default().wip(wip))
        .unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(run.exit_code, exit_code);
    assert_eq!(run.results.overall_failure(), exit_code == 1);
}

#[test]
fn cancelling_mid_run_leaves_later_scenarios_unvisited() {
    let token = CancellationToken::new();
    let mut steps = steps();
    let trigger = token.clone();
    steps
        .given("^stop everything$", move |_: &mut Desk| trigger.cancel())
        .unwrap_or_else(|err| panic!("{err}"));
    let feature = parse(
        "Feature: Cancel
  Scenario: First
    Given stop everything
    And it works

  Scenario: Second
    Given it works
",
    );
    let run = Runner::with_default_world(steps)
        .with_cancellation(token)
        .run(&[feature], &RunOptions::default())
        .unwrap_or_else(|err| panic!("{err}"));
    assert!(run.cancelled);
    assert_eq!(run.exit_code, 1);
    assert_eq!(run.scenario_counts.total(), 1);
    assert_eq!(run.step_counts.get(Status::Passed), 1);
    assert_eq!(run.step_counts.get(Status::Skipped), 1);
}

#[test]
fn cancelled_token_runs_nothing() {
    let runner = Runner::with_default_world(steps());
    runner.cancellation_token().cancel();
    let run = runner
        .run(&[parse("Feature: Idle\n  Scenario: Never\n    Given it works\n")], &RunOptions::default())
        .unwrap_or_else(|err| panic!("{err}"));
    assert!(run.cancelled);
    assert_eq!(run.scenario_counts.total(), 0);
}

fn operator_runner(operator: Operator) -> Runner<Desk> {
    Runner::new(steps(), |ctx: &WorldContext<'_>| Desk {
        operator: ctx.operator.cloned(),
        answer: String::new(),
    })
    .with_operator(operator)
}

#[test]
fn operator_answers_reach_the_step() {
    let operator = Operator::new(io::Cursor::new("blue\n"), io::sink());
    let feature = parse(
        "Feature: Ask\n  Scenario: Colour\n    When I ask \"Favourite colour?\"\n    Then the answer is \"blue\"\n",
    );
    let run = operator_runner(operator)
        .run(&[feature], &RunOptions::default())
        .unwrap_or_else(|err| panic!("{err}"));
    assert!(run.is_success());
}

struct Silent;

impl io::Read for Silent {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        std::thread::sleep(Duration::from_secs(5));
        Ok(0)
    }
}

#[test]
fn unanswered_questions_fail_the_step() {
    let operator = Operator::new(io::BufReader::new(Silent), io::sink());
    let feature = parse("Feature: Ask\n  Scenario: Silence\n    When I ask \"Anyone?\"\n");
    let run = operator_runner(operator)
        .run(&[feature], &RunOptions::default())
        .unwrap_or_else(|err| panic!("{err}"));
    let failed = run.results.steps(Some(Status::Failed));
    let [step] = failed.as_slice() else {
        panic!("the asking step should fail");
    };
    assert!(matches!(
        step.error(),
        Some(ExecutionError::StepFailed { source: StepError::Ask(AskError::Timeout { .. }), .. })
    ));
}
