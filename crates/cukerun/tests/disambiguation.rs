//! Choosing between overlapping step definitions.

use cukerun::{
    Expression, ExecutionError, Feature, Resolver, RunOptions, Runner, Status, StepRegistry, resolve,
};
use std::rc::Rc;

#[derive(Default)]
struct Picked(Vec<&'static str>);

fn overlapping() -> StepRegistry<Picked> {
    let mut steps = StepRegistry::new();
    steps
        .given("Simple (.*) test", |p: &mut Picked, _: String| p.0.push("with test"))
        .unwrap_or_else(|err| panic!("{err}"));
    steps
        .given("Simple (.*)", |p: &mut Picked, _: String| p.0.push("bare"))
        .unwrap_or_else(|err| panic!("{err}"));
    steps
}

fn source(pattern: &StepRegistry<Picked>, text: &str, guess: bool) -> Result<String, ExecutionError> {
    resolve(text, pattern.find_matches(text, text), guess).map(|m| m.definition().pattern().source().to_owned())
}

#[test]
fn guess_mode_picks_the_tighter_capture() {
    let steps = overlapping();
    assert_eq!(
        source(&steps, "Simple lucid test", true).ok().as_deref(),
        Some("Simple (.*) test")
    );
}

#[test]
fn without_guess_mode_overlap_is_ambiguous_with_a_hint() {
    let steps = overlapping();
    let Err(err) = source(&steps, "Simple lucid test", false) else {
        panic!("overlap should be ambiguous");
    };
    let message = err.to_string();
    assert!(message.contains("Simple (.*) test"));
    assert!(message.contains("disambiguation.rs"));
    assert!(message.contains("guess mode"));
}

#[test]
fn identical_patterns_are_ambiguous_even_when_guessing() {
    let mut steps = StepRegistry::<Picked>::new();
    for _ in 0..2 {
        steps
            .given("Simple (.*)", |_: &mut Picked, _: String| {})
            .unwrap_or_else(|err| panic!("{err}"));
    }
    let Err(ExecutionError::Ambiguous { candidates, guess_hint, .. }) = source(&steps, "Simple lucid test", true) else {
        panic!("identical patterns cannot be told apart");
    };
    assert_eq!(candidates.len(), 2);
    assert!(!guess_hint);
}

#[test]
fn resolution_is_deterministic() {
    let steps = overlapping();
    let mut first = Resolver::new(&steps, true);
    let mut second = Resolver::new(&steps, true);
    for _ in 0..3 {
        let a = first
            .step_match("Simple lucid test", "Given Simple lucid test")
            .unwrap_or_else(|err| panic!("{err}"));
        let b = second
            .step_match("Simple lucid test", "Given Simple lucid test")
            .unwrap_or_else(|err| panic!("{err}"));
        assert!(Rc::ptr_eq(a.definition(), b.definition()));
    }
}

#[test]
fn guess_mode_applies_during_runs() {
    let feature = Feature::parse(
        "Feature: Guess\n  Scenario: Pick\n    Given Simple lucid test\n    Given Simple lucid\n",
        "guess.feature",
    )
    .unwrap_or_else(|err| panic!("{err}"));
    let log = Rc::new(std::cell::RefCell::new(Vec::new()));
    let world_log = Rc::clone(&log);
    let mut steps = overlapping();
    steps
        .after(&[], move |p, _| world_log.borrow_mut().extend(p.0.iter().copied()))
        .unwrap_or_else(|err| panic!("{err}"));

    let strict = Runner::with_default_world(overlapping())
        .run(std::slice::from_ref(&feature), &RunOptions::default())
        .unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(strict.step_counts.get(Status::Failed), 1);

    let guessing = Runner::with_default_world(steps)
        .run(&[feature], &RunOptions::default().guess(true))
        .unwrap_or_else(|err| panic!("{err}"));
    assert!(guessing.is_success());
    assert_eq!(*log.borrow(), ["with test", "bare"]);
}

#[test]
fn placeholder_patterns_compete_with_regexes() {
    let mut steps = StepRegistry::<Picked>::new();
    steps
        .given(Expression("I have {n:u32} apples"), |p: &mut Picked, _: u32| p.0.push("expression"))
        .unwrap_or_else(|err| panic!("{err}"));
    steps
        .given(r"^I have (.*)$", |p: &mut Picked, _: String| p.0.push("regex"))
        .unwrap_or_else(|err| panic!("{err}"));
    let text = "I have 3 apples";
    assert_eq!(source(&steps, text, true).ok().as_deref(), Some("I have {n:u32} apples"));
}
