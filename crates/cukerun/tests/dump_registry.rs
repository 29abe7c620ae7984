//! JSON export of definitions, their usage and hooks.

use cukerun::{Expression, HookContext, Resolver, StepRegistry};
use serde_json::Value;

#[derive(Default)]
struct Ledger(Vec<u32>);

fn registry() -> StepRegistry<Ledger> {
    let mut steps = StepRegistry::new();
    steps
        .given(r"^I deposit (\d+) coins$", |ledger: &mut Ledger, n: u32| ledger.0.push(n))
        .unwrap_or_else(|err| panic!("{err}"));
    steps
        .then(Expression("the balance is {n:u32}"), |_: &mut Ledger, _: u32| {})
        .unwrap_or_else(|err| panic!("{err}"));
    steps
        .register("^nobody calls this$", |_: &mut Ledger| {})
        .unwrap_or_else(|err| panic!("{err}"));
    steps
        .before(&["@bank"], |_: &mut Ledger, _: &HookContext<'_>| {})
        .unwrap_or_else(|err| panic!("{err}"));
    steps
}

fn dump(steps: &StepRegistry<Ledger>) -> Value {
    let json = steps.dump_registry().unwrap_or_else(|err| panic!("{err}"));
    serde_json::from_str(&json).unwrap_or_else(|err| panic!("{err}"))
}

#[test]
fn dump_lists_usage_with_argument_offsets() {
    let steps = registry();
    {
        let mut resolver = Resolver::new(&steps, false);
        for text in ["I deposit 15 coins", "I deposit 15 coins", "the balance is 15"] {
            resolver
                .step_match(text, text)
                .unwrap_or_else(|err| panic!("{err}"));
        }
    }
    let dumped = dump(&steps);
    assert_eq!(dumped["steps"].as_array().map(Vec::len), Some(3));

    let deposit = &dumped["steps"][0];
    assert_eq!(deposit["keyword"], "Given");
    assert_eq!(deposit["syntax"], "regex");
    assert_eq!(deposit["used"], true);
    assert!(deposit["file"].as_str().is_some_and(|file| file.ends_with("dump_registry.rs")));
    assert_eq!(deposit["steps"].as_array().map(Vec::len), Some(1));
    assert_eq!(deposit["steps"][0]["arguments"][0]["value"], "15");
    assert_eq!(deposit["steps"][0]["arguments"][0]["offset"], 10);

    let balance = &dumped["steps"][1];
    assert_eq!(balance["syntax"], "expression");
    assert_eq!(balance["steps"][0]["arguments"][0]["offset"], 15);
    assert_eq!(dumped["steps"][2]["keyword"], Value::Null);

    assert_eq!(dumped["unused"].as_array().map(Vec::len), Some(1));
    assert_eq!(dumped["unused"][0]["pattern"], "^nobody calls this$");

    assert_eq!(dumped["hooks"][0]["phase"], "before");
}

#[test]
fn fresh_registry_reports_everything_unused() {
    let dumped = dump(&registry());
    assert_eq!(dumped["unused"].as_array().map(Vec::len), Some(3));
    assert!(
        dumped["steps"]
            .as_array()
            .is_some_and(|steps| steps.iter().all(|step| step["used"] == false))
    );
}
