//! JSON export of the registry for documentation tooling.

use super::{HookPhase, StepRegistry};
use serde::Serialize;

#[derive(Serialize)]
struct DumpedArgument<'a> {
    value: Option<&'a str>,
    offset: Option<usize>,
}

#[derive(Serialize)]
struct DumpedUsage<'a> {
    text: &'a str,
    arguments: Vec<DumpedArgument<'a>>,
}

#[derive(Serialize)]
struct DumpedStep<'a> {
    keyword: Option<&'static str>,
    pattern: &'a str,
    syntax: &'static str,
    file: &'a str,
    line: usize,
    used: bool,
    steps: Vec<DumpedUsage<'a>>,
}

#[derive(Serialize)]
struct DumpedHook<'a> {
    phase: HookPhase,
    file: &'a str,
    line: usize,
}

#[derive(Serialize)]
struct UnusedStep<'a> {
    pattern: &'a str,
    file: &'a str,
    line: usize,
}

#[derive(Serialize)]
struct RegistryDump<'a> {
    steps: Vec<DumpedStep<'a>>,
    hooks: Vec<DumpedHook<'a>>,
    unused: Vec<UnusedStep<'a>>,
}

pub(super) fn dump<W>(registry: &StepRegistry<W>) -> serde_json::Result<String> {
    let usage: Vec<_> = registry
        .definitions
        .iter()
        .map(|definition| definition.usage.borrow().clone())
        .collect();
    let steps = registry
        .definitions
        .iter()
        .zip(&usage)
        .map(|(definition, seen)| DumpedStep {
            keyword: definition.keyword.map(|keyword| keyword.as_str()),
            pattern: definition.pattern.source(),
            syntax: match definition.pattern.syntax() {
                cukerun_patterns::PatternSyntax::Regex => "regex",
                cukerun_patterns::PatternSyntax::Expression => "expression",
            },
            file: &definition.location.file,
            line: definition.location.line,
            used: !seen.is_empty(),
            steps: seen
                .iter()
                .map(|step| DumpedUsage {
                    text: &step.text,
                    arguments: step
                        .arguments
                        .iter()
                        .map(|arg| DumpedArgument {
                            value: arg.value(),
                            offset: arg.offset(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();
    let hooks = registry
        .hooks
        .iter()
        .map(|hook| DumpedHook {
            phase: hook.phase(),
            file: &hook.location().file,
            line: hook.location().line,
        })
        .collect();
    let unused = registry
        .definitions
        .iter()
        .zip(&usage)
        .filter(|(_, seen)| seen.is_empty())
        .map(|(definition, _)| UnusedStep {
            pattern: definition.pattern.source(),
            file: &definition.location.file,
            line: definition.location.line,
        })
        .collect();
    serde_json::to_string(&RegistryDump { steps, hooks, unused })
}
