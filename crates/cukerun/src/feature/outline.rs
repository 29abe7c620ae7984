//! Scenario outline expansion.

use super::{ExampleRow, ExpandedScenario, ScenarioOutline, Step};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([^<>]+)>").unwrap_or_else(|_| unreachable!("placeholder regex is valid"))
});

/// Replace `<name>` with the row value for `name`; unknown names are kept
/// verbatim.
fn substitute(text: &str, values: &[(String, String)]) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let name = caps.get(1).map_or("", |m| m.as_str());
            values
                .iter()
                .find(|(key, _)| key == name)
                .map_or_else(|| whole.to_owned(), |(_, value)| value.clone())
        })
        .into_owned()
}

fn substitute_step(step: &Step, values: &[(String, String)]) -> Step {
    Step {
        keyword: step.keyword,
        text: substitute(&step.text, values),
        argument: step
            .argument
            .as_ref()
            .map(|argument| argument.map_text(|text| substitute(text, values))),
        location: step.location.clone(),
    }
}

pub(super) fn expand(outline: &ScenarioOutline) -> Vec<ExpandedScenario> {
    let mut expanded = Vec::new();
    for examples in &outline.examples {
        let Some((header, rows)) = examples.table.rows().split_first() else {
            continue;
        };
        for row in rows {
            let values: Vec<(String, String)> =
                header.iter().cloned().zip(row.iter().cloned()).collect();
            let index = expanded.len();
            let mut tags = outline.tags.clone();
            tags.extend(examples.tags.iter().filter(|tag| !outline.tags.contains(tag)).cloned());
            expanded.push(ExpandedScenario {
                name: format!(
                    "{} (example {})",
                    substitute(&outline.name, &values),
                    index + 1
                ),
                tags,
                steps: outline
                    .steps
                    .iter()
                    .map(|step| substitute_step(step, &values))
                    .collect(),
                location: outline.location.clone(),
                example: Some(ExampleRow {
                    index,
                    values,
                    location: examples.location.clone(),
                }),
            });
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Examples, Location, MultilineArgument, ScenarioDefinition};
    use cukerun_patterns::StepKeyword;

    fn cells(row: &[&str]) -> Vec<String> {
        row.iter().map(|cell| (*cell).to_owned()).collect()
    }

    fn outline() -> ScenarioOutline {
        let at = |line| Location::new("eat.feature", line);
        ScenarioOutline {
            name: "eating <eat> of <start>".into(),
            tags: vec!["@cukes".into()],
            steps: vec![
                Step::new(StepKeyword::Given, "there are <start> cucumbers", at(3)),
                Step::new(StepKeyword::When, "I eat <eat> cucumbers", at(4)).with_argument(
                    MultilineArgument::Table(vec![cells(&["<eat>", "<unknown>"])].into()),
                ),
            ],
            examples: vec![
                Examples {
                    tags: Vec::new(),
                    table: vec![cells(&["start", "eat"]), cells(&["12", "5"]), cells(&["20", "5"])]
                        .into(),
                    location: at(7),
                },
                Examples {
                    tags: vec!["@slow".into(), "@cukes".into()],
                    table: vec![cells(&["start", "eat"]), cells(&["100", "99"])].into(),
                    location: at(12),
                },
            ],
            location: at(2),
        }
    }

    #[test]
    fn one_scenario_per_row() {
        let expanded = ScenarioDefinition::Outline(outline()).expand();
        let names: Vec<&str> = expanded.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "eating 5 of 12 (example 1)",
                "eating 5 of 20 (example 2)",
                "eating 99 of 100 (example 3)"
            ]
        );
    }

    #[test]
    fn substitutes_step_text_and_table_cells() {
        let expanded = expand(&outline());
        let Some(first) = expanded.first() else {
            panic!("rows expected");
        };
        let texts: Vec<&str> = first.steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["there are 12 cucumbers", "I eat 5 cucumbers"]);
        let table = first
            .steps
            .get(1)
            .and_then(|step| step.argument.as_ref())
            .and_then(MultilineArgument::as_table);
        assert_eq!(
            table.map(|t| t.rows().to_vec()),
            Some(vec![cells(&["5", "<unknown>"])])
        );
    }

    #[test]
    fn examples_tags_are_merged_once() {
        let expanded = expand(&outline());
        assert_eq!(
            expanded.last().map(|s| s.tags.clone()),
            Some(vec!["@cukes".to_owned(), "@slow".to_owned()])
        );
        assert_eq!(expanded.first().map(|s| s.tags.len()), Some(1));
    }

    #[test]
    fn headers_may_contain_spaces() {
        let values = [("first name".to_owned(), "bob".to_owned())];
        assert_eq!(
            substitute("I am <first name> <last name>", &values),
            "I am bob <last name>"
        );
    }

    #[test]
    fn header_only_examples_produce_nothing() {
        let mut bare = outline();
        bare.examples.truncate(1);
        if let Some(examples) = bare.examples.first_mut() {
            examples.table = vec![cells(&["start", "eat"])].into();
        }
        assert!(expand(&bare).is_empty());
    }
}
