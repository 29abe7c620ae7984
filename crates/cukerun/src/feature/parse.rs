//! Conversion from the `gherkin` parser's document tree.

use super::{
    Background, DataTable, Examples, Feature, Location, MultilineArgument, Rule, Scenario,
    ScenarioDefinition, ScenarioOutline, Step,
};
use crate::tags::normalise_tag;
use cukerun_patterns::StepKeyword;
use gherkin::GherkinEnv;
use std::path::Path;
use thiserror::Error;

/// A feature document could not be read or parsed.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Parsing in-memory source failed.
    #[error("failed to parse feature {name}: {source}")]
    Parse {
        /// Name the source was given.
        name: String,
        /// Parser failure.
        #[source]
        source: gherkin::ParseError,
    },
    /// Reading or parsing a file failed.
    #[error("failed to load feature file: {0}")]
    File(#[from] gherkin::ParseFileError),
}

impl Feature {
    /// Parse Gherkin `source`, recording `name` as the document path.
    ///
    /// # Errors
    /// Returns [`FeatureError::Parse`] when the source is not valid Gherkin.
    pub fn parse(source: &str, name: impl Into<String>) -> Result<Self, FeatureError> {
        let name = name.into();
        match gherkin::Feature::parse(source, GherkinEnv::default()) {
            Ok(parsed) => Ok(convert_feature(&parsed, &name)),
            Err(source) => Err(FeatureError::Parse { name, source }),
        }
    }

    /// Read and parse the feature file at `path`.
    ///
    /// # Errors
    /// Returns [`FeatureError::File`] when the file cannot be read or parsed.
    pub fn parse_path(path: impl AsRef<Path>) -> Result<Self, FeatureError> {
        let path = path.as_ref();
        let parsed = gherkin::Feature::parse_path(path, GherkinEnv::default())?;
        Ok(convert_feature(&parsed, &path.display().to_string()))
    }
}

fn tags(raw: &[String]) -> Vec<String> {
    raw.iter().map(|tag| normalise_tag(tag)).collect()
}

fn convert_steps(steps: &[gherkin::Step], file: &str) -> Vec<Step> {
    steps
        .iter()
        .map(|step| {
            let keyword = step
                .keyword
                .parse::<StepKeyword>()
                .ok()
                .or_else(|| StepKeyword::try_from(step.ty).ok())
                .unwrap_or(StepKeyword::Given);
            let argument = match (&step.table, &step.docstring) {
                (Some(table), _) => Some(MultilineArgument::Table(DataTable::from(
                    table.rows.clone(),
                ))),
                (None, Some(content)) => Some(MultilineArgument::DocString {
                    content: content.clone(),
                    content_type: None,
                }),
                (None, None) => None,
            };
            Step {
                keyword,
                text: step.value.clone(),
                argument,
                location: Location::new(file, step.position.line),
            }
        })
        .collect()
}

fn convert_scenario(scenario: &gherkin::Scenario, file: &str) -> ScenarioDefinition {
    let steps = convert_steps(&scenario.steps, file);
    let location = Location::new(file, scenario.position.line);
    if scenario.examples.is_empty() {
        return ScenarioDefinition::Scenario(Scenario {
            name: scenario.name.clone(),
            tags: tags(&scenario.tags),
            steps,
            location,
        });
    }
    let examples = scenario
        .examples
        .iter()
        .map(|examples| Examples {
            tags: tags(&examples.tags),
            table: examples
                .table
                .as_ref()
                .map(|table| DataTable::from(table.rows.clone()))
                .unwrap_or_default(),
            location: Location::new(file, examples.position.line),
        })
        .collect();
    ScenarioDefinition::Outline(ScenarioOutline {
        name: scenario.name.clone(),
        tags: tags(&scenario.tags),
        steps,
        examples,
        location,
    })
}

fn convert_background(background: &gherkin::Background, file: &str) -> Background {
    Background {
        steps: convert_steps(&background.steps, file),
        location: Location::new(file, background.position.line),
    }
}

fn convert_rule(rule: &gherkin::Rule, file: &str) -> Rule {
    Rule {
        name: rule.name.clone(),
        tags: tags(&rule.tags),
        background: rule.background.as_ref().map(|background| convert_background(background, file)),
        scenarios: rule
            .scenarios
            .iter()
            .map(|scenario| convert_scenario(scenario, file))
            .collect(),
        location: Location::new(file, rule.position.line),
    }
}

fn convert_feature(feature: &gherkin::Feature, file: &str) -> Feature {
    let description: Option<String> = feature.description.clone().into();
    Feature {
        name: feature.name.clone(),
        description: description.filter(|text| !text.trim().is_empty()),
        tags: tags(&feature.tags),
        location: Location::new(file, feature.position.line),
        background: feature.background.as_ref().map(|background| convert_background(background, file)),
        scenarios: feature
            .scenarios
            .iter()
            .map(|scenario| convert_scenario(scenario, file))
            .collect(),
        rules: feature.rules.iter().map(|rule| convert_rule(rule, file)).collect(),
    }
}
