//! Per-scenario context handed to world factories and hooks.

use crate::feature::{ExampleRow, Location, Step};
use crate::operator::Operator;
use crate::results::Status;
use crate::tags::normalise_tag;

/// Identity and tags of the scenario being executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioInfo {
    /// Name of the enclosing feature.
    pub feature: String,
    /// Scenario name; outline rows carry an `(example N)` suffix.
    pub name: String,
    /// Effective tags: feature, scenario and examples tags, `@`-prefixed.
    pub tags: Vec<String>,
    /// Where the scenario (or the examples row) is declared.
    pub location: Location,
    /// The examples row this scenario was expanded from.
    pub example: Option<ExampleRow>,
}

impl ScenarioInfo {
    /// Whether the scenario carries `tag` (with or without the `@`).
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = normalise_tag(tag);
        self.tags.iter().any(|candidate| *candidate == tag)
    }

    pub(crate) fn tag_refs(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

/// A step that has just finished, as seen by `AfterStep` hooks.
#[derive(Debug, Clone, Copy)]
pub struct CompletedStep<'a> {
    /// The executed step after outline substitution.
    pub step: &'a Step,
    /// Its outcome.
    pub status: Status,
}

/// Context passed to every hook.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    /// The scenario the hook fires for.
    pub scenario: &'a ScenarioInfo,
    /// Scenario status so far; `None` before any step ran.
    pub status: Option<Status>,
    /// The finished step, for `AfterStep` hooks.
    pub step: Option<CompletedStep<'a>>,
}

impl<'a> HookContext<'a> {
    pub(crate) fn new(scenario: &'a ScenarioInfo, status: Option<Status>) -> Self {
        Self {
            scenario,
            status,
            step: None,
        }
    }

    pub(crate) fn after_step(scenario: &'a ScenarioInfo, step: &'a Step, status: Status) -> Self {
        Self {
            scenario,
            status: Some(status),
            step: Some(CompletedStep { step, status }),
        }
    }
}

/// What a world factory sees when building the world for a scenario.
#[derive(Debug, Clone, Copy)]
pub struct WorldContext<'a> {
    /// The scenario about to run.
    pub scenario: &'a ScenarioInfo,
    /// Operator prompt channel, when the runner has one.
    pub operator: Option<&'a Operator>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_tag_ignores_the_at_sign() {
        let info = ScenarioInfo {
            feature: "Billing".into(),
            name: "Refund".into(),
            tags: vec!["@slow".into()],
            location: Location::new("billing.feature", 4),
            example: None,
        };
        assert!(info.has_tag("slow"));
        assert!(info.has_tag("@slow"));
        assert!(!info.has_tag("@fast"));
    }
}
