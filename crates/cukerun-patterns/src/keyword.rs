//! Step keywords.
//!
//! Matching never depends on the keyword: `Given`, `When` and `Then`
//! definitions are interchangeable aliases. The keyword is kept for display
//! and for the registry usage report.

use gherkin::StepType;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Keyword attached to a step definition or a document step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKeyword {
    /// Context.
    Given,
    /// Action.
    When,
    /// Outcome.
    Then,
    /// Continues the previous keyword.
    And,
    /// Continues the previous keyword with contrast.
    But,
}

const NAMES: [(StepKeyword, &str); 5] = [
    (StepKeyword::Given, "Given"),
    (StepKeyword::When, "When"),
    (StepKeyword::Then, "Then"),
    (StepKeyword::And, "And"),
    (StepKeyword::But, "But"),
];

impl StepKeyword {
    /// Canonical English spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
        }
    }
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword text that is not one of the supported English keywords.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown step keyword `{0}`")]
pub struct StepKeywordParseError(pub String);

impl FromStr for StepKeyword {
    type Err = StepKeywordParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(trimmed))
            .map(|(keyword, _)| *keyword)
            .ok_or_else(|| StepKeywordParseError(trimmed.to_owned()))
    }
}

/// A parser step type with no keyword equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unsupported step type {0:?}")]
pub struct UnsupportedStepType(pub StepType);

impl TryFrom<StepType> for StepKeyword {
    type Error = UnsupportedStepType;

    fn try_from(ty: StepType) -> Result<Self, Self::Error> {
        match ty {
            StepType::Given => Ok(Self::Given),
            StepType::When => Ok(Self::When),
            StepType::Then => Ok(Self::Then),
            #[expect(unreachable_patterns, reason = "parser may add step types")]
            other => Err(UnsupportedStepType(other)),
        }
    }
}
