//! Document tree consumed by the runner.
//!
//! The tree mirrors what a Gherkin parser produces: features holding an
//! optional background, a list of scenarios or scenario outlines, and rules
//! grouping further scenarios under their own tags and background. It can
//! be built by hand or converted from the `gherkin` crate (see
//! [`Feature::parse`]). Outlines are expanded into one
//! [`ExpandedScenario`] per examples row before execution.

mod outline;
mod parse;

pub use parse::FeatureError;

use cukerun_patterns::StepKeyword;
use derive_more::{Deref, From};
use std::collections::HashMap;
use std::fmt;

/// A `file:line` position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    /// Source file, as given to the parser or captured at registration.
    pub file: String,
    /// One-based line number.
    pub line: usize,
}

impl Location {
    /// Position `line` in `file`.
    #[must_use]
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Location of the caller of a `#[track_caller]` function.
    #[must_use]
    pub fn caller(location: &std::panic::Location<'_>) -> Self {
        let line = usize::try_from(location.line()).unwrap_or(usize::MAX);
        Self::new(location.file(), line)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Rows of cells attached to a step or an examples block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, From)]
pub struct DataTable(Vec<Vec<String>>);

impl DataTable {
    /// All rows, header included.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.0
    }

    /// First row, conventionally the header.
    #[must_use]
    pub fn header(&self) -> Option<&[String]> {
        self.0.first().map(Vec::as_slice)
    }

    /// Every row after the header keyed by header cell.
    #[must_use]
    pub fn hashes(&self) -> Vec<HashMap<&str, &str>> {
        let Some((header, body)) = self.0.split_first() else {
            return Vec::new();
        };
        body.iter()
            .map(|row| {
                header
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter().map(String::as_str))
                    .collect()
            })
            .collect()
    }

    fn map_cells(&self, f: impl Fn(&str) -> String) -> Self {
        Self(
            self.0
                .iter()
                .map(|row| row.iter().map(|cell| f(cell)).collect())
                .collect(),
        )
    }
}

/// Multiline argument trailing a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultilineArgument {
    /// A data table.
    Table(DataTable),
    /// A doc string.
    DocString {
        /// Text between the delimiters.
        content: String,
        /// Media type written after the opening delimiter, if any.
        content_type: Option<String>,
    },
}

impl MultilineArgument {
    /// The table, if this is one.
    #[must_use]
    pub fn as_table(&self) -> Option<&DataTable> {
        match self {
            Self::Table(table) => Some(table),
            Self::DocString { .. } => None,
        }
    }

    /// The doc string content, if this is one.
    #[must_use]
    pub fn as_doc_string(&self) -> Option<&str> {
        match self {
            Self::DocString { content, .. } => Some(content),
            Self::Table(_) => None,
        }
    }

    pub(crate) fn map_text(&self, f: impl Fn(&str) -> String) -> Self {
        match self {
            Self::Table(table) => Self::Table(table.map_cells(f)),
            Self::DocString {
                content,
                content_type,
            } => Self::DocString {
                content: f(content),
                content_type: content_type.clone(),
            },
        }
    }
}

/// One step line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Keyword as written.
    pub keyword: StepKeyword,
    /// Text after the keyword.
    pub text: String,
    /// Optional table or doc string.
    pub argument: Option<MultilineArgument>,
    /// Where the step is written.
    pub location: Location,
}

impl Step {
    /// A step without a multiline argument.
    #[must_use]
    pub fn new(keyword: StepKeyword, text: impl Into<String>, location: Location) -> Self {
        Self {
            keyword,
            text: text.into(),
            argument: None,
            location,
        }
    }

    /// Attach a multiline argument.
    #[must_use]
    pub fn with_argument(mut self, argument: MultilineArgument) -> Self {
        self.argument = Some(argument);
        self
    }
}

/// Steps prefixed to every scenario of a feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Background {
    /// Background steps in order.
    pub steps: Vec<Step>,
    /// Where the background starts.
    pub location: Location,
}

/// A plain scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Title.
    pub name: String,
    /// Tags declared on the scenario itself.
    pub tags: Vec<String>,
    /// Steps in order.
    pub steps: Vec<Step>,
    /// Where the scenario starts.
    pub location: Location,
}

/// A block of example rows for an outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Examples {
    /// Tags declared on the examples block.
    pub tags: Vec<String>,
    /// Header row followed by value rows.
    pub table: DataTable,
    /// Where the block starts.
    pub location: Location,
}

/// A scenario template expanded once per examples row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioOutline {
    /// Title, which may contain `<name>` placeholders.
    pub name: String,
    /// Tags declared on the outline.
    pub tags: Vec<String>,
    /// Template steps.
    pub steps: Vec<Step>,
    /// Example blocks.
    pub examples: Vec<Examples>,
    /// Where the outline starts.
    pub location: Location,
}

/// Either kind of scenario as written in a feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioDefinition {
    /// A plain scenario.
    Scenario(Scenario),
    /// A scenario outline.
    Outline(ScenarioOutline),
}

impl ScenarioDefinition {
    /// Title as written.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Scenario(scenario) => &scenario.name,
            Self::Outline(outline) => &outline.name,
        }
    }

    /// Tags declared on the scenario or outline.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        match self {
            Self::Scenario(scenario) => &scenario.tags,
            Self::Outline(outline) => &outline.tags,
        }
    }

    /// Where it is written.
    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            Self::Scenario(scenario) => &scenario.location,
            Self::Outline(outline) => &outline.location,
        }
    }

    /// Example blocks; empty for a plain scenario.
    #[must_use]
    pub fn examples(&self) -> &[Examples] {
        match self {
            Self::Scenario(_) => &[],
            Self::Outline(outline) => &outline.examples,
        }
    }

    /// Executable scenarios: the scenario itself, or one per example row.
    #[must_use]
    pub fn expand(&self) -> Vec<ExpandedScenario> {
        match self {
            Self::Scenario(scenario) => vec![ExpandedScenario {
                name: scenario.name.clone(),
                tags: scenario.tags.clone(),
                steps: scenario.steps.clone(),
                location: scenario.location.clone(),
                example: None,
            }],
            Self::Outline(outline) => outline::expand(outline),
        }
    }
}

/// A `Rule:` block: scenarios sharing tags and a background of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Title.
    pub name: String,
    /// Tags inherited by every scenario of the rule.
    pub tags: Vec<String>,
    /// Steps run after the feature background for each of the rule's
    /// scenarios.
    pub background: Option<Background>,
    /// Scenarios and outlines in document order.
    pub scenarios: Vec<ScenarioDefinition>,
    /// Where the rule starts.
    pub location: Location,
}

impl Rule {
    /// Background steps, or nothing when the rule has no background.
    #[must_use]
    pub fn background_steps(&self) -> &[Step] {
        self.background
            .as_ref()
            .map(|background| background.steps.as_slice())
            .unwrap_or_default()
    }
}

/// A parsed feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Title.
    pub name: String,
    /// Free text below the title.
    pub description: Option<String>,
    /// Tags inherited by every scenario.
    pub tags: Vec<String>,
    /// Where the feature starts; `file` identifies the document.
    pub location: Location,
    /// Steps shared by every scenario.
    pub background: Option<Background>,
    /// Scenarios and outlines outside any rule, in document order.
    pub scenarios: Vec<ScenarioDefinition>,
    /// Rules in document order, after the feature's own scenarios.
    pub rules: Vec<Rule>,
}

impl Feature {
    /// Background steps, or nothing when the feature has no background.
    #[must_use]
    pub fn background_steps(&self) -> &[Step] {
        self.background
            .as_ref()
            .map(|background| background.steps.as_slice())
            .unwrap_or_default()
    }
}

/// The example row an expanded scenario was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleRow {
    /// Zero-based row index across all example blocks of the outline.
    pub index: usize,
    /// Header cell to value.
    pub values: Vec<(String, String)>,
    /// Where the examples block starts.
    pub location: Location,
}

/// A scenario ready to execute, with outline placeholders substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedScenario {
    /// Title with placeholders substituted.
    pub name: String,
    /// Scenario tags plus examples tags (feature tags excluded).
    pub tags: Vec<String>,
    /// Own steps, without the background.
    pub steps: Vec<Step>,
    /// Where the scenario or outline starts.
    pub location: Location,
    /// Source row for outline expansions.
    pub example: Option<ExampleRow>,
}
