//! Compiled step patterns.

use crate::argument::{Argument, format_arguments};
use crate::errors::PatternError;
use crate::expression::{self, tokenize};
use crate::regex_source;
use crate::specificity::SpecificityScore;
use regex::Regex;
use std::fmt;

/// How a pattern source is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternSyntax {
    /// A regular expression used exactly as written (unanchored unless the
    /// source anchors itself).
    Regex,
    /// A placeholder expression compiled to an anchored regular expression.
    Expression,
}

/// A step pattern compiled once at registration time.
#[derive(Debug, Clone)]
pub struct StepPattern {
    source: String,
    syntax: PatternSyntax,
    regex: Regex,
    specificity: SpecificityScore,
}

impl StepPattern {
    /// Compile `source` as a raw regular expression.
    ///
    /// # Errors
    /// Returns [`PatternError::Regex`] when `source` is not a valid regex.
    pub fn regex(source: impl Into<String>) -> Result<Self, PatternError> {
        Self::new(source, PatternSyntax::Regex)
    }

    /// Compile `source` as a placeholder expression.
    ///
    /// # Errors
    /// Returns [`PatternError::Placeholder`] for malformed placeholders and
    /// [`PatternError::Regex`] when the generated regex is rejected.
    pub fn expression(source: impl Into<String>) -> Result<Self, PatternError> {
        Self::new(source, PatternSyntax::Expression)
    }

    /// Compile `source` using the given syntax.
    ///
    /// # Errors
    /// See [`StepPattern::regex`] and [`StepPattern::expression`].
    pub fn new(source: impl Into<String>, syntax: PatternSyntax) -> Result<Self, PatternError> {
        let source = source.into();
        let (regex, specificity) = match syntax {
            PatternSyntax::Regex => {
                let regex = Regex::new(&source)?;
                let specificity = SpecificityScore {
                    literal_chars: regex_source::literal_chars(&source),
                    capture_count: regex.captures_len().saturating_sub(1),
                };
                (regex, specificity)
            }
            PatternSyntax::Expression => {
                let tokens = tokenize(&source)?;
                let regex = Regex::new(&expression::regex_source(&tokens))?;
                (regex, expression::specificity(&tokens))
            }
        };
        Ok(Self {
            source,
            syntax,
            regex,
            specificity,
        })
    }

    /// Pattern text as registered.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Syntax the source was compiled with.
    #[must_use]
    pub fn syntax(&self) -> PatternSyntax {
        self.syntax
    }

    /// Underlying compiled regex.
    #[must_use]
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }

    /// Specificity used to rank competing matches.
    #[must_use]
    pub fn specificity(&self) -> SpecificityScore {
        self.specificity
    }

    /// Number of capture groups, which is the number of arguments every
    /// successful match yields.
    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.specificity.capture_count
    }

    /// Match `text`, returning one [`Argument`] per capture group in
    /// left-to-right order, or `None` when the pattern does not match.
    #[must_use]
    pub fn match_arguments(&self, text: &str) -> Option<Vec<Argument>> {
        let captures = self.regex.captures(text)?;
        Some(
            captures
                .iter()
                .skip(1)
                .map(|capture| Argument::from_capture(text, capture))
                .collect(),
        )
    }

    /// Match `text` and render it with each argument passed through
    /// `wrapper`.
    #[must_use]
    pub fn format(&self, text: &str, wrapper: impl Fn(&str) -> String) -> Option<String> {
        let arguments = self.match_arguments(text)?;
        Some(format_arguments(text, &arguments, wrapper))
    }
}

impl fmt::Display for StepPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.syntax {
            PatternSyntax::Regex => write!(f, "/{}/", self.source),
            PatternSyntax::Expression => write!(f, "{:?}", self.source),
        }
    }
}

impl PartialEq for StepPattern {
    fn eq(&self, other: &Self) -> bool {
        self.syntax == other.syntax && self.source == other.source
    }
}

impl Eq for StepPattern {}
