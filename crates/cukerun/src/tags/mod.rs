//! Tag filtering and tag occurrence limits.
//!
//! A [`TagFilter`] is the conjunction of every tag option supplied for a
//! run. An option is either a legacy clause list (`@smoke,~@wip`, optionally
//! carrying limits such as `@critical:3`) or a boolean expression
//! (`@smoke and not @wip`).

mod expr;
mod limits;

pub use limits::{TagLimit, TagLimitViolation, check_limits, count_tags};

use expr::TagExpr;
use std::collections::HashSet;
use thiserror::Error;

/// A tag option could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tag option at byte {position}: {message}")]
pub struct TagFilterError {
    position: usize,
    message: String,
}

impl TagFilterError {
    pub(crate) fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }

    /// Byte offset of the problem within the option.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    tag: String,
    negated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TagOption {
    Clause(Vec<Term>),
    Expression(TagExpr),
}

impl TagOption {
    fn matches(&self, tags: &HashSet<&str>) -> bool {
        match self {
            Self::Clause(terms) => {
                let mut positives = terms.iter().filter(|term| !term.negated).peekable();
                let wanted = positives.peek().is_none()
                    || positives.any(|term| tags.contains(term.tag.as_str()));
                let vetoed = terms
                    .iter()
                    .any(|term| term.negated && tags.contains(term.tag.as_str()));
                wanted && !vetoed
            }
            Self::Expression(expr) => expr.eval(tags),
        }
    }
}

/// Normalise a tag to its `@`-prefixed form.
pub(crate) fn normalise_tag(tag: &str) -> String {
    let tag = tag.trim();
    if tag.starts_with('@') {
        tag.to_owned()
    } else {
        format!("@{tag}")
    }
}

/// Conjunction of tag options.
///
/// An empty filter accepts everything.
///
/// # Examples
/// ```
/// use cukerun::TagFilter;
///
/// let filter = TagFilter::parse(["@smoke,@wip", "~@slow"])?;
/// assert!(filter.matches(["@wip"]));
/// assert!(!filter.matches(["@smoke", "@slow"]));
/// assert!(!filter.matches(["@other"]));
/// # Ok::<(), cukerun::TagFilterError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    options: Vec<TagOption>,
}

impl TagFilter {
    /// Parse several options, combining them with AND. Limits embedded in
    /// legacy clauses are ignored here; use
    /// [`RunOptions::with_tags`](crate::RunOptions::with_tags) to keep them.
    ///
    /// # Errors
    /// Returns the first [`TagFilterError`] encountered.
    pub fn parse<'a>(options: impl IntoIterator<Item = &'a str>) -> Result<Self, TagFilterError> {
        let mut filter = Self::default();
        for option in options {
            filter.push_option(option)?;
        }
        Ok(filter)
    }

    /// Add one option, returning any `@tag:N` limits it declares.
    ///
    /// # Errors
    /// Returns [`TagFilterError`] for an empty option, a malformed limit or
    /// a malformed boolean expression.
    pub fn push_option(&mut self, option: &str) -> Result<Vec<TagLimit>, TagFilterError> {
        if option.trim().is_empty() {
            return Err(TagFilterError::new(0, "empty tag option"));
        }
        if expr::looks_boolean(option) {
            self.options.push(TagOption::Expression(expr::parse(option)?));
            return Ok(Vec::new());
        }

        let mut terms = Vec::new();
        let mut limits = Vec::new();
        let mut offset = 0usize;
        for raw in option.split(',') {
            let start = offset + (raw.len() - raw.trim_start().len());
            offset += raw.len() + 1;
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(TagFilterError::new(start, "empty tag in clause"));
            }
            let (negated, body) = raw
                .strip_prefix('~')
                .map_or((false, raw), |rest| (true, rest.trim_start()));
            let (name, limit) = match body.rsplit_once(':') {
                Some((name, count)) => {
                    let max = count.trim().parse::<usize>().map_err(|_| {
                        TagFilterError::new(start, format!("invalid tag limit {count:?}"))
                    })?;
                    (name, Some(max))
                }
                None => (body, None),
            };
            let tag = normalise_tag(name);
            if tag.len() < 2 {
                return Err(TagFilterError::new(start, "missing tag name"));
            }
            if let (false, Some(max)) = (negated, limit) {
                limits.push(TagLimit::new(tag.clone(), max));
            }
            terms.push(Term { tag, negated });
        }
        self.options.push(TagOption::Clause(terms));
        Ok(limits)
    }

    /// Whether no options were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Whether a scenario carrying `tags` should run.
    pub fn matches<'a>(&self, tags: impl IntoIterator<Item = &'a str>) -> bool {
        let set: HashSet<&str> = tags.into_iter().collect();
        self.options.iter().all(|option| option.matches(&set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn filter(options: &[&str]) -> TagFilter {
        TagFilter::parse(options.iter().copied())
            .unwrap_or_else(|err| panic!("{options:?} should parse: {err}"))
    }

    #[rstest]
    #[case(&["@wip"], false)]
    #[case(&["@smoke"], true)]
    #[case(&[], true)]
    fn negated_tag_excludes_only_that_tag(#[case] tags: &[&str], #[case] expected: bool) {
        assert_eq!(filter(&["~@wip"]).matches(tags.iter().copied()), expected);
    }

    #[rstest]
    #[case(&["@smoke"], true)]
    #[case(&["@wip"], true)]
    #[case(&["@smoke", "@wip"], true)]
    #[case(&["@other"], false)]
    #[case(&[], false)]
    fn comma_means_or(#[case] tags: &[&str], #[case] expected: bool) {
        assert_eq!(filter(&["@smoke,@wip"]).matches(tags.iter().copied()), expected);
    }

    #[test]
    fn repeated_options_mean_and() {
        let both = filter(&["@a", "@b"]);
        assert!(both.matches(["@a", "@b"]));
        assert!(!both.matches(["@a"]));
    }

    #[test]
    fn negation_in_a_clause_vetoes_positive_matches() {
        let clause = filter(&["@a,~@b"]);
        assert!(clause.matches(["@a"]));
        assert!(!clause.matches(["@a", "@b"]));
    }

    #[test]
    fn bare_names_gain_an_at_sign() {
        assert!(filter(&["smoke"]).matches(["@smoke"]));
    }

    #[test]
    fn limits_are_returned_and_still_filter() {
        let mut tags = TagFilter::default();
        let Ok(limits) = tags.push_option("@critical:3,~@slow:1") else {
            panic!("option should parse");
        };
        assert_eq!(limits, vec![TagLimit::new("@critical".into(), 3)]);
        assert!(tags.matches(["@critical"]));
    }

    #[test]
    fn boolean_and_legacy_options_combine() {
        let mixed = filter(&["@a and not @b", "@c,@d"]);
        assert!(mixed.matches(["@a", "@d"]));
        assert!(!mixed.matches(["@a", "@b", "@d"]));
        assert!(!mixed.matches(["@a"]));
    }

    #[rstest]
    #[case("", 0)]
    #[case("@a,,@b", 3)]
    #[case("@a:lots", 0)]
    #[case("@ok, ~", 5)]
    fn malformed_options_report_position(#[case] option: &str, #[case] position: usize) {
        let Err(err) = TagFilter::default().push_option(option) else {
            panic!("{option:?} should be rejected");
        };
        assert_eq!(err.position(), position);
    }
}
