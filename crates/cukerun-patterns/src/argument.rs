//! Positional arguments captured from a step text.

use regex::Match;
use std::ops::Range;

/// One capture group's contribution to a step match.
///
/// `value` and `offset` are both `None` when the group sits in an optional
/// branch that did not take part in the match. `offset` counts characters,
/// not bytes, from the start of the step text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    value: Option<String>,
    offset: Option<usize>,
    span: Option<Range<usize>>,
}

impl Argument {
    pub(crate) fn from_capture(text: &str, capture: Option<Match<'_>>) -> Self {
        capture.map_or(
            Self {
                value: None,
                offset: None,
                span: None,
            },
            |m| Self {
                value: Some(m.as_str().to_owned()),
                offset: Some(char_offset(text, m.start())),
                span: Some(m.range()),
            },
        )
    }

    /// Captured text, if the group participated.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Character index of the capture within the step text.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Byte range of the capture within the step text.
    #[must_use]
    pub fn byte_range(&self) -> Option<Range<usize>> {
        self.span.clone()
    }
}

fn char_offset(text: &str, byte_index: usize) -> usize {
    text.get(..byte_index).map_or(0, |prefix| prefix.chars().count())
}

/// Render `text` with every positioned argument passed through `wrapper`.
///
/// Spans that overlap an earlier one are left unwrapped, so nested groups
/// only highlight their outermost capture. Text outside the arguments is
/// copied unchanged.
///
/// # Examples
/// ```
/// use cukerun_patterns::{StepPattern, format_arguments};
///
/// let pattern = StepPattern::regex(r"^I have (\d+) cukes in my (\w+)$")?;
/// let text = "I have 7 cukes in my belly";
/// let args = pattern.match_arguments(text).unwrap_or_default();
/// let shown = format_arguments(text, &args, |arg| format!("[{arg}]"));
/// assert_eq!(shown, "I have [7] cukes in my [belly]");
/// # Ok::<(), cukerun_patterns::PatternError>(())
/// ```
#[must_use]
pub fn format_arguments(text: &str, arguments: &[Argument], wrapper: impl Fn(&str) -> String) -> String {
    let mut spans: Vec<Range<usize>> = arguments
        .iter()
        .filter_map(Argument::byte_range)
        .collect();
    spans.sort_by_key(|span| (span.start, std::cmp::Reverse(span.end)));

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for span in spans {
        if span.start < cursor {
            continue;
        }
        let (Some(before), Some(inner)) = (text.get(cursor..span.start), text.get(span.clone()))
        else {
            continue;
        };
        out.push_str(before);
        out.push_str(&wrapper(inner));
        cursor = span.end;
    }
    out.push_str(text.get(cursor..).unwrap_or_default());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn arguments(pattern: &str, text: &str) -> Vec<Argument> {
        let Ok(re) = Regex::new(pattern) else {
            panic!("test regex {pattern:?} must compile");
        };
        let Some(caps) = re.captures(text) else {
            panic!("{pattern:?} should match {text:?}");
        };
        caps.iter()
            .skip(1)
            .map(|capture| Argument::from_capture(text, capture))
            .collect()
    }

    #[test]
    fn offsets_count_characters() {
        let args = arguments("^naïve (\\w+)$", "naïve café");
        assert_eq!(args.first().and_then(Argument::offset), Some(6));
        assert_eq!(args.first().and_then(Argument::byte_range), Some(7..12));
    }

    #[test]
    fn skipped_optional_group_has_no_offset() {
        let args = arguments("^I (don't )?like it$", "I like it");
        assert_eq!(
            args,
            vec![Argument {
                value: None,
                offset: None,
                span: None
            }]
        );
    }

    #[test]
    fn zero_width_capture_keeps_its_offset() {
        let args = arguments("^a(b*)c$", "ac");
        assert_eq!(args.first().and_then(Argument::value), Some(""));
        assert_eq!(args.first().and_then(Argument::offset), Some(1));
    }

    #[test]
    fn format_skips_nested_spans() {
        let text = "abc";
        let args = arguments("^((a)b)c$", text);
        assert_eq!(format_arguments(text, &args, |s| format!("<{s}>")), "<ab>c");
    }

    #[test]
    fn format_without_arguments_copies_text() {
        assert_eq!(format_arguments("plain", &[], |s| s.to_uppercase()), "plain");
    }
}
