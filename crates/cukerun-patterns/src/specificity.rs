//! Ranking of step patterns by how much literal text they pin down.

use std::cmp::Ordering;

/// How specific a compiled pattern is.
///
/// Larger is more specific: more literal characters first, then fewer
/// captures. The runtime uses `literal_chars` to rank argument-free matches
/// when resolving ambiguous steps in guess mode.
///
/// # Examples
///
/// ```
/// use cukerun_patterns::StepPattern;
///
/// let exact = StepPattern::expression("the light is green")?;
/// let generic = StepPattern::expression("the light is {colour}")?;
/// assert!(exact.specificity() > generic.specificity());
/// # Ok::<(), cukerun_patterns::PatternError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecificityScore {
    /// Characters of the pattern source that lie outside capture groups.
    pub literal_chars: usize,
    /// Number of capture groups.
    pub capture_count: usize,
}

impl Ord for SpecificityScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.literal_chars
            .cmp(&other.literal_chars)
            .then_with(|| other.capture_count.cmp(&self.capture_count))
    }
}

impl PartialOrd for SpecificityScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
