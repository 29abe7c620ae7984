//! Errors raised while compiling step patterns.

use std::fmt;
use thiserror::Error;

/// Location and description of a malformed placeholder expression.
///
/// # Examples
/// ```
/// use cukerun_patterns::PlaceholderErrorInfo;
/// let info = PlaceholderErrorInfo::new("missing closing '}'", 4, Some("count".into()));
/// assert_eq!(info.position, 4);
/// assert_eq!(info.placeholder.as_deref(), Some("count"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderErrorInfo {
    /// Human readable reason.
    pub message: &'static str,
    /// Zero-based byte offset into the pattern source.
    pub position: usize,
    /// Name of the placeholder being parsed, when one was recognised.
    pub placeholder: Option<String>,
}

impl PlaceholderErrorInfo {
    /// Describe a placeholder failure at `position`.
    #[must_use]
    pub fn new(message: &'static str, position: usize, placeholder: Option<String>) -> Self {
        Self {
            message,
            position,
            placeholder,
        }
    }
}

impl fmt::Display for PlaceholderErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.placeholder {
            write!(
                f,
                "{} in placeholder `{name}` at byte {}",
                self.message, self.position
            )
        } else {
            write!(f, "{} at byte {}", self.message, self.position)
        }
    }
}

/// A step pattern could not be compiled.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The placeholder expression is malformed.
    #[error("{0}")]
    Placeholder(PlaceholderErrorInfo),
    /// The regular expression (raw or generated) failed to compile.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub(crate) fn placeholder_error(
    message: &'static str,
    position: usize,
    placeholder: Option<String>,
) -> PatternError {
    PatternError::Placeholder(PlaceholderErrorInfo::new(message, position, placeholder))
}
