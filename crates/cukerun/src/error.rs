//! Error types raised while registering and running steps.

use crate::registry::HookPhase;
use crate::tags::TagLimitViolation;
use cukerun_patterns::PatternError;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Outcome of a step body or hook that did not pass.
///
/// Step bodies return `Result<(), E>` for any `E: Into<StepError>`; panics
/// are caught and become [`StepError::Panic`].
#[derive(Debug, Error)]
pub enum StepError {
    /// The step is declared but not yet implemented.
    #[error("{}", .0.as_deref().unwrap_or("pending"))]
    Pending(Option<String>),
    /// The step reported a failure.
    #[error("{message}")]
    Failed {
        /// Failure description.
        message: String,
    },
    /// The step panicked.
    #[error("{message}{}", .location.as_ref().map(|loc| format!(" ({loc})")).unwrap_or_default())]
    Panic {
        /// Panic payload rendered as text.
        message: String,
        /// `file:line:column` of the panic, when known.
        location: Option<String>,
        /// Filtered backtrace captured at the panic site.
        backtrace: Option<String>,
    },
    /// A captured argument could not be converted to the parameter type.
    #[error("argument {index} ({value:?}) is invalid: {reason}")]
    InvalidArgument {
        /// Zero-based position of the argument.
        index: usize,
        /// Text that failed to convert.
        value: String,
        /// Conversion error message.
        reason: String,
    },
    /// The operator did not answer a question.
    #[error(transparent)]
    Ask(#[from] AskError),
    /// Any other error returned by a step body.
    #[error(transparent)]
    Other(Box<dyn StdError + Send + Sync>),
}

impl StepError {
    /// Build a failure from any displayable message.
    pub fn failed(message: impl fmt::Display) -> Self {
        Self::Failed {
            message: message.to_string(),
        }
    }

    /// Whether this is an explicit pending marker.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Backtrace captured for a panic, if any.
    #[must_use]
    pub fn backtrace(&self) -> Option<&str> {
        match self {
            Self::Panic { backtrace, .. } => backtrace.as_deref(),
            _ => None,
        }
    }
}

impl From<String> for StepError {
    fn from(message: String) -> Self {
        Self::Failed { message }
    }
}

impl From<&str> for StepError {
    fn from(message: &str) -> Self {
        Self::failed(message)
    }
}

impl From<Box<dyn StdError + Send + Sync>> for StepError {
    fn from(error: Box<dyn StdError + Send + Sync>) -> Self {
        Self::Other(error)
    }
}

/// Why a single step, hook or scenario did not pass.
///
/// These never abort the run; they are recorded against the step or
/// scenario that raised them.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// No definition matched the step text.
    #[error("undefined step: {text:?}")]
    Undefined {
        /// Step text after outline substitution.
        text: String,
    },
    /// Several definitions matched and none could be preferred.
    #[error("{}", ambiguous_message(.text, .candidates, *.guess_hint))]
    Ambiguous {
        /// Step text after outline substitution.
        text: String,
        /// `location:in pattern` description of every candidate.
        candidates: Vec<String>,
        /// Whether to suggest enabling guess mode.
        guess_hint: bool,
    },
    /// The definition's action takes a different number of arguments.
    #[error("{pattern} expects {expected} argument(s) but the step supplied {actual}")]
    ArityMismatch {
        /// Display form of the definition pattern.
        pattern: String,
        /// Parameters declared by the action.
        expected: usize,
        /// Captured arguments plus the multiline argument, if any.
        actual: usize,
    },
    /// The step is pending.
    #[error("pending: {}", .message.as_deref().unwrap_or("TODO"))]
    Pending {
        /// Optional explanation supplied by the step.
        message: Option<String>,
    },
    /// The step body failed.
    #[error("step {text:?} failed: {source}")]
    StepFailed {
        /// Step text after outline substitution.
        text: String,
        /// Underlying failure.
        #[source]
        source: StepError,
    },
    /// A hook failed.
    #[error("{phase} hook failed: {source}")]
    HookFailed {
        /// Phase the hook was registered for.
        phase: HookPhase,
        /// Underlying failure.
        #[source]
        source: StepError,
    },
}

fn ambiguous_message(text: &str, candidates: &[String], guess_hint: bool) -> String {
    let mut message = format!("ambiguous match of {text:?}:\n");
    for candidate in candidates {
        message.push('\n');
        message.push_str(candidate);
    }
    if guess_hint {
        message.push_str("\n\nenable guess mode to let the runner pick the most specific definition");
    }
    message
}

impl ExecutionError {
    /// The underlying step failure, when there is one.
    #[must_use]
    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            Self::StepFailed { source, .. } | Self::HookFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A step definition or hook could not be registered.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The step pattern does not compile.
    #[error("invalid step pattern {pattern:?} at {location}: {source}")]
    Pattern {
        /// Pattern source.
        pattern: String,
        /// Where the registration happened.
        location: crate::Location,
        /// Compilation failure.
        #[source]
        source: PatternError,
    },
    /// A transform pattern is not a valid regular expression.
    #[error("invalid transform pattern {pattern:?}: {source}")]
    Transform {
        /// Pattern source.
        pattern: String,
        /// Compilation failure.
        #[source]
        source: regex::Error,
    },
    /// A hook body's shape does not suit its phase.
    #[error("{phase} hooks need {} body", if *.phase == HookPhase::Around { "an around" } else { "a plain" })]
    HookShape {
        /// Phase the hook was registered for.
        phase: HookPhase,
    },
    /// A hook tag expression does not parse.
    #[error(transparent)]
    TagExpression(#[from] crate::tags::TagFilterError),
}

/// A run aborted before executing any scenario.
#[derive(Debug, Error)]
pub enum RunError {
    /// One or more tags exceed their declared occurrence cap.
    #[error("{}", limit_message(.0))]
    TagLimitExceeded(Vec<TagLimitViolation>),
}

fn limit_message(violations: &[TagLimitViolation]) -> String {
    let lines: Vec<String> = violations.iter().map(ToString::to_string).collect();
    lines.join("\n")
}

/// Asking the operator a question failed.
#[derive(Debug, Error)]
pub enum AskError {
    /// No answer arrived in time.
    #[error("no answer to {question:?} within {timeout_ms} ms")]
    Timeout {
        /// The question asked.
        question: String,
        /// How long the runner waited.
        timeout_ms: u128,
    },
    /// The answer source reached end of input.
    #[error("operator input closed")]
    Closed,
    /// The run was cancelled while waiting for an answer.
    #[error("run cancelled while waiting for an answer")]
    Cancelled,
    /// Writing the question failed.
    #[error("could not prompt the operator: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_message_lists_candidates_and_hint() {
        let err = ExecutionError::Ambiguous {
            text: "Simple x".into(),
            candidates: vec!["steps.rs:3:in /Simple (.*)/".into(), "steps.rs:9:in /Simple (.*)/".into()],
            guess_hint: true,
        };
        let message = err.to_string();
        assert!(message.contains("steps.rs:3"));
        assert!(message.contains("steps.rs:9"));
        assert!(message.contains("guess mode"));
    }

    #[test]
    fn guess_hint_can_be_suppressed() {
        let err = ExecutionError::Ambiguous {
            text: "Simple x".into(),
            candidates: vec![],
            guess_hint: false,
        };
        assert!(!err.to_string().contains("guess"));
    }

    #[test]
    fn panic_display_includes_location() {
        let err = StepError::Panic {
            message: "boom".into(),
            location: Some("steps.rs:4:9".into()),
            backtrace: None,
        };
        assert_eq!(err.to_string(), "boom (steps.rs:4:9)");
    }

    #[test]
    fn strings_become_failures() {
        assert!(matches!(StepError::from("nope"), StepError::Failed { .. }));
        assert!(StepError::Pending(None).is_pending());
        assert_eq!(StepError::Pending(None).to_string(), "pending");
    }
}
