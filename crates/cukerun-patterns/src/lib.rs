//! Step-pattern compilation and argument extraction for `cukerun`.
//!
//! A [`StepPattern`] wraps either a raw regular expression or a placeholder
//! expression such as `there are {count:u32} items`. Matching a step text
//! yields positional [`Argument`]s carrying their character offsets, which the
//! runtime uses for invocation, highlighted display and usage reports.

mod argument;
mod errors;
mod expression;
mod hint;
mod keyword;
mod pattern;
mod regex_source;
mod specificity;

pub use argument::{Argument, format_arguments};
pub use errors::{PatternError, PlaceholderErrorInfo};
pub use expression::build_regex_from_expression;
pub use hint::type_hint_fragment;
pub use keyword::{StepKeyword, StepKeywordParseError, UnsupportedStepType};
pub use pattern::{PatternSyntax, StepPattern};
pub use specificity::SpecificityScore;
