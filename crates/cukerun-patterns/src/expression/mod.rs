//! Placeholder expressions such as `I have {count:u32} cukes`.

mod lexer;

use crate::errors::PatternError;
use crate::hint::type_hint_fragment;
use crate::specificity::SpecificityScore;

pub(crate) use lexer::{Token, tokenize};

/// Translate a placeholder expression into an anchored regex source.
///
/// # Errors
/// Returns [`PatternError::Placeholder`] when the expression contains stray
/// braces or a malformed placeholder.
///
/// # Examples
/// ```
/// use cukerun_patterns::build_regex_from_expression;
/// let source = build_regex_from_expression("I have {count:u32} cukes")?;
/// assert_eq!(source, r"^I have (\d+) cukes$");
/// # Ok::<(), cukerun_patterns::PatternError>(())
/// ```
pub fn build_regex_from_expression(expression: &str) -> Result<String, PatternError> {
    let tokens = tokenize(expression)?;
    Ok(regex_source(&tokens))
}

pub(crate) fn regex_source(tokens: &[Token]) -> String {
    let mut source = String::from("^");
    for token in tokens {
        match token {
            Token::Literal(text) => source.push_str(&regex::escape(text)),
            Token::Placeholder { hint, .. } => {
                source.push('(');
                source.push_str(type_hint_fragment(hint.as_deref()));
                source.push(')');
            }
        }
    }
    source.push('$');
    source
}

pub(crate) fn specificity(tokens: &[Token]) -> SpecificityScore {
    tokens
        .iter()
        .fold(SpecificityScore::default(), |mut score, token| {
            match token {
                Token::Literal(text) => score.literal_chars += text.chars().count(),
                Token::Placeholder { .. } => score.capture_count += 1,
            }
            score
        })
}
