//! Tokeniser for placeholder expressions.

use crate::errors::{PatternError, placeholder_error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Literal(String),
    Placeholder {
        start: usize,
        name: String,
        hint: Option<String>,
    },
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Split `source` into literal runs and placeholders.
///
/// `{{` and `}}` stand for literal braces; any other brace must belong to a
/// well-formed `{name}` or `{name:hint}` placeholder.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' if chars.peek().is_some_and(|&(_, next)| next == '{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek().is_some_and(|&(_, next)| next == '}') => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(placeholder_error("unmatched '}'", pos, None)),
            '{' => {
                if !chars.peek().is_some_and(|&(_, next)| is_name_start(next)) {
                    return Err(placeholder_error(
                        "placeholder must start with a letter or '_'",
                        pos,
                        None,
                    ));
                }
                let mut name = String::new();
                while let Some(&(_, next)) = chars.peek() {
                    if !is_name_char(next) {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                let hint = match chars.next() {
                    Some((_, '}')) => None,
                    Some((_, ':')) => Some(read_hint(&mut chars, pos, &name)?),
                    Some(_) => {
                        return Err(placeholder_error(
                            "unexpected character",
                            pos,
                            Some(name),
                        ));
                    }
                    None => {
                        return Err(placeholder_error("missing closing '}'", pos, Some(name)));
                    }
                };
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Placeholder {
                    start: pos,
                    name,
                    hint,
                });
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

fn read_hint(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    start: usize,
    name: &str,
) -> Result<String, PatternError> {
    let mut hint = String::new();
    for (_, ch) in chars.by_ref() {
        match ch {
            '}' if hint.is_empty() => {
                return Err(placeholder_error("empty type hint", start, Some(name.into())));
            }
            '}' => return Ok(hint),
            c if c.is_whitespace() || c == '{' => {
                return Err(placeholder_error(
                    "invalid type hint",
                    start,
                    Some(name.into()),
                ));
            }
            c => hint.push(c),
        }
    }
    Err(placeholder_error("missing closing '}'", start, Some(name.into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        tokenize(source).unwrap_or_else(|err| panic!("{source:?} should tokenize: {err}"))
    }

    #[test]
    fn splits_literals_and_typed_placeholders() {
        assert_eq!(
            lex("I eat {count:u32} cukes"),
            vec![
                Token::Literal("I eat ".into()),
                Token::Placeholder {
                    start: 6,
                    name: "count".into(),
                    hint: Some("u32".into()),
                },
                Token::Literal(" cukes".into()),
            ]
        );
    }

    #[test]
    fn doubled_braces_are_literal() {
        assert_eq!(lex("{{json}}"), vec![Token::Literal("{json}".into())]);
    }

    #[test]
    fn adjacent_placeholders_have_no_literal_between() {
        let tokens = lex("{a}{b}");
        assert_eq!(tokens.len(), 2);
        assert!(matches!(tokens.first(), Some(Token::Placeholder { start: 0, .. })));
        assert!(matches!(tokens.get(1), Some(Token::Placeholder { start: 3, .. })));
    }

    #[test]
    fn rejects_stray_closing_brace() {
        let Err(PatternError::Placeholder(info)) = tokenize("oops }") else {
            panic!("stray brace should fail");
        };
        assert_eq!(info.position, 5);
        assert_eq!(info.placeholder, None);
    }

    #[test]
    fn rejects_unterminated_placeholder() {
        let Err(PatternError::Placeholder(info)) = tokenize("a {value") else {
            panic!("unterminated placeholder should fail");
        };
        assert_eq!(info.message, "missing closing '}'");
        assert_eq!(info.placeholder.as_deref(), Some("value"));
    }

    #[test]
    fn rejects_empty_or_spaced_hints() {
        assert!(tokenize("{n:}").is_err());
        assert!(tokenize("{n:big int}").is_err());
        assert!(tokenize("{ n}").is_err());
    }
}
