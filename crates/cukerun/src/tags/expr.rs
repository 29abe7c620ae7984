//! Boolean tag expressions: `@fast and not (@slow or @flaky)`.

use super::TagFilterError;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TagExpr {
    Tag(String),
    Not(Box<TagExpr>),
    And(Box<TagExpr>, Box<TagExpr>),
    Or(Box<TagExpr>, Box<TagExpr>),
}

impl TagExpr {
    pub(crate) fn eval(&self, tags: &HashSet<&str>) -> bool {
        match self {
            Self::Tag(tag) => tags.contains(tag.as_str()),
            Self::Not(inner) => !inner.eval(tags),
            Self::And(left, right) => left.eval(tags) && right.eval(tags),
            Self::Or(left, right) => left.eval(tags) || right.eval(tags),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Tag(String),
    And,
    Or,
    Not,
    Open,
    Close,
}

/// Whether `option` uses boolean syntax rather than legacy clauses.
pub(crate) fn looks_boolean(option: &str) -> bool {
    option.contains(['(', ')'])
        || option.split_whitespace().any(|word| {
            ["and", "or", "not"]
                .iter()
                .any(|kw| word.eq_ignore_ascii_case(kw))
        })
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, TagFilterError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();
    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push((pos, Token::Open));
            }
            ')' => {
                chars.next();
                tokens.push((pos, Token::Close));
            }
            _ => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                let token = match word.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ if word.starts_with('@') && word.len() > 1 => Token::Tag(word),
                    _ => {
                        return Err(TagFilterError::new(
                            pos,
                            format!("expected a tag starting with '@', found {word:?}"),
                        ));
                    }
                };
                tokens.push((pos, token));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    cursor: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(_, token)| token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .map_or(self.end, |(pos, _)| *pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).map(|(_, token)| token.clone());
        self.cursor += 1;
        token
    }

    fn or(&mut self) -> Result<TagExpr, TagFilterError> {
        let mut left = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            left = TagExpr::Or(Box::new(left), Box::new(self.and()?));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<TagExpr, TagFilterError> {
        let mut left = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            left = TagExpr::And(Box::new(left), Box::new(self.unary()?));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<TagExpr, TagFilterError> {
        let pos = self.position();
        match self.advance() {
            Some(Token::Not) => Ok(TagExpr::Not(Box::new(self.unary()?))),
            Some(Token::Tag(tag)) => Ok(TagExpr::Tag(tag)),
            Some(Token::Open) => {
                let inner = self.or()?;
                let close = self.position();
                match self.advance() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(TagFilterError::new(close, "expected ')'")),
                }
            }
            Some(_) => Err(TagFilterError::new(pos, "expected a tag, 'not' or '('")),
            None => Err(TagFilterError::new(pos, "unexpected end of tag expression")),
        }
    }
}

pub(crate) fn parse(source: &str) -> Result<TagExpr, TagFilterError> {
    let mut parser = Parser {
        tokens: tokenize(source)?,
        cursor: 0,
        end: source.len(),
    };
    let expr = parser.or()?;
    if parser.peek().is_some() {
        return Err(TagFilterError::new(parser.position(), "unexpected token"));
    }
    Ok(expr)
}
