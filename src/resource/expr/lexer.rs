// src/resource/expr/lexer.rs

use std::fmt;

use super::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Minus,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    In,
    True,
    False,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "name {name:?}"),
            Token::Str(s) => write!(f, "string {s:?}"),
            Token::Int(n) => write!(f, "number {n}"),
            Token::Float(n) => write!(f, "number {n}"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::Comma => f.write_str("','"),
            Token::Dot => f.write_str("'.'"),
            Token::Minus => f.write_str("'-'"),
            Token::Eq => f.write_str("'=='"),
            Token::Ne => f.write_str("'!='"),
            Token::Lt => f.write_str("'<'"),
            Token::Le => f.write_str("'<='"),
            Token::Gt => f.write_str("'>'"),
            Token::Ge => f.write_str("'>='"),
            Token::And => f.write_str("'and'"),
            Token::Or => f.write_str("'or'"),
            Token::Not => f.write_str("'not'"),
            Token::In => f.write_str("'in'"),
            Token::True => f.write_str("'True'"),
            Token::False => f.write_str("'False'"),
        }
    }
}

/// A token plus its byte offset in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub fn tokenize(text: &str) -> Result<Vec<Spanned>, ExpressionError> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let peek = chars.get(i + 1).map(|&(_, c)| c);
        let (token, width) = match c {
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '[' => (Token::LBracket, 1),
            ']' => (Token::RBracket, 1),
            ',' => (Token::Comma, 1),
            '.' => (Token::Dot, 1),
            '-' => (Token::Minus, 1),
            '=' if peek == Some('=') => (Token::Eq, 2),
            '!' if peek == Some('=') => (Token::Ne, 2),
            '<' if peek == Some('=') => (Token::Le, 2),
            '<' => (Token::Lt, 1),
            '>' if peek == Some('=') => (Token::Ge, 2),
            '>' => (Token::Gt, 1),
            '"' | '\'' => {
                let (s, consumed) = lex_string(&chars, i, c)?;
                tokens.push(Spanned {
                    token: Token::Str(s),
                    offset,
                });
                i += consumed;
                continue;
            }
            c if c.is_ascii_digit() => {
                let (token, consumed) = lex_number(&chars, i)?;
                tokens.push(Spanned { token, offset });
                i += consumed;
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_alphanumeric() || chars[i].1 == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().map(|&(_, c)| c).collect();
                let token = match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "in" => Token::In,
                    "True" => Token::True,
                    "False" => Token::False,
                    _ => Token::Ident(word),
                };
                tokens.push(Spanned { token, offset });
                continue;
            }
            other => {
                return Err(ExpressionError::UnexpectedChar { ch: other, offset });
            }
        };

        tokens.push(Spanned { token, offset });
        i += width;
    }

    Ok(tokens)
}

/// Returns the unescaped string and the number of chars consumed, quotes
/// included.
fn lex_string(
    chars: &[(usize, char)],
    start: usize,
    quote: char,
) -> Result<(String, usize), ExpressionError> {
    let mut out = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        let c = chars[i].1;
        if c == quote {
            return Ok((out, i + 1 - start));
        }
        if c == '\\' {
            let escaped = chars.get(i + 1).map(|&(_, c)| c).ok_or(
                ExpressionError::UnterminatedString {
                    offset: chars[start].0,
                },
            )?;
            out.push(match escaped {
                'n' => '\n',
                't' => '\t',
                other => other,
            });
            i += 2;
            continue;
        }
        out.push(c);
        i += 1;
    }

    Err(ExpressionError::UnterminatedString {
        offset: chars[start].0,
    })
}

fn lex_number(chars: &[(usize, char)], start: usize) -> Result<(Token, usize), ExpressionError> {
    let mut i = start;
    let mut seen_dot = false;

    while i < chars.len() {
        let c = chars[i].1;
        if c.is_ascii_digit() {
            i += 1;
        } else if c == '.'
            && !seen_dot
            && chars.get(i + 1).is_some_and(|&(_, next)| next.is_ascii_digit())
        {
            seen_dot = true;
            i += 1;
        } else {
            break;
        }
    }

    let text: String = chars[start..i].iter().map(|&(_, c)| c).collect();
    let token = if seen_dot {
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| ExpressionError::InvalidNumber { text: text.clone() })?
    } else {
        text.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| ExpressionError::InvalidNumber { text: text.clone() })?
    };

    Ok((token, i - start))
}
