// src/resource/expr/parser.rs

//! Recursive-descent parser.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or      := and ("or" and)*
//! and     := not ("and" not)*
//! not     := "not" not | compare
//! compare := primary (cmp_op primary)*        a < b < c  ==  a < b and b < c
//! primary := literal | "-" number | name "." name | name "(" or ")"
//!          | "(" or ")" | "(" or "," ... ")" | "[" (or ("," or)* ","?)? "]"
//! ```

use super::ExpressionError;
use super::ast::{Builtin, CmpOp, Expr, Value};
use super::lexer::{Spanned, Token, tokenize};

/// Deepest nesting of parentheses, brackets, calls and `not` accepted.
pub const MAX_DEPTH: usize = 64;

/// Parse `text` into an expression tree.
///
/// The expression must reference at least one resource field.
pub fn parse(text: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;

    if let Some(extra) = parser.peek_spanned() {
        return Err(ExpressionError::UnexpectedToken {
            found: extra.token.to_string(),
            offset: extra.offset,
            expected: "end of expression".to_string(),
        });
    }

    if expr.aliases().is_empty() {
        return Err(ExpressionError::NoResources);
    }

    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|s| &s.token)
    }

    fn peek_spanned(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, expected: &str) -> ExpressionError {
        match self.peek_spanned() {
            Some(s) => ExpressionError::UnexpectedToken {
                found: s.token.to_string(),
                offset: s.offset,
                expected: expected.to_string(),
            },
            None => ExpressionError::UnexpectedEnd {
                expected: expected.to_string(),
            },
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<(), ExpressionError> {
        if self.peek() == Some(&token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ExpressionError>,
    ) -> Result<T, ExpressionError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExpressionError::TooDeep { limit: MAX_DEPTH });
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    fn parse_or(&mut self) -> Result<Expr, ExpressionError> {
        self.nested(Self::parse_or_chain)
    }

    fn parse_or_chain(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.parse_not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.parse_not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, ExpressionError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let inner = self.nested(Self::parse_not)?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_compare()
    }

    fn compare_op(&mut self) -> Option<CmpOp> {
        let op = match self.peek()? {
            Token::Eq => CmpOp::Eq,
            Token::Ne => CmpOp::Ne,
            Token::Lt => CmpOp::Lt,
            Token::Le => CmpOp::Le,
            Token::Gt => CmpOp::Gt,
            Token::Ge => CmpOp::Ge,
            Token::In => CmpOp::In,
            Token::Not if self.peek_at(1) == Some(&Token::In) => {
                self.pos += 1;
                CmpOp::NotIn
            }
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn parse_compare(&mut self) -> Result<Expr, ExpressionError> {
        let first = self.parse_primary()?;

        let mut operands = vec![first];
        let mut ops = Vec::new();
        while let Some(op) = self.compare_op() {
            ops.push(op);
            operands.push(self.parse_primary()?);
        }

        if ops.is_empty() {
            return Ok(operands.remove(0));
        }

        let mut chain: Option<Expr> = None;
        for (i, op) in ops.into_iter().enumerate() {
            let link = Expr::Compare {
                op,
                lhs: Box::new(operands[i].clone()),
                rhs: Box::new(operands[i + 1].clone()),
            };
            chain = Some(match chain {
                None => link,
                Some(prev) => Expr::And(Box::new(prev), Box::new(link)),
            });
        }

        chain.ok_or_else(|| self.unexpected("comparison"))
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        let Some(spanned) = self.advance() else {
            return Err(ExpressionError::UnexpectedEnd {
                expected: "a value".to_string(),
            });
        };

        match spanned.token {
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            Token::Int(n) => Ok(Expr::Literal(Value::Int(n))),
            Token::Float(n) => Ok(Expr::Literal(Value::Float(n))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Minus => {
                let literal = match self.peek() {
                    Some(Token::Int(n)) => Value::Int(-n),
                    Some(Token::Float(n)) => Value::Float(-n),
                    _ => return Err(self.unexpected("a number after '-'")),
                };
                self.pos += 1;
                Ok(Expr::Literal(literal))
            }
            Token::Ident(name) => self.parse_name(name),
            Token::LParen => {
                let first = self.parse_or()?;
                if self.peek() != Some(&Token::Comma) {
                    self.expect(Token::RParen, "')'")?;
                    return Ok(first);
                }
                let mut items = vec![first];
                while self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                    if self.peek() == Some(&Token::RParen) {
                        break;
                    }
                    items.push(self.parse_or()?);
                }
                self.expect(Token::RParen, "')'")?;
                Ok(Expr::List(items))
            }
            Token::LBracket => {
                let mut items = Vec::new();
                while self.peek() != Some(&Token::RBracket) {
                    items.push(self.parse_or()?);
                    if self.peek() == Some(&Token::Comma) {
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                self.expect(Token::RBracket, "']'")?;
                Ok(Expr::List(items))
            }
            other => Err(ExpressionError::UnexpectedToken {
                found: other.to_string(),
                offset: spanned.offset,
                expected: "a value".to_string(),
            }),
        }
    }

    fn parse_name(&mut self, name: String) -> Result<Expr, ExpressionError> {
        match self.peek() {
            Some(Token::Dot) => {
                self.pos += 1;
                let Some(Token::Ident(field)) = self.peek().cloned() else {
                    return Err(self.unexpected("a field name after '.'"));
                };
                self.pos += 1;
                Ok(Expr::Field { alias: name, field })
            }
            Some(Token::LParen) => {
                let func = Builtin::from_name(&name)
                    .ok_or(ExpressionError::CallNotAllowed { name: name.clone() })?;
                self.pos += 1;
                let arg = self.parse_or()?;
                self.expect(Token::RParen, "')'")?;
                Ok(Expr::Call {
                    func,
                    arg: Box::new(arg),
                })
            }
            _ => Err(ExpressionError::BareName { name }),
        }
    }
}

