//! Recursive-descent parser: `||` binds loosest, then `&&`, then equality,
//! then relational, then additive, then multiplicative, then unary.

use super::ast::{BinOp, Expr};
use super::error::SyntaxError;
use super::lexer::{Lexer, Tok};
use crate::literal::Literal;

pub fn parse(src: &str) -> Result<Expr, SyntaxError> {
    let mut p = Parser::new(src)?;
    let expr = p.parse_or()?;
    p.expect_eof()?;
    Ok(expr)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    cur: Tok,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Self, SyntaxError> {
        let mut lexer = Lexer::new(src);
        let cur = lexer.next_token().map_err(|(m, p)| SyntaxError::new(m, p))?;
        Ok(Parser { lexer, cur })
    }

    fn bump(&mut self) -> Result<Tok, SyntaxError> {
        let next = self.lexer.next_token().map_err(|(m, p)| SyntaxError::new(m, p))?;
        Ok(std::mem::replace(&mut self.cur, next))
    }

    fn expect_eof(&self) -> Result<(), SyntaxError> {
        if self.cur == Tok::Eof {
            Ok(())
        } else {
            Err(SyntaxError::new(
                format!("unexpected trailing token: {:?}", self.cur),
                self.lexer.position(),
            ))
        }
    }

    fn expect(&mut self, tok: Tok) -> Result<(), SyntaxError> {
        if self.cur == tok {
            self.bump()?;
            Ok(())
        } else {
            Err(SyntaxError::new(
                format!("expected {:?}, found {:?}", tok, self.cur),
                self.lexer.position(),
            ))
        }
    }

    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_and()?;
        while self.cur == Tok::OrOr {
            self.bump()?;
            let rhs = self.parse_and()?;
            lhs = Expr::Bin(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_equality()?;
        while self.cur == Tok::AndAnd {
            self.bump()?;
            let rhs = self.parse_equality()?;
            lhs = Expr::Bin(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.cur {
                Tok::EqEq => BinOp::Eq,
                Tok::NotEq => BinOp::Ne,
                _ => break,
            };
            self.bump()?;
            let rhs = self.parse_relational()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.cur {
                Tok::Lt => BinOp::Lt,
                Tok::LtEq => BinOp::Le,
                Tok::Gt => BinOp::Gt,
                Tok::GtEq => BinOp::Ge,
                _ => break,
            };
            self.bump()?;
            let rhs = self.parse_additive()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.cur {
                Tok::Plus => BinOp::Add,
                Tok::Minus => BinOp::Sub,
                _ => break,
            };
            self.bump()?;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.cur {
                Tok::Star => BinOp::Mul,
                Tok::Slash => BinOp::Div,
                _ => break,
            };
            self.bump()?;
            let rhs = self.parse_unary()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        match self.cur {
            Tok::Bang => {
                self.bump()?;
                Ok(Expr::Not(Box::new(self.parse_unary()?)))
            }
            Tok::Minus => {
                self.bump()?;
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        match self.bump()? {
            Tok::Int(i) => Ok(Expr::Lit(Literal::int(i))),
            Tok::Float(f, text) => Ok(Expr::Lit(Literal::float_with_text(f, text))),
            Tok::Str(s) => Ok(Expr::Lit(Literal::string(s))),
            Tok::Ident(name) => {
                if self.cur == Tok::LParen {
                    self.bump()?;
                    let args = self.parse_args()?;
                    Ok(Expr::Call(name, args))
                } else if name == "true" {
                    Ok(Expr::Lit(Literal::bool(true)))
                } else if name == "false" {
                    Ok(Expr::Lit(Literal::bool(false)))
                } else {
                    Ok(Expr::Field(name))
                }
            }
            Tok::LParen => {
                let inner = self.parse_or()?;
                self.expect(Tok::RParen)?;
                Ok(inner)
            }
            other => Err(SyntaxError::new(
                format!("unexpected token: {other:?}"),
                self.lexer.position(),
            )),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut args = Vec::new();
        if self.cur == Tok::RParen {
            self.bump()?;
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            match self.cur {
                Tok::Comma => {
                    self.bump()?;
                }
                Tok::RParen => {
                    self.bump()?;
                    break;
                }
                _ => {
                    return Err(SyntaxError::new(
                        format!("expected ',' or ')', found {:?}", self.cur),
                        self.lexer.position(),
                    ))
                }
            }
        }
        Ok(args)
    }
}
