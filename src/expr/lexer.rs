//! Hand-rolled tokenizer for the expression grammar, in the teacher's
//! style of a small recursive-descent parser over raw source text (no
//! parser-combinator or grammar-generator dependency).

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Int(i64),
    Float(f64, String),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
    Comma,
    Eof,
}

pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer { src, bytes: src.as_bytes(), pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    pub fn next_token(&mut self) -> Result<Tok, (String, usize)> {
        self.skip_ws();
        let start = self.pos;
        let Some(c) = self.peek() else { return Ok(Tok::Eof) };

        match c {
            b'+' => { self.bump(); Ok(Tok::Plus) }
            b'-' => { self.bump(); Ok(Tok::Minus) }
            b'*' => { self.bump(); Ok(Tok::Star) }
            b'/' => { self.bump(); Ok(Tok::Slash) }
            b'(' => { self.bump(); Ok(Tok::LParen) }
            b')' => { self.bump(); Ok(Tok::RParen) }
            b',' => { self.bump(); Ok(Tok::Comma) }
            b'=' => {
                self.bump();
                if self.peek() == Some(b'=') { self.bump(); Ok(Tok::EqEq) }
                else { Err(("expected '==', found '='".to_string(), start)) }
            }
            b'!' => {
                self.bump();
                if self.peek() == Some(b'=') { self.bump(); Ok(Tok::NotEq) } else { Ok(Tok::Bang) }
            }
            b'<' => {
                self.bump();
                if self.peek() == Some(b'=') { self.bump(); Ok(Tok::LtEq) } else { Ok(Tok::Lt) }
            }
            b'>' => {
                self.bump();
                if self.peek() == Some(b'=') { self.bump(); Ok(Tok::GtEq) } else { Ok(Tok::Gt) }
            }
            b'&' => {
                self.bump();
                if self.peek() == Some(b'&') { self.bump(); Ok(Tok::AndAnd) }
                else { Err(("expected '&&'".to_string(), start)) }
            }
            b'|' => {
                self.bump();
                if self.peek() == Some(b'|') { self.bump(); Ok(Tok::OrOr) }
                else { Err(("expected '||'".to_string(), start)) }
            }
            b'"' | b'\'' => self.lex_string(c),
            b'0'..=b'9' => self.lex_number(),
            _ if c.is_ascii_alphabetic() || c == b'_' => self.lex_ident(),
            _ => Err((format!("unexpected character '{}'", c as char), start)),
        }
    }

    fn lex_string(&mut self, quote: u8) -> Result<Tok, (String, usize)> {
        let start = self.pos;
        self.bump();
        let mut s = String::new();
        loop {
            match self.bump() {
                Some(b) if b == quote => return Ok(Tok::Str(s)),
                Some(b) => s.push(b as char),
                None => return Err(("unterminated string literal".to_string(), start)),
            }
        }
    }

    fn lex_number(&mut self) -> Result<Tok, (String, usize)> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.bump();
        }
        let mut is_float = false;
        if self.peek() == Some(b'.') && matches!(self.peek2(), Some(b) if b.is_ascii_digit()) {
            is_float = true;
            self.bump();
            while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
                self.bump();
            }
        }
        let text = &self.src[start..self.pos];
        if is_float {
            let v: f64 = text.parse().map_err(|_| ("invalid number".to_string(), start))?;
            Ok(Tok::Float(v, text.to_string()))
        } else {
            let v: i64 = text.parse().map_err(|_| ("invalid number".to_string(), start))?;
            Ok(Tok::Int(v))
        }
    }

    fn lex_ident(&mut self) -> Result<Tok, (String, usize)> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.bump();
        }
        Ok(Tok::Ident(self.src[start..self.pos].to_string()))
    }
}
