//! Tokenizer for formulas
//!
//! Zero-copy: identifiers borrow from the input, numbers are converted once
//! when scanned.

use super::error::{ParseError, ParseResult};

/// Formula token
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'input> {
    /// Numeric literal (e.g., 2, 3.5, .5, 1e-3)
    Number(f64),
    /// Identifier token (variable, constant or function name)
    Identifier(&'input str),

    /// Addition operator (+)
    Plus,
    /// Subtraction operator (-)
    Minus,
    /// Multiplication operator (*)
    Multiply,
    /// Division operator (/)
    Divide,
    /// Power operator (^)
    Power,
    /// Equality operator (==)
    Equal,
    /// Inequality operator (!=)
    NotEqual,
    /// Less than operator (<)
    LessThan,
    /// Less than or equal operator (<=)
    LessThanOrEqual,
    /// Greater than operator (>)
    GreaterThan,
    /// Greater than or equal operator (>=)
    GreaterThanOrEqual,
    /// Logical AND operator (&&)
    And,
    /// Logical OR operator (||)
    Or,
    /// Logical NOT operator (!)
    Not,
    /// Conditional operator (?)
    Question,
    /// Conditional separator (:)
    Colon,
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Comma separator (,)
    Comma,
}

/// Byte-oriented tokenizer over a formula
#[derive(Clone)]
pub struct Tokenizer<'input> {
    input: &'input str,
    bytes: &'input [u8],
    pos: usize,
    end: usize,
    /// Start position of the last token returned by `next_token`
    token_start: usize,
}

impl<'input> Tokenizer<'input> {
    /// Create a new tokenizer
    #[inline]
    pub fn new(input: &'input str) -> Self {
        let bytes = input.as_bytes();
        Self {
            input,
            bytes,
            pos: 0,
            end: bytes.len(),
            token_start: 0,
        }
    }

    #[inline(always)]
    fn is_id_start(ch: u8) -> bool {
        matches!(ch, b'A'..=b'Z' | b'a'..=b'z' | b'_')
    }

    #[inline(always)]
    fn is_id_continue(ch: u8) -> bool {
        matches!(ch, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')
    }

    #[inline(always)]
    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    #[inline(always)]
    fn skip_whitespace(&mut self) {
        while self.pos < self.end {
            match self.bytes[self.pos] {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                _ => break,
            }
        }
    }

    fn scan_digits(&mut self) -> usize {
        let start = self.pos;
        while self.pos < self.end && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Number parsing: digits, optional fraction, optional exponent
    fn parse_number(&mut self) -> ParseResult<Token<'input>> {
        let start = self.pos;
        let mut digits = self.scan_digits();

        if self.peek_byte(0) == Some(b'.') {
            self.pos += 1;
            digits += self.scan_digits();
        }

        if digits == 0 {
            return Err(ParseError::InvalidNumber {
                value: self.input[start..self.pos].to_string(),
                position: start,
            });
        }

        // Exponent only when followed by digits, so `2e` stays an error below
        if matches!(self.peek_byte(0), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.peek_byte(1), Some(b'+' | b'-')));
            if self.peek_byte(1 + sign).is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1 + sign;
                self.scan_digits();
            }
        }

        let literal = &self.input[start..self.pos];
        if self.peek_byte(0).is_some_and(Self::is_id_start) {
            return Err(ParseError::InvalidNumber {
                value: format!("{literal}{}", self.input[self.pos..].chars().next().unwrap_or(' ')),
                position: start,
            });
        }

        literal
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| ParseError::InvalidNumber {
                value: literal.to_string(),
                position: start,
            })
    }

    #[inline]
    fn parse_identifier(&mut self) -> &'input str {
        let start = self.pos;
        while self.pos < self.end && Self::is_id_continue(self.bytes[self.pos]) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// Consume `len` bytes and yield `token`
    #[inline(always)]
    fn emit(&mut self, len: usize, token: Token<'input>) -> Token<'input> {
        self.pos += len;
        token
    }

    /// Produce the next token, or `None` at end of input
    pub fn next_token(&mut self) -> ParseResult<Option<Token<'input>>> {
        self.skip_whitespace();
        self.token_start = self.pos;

        if self.pos >= self.end {
            return Ok(None);
        }

        let token = match self.bytes[self.pos] {
            b'0'..=b'9' | b'.' => self.parse_number()?,
            ch if Self::is_id_start(ch) => Token::Identifier(self.parse_identifier()),
            b'+' => self.emit(1, Token::Plus),
            b'-' => self.emit(1, Token::Minus),
            b'*' => self.emit(1, Token::Multiply),
            b'/' => self.emit(1, Token::Divide),
            b'^' => self.emit(1, Token::Power),
            b'(' => self.emit(1, Token::LeftParen),
            b')' => self.emit(1, Token::RightParen),
            b',' => self.emit(1, Token::Comma),
            b'?' => self.emit(1, Token::Question),
            b':' => self.emit(1, Token::Colon),
            b'<' => match self.peek_byte(1) {
                Some(b'=') => self.emit(2, Token::LessThanOrEqual),
                _ => self.emit(1, Token::LessThan),
            },
            b'>' => match self.peek_byte(1) {
                Some(b'=') => self.emit(2, Token::GreaterThanOrEqual),
                _ => self.emit(1, Token::GreaterThan),
            },
            b'=' => match self.peek_byte(1) {
                Some(b'=') => self.emit(2, Token::Equal),
                _ => return Err(self.unexpected_character()),
            },
            b'!' => match self.peek_byte(1) {
                Some(b'=') => self.emit(2, Token::NotEqual),
                _ => self.emit(1, Token::Not),
            },
            b'&' => match self.peek_byte(1) {
                Some(b'&') => self.emit(2, Token::And),
                _ => return Err(self.unexpected_character()),
            },
            b'|' => match self.peek_byte(1) {
                Some(b'|') => self.emit(2, Token::Or),
                _ => return Err(self.unexpected_character()),
            },
            _ => return Err(self.unexpected_character()),
        };

        Ok(Some(token))
    }

    fn unexpected_character(&self) -> ParseError {
        ParseError::UnexpectedCharacter {
            character: self.input[self.pos..].chars().next().unwrap_or('\0'),
            position: self.pos,
        }
    }

    /// Start position of the most recently produced token
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Tokenize the whole input
    pub fn tokenize_all(&mut self) -> ParseResult<Vec<Token<'input>>> {
        let mut tokens = Vec::with_capacity(self.end / 2 + 1);
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}

/// Tokenize a formula into a vector of tokens
pub fn tokenize(input: &str) -> ParseResult<Vec<Token<'_>>> {
    Tokenizer::new(input).tokenize_all()
}
