//! Pratt parser for formulas
//!
//! Precedence climbing over a single-token lookahead. All binary operator
//! precedence lives in [`get_precedence`].

use super::error::{ParseError, ParseResult};
use super::tokenizer::{Token, Tokenizer};
use crate::ast::{BinaryOperator, ExpressionNode, UnaryOperator};

/// Deepest nesting of operators, calls and parentheses accepted in one formula
pub const MAX_NESTING_DEPTH: usize = 512;

/// A subtree together with its height
type Parsed = (ExpressionNode, usize);

/// Operator precedence levels (higher = tighter binding)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// Lowest precedence - conditional `? :` (right associative)
    Conditional = 1,
    /// Logical OR
    Or = 2,
    /// Logical AND
    And = 3,
    /// Equality operators (==, !=)
    Equality = 4,
    /// Inequality operators (<, >, <=, >=)
    Inequality = 5,
    /// Additive operators (+, -)
    Additive = 6,
    /// Multiplicative operators (*, /)
    Multiplicative = 7,
    /// Unary operators (-, +, !)
    Unary = 8,
    /// Power (^), right associative
    Power = 9,
}

impl Precedence {
    /// Get the next higher precedence level for left-associative operators
    #[inline(always)]
    pub const fn next_level(self) -> Self {
        match self {
            Precedence::Conditional => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Inequality,
            Precedence::Inequality => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Unary,
            Precedence::Unary => Precedence::Power,
            Precedence::Power => Precedence::Power,
        }
    }

    /// Check if this precedence is right associative
    #[inline(always)]
    pub const fn is_right_associative(self) -> bool {
        matches!(self, Precedence::Power | Precedence::Conditional)
    }
}

/// Precedence of a token in infix position
#[inline(always)]
fn get_precedence(token: &Token<'_>) -> Option<Precedence> {
    match token {
        Token::Plus | Token::Minus => Some(Precedence::Additive),
        Token::Multiply | Token::Divide => Some(Precedence::Multiplicative),
        Token::Power => Some(Precedence::Power),
        Token::LessThan
        | Token::LessThanOrEqual
        | Token::GreaterThan
        | Token::GreaterThanOrEqual => Some(Precedence::Inequality),
        Token::Equal | Token::NotEqual => Some(Precedence::Equality),
        Token::And => Some(Precedence::And),
        Token::Or => Some(Precedence::Or),
        Token::Question => Some(Precedence::Conditional),
        _ => None,
    }
}

#[inline(always)]
fn token_to_binary_op(token: &Token<'_>) -> Option<BinaryOperator> {
    match token {
        Token::Plus => Some(BinaryOperator::Add),
        Token::Minus => Some(BinaryOperator::Subtract),
        Token::Multiply => Some(BinaryOperator::Multiply),
        Token::Divide => Some(BinaryOperator::Divide),
        Token::Power => Some(BinaryOperator::Power),
        Token::Equal => Some(BinaryOperator::Equal),
        Token::NotEqual => Some(BinaryOperator::NotEqual),
        Token::LessThan => Some(BinaryOperator::LessThan),
        Token::LessThanOrEqual => Some(BinaryOperator::LessThanOrEqual),
        Token::GreaterThan => Some(BinaryOperator::GreaterThan),
        Token::GreaterThanOrEqual => Some(BinaryOperator::GreaterThanOrEqual),
        Token::And => Some(BinaryOperator::And),
        Token::Or => Some(BinaryOperator::Or),
        _ => None,
    }
}

/// Pratt parser
///
/// ### Precedence Levels (highest to lowest):
/// - **Power** (9): `^` (right associative, so `2^3^2 == 2^9`)
/// - **Unary** (8): `-`, `+`, `!` (so `-x^2 == -(x^2)`)
/// - **Multiplicative** (7): `*`, `/`
/// - **Additive** (6): `+`, `-`
/// - **Inequality** (5): `<`, `>`, `<=`, `>=`
/// - **Equality** (4): `==`, `!=`
/// - **And** (3): `&&`
/// - **Or** (2): `||`
/// - **Conditional** (1): `c ? a : b` (right associative)
pub struct PrattParser<'input> {
    tokenizer: Tokenizer<'input>,
    current_token: Option<Token<'input>>,
    current_position: usize,
    /// Open `parse_expression_with_precedence` frames
    depth: usize,
}

impl<'input> PrattParser<'input> {
    /// Create new parser positioned on the first token
    pub fn new(input: &'input str) -> ParseResult<Self> {
        let mut parser = Self {
            tokenizer: Tokenizer::new(input),
            current_token: None,
            current_position: 0,
            depth: 0,
        };
        parser.advance()?;
        Ok(parser)
    }

    #[inline(always)]
    fn advance(&mut self) -> ParseResult<()> {
        self.current_token = self.tokenizer.next_token()?;
        self.current_position = self.tokenizer.token_start();
        Ok(())
    }

    #[inline(always)]
    fn current(&self) -> Option<&Token<'input>> {
        self.current_token.as_ref()
    }

    fn unexpected(&self) -> ParseError {
        match &self.current_token {
            Some(token) => ParseError::UnexpectedToken {
                token: format!("{token:?}"),
                position: self.current_position,
            },
            None => ParseError::UnexpectedEndOfInput {
                position: self.current_position,
            },
        }
    }

    /// Attach `height` to `node`, rejecting trees too deep to walk recursively
    fn nested(&self, node: ExpressionNode, height: usize) -> ParseResult<Parsed> {
        if height > MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                position: self.current_position,
            });
        }
        Ok((node, height))
    }

    fn expect(&mut self, expected: Token<'input>, description: &str) -> ParseResult<()> {
        match &self.current_token {
            Some(token) if *token == expected => self.advance(),
            Some(_) => Err(ParseError::ExpectedToken {
                expected: description.to_string(),
                position: self.current_position,
            }),
            None => Err(ParseError::UnexpectedEndOfInput {
                position: self.current_position,
            }),
        }
    }

    /// Parse the whole input as one expression
    pub fn parse(mut self) -> ParseResult<ExpressionNode> {
        if self.current_token.is_none() {
            return Err(ParseError::EmptyExpression);
        }
        let (expr, _) = self.parse_expression_with_precedence(Precedence::Conditional)?;
        if self.current_token.is_some() {
            return Err(self.unexpected());
        }
        Ok(expr)
    }

    /// Parse primary expression (literals, identifiers, calls, parentheses, prefix operators)
    fn parse_primary(&mut self) -> ParseResult<Parsed> {
        match self.current() {
            Some(Token::Number(value)) => {
                let value = *value;
                self.advance()?;
                Ok((ExpressionNode::number(value), 1))
            }

            Some(Token::Identifier(name)) => {
                let name = *name;
                self.advance()?;
                if let Some(Token::LeftParen) = self.current() {
                    self.parse_function_call(name)
                } else {
                    Ok((ExpressionNode::identifier(name), 1))
                }
            }

            Some(Token::LeftParen) => {
                self.advance()?;
                let expr = self.parse_expression_with_precedence(Precedence::Conditional)?;
                self.expect(Token::RightParen, "')'")?;
                Ok(expr)
            }

            Some(Token::Minus) => {
                self.advance()?;
                let (operand, height) = self.parse_expression_with_precedence(Precedence::Unary)?;
                self.nested(
                    ExpressionNode::unary_op(UnaryOperator::Minus, operand),
                    height + 1,
                )
            }
            Some(Token::Plus) => {
                // Unary plus is a no-op
                self.advance()?;
                self.parse_expression_with_precedence(Precedence::Unary)
            }
            Some(Token::Not) => {
                self.advance()?;
                let (operand, height) = self.parse_expression_with_precedence(Precedence::Unary)?;
                self.nested(
                    ExpressionNode::unary_op(UnaryOperator::Not, operand),
                    height + 1,
                )
            }

            _ => Err(self.unexpected()),
        }
    }

    fn parse_function_call(&mut self, name: &str) -> ParseResult<Parsed> {
        self.advance()?; // consume (
        let mut args = Vec::new();
        let mut height = 0;

        if let Some(Token::RightParen) = self.current() {
            self.advance()?;
            return Ok((ExpressionNode::function_call(name, args), 1));
        }

        loop {
            let (arg, arg_height) =
                self.parse_expression_with_precedence(Precedence::Conditional)?;
            args.push(arg);
            height = height.max(arg_height);

            match self.current() {
                Some(Token::Comma) => {
                    self.advance()?;
                }
                Some(Token::RightParen) => {
                    self.advance()?;
                    break;
                }
                Some(_) => {
                    return Err(ParseError::ExpectedToken {
                        expected: "',' or ')' in function arguments".to_string(),
                        position: self.current_position,
                    });
                }
                None => {
                    return Err(ParseError::UnexpectedEndOfInput {
                        position: self.current_position,
                    });
                }
            }
        }

        self.nested(ExpressionNode::function_call(name, args), height + 1)
    }

    /// Core Pratt parsing loop
    fn parse_expression_with_precedence(
        &mut self,
        min_precedence: Precedence,
    ) -> ParseResult<Parsed> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                position: self.current_position,
            });
        }
        self.depth += 1;
        let result = self.parse_operators(min_precedence);
        self.depth -= 1;
        result
    }

    fn parse_operators(&mut self, min_precedence: Precedence) -> ParseResult<Parsed> {
        let (mut left, mut height) = self.parse_primary()?;

        while let Some(current_token) = self.current() {
            let precedence = match get_precedence(current_token) {
                Some(prec) if prec >= min_precedence => prec,
                _ => break,
            };

            if let Token::Question = current_token {
                self.advance()?;
                let (then_expr, then_height) =
                    self.parse_expression_with_precedence(Precedence::Conditional)?;
                self.expect(Token::Colon, "':' in conditional expression")?;
                let (else_expr, else_height) =
                    self.parse_expression_with_precedence(Precedence::Conditional)?;
                (left, height) = self.nested(
                    ExpressionNode::conditional(left, then_expr, else_expr),
                    height.max(then_height).max(else_height) + 1,
                )?;
                continue;
            }

            let op = token_to_binary_op(current_token).ok_or_else(|| self.unexpected())?;
            self.advance()?;

            let next_precedence = if precedence.is_right_associative() {
                precedence
            } else {
                precedence.next_level()
            };
            let (right, right_height) = self.parse_expression_with_precedence(next_precedence)?;
            (left, height) = self.nested(
                ExpressionNode::binary_op(op, left, right),
                height.max(right_height) + 1,
            )?;
        }

        Ok((left, height))
    }
}

/// Parse a formula into an AST
pub fn parse_expression_pratt(input: &str) -> ParseResult<ExpressionNode> {
    PrattParser::new(input)?.parse()
}
