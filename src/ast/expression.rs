// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Formula AST node definitions

use smallvec::SmallVec;
use std::fmt;

/// AST representation of a formula
///
/// Large variants are boxed to keep the enum small.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    /// Numeric literal
    Number(f64),

    /// Identifier (input variable or named constant)
    Identifier(String),

    /// Unary operation (negation, not)
    UnaryOp {
        /// The operator
        op: UnaryOperator,
        /// The operand
        operand: Box<ExpressionNode>,
    },

    /// Binary operation (arithmetic, comparison, logical)
    BinaryOp(Box<BinaryOpData>),

    /// Function call with name and arguments
    FunctionCall(Box<FunctionCallData>),

    /// Conditional expression (`cond ? a : b`)
    Conditional(Box<ConditionalData>),
}

/// Binary operation data (separate struct to optimize enum size)
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOpData {
    /// The operator
    pub op: BinaryOperator,
    /// Left operand
    pub left: ExpressionNode,
    /// Right operand
    pub right: ExpressionNode,
}

/// Function call data (separate struct to optimize enum size)
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallData {
    /// Function name
    pub name: String,
    /// Function arguments (SmallVec for the common case of 1-2 args)
    pub args: SmallVec<[ExpressionNode; 4]>,
}

/// Conditional expression data
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalData {
    /// Condition, true when non-zero
    pub condition: ExpressionNode,
    /// Value when the condition holds
    pub then_expr: ExpressionNode,
    /// Value otherwise
    pub else_expr: ExpressionNode,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `^`
    Power,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl BinaryOperator {
    /// Operator symbol as written in formulas
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }

    /// Apply the operator; comparisons and logic yield `1.0` or `0.0`
    #[inline]
    pub fn apply(self, left: f64, right: f64) -> f64 {
        let truth = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            BinaryOperator::Add => left + right,
            BinaryOperator::Subtract => left - right,
            BinaryOperator::Multiply => left * right,
            BinaryOperator::Divide => left / right,
            BinaryOperator::Power => left.powf(right),
            BinaryOperator::Equal => truth(left == right),
            BinaryOperator::NotEqual => truth(left != right),
            BinaryOperator::LessThan => truth(left < right),
            BinaryOperator::LessThanOrEqual => truth(left <= right),
            BinaryOperator::GreaterThan => truth(left > right),
            BinaryOperator::GreaterThanOrEqual => truth(left >= right),
            BinaryOperator::And => truth(left != 0.0 && right != 0.0),
            BinaryOperator::Or => truth(left != 0.0 || right != 0.0),
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Arithmetic negation `-`
    Minus,
    /// Logical not `!`
    Not,
}

impl UnaryOperator {
    /// Apply the operator
    #[inline]
    pub fn apply(self, operand: f64) -> f64 {
        match self {
            UnaryOperator::Minus => -operand,
            UnaryOperator::Not => {
                if operand == 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl ExpressionNode {
    /// Create a numeric literal node
    pub fn number(value: f64) -> Self {
        Self::Number(value)
    }

    /// Create an identifier node
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    /// Create a unary operation node
    pub fn unary_op(op: UnaryOperator, operand: ExpressionNode) -> Self {
        Self::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// Create a binary operation node
    pub fn binary_op(op: BinaryOperator, left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::BinaryOp(Box::new(BinaryOpData { op, left, right }))
    }

    /// Create a function call node
    pub fn function_call(name: impl Into<String>, args: Vec<ExpressionNode>) -> Self {
        Self::FunctionCall(Box::new(FunctionCallData {
            name: name.into(),
            args: SmallVec::from_vec(args),
        }))
    }

    /// Create a conditional node
    pub fn conditional(
        condition: ExpressionNode,
        then_expr: ExpressionNode,
        else_expr: ExpressionNode,
    ) -> Self {
        Self::Conditional(Box::new(ConditionalData {
            condition,
            then_expr,
            else_expr,
        }))
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionNode::Number(value) => write!(f, "{value}"),
            ExpressionNode::Identifier(name) => write!(f, "{name}"),
            ExpressionNode::UnaryOp { op, operand } => match op {
                UnaryOperator::Minus => write!(f, "(-{operand})"),
                UnaryOperator::Not => write!(f, "(!{operand})"),
            },
            ExpressionNode::BinaryOp(data) => {
                write!(f, "({} {} {})", data.left, data.op.symbol(), data.right)
            }
            ExpressionNode::FunctionCall(data) => {
                write!(f, "{}(", data.name)?;
                for (i, arg) in data.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            ExpressionNode::Conditional(data) => write!(
                f,
                "({} ? {} : {})",
                data.condition, data.then_expr, data.else_expr
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_fully_parenthesized() {
        let expr = ExpressionNode::binary_op(
            BinaryOperator::Multiply,
            ExpressionNode::unary_op(UnaryOperator::Minus, ExpressionNode::identifier("x")),
            ExpressionNode::number(2.0),
        );
        assert_eq!(expr.to_string(), "((-x) * 2)");
    }

    #[test]
    fn test_operator_truth_values() {
        assert_eq!(BinaryOperator::LessThan.apply(1.0, 2.0), 1.0);
        assert_eq!(BinaryOperator::And.apply(1.0, 0.0), 0.0);
        assert_eq!(BinaryOperator::Or.apply(0.0, -3.0), 1.0);
        assert_eq!(UnaryOperator::Not.apply(0.0), 1.0);
    }
}
