//! Abstract syntax tree for formulas

mod expression;

pub use expression::{
    BinaryOpData, BinaryOperator, ConditionalData, ExpressionNode, FunctionCallData,
    UnaryOperator,
};
