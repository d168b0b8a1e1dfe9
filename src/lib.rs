//! Multivariate function representation and tensor-product basis construction
//!
//! Vector-valued functions of several real inputs are represented either
//! symbolically, one formula per output ([`SymbolicEvaluation`]), or as a
//! member of a tensor-product basis ([`TensorizedProductFunction`]) built by a
//! [`TensorizedUniVariateFunctionFactory`] from per-dimension univariate
//! families and an [`EnumerateFunction`].

pub mod ast;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod evaluator;
pub mod factory;
pub mod family;
pub mod function;
pub mod parser;
pub mod persistence;
pub mod registry;

// Re-export main types
pub use config::{HistoryConfig, ParserConfig};
pub use enumerate::{
    AnisotropicEnumerateFunction, Enumerate, EnumerateFunction, LinearEnumerateFunction,
    MultiIndex,
};
pub use error::{FunctionError, Result};
pub use evaluator::FormulaParser;
pub use factory::TensorizedUniVariateFunctionFactory;
pub use family::{
    PolynomialFamily, UniVariateFunction, UniVariateFunctionFamily, UniVariatePolynomial,
};
pub use function::{
    CallTracker, Differentiable, Evaluation, SymbolicEvaluation, TensorizedProductFunction,
};
pub use parser::{ParseError, parse_expression as parse};
pub use persistence::{load_json, save_json};
pub use registry::FunctionRegistry;
