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

//! Error types for function construction, evaluation and basis generation
//!
//! Every failure of the crate is surfaced as one [`FunctionError`] variant.
//! Nothing is recovered silently: constructors either return a fully valid
//! object or one of these errors.

use crate::parser::ParseError;
use thiserror::Error;

/// Result type alias for function operations
pub type Result<T> = std::result::Result<T, FunctionError>;

/// Comprehensive error type for function operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FunctionError {
    /// Two sizes that must agree do not
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// What was being checked
        context: String,
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },

    /// Selection index outside the valid range
    #[error("Index out of range: {index} must be in [0, {bound})")]
    IndexOutOfRange {
        /// The offending index
        index: usize,
        /// Exclusive upper bound
        bound: usize,
    },

    /// The same index appears twice in a selection
    #[error("Duplicate index {index} in selection")]
    DuplicateIndex {
        /// The repeated index
        index: usize,
    },

    /// A formula failed to parse
    #[error("Invalid formula '{formula}': {source}")]
    InvalidFormula {
        /// The formula text
        formula: String,
        /// Underlying parse error
        #[source]
        source: ParseError,
    },

    /// A formula references a name that is neither an input nor a constant
    #[error("Unknown variable '{name}' in formula '{formula}'")]
    UnknownVariable {
        /// The unresolved identifier
        name: String,
        /// The formula text
        formula: String,
    },

    /// A formula calls a function that is not registered
    #[error("Unknown function '{name}' in formula '{formula}'")]
    UnknownFunction {
        /// The unresolved function name
        name: String,
        /// The formula text
        formula: String,
    },

    /// A builtin function is called with the wrong number of arguments
    #[error("Function '{name}' expects {min_arity}{} arguments, got {actual}",
            max_arity.map(|m| if m == *min_arity { String::new() } else { format!("-{m}") })
                .unwrap_or_else(|| String::from(" or more")))]
    InvalidArity {
        /// Function name
        name: String,
        /// Minimum number of arguments
        min_arity: usize,
        /// Maximum number of arguments (None for variadic)
        max_arity: Option<usize>,
        /// Number of arguments supplied
        actual: usize,
    },

    /// An input variable name is declared twice
    #[error("Duplicate input variable '{name}'")]
    DuplicateVariable {
        /// The repeated name
        name: String,
    },

    /// A univariate family failed to build the requested member
    #[error("Family '{family}' cannot build degree {degree}: {message}")]
    FamilyError {
        /// Family name
        family: String,
        /// Requested degree
        degree: usize,
        /// Human-readable reason
        message: String,
    },

    /// Invalid constructor argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable error message
        message: String,
    },

    /// An index or count does not fit the machine word
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// The operation that overflowed
        operation: String,
    },

    /// Evaluation produced NaN or an infinity
    #[error("Non-finite value of formula '{formula}' at point {point:?}")]
    NonFiniteResult {
        /// The formula text
        formula: String,
        /// Input point
        point: Vec<f64>,
    },

    /// Saving or loading failed
    #[error("Serialization error: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
    },
}

impl FunctionError {
    /// Create a dimension mismatch error
    pub fn dimension_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Create an index out of range error
    pub fn index_out_of_range(index: usize, bound: usize) -> Self {
        Self::IndexOutOfRange { index, bound }
    }

    /// Create an invalid formula error
    pub fn invalid_formula(formula: impl Into<String>, source: ParseError) -> Self {
        Self::InvalidFormula {
            formula: formula.into(),
            source,
        }
    }

    /// Create an unknown variable error
    pub fn unknown_variable(name: impl Into<String>, formula: impl Into<String>) -> Self {
        Self::UnknownVariable {
            name: name.into(),
            formula: formula.into(),
        }
    }

    /// Create an unknown function error
    pub fn unknown_function(name: impl Into<String>, formula: impl Into<String>) -> Self {
        Self::UnknownFunction {
            name: name.into(),
            formula: formula.into(),
        }
    }

    /// Create a family error
    pub fn family_error(
        family: impl Into<String>,
        degree: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::FamilyError {
            family: family.into(),
            degree,
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an overflow error
    pub fn overflow(operation: impl Into<String>) -> Self {
        Self::Overflow {
            operation: operation.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Whether this is a dimension mismatch
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. })
    }

    /// Whether this error rejects a selection (out of range or duplicate)
    pub fn is_selection_error(&self) -> bool {
        matches!(
            self,
            Self::IndexOutOfRange { .. } | Self::DuplicateIndex { .. }
        )
    }
}

/// Check that `indices` are all below `bound` and pairwise distinct
pub(crate) fn check_selection(indices: &[usize], bound: usize) -> Result<()> {
    let mut seen = vec![false; bound];
    for &index in indices {
        if index >= bound {
            return Err(FunctionError::index_out_of_range(index, bound));
        }
        if seen[index] {
            return Err(FunctionError::DuplicateIndex { index });
        }
        seen[index] = true;
    }
    Ok(())
}
