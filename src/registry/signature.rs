//! Function signatures for arity checking

use crate::error::{FunctionError, Result};
use std::fmt;

/// Function signature used to validate calls at binding time
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    /// Function name
    pub name: &'static str,
    /// Minimum number of arguments
    pub min_arity: usize,
    /// Maximum number of arguments (None for variadic)
    pub max_arity: Option<usize>,
}

impl FunctionSignature {
    /// Signature with exactly `arity` arguments
    pub const fn fixed(name: &'static str, arity: usize) -> Self {
        Self {
            name,
            min_arity: arity,
            max_arity: Some(arity),
        }
    }

    /// Signature accepting `min_arity` or more arguments
    pub const fn variadic(name: &'static str, min_arity: usize) -> Self {
        Self {
            name,
            min_arity,
            max_arity: None,
        }
    }

    /// Check an argument count against this signature
    pub fn validate_arity(&self, actual: usize) -> Result<()> {
        let too_many = self.max_arity.is_some_and(|max| actual > max);
        if actual < self.min_arity || too_many {
            return Err(FunctionError::InvalidArity {
                name: self.name.to_string(),
                min_arity: self.min_arity,
                max_arity: self.max_arity,
                actual,
            });
        }
        Ok(())
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_arity {
            Some(max) if max == self.min_arity => write!(f, "{}/{}", self.name, max),
            Some(max) => write!(f, "{}/{}-{}", self.name, self.min_arity, max),
            None => write!(f, "{}/{}+", self.name, self.min_arity),
        }
    }
}
