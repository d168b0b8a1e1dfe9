//! Builtin mathematical functions and constants for formulas

use super::signature::FunctionSignature;

/// How a builtin combines its arguments
#[derive(Clone, Copy)]
pub enum FunctionKind {
    /// One argument
    Unary(fn(f64) -> f64),
    /// Two arguments
    Binary(fn(f64, f64) -> f64),
    /// Any number of arguments, at least the signature minimum
    Variadic(fn(&[f64]) -> f64),
}

/// A builtin function: signature plus implementation
#[derive(Clone)]
pub struct BuiltinFunction {
    /// Signature used for arity checks
    pub signature: FunctionSignature,
    /// Implementation
    pub kind: FunctionKind,
}

impl std::fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BuiltinFunction({})", self.signature)
    }
}

impl BuiltinFunction {
    const fn unary(name: &'static str, f: fn(f64) -> f64) -> Self {
        Self {
            signature: FunctionSignature::fixed(name, 1),
            kind: FunctionKind::Unary(f),
        }
    }

    const fn binary(name: &'static str, f: fn(f64, f64) -> f64) -> Self {
        Self {
            signature: FunctionSignature::fixed(name, 2),
            kind: FunctionKind::Binary(f),
        }
    }

    const fn variadic(name: &'static str, f: fn(&[f64]) -> f64) -> Self {
        Self {
            signature: FunctionSignature::variadic(name, 1),
            kind: FunctionKind::Variadic(f),
        }
    }

    /// Function name
    pub fn name(&self) -> &'static str {
        self.signature.name
    }

    /// Apply to already-evaluated arguments; arity was checked at binding time
    #[inline]
    pub fn apply(&self, args: &[f64]) -> f64 {
        match self.kind {
            FunctionKind::Unary(f) => f(args[0]),
            FunctionKind::Binary(f) => f(args[0], args[1]),
            FunctionKind::Variadic(f) => f(args),
        }
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn rint(x: f64) -> f64 {
    x.round_ties_even()
}

fn min(args: &[f64]) -> f64 {
    args.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(args: &[f64]) -> f64 {
    args.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn sum(args: &[f64]) -> f64 {
    args.iter().sum()
}

fn avg(args: &[f64]) -> f64 {
    sum(args) / args.len() as f64
}

/// Every builtin function
pub fn builtin_functions() -> Vec<BuiltinFunction> {
    vec![
        BuiltinFunction::unary("sin", f64::sin),
        BuiltinFunction::unary("cos", f64::cos),
        BuiltinFunction::unary("tan", f64::tan),
        BuiltinFunction::unary("asin", f64::asin),
        BuiltinFunction::unary("acos", f64::acos),
        BuiltinFunction::unary("atan", f64::atan),
        BuiltinFunction::unary("sinh", f64::sinh),
        BuiltinFunction::unary("cosh", f64::cosh),
        BuiltinFunction::unary("tanh", f64::tanh),
        BuiltinFunction::unary("asinh", f64::asinh),
        BuiltinFunction::unary("acosh", f64::acosh),
        BuiltinFunction::unary("atanh", f64::atanh),
        BuiltinFunction::unary("log", f64::ln),
        BuiltinFunction::unary("ln", f64::ln),
        BuiltinFunction::unary("log2", f64::log2),
        BuiltinFunction::unary("log10", f64::log10),
        BuiltinFunction::unary("exp", f64::exp),
        BuiltinFunction::unary("sqrt", f64::sqrt),
        BuiltinFunction::unary("cbrt", f64::cbrt),
        BuiltinFunction::unary("abs", f64::abs),
        BuiltinFunction::unary("sign", sign),
        BuiltinFunction::unary("rint", rint),
        BuiltinFunction::unary("floor", f64::floor),
        BuiltinFunction::unary("ceil", f64::ceil),
        BuiltinFunction::binary("atan2", f64::atan2),
        BuiltinFunction::binary("pow", f64::powf),
        BuiltinFunction::variadic("min", min),
        BuiltinFunction::variadic("max", max),
        BuiltinFunction::variadic("sum", sum),
        BuiltinFunction::variadic("avg", avg),
    ]
}

/// Named constants available in every formula
pub const BUILTIN_CONSTANTS: &[(&str, f64)] =
    &[("_pi", std::f64::consts::PI), ("_e", std::f64::consts::E)];
