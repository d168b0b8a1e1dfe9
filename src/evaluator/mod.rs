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

//! Formula binding and evaluation
//!
//! [`FormulaParser`] binds a list of formulas to an ordered list of input
//! variable names. Binding parses every formula, resolves identifiers to input
//! slots or constants and functions to builtins, so evaluation itself can only
//! fail on a wrong point length (or a non-finite result in strict mode).

use crate::ast::{BinaryOperator, ExpressionNode, UnaryOperator};
use crate::config::ParserConfig;
use crate::error::{FunctionError, Result};
use crate::parser::parse_expression;
use crate::registry::{BuiltinFunction, FunctionRegistry};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Expression with every name resolved
#[derive(Debug, Clone)]
enum BoundNode {
    Constant(f64),
    Variable(usize),
    Unary(UnaryOperator, Box<BoundNode>),
    Binary(BinaryOperator, Box<BoundNode>, Box<BoundNode>),
    Call(BuiltinFunction, Box<[BoundNode]>),
    Conditional(Box<[BoundNode; 3]>),
}

impl BoundNode {
    #[inline]
    fn evaluate(&self, point: &[f64]) -> f64 {
        match self {
            BoundNode::Constant(value) => *value,
            BoundNode::Variable(slot) => point[*slot],
            BoundNode::Unary(op, operand) => op.apply(operand.evaluate(point)),
            BoundNode::Binary(op, left, right) => {
                op.apply(left.evaluate(point), right.evaluate(point))
            }
            BoundNode::Call(function, args) => {
                let values: SmallVec<[f64; 4]> =
                    args.iter().map(|arg| arg.evaluate(point)).collect();
                function.apply(&values)
            }
            BoundNode::Conditional(parts) => {
                let [condition, then_expr, else_expr] = &**parts;
                if condition.evaluate(point) != 0.0 {
                    then_expr.evaluate(point)
                } else {
                    else_expr.evaluate(point)
                }
            }
        }
    }

    fn as_constant(&self) -> Option<f64> {
        match self {
            BoundNode::Constant(value) => Some(*value),
            _ => None,
        }
    }
}

/// Resolves names while converting an AST into a [`BoundNode`]
struct Binder<'a> {
    slots: &'a FxHashMap<&'a str, usize>,
    registry: &'a FunctionRegistry,
    formula: &'a str,
    fold_constants: bool,
}

impl Binder<'_> {
    fn bind(&self, node: &ExpressionNode) -> Result<BoundNode> {
        let bound = match node {
            ExpressionNode::Number(value) => BoundNode::Constant(*value),
            ExpressionNode::Identifier(name) => {
                if let Some(&slot) = self.slots.get(name.as_str()) {
                    BoundNode::Variable(slot)
                } else if let Some(value) = self.registry.get_constant(name) {
                    BoundNode::Constant(value)
                } else {
                    return Err(FunctionError::unknown_variable(name, self.formula));
                }
            }
            ExpressionNode::UnaryOp { op, operand } => {
                BoundNode::Unary(*op, Box::new(self.bind(operand)?))
            }
            ExpressionNode::BinaryOp(data) => BoundNode::Binary(
                data.op,
                Box::new(self.bind(&data.left)?),
                Box::new(self.bind(&data.right)?),
            ),
            ExpressionNode::FunctionCall(data) => {
                let function = self
                    .registry
                    .get_function(&data.name)
                    .ok_or_else(|| FunctionError::unknown_function(&data.name, self.formula))?;
                function.signature.validate_arity(data.args.len())?;
                let args = data
                    .args
                    .iter()
                    .map(|arg| self.bind(arg))
                    .collect::<Result<Box<[BoundNode]>>>()?;
                BoundNode::Call(function.clone(), args)
            }
            ExpressionNode::Conditional(data) => BoundNode::Conditional(Box::new([
                self.bind(&data.condition)?,
                self.bind(&data.then_expr)?,
                self.bind(&data.else_expr)?,
            ])),
        };

        Ok(if self.fold_constants {
            fold(bound)
        } else {
            bound
        })
    }
}

/// Replace a node whose operands are all constants by its value
fn fold(node: BoundNode) -> BoundNode {
    let constant = match &node {
        BoundNode::Unary(op, operand) => operand.as_constant().map(|v| op.apply(v)),
        BoundNode::Binary(op, left, right) => left
            .as_constant()
            .zip(right.as_constant())
            .map(|(l, r)| op.apply(l, r)),
        BoundNode::Call(function, args) => args
            .iter()
            .map(BoundNode::as_constant)
            .collect::<Option<SmallVec<[f64; 4]>>>()
            .map(|values| function.apply(&values)),
        BoundNode::Conditional(parts) => parts[0].as_constant().and_then(|c| {
            let branch = if c != 0.0 { &parts[1] } else { &parts[2] };
            branch.as_constant()
        }),
        BoundNode::Constant(_) | BoundNode::Variable(_) => None,
    };
    constant.map_or(node, BoundNode::Constant)
}

/// One formula after binding
#[derive(Debug, Clone)]
struct CompiledFormula {
    root: BoundNode,
}

/// Formulas bound to an ordered list of input variables
///
/// Built deterministically from `(input_names, formulas)`; owners rebuild it
/// whenever either changes instead of mutating it.
#[derive(Debug, Clone)]
pub struct FormulaParser {
    input_names: Vec<String>,
    formulas: Vec<String>,
    compiled: Vec<CompiledFormula>,
    config: ParserConfig,
}

impl FormulaParser {
    /// Bind `formulas` over `input_names` with the default configuration
    pub fn new(input_names: &[String], formulas: &[String]) -> Result<Self> {
        Self::with_config(input_names, formulas, ParserConfig::default())
    }

    /// Bind `formulas` over `input_names`
    pub fn with_config(
        input_names: &[String],
        formulas: &[String],
        config: ParserConfig,
    ) -> Result<Self> {
        let mut slots: FxHashMap<&str, usize> = FxHashMap::default();
        for (slot, name) in input_names.iter().enumerate() {
            if slots.insert(name.as_str(), slot).is_some() {
                return Err(FunctionError::DuplicateVariable { name: name.clone() });
            }
        }

        let registry = FunctionRegistry::global();
        let compiled = formulas
            .iter()
            .map(|formula| -> Result<CompiledFormula> {
                let ast = parse_expression(formula)
                    .map_err(|source| FunctionError::invalid_formula(formula, source))?;
                let binder = Binder {
                    slots: &slots,
                    registry,
                    formula,
                    fold_constants: config.fold_constants,
                };
                Ok(CompiledFormula {
                    root: binder.bind(&ast)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Bound {} formula(s) over {} input variable(s)",
            formulas.len(),
            input_names.len()
        );

        Ok(Self {
            input_names: input_names.to_vec(),
            formulas: formulas.to_vec(),
            compiled,
            config,
        })
    }

    /// Input variable names in slot order
    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    /// Bound formulas
    pub fn formulas(&self) -> &[String] {
        &self.formulas
    }

    /// Binding configuration
    pub fn config(&self) -> ParserConfig {
        self.config
    }

    /// Evaluate every formula at `point`
    pub fn evaluate(&self, point: &[f64]) -> Result<Vec<f64>> {
        if point.len() != self.input_names.len() {
            return Err(FunctionError::dimension_mismatch(
                "formula input point",
                self.input_names.len(),
                point.len(),
            ));
        }

        let mut result = Vec::with_capacity(self.compiled.len());
        for (compiled, formula) in self.compiled.iter().zip(&self.formulas) {
            let value = compiled.root.evaluate(point);
            if self.config.reject_non_finite && !value.is_finite() {
                return Err(FunctionError::NonFiniteResult {
                    formula: formula.clone(),
                    point: point.to_vec(),
                });
            }
            result.push(value);
        }
        Ok(result)
    }
}
