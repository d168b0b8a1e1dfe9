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

//! Evaluation capability and its concrete variants
//!
//! Two representations share the [`Evaluation`] capability:
//!
//! - [`SymbolicEvaluation`]: one formula per output over named inputs
//! - [`TensorizedProductFunction`]: a product of univariate factors, which is
//!   also [`Differentiable`]
//!
//! Both embed a [`CallTracker`] so call counts and history stay correct under
//! concurrent evaluation.

mod product;
mod symbolic;
mod tracking;

pub use product::TensorizedProductFunction;
pub use symbolic::SymbolicEvaluation;
pub use tracking::CallTracker;

use crate::error::{FunctionError, Result};
use ndarray::{Array2, ArrayView2};
use std::fmt::Debug;

/// A vector-valued function of a real vector
pub trait Evaluation: Debug + Send + Sync {
    /// Length of the input point
    fn input_dimension(&self) -> usize;

    /// Length of the output point
    fn output_dimension(&self) -> usize;

    /// Evaluate at a single point
    fn evaluate(&self, point: &[f64]) -> Result<Vec<f64>>;

    /// Evaluate every row of `sample`, preserving row order
    ///
    /// Rows are evaluated one by one through [`Evaluation::evaluate`], so each
    /// row pays the full per-call bookkeeping.
    fn evaluate_sample(&self, sample: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if sample.ncols() != self.input_dimension() {
            return Err(FunctionError::dimension_mismatch(
                "sample columns",
                self.input_dimension(),
                sample.ncols(),
            ));
        }
        let mut output = Array2::zeros((sample.nrows(), self.output_dimension()));
        for (row, mut target) in sample.rows().into_iter().zip(output.rows_mut()) {
            let values = self.evaluate(&row.to_vec())?;
            for (slot, value) in target.iter_mut().zip(values) {
                *slot = value;
            }
        }
        Ok(output)
    }

    /// Sub-function made of the selected outputs, in the given order
    ///
    /// Fails when an index is out of range or repeated.
    fn marginal(&self, indices: &[usize]) -> Result<Box<dyn Evaluation>>;

    /// Number of successful single-point evaluations so far
    fn calls_number(&self) -> usize;
}

/// Scalar function with first and second derivatives
pub trait Differentiable: Evaluation {
    /// Gradient at `point`
    fn gradient(&self, point: &[f64]) -> Result<Vec<f64>>;

    /// Hessian at `point`, symmetric `input_dimension x input_dimension`
    fn hessian(&self, point: &[f64]) -> Result<Array2<f64>>;
}
