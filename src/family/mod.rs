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

//! Univariate functions and the families that build them by degree

mod polynomial;

pub use polynomial::{MAX_POLYNOMIAL_DEGREE, PolynomialFamily, UniVariatePolynomial};

use crate::error::Result;
use std::fmt::Debug;
use std::sync::Arc;

/// A scalar function of one real variable with two derivatives
pub trait UniVariateFunction: Debug + Send + Sync {
    /// Value at `x`
    fn value(&self, x: f64) -> f64;

    /// First derivative at `x`
    fn gradient(&self, x: f64) -> f64;

    /// Second derivative at `x`
    fn hessian(&self, x: f64) -> f64;
}

/// A family of univariate functions indexed by a non-negative degree
///
/// `build` must be safe to call concurrently: factories share one family
/// between every basis function they build.
pub trait UniVariateFunctionFamily: Debug + Send + Sync {
    /// Member of degree `degree`
    fn build(&self, degree: usize) -> Result<Arc<dyn UniVariateFunction>>;
}

impl<T: UniVariateFunction + ?Sized> UniVariateFunction for Arc<T> {
    fn value(&self, x: f64) -> f64 {
        (**self).value(x)
    }

    fn gradient(&self, x: f64) -> f64 {
        (**self).gradient(x)
    }

    fn hessian(&self, x: f64) -> f64 {
        (**self).hessian(x)
    }
}

impl<T: UniVariateFunctionFamily + ?Sized> UniVariateFunctionFamily for Arc<T> {
    fn build(&self, degree: usize) -> Result<Arc<dyn UniVariateFunction>> {
        (**self).build(degree)
    }
}

impl<T: UniVariateFunctionFamily + ?Sized> UniVariateFunctionFamily for Box<T> {
    fn build(&self, degree: usize) -> Result<Arc<dyn UniVariateFunction>> {
        (**self).build(degree)
    }
}
