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

//! Tensor-product basis generation
//!
//! [`TensorizedUniVariateFunctionFactory`] pairs one univariate family per
//! input dimension with an [`EnumerateFunction`] of the same dimension.
//! Basis element `i` is the product of `families[k].build(phi(i)[k])`.
//!
//! ```
//! use tensorized_basis::{Differentiable, PolynomialFamily, TensorizedUniVariateFunctionFactory};
//!
//! let factory = TensorizedUniVariateFunctionFactory::new(vec![PolynomialFamily::Monomial; 2]).unwrap();
//! let f = factory.build(18).unwrap(); // x1^2 * x2^3
//! assert_eq!(f.gradient(&[2.0, 1.0]).unwrap(), vec![4.0, 12.0]);
//! ```

use crate::enumerate::{Enumerate, EnumerateFunction};
use crate::error::{FunctionError, Result};
use crate::family::{PolynomialFamily, UniVariateFunction, UniVariateFunctionFamily};
use crate::function::TensorizedProductFunction;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Builds tensor-product basis functions by linear index
///
/// Invariant: the number of families always equals the dimension of the
/// enumerate function. Every mutator either keeps it or fails.
#[derive(Debug, Clone)]
pub struct TensorizedUniVariateFunctionFactory<F = PolynomialFamily> {
    families: Vec<F>,
    enumerate_function: EnumerateFunction,
}

fn check_consistency(families: usize, enumerate_function: &EnumerateFunction) -> Result<()> {
    if families != enumerate_function.dimension() {
        return Err(FunctionError::dimension_mismatch(
            "function families vs enumerate function dimension",
            enumerate_function.dimension(),
            families,
        ));
    }
    Ok(())
}

impl<F: UniVariateFunctionFamily> TensorizedUniVariateFunctionFactory<F> {
    /// Factory over `families` with the default enumeration
    pub fn new(families: Vec<F>) -> Result<Self> {
        let enumerate_function = EnumerateFunction::default_for(families.len())?;
        Ok(Self {
            families,
            enumerate_function,
        })
    }

    /// Factory over `families` with an explicit enumeration
    ///
    /// Fails when the number of families differs from the enumeration dimension.
    pub fn with_enumerate_function(
        families: Vec<F>,
        enumerate_function: EnumerateFunction,
    ) -> Result<Self> {
        check_consistency(families.len(), &enumerate_function)?;
        Ok(Self {
            families,
            enumerate_function,
        })
    }

    /// Number of input dimensions
    pub fn dimension(&self) -> usize {
        self.families.len()
    }

    /// The univariate families, one per input dimension
    pub fn function_family_collection(&self) -> &[F] {
        &self.families
    }

    /// The enumerate function
    pub fn enumerate_function(&self) -> &EnumerateFunction {
        &self.enumerate_function
    }

    /// Replace the enumerate function; its dimension must match the families
    pub fn set_enumerate_function(&mut self, enumerate_function: EnumerateFunction) -> Result<()> {
        check_consistency(self.families.len(), &enumerate_function)?;
        self.enumerate_function = enumerate_function;
        Ok(())
    }

    /// Replace the families
    ///
    /// When the new collection has a different size, the enumerate function is
    /// reset to the default enumeration of that size and the discarded one is
    /// returned. Returns `None` when the enumerate function is kept.
    pub fn set_function_family_collection(
        &mut self,
        families: Vec<F>,
    ) -> Result<Option<EnumerateFunction>> {
        if families.len() == self.enumerate_function.dimension() {
            self.families = families;
            return Ok(None);
        }

        let reset = EnumerateFunction::default_for(families.len())?;
        log::info!(
            "Family collection resized from {} to {}: replacing {} by the default enumeration",
            self.families.len(),
            families.len(),
            self.enumerate_function
        );
        self.families = families;
        Ok(Some(std::mem::replace(&mut self.enumerate_function, reset)))
    }

    /// Replace families and enumerate function together, failing on mismatch
    pub fn replace_function_family_collection(
        &mut self,
        families: Vec<F>,
        enumerate_function: EnumerateFunction,
    ) -> Result<()> {
        check_consistency(families.len(), &enumerate_function)?;
        self.families = families;
        self.enumerate_function = enumerate_function;
        Ok(())
    }

    /// Basis function of linear index `index`
    ///
    /// Errors from the families are propagated unchanged.
    pub fn build(&self, index: usize) -> Result<TensorizedProductFunction> {
        let multi_index = self.enumerate_function.multi_index(index);
        if multi_index.dimension() != self.families.len() {
            return Err(FunctionError::dimension_mismatch(
                "multi-index vs function families",
                self.families.len(),
                multi_index.dimension(),
            ));
        }

        let functions = self
            .families
            .iter()
            .zip(multi_index.iter())
            .map(|(family, &degree)| family.build(degree))
            .collect::<Result<Vec<Arc<dyn UniVariateFunction>>>>()?;
        log::trace!("Built basis function {index} for multi-index {multi_index}");
        TensorizedProductFunction::with_multi_index(multi_index, functions)
    }

    /// The first `size` basis functions in index order
    pub fn build_basis(&self, size: usize) -> Result<Vec<TensorizedProductFunction>> {
        log::debug!(
            "Building {size} basis functions of dimension {}",
            self.dimension()
        );
        (0..size).map(|index| self.build(index)).collect()
    }
}

impl<F: fmt::Debug> fmt::Display for TensorizedUniVariateFunctionFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TensorizedUniVariateFunctionFactory(families={:?}, enumerate_function={})",
            self.families, self.enumerate_function
        )
    }
}

#[derive(Serialize)]
struct FactoryRecordRef<'a, F> {
    families: &'a [F],
    enumerate_function: &'a EnumerateFunction,
}

#[derive(Deserialize)]
struct FactoryRecord<F> {
    families: Vec<F>,
    enumerate_function: EnumerateFunction,
}

impl<F: Serialize> Serialize for TensorizedUniVariateFunctionFactory<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        FactoryRecordRef {
            families: &self.families,
            enumerate_function: &self.enumerate_function,
        }
        .serialize(serializer)
    }
}

impl<'de, F> Deserialize<'de> for TensorizedUniVariateFunctionFactory<F>
where
    F: UniVariateFunctionFamily + DeserializeOwned,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let record = FactoryRecord::<F>::deserialize(deserializer)?;
        Self::with_enumerate_function(record.families, record.enumerate_function)
            .map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerate::{AnisotropicEnumerateFunction, LinearEnumerateFunction, MultiIndex};
    use crate::function::{Differentiable, Evaluation};
    use ndarray::array;
    use pretty_assertions::assert_eq;

    fn monomial_factory(d: usize) -> TensorizedUniVariateFunctionFactory {
        TensorizedUniVariateFunctionFactory::new(vec![PolynomialFamily::Monomial; d]).unwrap()
    }

    fn linear(d: usize) -> EnumerateFunction {
        LinearEnumerateFunction::new(d).unwrap().into()
    }

    /// Family that only knows degrees below a bound
    #[derive(Debug)]
    struct Truncated(usize);

    impl UniVariateFunctionFamily for Truncated {
        fn build(&self, degree: usize) -> Result<Arc<dyn UniVariateFunction>> {
            if degree >= self.0 {
                return Err(FunctionError::family_error("Truncated", degree, "too high"));
            }
            PolynomialFamily::Monomial.build(degree)
        }
    }

    #[test]
    fn test_build_example_product() {
        let factory = monomial_factory(2);
        let f = factory.build(18).unwrap();
        assert_eq!(f.multi_index(), Some(&MultiIndex::from([2, 3])));
        assert_eq!(f.evaluate(&[2.0, 1.0]).unwrap(), vec![4.0]);
        assert_eq!(f.gradient(&[2.0, 1.0]).unwrap(), vec![4.0, 12.0]);
        assert_eq!(
            f.hessian(&[2.0, 1.0]).unwrap(),
            array![[2.0, 12.0], [12.0, 24.0]]
        );
    }

    #[test]
    fn test_construction_checks_dimension() {
        let err = TensorizedUniVariateFunctionFactory::with_enumerate_function(
            vec![PolynomialFamily::Hermite; 3],
            linear(2),
        )
        .unwrap_err();
        assert!(err.is_dimension_mismatch());

        let empty: Vec<PolynomialFamily> = Vec::new();
        assert!(TensorizedUniVariateFunctionFactory::new(empty).is_err());
    }

    #[test]
    fn test_resize_resets_enumerate_function() {
        let anisotropic: EnumerateFunction = AnisotropicEnumerateFunction::new(vec![1, 2]).unwrap().into();
        let mut factory = TensorizedUniVariateFunctionFactory::with_enumerate_function(
            vec![PolynomialFamily::Legendre; 2],
            anisotropic.clone(),
        )
        .unwrap();

        let kept = factory
            .set_function_family_collection(vec![PolynomialFamily::Hermite; 2])
            .unwrap();
        assert_eq!(kept, None);
        assert_eq!(factory.enumerate_function(), &anisotropic);

        let discarded = factory
            .set_function_family_collection(vec![PolynomialFamily::Hermite; 3])
            .unwrap();
        assert_eq!(discarded, Some(anisotropic));
        assert_eq!(factory.enumerate_function(), &linear(3));
        assert_eq!(factory.dimension(), 3);
    }

    #[test]
    fn test_strict_replacement() {
        let mut factory = monomial_factory(2);
        assert!(
            factory
                .replace_function_family_collection(vec![PolynomialFamily::Monomial; 3], linear(2))
                .unwrap_err()
                .is_dimension_mismatch()
        );
        assert_eq!(factory.dimension(), 2);

        factory
            .replace_function_family_collection(vec![PolynomialFamily::Monomial; 3], linear(3))
            .unwrap();
        assert_eq!(factory.dimension(), 3);

        assert!(factory.set_enumerate_function(linear(2)).is_err());
        assert_eq!(factory.enumerate_function(), &linear(3));
    }

    #[test]
    fn test_family_errors_propagate() {
        let factory =
            TensorizedUniVariateFunctionFactory::new(vec![Truncated(2), Truncated(2)]).unwrap();
        assert!(factory.build(4).is_ok());
        let err = factory.build(5).unwrap_err();
        assert_eq!(err, FunctionError::family_error("Truncated", 2, "too high"));
    }

    #[test]
    fn test_shared_dynamic_families() {
        let families: Vec<Arc<dyn UniVariateFunctionFamily>> = vec![
            Arc::new(PolynomialFamily::Hermite),
            Arc::new(PolynomialFamily::Legendre),
        ];
        let factory = TensorizedUniVariateFunctionFactory::new(families).unwrap();
        // He_1(x1) * P_1(x2) = x1 * x2
        let f = factory.build(4).unwrap();
        assert_eq!(f.evaluate(&[3.0, 0.5]).unwrap(), vec![1.5]);
    }

    #[test]
    fn test_build_basis_order() {
        let factory = monomial_factory(2);
        let basis = factory.build_basis(6).unwrap();
        let indices: Vec<String> = basis
            .iter()
            .map(|f| f.multi_index().map(|m| m.to_string()).unwrap_or_default())
            .collect();
        assert_eq!(
            indices,
            vec!["[0,0]", "[1,0]", "[0,1]", "[2,0]", "[1,1]", "[0,2]"]
        );
    }

    #[test]
    fn test_serde_revalidates_dimension() {
        let factory = monomial_factory(2);
        let json = serde_json::to_string(&factory).unwrap();
        let back: TensorizedUniVariateFunctionFactory = serde_json::from_str(&json).unwrap();
        assert_eq!(back.enumerate_function(), factory.enumerate_function());

        let corrupted = r#"{"families":[{"family":"monomial"}],"enumerate_function":{"kind":"linear","dimension":2}}"#;
        assert!(serde_json::from_str::<TensorizedUniVariateFunctionFactory>(corrupted).is_err());
    }
}
