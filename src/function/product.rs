//! Tensor product of univariate functions

use super::{CallTracker, Differentiable, Evaluation};
use crate::enumerate::MultiIndex;
use crate::error::{FunctionError, Result, check_selection};
use crate::family::UniVariateFunction;
use ndarray::Array2;
use std::sync::Arc;

/// `f(x) = g_1(x_1) * ... * g_d(x_d)` with exact product-rule derivatives
///
/// Every product "all factors but one" (or "but two") is formed from prefix
/// and suffix products, never by dividing the full product, so a factor that
/// vanishes at the point is handled exactly.
#[derive(Debug, Clone)]
pub struct TensorizedProductFunction {
    multi_index: Option<MultiIndex>,
    functions: Vec<Arc<dyn UniVariateFunction>>,
    tracker: CallTracker,
}

/// Factor values and derivatives at one point
struct Factors {
    values: Vec<f64>,
    gradients: Vec<f64>,
    /// `prefix[i]` is the product of `values[..i]`
    prefix: Vec<f64>,
    /// `suffix[i]` is the product of `values[i..]`
    suffix: Vec<f64>,
}

impl Factors {
    /// Product of every value except the one at `i`
    fn all_but(&self, i: usize) -> f64 {
        self.prefix[i] * self.suffix[i + 1]
    }
}

impl TensorizedProductFunction {
    /// Product of `functions`, one per input dimension
    pub fn new(functions: Vec<Arc<dyn UniVariateFunction>>) -> Result<Self> {
        if functions.is_empty() {
            return Err(FunctionError::invalid_argument(
                "a tensorized product needs at least one factor",
            ));
        }
        Ok(Self {
            multi_index: None,
            tracker: CallTracker::with_dimensions(functions.len(), 1),
            functions,
        })
    }

    /// Product built by a factory for `multi_index`
    pub(crate) fn with_multi_index(
        multi_index: MultiIndex,
        functions: Vec<Arc<dyn UniVariateFunction>>,
    ) -> Result<Self> {
        if multi_index.dimension() != functions.len() {
            return Err(FunctionError::dimension_mismatch(
                "multi-index vs univariate factors",
                functions.len(),
                multi_index.dimension(),
            ));
        }
        let mut product = Self::new(functions)?;
        product.multi_index = Some(multi_index);
        Ok(product)
    }

    /// The multi-index this product was built for, if built by a factory
    pub fn multi_index(&self) -> Option<&MultiIndex> {
        self.multi_index.as_ref()
    }

    /// The univariate factors
    pub fn functions(&self) -> &[Arc<dyn UniVariateFunction>] {
        &self.functions
    }

    /// Call tracker
    pub fn tracker(&self) -> &CallTracker {
        &self.tracker
    }

    /// Start recording input/output pairs
    pub fn enable_history(&self) {
        self.tracker.enable_history();
    }

    /// Stop recording input/output pairs
    pub fn disable_history(&self) {
        self.tracker.disable_history();
    }

    /// Whether input/output pairs are recorded
    pub fn is_history_enabled(&self) -> bool {
        self.tracker.is_history_enabled()
    }

    /// Drop the recorded pairs
    pub fn clear_history(&self) {
        self.tracker.clear_history();
    }

    /// Recorded input points, one row per call
    pub fn history_input(&self) -> Array2<f64> {
        self.tracker.history_input()
    }

    /// Recorded values, as a one-column sample
    pub fn history_output(&self) -> Array2<f64> {
        self.tracker.history_output()
    }

    fn check_point(&self, point: &[f64]) -> Result<()> {
        if point.len() != self.functions.len() {
            return Err(FunctionError::dimension_mismatch(
                "tensorized product input point",
                self.functions.len(),
                point.len(),
            ));
        }
        Ok(())
    }

    fn factors(&self, point: &[f64]) -> Factors {
        let d = self.functions.len();
        let values: Vec<f64> = self
            .functions
            .iter()
            .zip(point)
            .map(|(g, &x)| g.value(x))
            .collect();
        let gradients = self
            .functions
            .iter()
            .zip(point)
            .map(|(g, &x)| g.gradient(x))
            .collect();

        let mut prefix = vec![1.0; d + 1];
        let mut suffix = vec![1.0; d + 1];
        for i in 0..d {
            prefix[i + 1] = prefix[i] * values[i];
            suffix[d - i - 1] = suffix[d - i] * values[d - i - 1];
        }
        Factors {
            values,
            gradients,
            prefix,
            suffix,
        }
    }

    /// Value at `point`
    pub fn value(&self, point: &[f64]) -> Result<f64> {
        self.check_point(point)?;
        Ok(self
            .functions
            .iter()
            .zip(point)
            .map(|(g, &x)| g.value(x))
            .product())
    }
}

impl Evaluation for TensorizedProductFunction {
    fn input_dimension(&self) -> usize {
        self.functions.len()
    }

    fn output_dimension(&self) -> usize {
        1
    }

    fn evaluate(&self, point: &[f64]) -> Result<Vec<f64>> {
        let output = vec![self.value(point)?];
        self.tracker.record(point, &output);
        Ok(output)
    }

    fn marginal(&self, indices: &[usize]) -> Result<Box<dyn Evaluation>> {
        check_selection(indices, 1)?;
        if indices.is_empty() {
            return Err(FunctionError::invalid_argument("empty marginal selection"));
        }
        Ok(Box::new(Self {
            multi_index: self.multi_index.clone(),
            functions: self.functions.clone(),
            tracker: CallTracker::with_dimensions(self.functions.len(), 1),
        }))
    }

    fn calls_number(&self) -> usize {
        self.tracker.calls_number()
    }
}

impl Differentiable for TensorizedProductFunction {
    fn gradient(&self, point: &[f64]) -> Result<Vec<f64>> {
        self.check_point(point)?;
        let factors = self.factors(point);
        Ok((0..self.functions.len())
            .map(|i| factors.gradients[i] * factors.all_but(i))
            .collect())
    }

    fn hessian(&self, point: &[f64]) -> Result<Array2<f64>> {
        self.check_point(point)?;
        let d = self.functions.len();
        let factors = self.factors(point);
        let mut hessian = Array2::zeros((d, d));

        for i in 0..d {
            hessian[[i, i]] = self.functions[i].hessian(point[i]) * factors.all_but(i);

            // Running product of the values strictly between i and j
            let mut between = 1.0;
            for j in (i + 1)..d {
                let entry = factors.gradients[i]
                    * factors.gradients[j]
                    * factors.prefix[i]
                    * between
                    * factors.suffix[j + 1];
                hessian[[i, j]] = entry;
                hessian[[j, i]] = entry;
                between *= factors.values[j];
            }
        }
        Ok(hessian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{PolynomialFamily, UniVariateFunctionFamily, UniVariatePolynomial};
    use ndarray::array;
    use pretty_assertions::assert_eq;

    fn monomials(degrees: &[usize]) -> TensorizedProductFunction {
        let functions = degrees
            .iter()
            .map(|&k| PolynomialFamily::Monomial.build(k).unwrap())
            .collect();
        TensorizedProductFunction::new(functions).unwrap()
    }

    #[test]
    fn test_value_gradient_hessian() {
        // x1^2 * x2^3 at (2, 1)
        let f = monomials(&[2, 3]);
        assert_eq!(f.evaluate(&[2.0, 1.0]).unwrap(), vec![4.0]);
        assert_eq!(f.gradient(&[2.0, 1.0]).unwrap(), vec![4.0, 12.0]);
        assert_eq!(
            f.hessian(&[2.0, 1.0]).unwrap(),
            array![[2.0, 12.0], [12.0, 24.0]]
        );
    }

    #[test]
    fn test_zero_factor_is_exact() {
        // x1 * x2 * x3 at (0, 2, 3): no division by the zero factor
        let f = monomials(&[1, 1, 1]);
        let point = [0.0, 2.0, 3.0];
        assert_eq!(f.value(&point).unwrap(), 0.0);
        assert_eq!(f.gradient(&point).unwrap(), vec![6.0, 0.0, 0.0]);
        assert_eq!(
            f.hessian(&point).unwrap(),
            array![[0.0, 3.0, 2.0], [3.0, 0.0, 0.0], [2.0, 0.0, 0.0]]
        );
    }

    #[test]
    fn test_hessian_matches_finite_differences() {
        let functions: Vec<Arc<dyn UniVariateFunction>> = vec![
            Arc::new(UniVariatePolynomial::new(vec![1.0, -2.0, 0.5])),
            PolynomialFamily::Hermite.build(3).unwrap(),
            PolynomialFamily::Legendre.build(2).unwrap(),
        ];
        let f = TensorizedProductFunction::new(functions).unwrap();
        let point = [0.3, -0.7, 0.9];
        let h = 1e-5;
        let hessian = f.hessian(&point).unwrap();
        for i in 0..3 {
            let mut plus = point;
            let mut minus = point;
            plus[i] += h;
            minus[i] -= h;
            let gp = f.gradient(&plus).unwrap();
            let gm = f.gradient(&minus).unwrap();
            for j in 0..3 {
                let approx = (gp[j] - gm[j]) / (2.0 * h);
                assert!(
                    (approx - hessian[[j, i]]).abs() < 1e-6,
                    "entry ({j},{i}): {approx} vs {}",
                    hessian[[j, i]]
                );
            }
        }
    }

    #[test]
    fn test_point_length_is_checked() {
        let f = monomials(&[1, 2]);
        assert!(f.evaluate(&[1.0]).unwrap_err().is_dimension_mismatch());
        assert!(f.gradient(&[1.0, 2.0, 3.0]).is_err());
        assert!(f.hessian(&[]).is_err());
        assert_eq!(f.calls_number(), 0);
    }

    #[test]
    fn test_marginal_of_scalar_function() {
        let f = monomials(&[1]);
        f.evaluate(&[2.0]).unwrap();
        let m = f.marginal(&[0]).unwrap();
        assert_eq!(m.evaluate(&[3.0]).unwrap(), vec![3.0]);
        assert_eq!(m.calls_number(), 1);
        assert!(f.marginal(&[1]).unwrap_err().is_selection_error());
        assert!(f.marginal(&[]).is_err());
    }

    #[test]
    fn test_history() {
        let f = monomials(&[2, 1]);
        f.evaluate(&[1.0, 1.0]).unwrap();
        assert_eq!(f.history_input().dim(), (0, 2));

        f.enable_history();
        f.evaluate(&[2.0, 3.0]).unwrap();
        f.evaluate(&[1.0, -1.0]).unwrap();
        f.gradient(&[5.0, 5.0]).unwrap();
        assert!(f.is_history_enabled());
        assert_eq!(f.history_input(), array![[2.0, 3.0], [1.0, -1.0]]);
        assert_eq!(f.history_output(), array![[12.0], [-1.0]]);
        assert_eq!(f.calls_number(), 3);

        f.clear_history();
        f.disable_history();
        f.evaluate(&[0.0, 0.0]).unwrap();
        assert_eq!(f.history_output().dim(), (0, 1));
    }

    #[test]
    fn test_rejects_empty_product() {
        assert!(TensorizedProductFunction::new(Vec::new()).is_err());
        let err = TensorizedProductFunction::with_multi_index(
            MultiIndex::from([1, 2]),
            vec![PolynomialFamily::Monomial.build(1).unwrap()],
        )
        .unwrap_err();
        assert!(err.is_dimension_mismatch());
    }
}
