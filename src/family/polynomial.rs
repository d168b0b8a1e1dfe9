//! Polynomial families built from three-term recurrences

use super::{UniVariateFunction, UniVariateFunctionFamily};
use crate::error::{FunctionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Highest degree a [`PolynomialFamily`] builds
pub const MAX_POLYNOMIAL_DEGREE: usize = 128;

/// Polynomial stored by its coefficients in increasing degree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniVariatePolynomial {
    coefficients: Vec<f64>,
}

impl UniVariatePolynomial {
    /// Polynomial `sum(c_k * x^k)`; trailing zero coefficients are dropped
    pub fn new(mut coefficients: Vec<f64>) -> Self {
        while coefficients.len() > 1 && coefficients.last() == Some(&0.0) {
            coefficients.pop();
        }
        if coefficients.is_empty() {
            coefficients.push(0.0);
        }
        Self { coefficients }
    }

    /// The monomial `x^degree`
    pub fn monomial(degree: usize) -> Self {
        let mut coefficients = vec![0.0; degree + 1];
        coefficients[degree] = 1.0;
        Self { coefficients }
    }

    /// Coefficients in increasing degree
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Degree of the polynomial (0 for constants, including zero)
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Horner evaluation of the `order`-th derivative
    fn derivative_at(&self, x: f64, order: usize) -> f64 {
        self.coefficients
            .iter()
            .enumerate()
            .skip(order)
            .rev()
            .fold(0.0, |acc, (k, &c)| {
                // k! / (k - order)!
                let factor: f64 = ((k - order + 1)..=k).map(|j| j as f64).product();
                acc * x + c * factor
            })
    }

    /// `x * self`
    fn shift(&self) -> Vec<f64> {
        let mut shifted = Vec::with_capacity(self.coefficients.len() + 1);
        shifted.push(0.0);
        shifted.extend_from_slice(&self.coefficients);
        shifted
    }
}

impl UniVariateFunction for UniVariatePolynomial {
    fn value(&self, x: f64) -> f64 {
        self.derivative_at(x, 0)
    }

    fn gradient(&self, x: f64) -> f64 {
        self.derivative_at(x, 1)
    }

    fn hessian(&self, x: f64) -> f64 {
        self.derivative_at(x, 2)
    }
}

impl fmt::Display for UniVariatePolynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        for (k, &c) in self.coefficients.iter().enumerate() {
            if c == 0.0 {
                continue;
            }
            if wrote {
                write!(f, " + ")?;
            }
            match k {
                0 => write!(f, "{c}")?,
                1 => write!(f, "{c} * X")?,
                _ => write!(f, "{c} * X^{k}")?,
            }
            wrote = true;
        }
        if !wrote {
            write!(f, "0")?;
        }
        Ok(())
    }
}

/// Standard polynomial families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum PolynomialFamily {
    /// `x^k`
    Monomial,
    /// Probabilists' Hermite polynomials, `He_{n+1} = x He_n - n He_{n-1}`
    Hermite,
    /// Legendre polynomials, `(n+1) P_{n+1} = (2n+1) x P_n - n P_{n-1}`
    Legendre,
}

impl PolynomialFamily {
    /// Family name used in errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::Monomial => "Monomial",
            Self::Hermite => "Hermite",
            Self::Legendre => "Legendre",
        }
    }

    /// Coefficients of the recurrence `P_{n+1} = (a_n x) P_n - b_n P_{n-1}`
    fn recurrence(&self, n: usize) -> (f64, f64) {
        let n = n as f64;
        match self {
            Self::Monomial => (1.0, 0.0),
            Self::Hermite => (1.0, n),
            Self::Legendre => ((2.0 * n + 1.0) / (n + 1.0), n / (n + 1.0)),
        }
    }

    /// Member of degree `degree` as an explicit polynomial
    pub fn polynomial(&self, degree: usize) -> Result<UniVariatePolynomial> {
        if degree > MAX_POLYNOMIAL_DEGREE {
            return Err(FunctionError::family_error(
                self.name(),
                degree,
                format!("degree exceeds the maximum of {MAX_POLYNOMIAL_DEGREE}"),
            ));
        }
        if matches!(self, Self::Monomial) {
            return Ok(UniVariatePolynomial::monomial(degree));
        }

        let mut previous = UniVariatePolynomial::new(vec![1.0]);
        if degree == 0 {
            return Ok(previous);
        }
        let mut current = UniVariatePolynomial::new(vec![0.0, 1.0]);
        for n in 1..degree {
            let (a, b) = self.recurrence(n);
            let mut next: Vec<f64> = current.shift().into_iter().map(|c| a * c).collect();
            for (slot, &c) in next.iter_mut().zip(&previous.coefficients) {
                *slot -= b * c;
            }
            previous = std::mem::replace(&mut current, UniVariatePolynomial::new(next));
        }
        log::trace!("Built {} polynomial of degree {degree}", self.name());
        Ok(current)
    }
}

impl UniVariateFunctionFamily for PolynomialFamily {
    fn build(&self, degree: usize) -> Result<Arc<dyn UniVariateFunction>> {
        Ok(Arc::new(self.polynomial(degree)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_monomial_derivatives() {
        let cube = PolynomialFamily::Monomial.polynomial(3).unwrap();
        assert_eq!(cube.value(2.0), 8.0);
        assert_eq!(cube.gradient(2.0), 12.0);
        assert_eq!(cube.hessian(2.0), 12.0);

        let constant = PolynomialFamily::Monomial.polynomial(0).unwrap();
        assert_eq!(constant.value(5.0), 1.0);
        assert_eq!(constant.gradient(5.0), 0.0);
        assert_eq!(constant.hessian(5.0), 0.0);
    }

    #[rstest]
    #[case(PolynomialFamily::Hermite, 2, vec![-1.0, 0.0, 1.0])]
    #[case(PolynomialFamily::Hermite, 3, vec![0.0, -3.0, 0.0, 1.0])]
    #[case(PolynomialFamily::Hermite, 4, vec![3.0, 0.0, -6.0, 0.0, 1.0])]
    #[case(PolynomialFamily::Legendre, 2, vec![-0.5, 0.0, 1.5])]
    #[case(PolynomialFamily::Legendre, 3, vec![0.0, -1.5, 0.0, 2.5])]
    fn test_recurrence_coefficients(
        #[case] family: PolynomialFamily,
        #[case] degree: usize,
        #[case] expected: Vec<f64>,
    ) {
        let polynomial = family.polynomial(degree).unwrap();
        assert_eq!(polynomial.degree(), degree);
        for (actual, expected) in polynomial.coefficients().iter().zip(&expected) {
            assert!((actual - expected).abs() < 1e-12, "{polynomial}");
        }
    }

    #[test]
    fn test_legendre_is_one_at_one() {
        for degree in 0..20 {
            let p = PolynomialFamily::Legendre.polynomial(degree).unwrap();
            assert!((p.value(1.0) - 1.0).abs() < 1e-9, "degree {degree}");
        }
    }

    #[test]
    fn test_degree_limit() {
        assert!(PolynomialFamily::Hermite.polynomial(MAX_POLYNOMIAL_DEGREE).is_ok());
        let err = PolynomialFamily::Legendre
            .build(MAX_POLYNOMIAL_DEGREE + 1)
            .unwrap_err();
        assert!(matches!(err, FunctionError::FamilyError { ref family, .. } if family == "Legendre"));
    }

    #[test]
    fn test_display() {
        let p = UniVariatePolynomial::new(vec![-1.0, 0.0, 1.0, 0.0]);
        assert_eq!(p.degree(), 2);
        assert_eq!(p.to_string(), "-1 + 1 * X^2");
        assert_eq!(UniVariatePolynomial::new(vec![]).to_string(), "0");
    }

    #[test]
    fn test_family_serde_tag() {
        let json = serde_json::to_string(&PolynomialFamily::Hermite).unwrap();
        assert_eq!(json, r#"{"family":"hermite"}"#);
        let back: PolynomialFamily = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PolynomialFamily::Hermite);
    }
}
