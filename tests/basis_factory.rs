//! Integration tests for tensor-product basis construction

use ndarray::array;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;
use std::thread;
use tensorized_basis::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_monomial_product_derivatives() {
    init_logging();
    let factory =
        TensorizedUniVariateFunctionFactory::new(vec![PolynomialFamily::Monomial; 2]).unwrap();
    let f = factory.build(18).unwrap();
    assert_eq!(f.multi_index().unwrap().as_slice(), &[2, 3]);

    let point = [2.0, 1.0];
    assert_eq!(f.evaluate(&point).unwrap(), vec![4.0]);
    assert_eq!(f.gradient(&point).unwrap(), vec![4.0, 12.0]);
    assert_eq!(
        f.hessian(&point).unwrap(),
        array![[2.0, 12.0], [12.0, 24.0]]
    );
}

#[test]
fn test_three_families_with_two_dimensional_enumeration_fail() {
    let err = TensorizedUniVariateFunctionFactory::with_enumerate_function(
        vec![PolynomialFamily::Monomial; 3],
        EnumerateFunction::default_for(2).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        FunctionError::DimensionMismatch {
            expected: 2,
            actual: 3,
            ..
        }
    ));
}

#[rstest]
#[case(PolynomialFamily::Monomial)]
#[case(PolynomialFamily::Hermite)]
#[case(PolynomialFamily::Legendre)]
fn test_product_matches_factor_values(#[case] family: PolynomialFamily) {
    let factory = TensorizedUniVariateFunctionFactory::new(vec![family; 3]).unwrap();
    let point = [0.3, -1.2, 0.8];
    for index in 0..30 {
        let f = factory.build(index).unwrap();
        let multi = f.multi_index().unwrap().clone();
        let expected: f64 = multi
            .iter()
            .zip(point)
            .map(|(&k, x)| family.polynomial(k).unwrap().value(x))
            .product();
        let value = f.evaluate(&point).unwrap()[0];
        assert!((value - expected).abs() < 1e-12, "index {index} ({multi})");
    }
}

#[test]
fn test_gradient_matches_finite_differences() {
    let factory = TensorizedUniVariateFunctionFactory::with_enumerate_function(
        vec![PolynomialFamily::Hermite, PolynomialFamily::Legendre, PolynomialFamily::Monomial],
        AnisotropicEnumerateFunction::new(vec![1, 2, 1]).unwrap().into(),
    )
    .unwrap();
    let point = [0.4, -0.3, 1.1];
    let h = 1e-6;
    for index in [7, 23, 41] {
        let f = factory.build(index).unwrap();
        let gradient = f.gradient(&point).unwrap();
        for i in 0..3 {
            let mut plus = point;
            let mut minus = point;
            plus[i] += h;
            minus[i] -= h;
            let approx = (f.evaluate(&plus).unwrap()[0] - f.evaluate(&minus).unwrap()[0]) / (2.0 * h);
            assert!((approx - gradient[i]).abs() < 1e-6, "index {index}, component {i}");
        }
    }
}

#[test]
fn test_hessian_is_symmetric() {
    let factory =
        TensorizedUniVariateFunctionFactory::new(vec![PolynomialFamily::Legendre; 4]).unwrap();
    let f = factory.build(200).unwrap();
    let hessian = f.hessian(&[0.1, 0.2, -0.3, 0.7]).unwrap();
    assert_eq!(hessian.dim(), (4, 4));
    assert_eq!(hessian, hessian.t());
}

#[test]
fn test_built_functions_are_independent() {
    let factory =
        TensorizedUniVariateFunctionFactory::new(vec![PolynomialFamily::Monomial; 2]).unwrap();
    let a = factory.build(4).unwrap();
    let b = factory.build(4).unwrap();
    a.evaluate(&[1.0, 1.0]).unwrap();
    a.evaluate(&[1.0, 2.0]).unwrap();
    assert_eq!(a.calls_number(), 2);
    assert_eq!(b.calls_number(), 0);
}

#[test]
fn test_concurrent_builds_agree() {
    let factory = Arc::new(
        TensorizedUniVariateFunctionFactory::new(vec![PolynomialFamily::Hermite; 2]).unwrap(),
    );
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let factory = Arc::clone(&factory);
            thread::spawn(move || {
                (0..50)
                    .map(|i| factory.build(i).unwrap().evaluate(&[0.5, -0.5]).unwrap()[0])
                    .collect::<Vec<f64>>()
            })
        })
        .collect();
    let results: Vec<Vec<f64>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for other in &results[1..] {
        assert_eq!(other, &results[0]);
    }
}

#[test]
fn test_explicit_reset_on_resize() {
    let custom: EnumerateFunction = AnisotropicEnumerateFunction::new(vec![2, 1]).unwrap().into();
    let mut factory = TensorizedUniVariateFunctionFactory::with_enumerate_function(
        vec![PolynomialFamily::Legendre; 2],
        custom.clone(),
    )
    .unwrap();

    let discarded = factory
        .set_function_family_collection(vec![PolynomialFamily::Legendre; 4])
        .unwrap();
    assert_eq!(discarded, Some(custom));
    assert_eq!(factory.enumerate_function().dimension(), 4);
    assert_eq!(factory.build(1).unwrap().input_dimension(), 4);
}

#[test]
fn test_basis_truncated_by_total_degree() {
    let factory =
        TensorizedUniVariateFunctionFactory::new(vec![PolynomialFamily::Hermite; 3]).unwrap();
    let size = factory.enumerate_function().strata_cumulated_cardinal(2);
    assert_eq!(size, 10);
    let basis = factory.build_basis(size).unwrap();
    assert!(
        basis
            .iter()
            .all(|f| f.multi_index().unwrap().total_degree() <= 2)
    );
}

#[test]
fn test_degree_limit_propagates_from_family() {
    let factory =
        TensorizedUniVariateFunctionFactory::new(vec![PolynomialFamily::Legendre]).unwrap();
    assert!(factory.build(MAX).is_ok());
    assert!(matches!(
        factory.build(MAX + 1),
        Err(FunctionError::FamilyError { degree, .. }) if degree == MAX + 1
    ));
}

const MAX: usize = tensorized_basis::family::MAX_POLYNOMIAL_DEGREE;
