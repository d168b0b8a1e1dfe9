//! Property tests for the enumerate functions

use proptest::prelude::*;
use rustc_hash::FxHashSet;
use tensorized_basis::{
    AnisotropicEnumerateFunction, Enumerate, EnumerateFunction, LinearEnumerateFunction,
};

fn strategies() -> impl Strategy<Value = EnumerateFunction> {
    prop_oneof![
        (1usize..6).prop_map(|d| LinearEnumerateFunction::new(d).unwrap().into()),
        prop::collection::vec(1usize..4, 1..5)
            .prop_map(|w| AnisotropicEnumerateFunction::new(w).unwrap().into()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn window_is_injective_and_graded(phi in strategies(), start in 0usize..500, len in 1usize..200) {
        let mut seen = FxHashSet::default();
        let mut previous_strata = 0;
        for index in start..start + len {
            let multi = phi.multi_index(index);
            prop_assert_eq!(multi.len(), phi.dimension());
            prop_assert!(seen.insert(multi.clone()), "{} repeated at {}", multi, index);

            let strata = phi.strata_index(&multi);
            prop_assert!(strata >= previous_strata);
            previous_strata = strata;
        }
    }

    #[test]
    fn inverse_round_trips(phi in strategies(), index in 0usize..5_000) {
        let multi = phi.multi_index(index);
        prop_assert_eq!(phi.inverse(&multi).unwrap(), index);
        prop_assert_eq!(phi.multi_index(index), multi);
    }

    #[test]
    fn strata_cardinals_partition_the_indices(phi in strategies(), strata in 0usize..8) {
        let cumulated = phi.strata_cumulated_cardinal(strata);
        let sum: usize = (0..=strata).map(|s| phi.strata_cardinal(s)).sum();
        prop_assert_eq!(cumulated, sum);

        // Truncation boundary: the last kept index is inside, the next one beyond
        let last = phi.multi_index(cumulated - 1);
        prop_assert!(phi.strata_index(&last) <= strata);
        let next = phi.multi_index(cumulated);
        prop_assert!(phi.strata_index(&next) > strata);
    }

    #[test]
    fn linear_rank_is_exact_for_large_indices(d in 1usize..4, index in 1_000_000usize..1_000_000_000) {
        let phi = LinearEnumerateFunction::new(d).unwrap();
        let multi = phi.multi_index(index);
        prop_assert_eq!(phi.inverse(&multi).unwrap(), index);
        let before = phi.multi_index(index - 1);
        prop_assert!(before.total_degree() <= multi.total_degree());
    }

    #[test]
    fn anisotropic_rank_is_exact_for_large_indices(
        weights in prop::collection::vec(1usize..5, 1..4),
        index in 1_000_000usize..10_000_000_000,
    ) {
        let phi = AnisotropicEnumerateFunction::new(weights).unwrap();
        let multi = phi.multi_index(index);
        prop_assert_eq!(phi.inverse(&multi).unwrap(), index);
        let before = phi.multi_index(index - 1);
        prop_assert!(phi.strata_index(&before) <= phi.strata_index(&multi));
        prop_assert_eq!(phi.inverse(&before).unwrap(), index - 1);
    }
}

#[test]
fn window_covers_every_multi_index_of_low_degree() {
    let phi = LinearEnumerateFunction::new(3).unwrap();
    let window: FxHashSet<Vec<usize>> = phi.iter().take(20).map(|m| m.to_vec()).collect();
    for a in 0..=3 {
        for b in 0..=3 - a {
            for c in 0..=3 - a - b {
                assert!(window.contains(&vec![a, b, c]), "missing [{a},{b},{c}]");
            }
        }
    }
}
