//! Enumeration graded by weighted degree

use super::{Enumerate, MultiIndex, binomial, saturate};
use crate::error::{FunctionError, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Graded enumeration by weighted degree `sum(w_i * k_i)`
///
/// Inside a stratum the order is the same as for
/// [`LinearEnumerateFunction`](super::LinearEnumerateFunction), which this
/// strategy reproduces exactly when every weight is one. Larger weights make a
/// direction enter the basis later. Strata with no member are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AnisotropicRecord", into = "AnisotropicRecord")]
pub struct AnisotropicEnumerateFunction {
    weights: Vec<usize>,
}

#[derive(Serialize, Deserialize)]
struct AnisotropicRecord {
    weights: Vec<usize>,
}

impl TryFrom<AnisotropicRecord> for AnisotropicEnumerateFunction {
    type Error = FunctionError;

    fn try_from(record: AnisotropicRecord) -> Result<Self> {
        Self::new(record.weights)
    }
}

impl From<AnisotropicEnumerateFunction> for AnisotropicRecord {
    fn from(phi: AnisotropicEnumerateFunction) -> Self {
        Self {
            weights: phi.weights,
        }
    }
}

/// Components sharing one weight
#[derive(Debug, Clone, Copy)]
struct WeightGroup {
    weight: u128,
    multiplicity: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Count {
    /// Weighted degree at most `s`
    Cumulated,
    /// Weighted degree exactly `s`
    Exact,
}

/// Counts the multi-indices of a set of weighted components by weighted degree
///
/// Components of equal weight are grouped, largest weight first. The last
/// group (or a last pair of single components) is counted in closed form and
/// the groups above it are summed over with memoisation, so the cost depends on
/// the number of distinct weights rather than growing with the count. Every
/// count stops at `cap`: a result equal to `cap` means "at least `cap`".
#[derive(Debug)]
struct LatticeCounter {
    groups: SmallVec<[WeightGroup; 8]>,
}

impl LatticeCounter {
    fn new(weights: &[usize]) -> Self {
        let mut sorted: SmallVec<[usize; 8]> = weights.iter().copied().collect();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        let mut groups: SmallVec<[WeightGroup; 8]> = SmallVec::new();
        for weight in sorted {
            let weight = weight as u128;
            match groups.last_mut() {
                Some(group) if group.weight == weight => group.multiplicity += 1,
                _ => groups.push(WeightGroup {
                    weight,
                    multiplicity: 1,
                }),
            }
        }
        Self { groups }
    }

    fn cumulated(&self, s: u128, cap: u128) -> u128 {
        self.count(Count::Cumulated, s, cap)
    }

    fn exact(&self, s: u128, cap: u128) -> u128 {
        self.count(Count::Exact, s, cap)
    }

    fn count(&self, kind: Count, s: u128, cap: u128) -> u128 {
        let mut memo = FxHashMap::default();
        self.count_from(0, kind, s, cap, &mut memo).min(cap)
    }

    fn count_from(
        &self,
        level: usize,
        kind: Count,
        s: u128,
        cap: u128,
        memo: &mut FxHashMap<(usize, u128), u128>,
    ) -> u128 {
        match &self.groups[level..] {
            [] => u128::from(kind == Count::Cumulated || s == 0),
            [group] => group_count(*group, kind, s),
            [first, second] if first.multiplicity == 1 && second.multiplicity == 1 => {
                pair_count(first.weight, second.weight, kind, s)
            }
            [group, ..] => {
                if let Some(&known) = memo.get(&(level, s)) {
                    return known;
                }
                let group = *group;
                let mut total: u128 = 0;
                for t in 0..=s / group.weight {
                    // Ways to spend `t * weight` inside the group
                    let ways = binomial(
                        t.saturating_add(group.multiplicity - 1),
                        group.multiplicity - 1,
                    );
                    let below = self.count_from(level + 1, kind, s - t * group.weight, cap, memo);
                    total = total.saturating_add(ways.saturating_mul(below));
                    if total >= cap {
                        total = cap;
                        break;
                    }
                }
                memo.insert((level, s), total);
                total
            }
        }
    }
}

/// Multi-indices of `multiplicity` components of equal weight
fn group_count(group: WeightGroup, kind: Count, s: u128) -> u128 {
    let WeightGroup {
        weight,
        multiplicity,
    } = group;
    match kind {
        Count::Cumulated => binomial((s / weight).saturating_add(multiplicity), multiplicity),
        Count::Exact if s % weight == 0 => binomial(
            (s / weight).saturating_add(multiplicity - 1),
            multiplicity - 1,
        ),
        Count::Exact => 0,
    }
}

/// Pairs `(i, j)` with `i * a + j * b` at most (or exactly) `s`
fn pair_count(a: u128, b: u128, kind: Count, s: u128) -> u128 {
    let cumulated = |s: u128| {
        let last = s / a;
        floor_sum(last.saturating_add(1), b, a, s - last * a).saturating_add(last.saturating_add(1))
    };
    match kind {
        Count::Cumulated => cumulated(s),
        Count::Exact if s == 0 => 1,
        Count::Exact => match cumulated(s) {
            u128::MAX => u128::MAX,
            upper => upper.saturating_sub(cumulated(s - 1)),
        },
    }
}

/// `sum_{i < n} floor((a * i + b) / m)`, saturating
fn floor_sum(mut n: u128, mut m: u128, mut a: u128, mut b: u128) -> u128 {
    let mut total: u128 = 0;
    loop {
        if a >= m {
            let pairs = if n % 2 == 0 {
                (n / 2).saturating_mul(n.saturating_sub(1))
            } else {
                n.saturating_mul((n - 1) / 2)
            };
            total = total.saturating_add(pairs.saturating_mul(a / m));
            a %= m;
        }
        if b >= m {
            total = total.saturating_add(n.saturating_mul(b / m));
            b %= m;
        }
        let Some(y_max) = a.checked_mul(n).and_then(|y| y.checked_add(b)) else {
            return u128::MAX;
        };
        if y_max < m {
            return total;
        }
        n = y_max / m;
        b = y_max % m;
        std::mem::swap(&mut m, &mut a);
    }
}

impl AnisotropicEnumerateFunction {
    /// Create the enumeration for the given per-component weights
    pub fn new(weights: Vec<usize>) -> Result<Self> {
        if weights.is_empty() {
            return Err(FunctionError::invalid_argument(
                "anisotropic enumeration needs at least one weight",
            ));
        }
        if let Some(position) = weights.iter().position(|&w| w == 0) {
            return Err(FunctionError::invalid_argument(format!(
                "anisotropic weight at position {position} must be positive"
            )));
        }
        Ok(Self { weights })
    }

    /// Per-component weights
    pub fn weights(&self) -> &[usize] {
        &self.weights
    }

    fn weighted_degree(&self, multi_index: &[usize]) -> Option<usize> {
        multi_index
            .iter()
            .zip(&self.weights)
            .try_fold(0usize, |acc, (&k, &w)| acc.checked_add(k.checked_mul(w)?))
    }
}

impl Enumerate for AnisotropicEnumerateFunction {
    fn dimension(&self) -> usize {
        self.weights.len()
    }

    fn multi_index(&self, index: usize) -> MultiIndex {
        let d = self.weights.len();
        let counters: Vec<LatticeCounter> = (0..d)
            .map(|position| LatticeCounter::new(&self.weights[position..]))
            .collect();
        let target = index as u128;
        let cap = target + 1;
        let total = &counters[0];

        // Smallest stratum whose cumulated cardinal exceeds `index`
        let mut high: u128 = 0;
        while high < u128::MAX && total.cumulated(high, cap) <= target {
            high = high.saturating_mul(2).max(1);
        }
        let mut low: u128 = high / 2;
        while low < high {
            let mid = low + (high - low) / 2;
            if total.cumulated(mid, cap) > target {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        let strata = low;
        let mut rank = match strata.checked_sub(1) {
            Some(previous) => target.saturating_sub(total.cumulated(previous, cap)),
            None => target,
        };

        let mut components = MultiIndex::zeros(d).0;
        let mut remaining = strata;
        for (position, (&weight, counter)) in self.weights.iter().zip(&counters).enumerate() {
            let weight = weight as u128;
            // Members of the stratum ranked before those whose component here is `k`
            let ahead = |k: u128| match (k + 1).checked_mul(weight) {
                Some(shift) if shift <= remaining => counter.exact(remaining - shift, rank + 1),
                _ => 0,
            };
            let (mut low, mut high) = (0u128, remaining / weight);
            while low < high {
                let mid = low + (high - low) / 2;
                if ahead(mid) <= rank {
                    high = mid;
                } else {
                    low = mid + 1;
                }
            }
            let skipped = ahead(low);
            rank -= skipped;
            components[position] = saturate(low);
            remaining -= low * weight;
        }
        MultiIndex(components)
    }

    fn inverse(&self, multi_index: &[usize]) -> Result<usize> {
        let d = self.weights.len();
        if multi_index.len() != d {
            return Err(FunctionError::dimension_mismatch(
                "multi-index length",
                d,
                multi_index.len(),
            ));
        }
        let overflow = || FunctionError::overflow("anisotropic enumeration rank");
        let strata = multi_index
            .iter()
            .zip(&self.weights)
            .try_fold(0u128, |acc, (&k, &w)| acc.checked_add((k as u128).checked_mul(w as u128)?))
            .ok_or_else(overflow)?;

        let cap = usize::MAX as u128 + 1;
        let mut index = match strata.checked_sub(1) {
            Some(previous) => LatticeCounter::new(&self.weights).cumulated(previous, cap),
            None => 0,
        };
        if index >= cap {
            return Err(overflow());
        }

        let mut remaining = strata;
        for (position, (&k, &weight)) in multi_index.iter().zip(&self.weights).enumerate() {
            let (k, weight) = (k as u128, weight as u128);
            if let Some(shift) = (k + 1).checked_mul(weight).filter(|&shift| shift <= remaining) {
                let ahead =
                    LatticeCounter::new(&self.weights[position..]).exact(remaining - shift, cap);
                index = index
                    .checked_add(ahead)
                    .filter(|&index| index < cap)
                    .ok_or_else(overflow)?;
            }
            remaining -= k * weight;
        }
        usize::try_from(index).map_err(|_| overflow())
    }

    fn strata_index(&self, multi_index: &[usize]) -> usize {
        self.weighted_degree(multi_index).unwrap_or(usize::MAX)
    }

    fn strata_cardinal(&self, strata: usize) -> usize {
        let cap = usize::MAX as u128 + 1;
        saturate(LatticeCounter::new(&self.weights).exact(strata as u128, cap))
    }

    fn strata_cumulated_cardinal(&self, strata: usize) -> usize {
        let cap = usize::MAX as u128 + 1;
        saturate(LatticeCounter::new(&self.weights).cumulated(strata as u128, cap))
    }
}
