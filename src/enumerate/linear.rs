//! Enumeration graded by total degree

use super::{Enumerate, MultiIndex, binomial, saturate};
use crate::error::{FunctionError, Result};
use serde::{Deserialize, Serialize};

/// Graded enumeration by total degree with a closed-form rank and unrank
///
/// The stratum of degree `r` in dimension `d` holds `C(r+d-1, d-1)`
/// multi-indices, and strata `0..=r` together hold `C(r+d, d)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "LinearRecord", into = "LinearRecord")]
pub struct LinearEnumerateFunction {
    dimension: usize,
}

#[derive(Serialize, Deserialize)]
struct LinearRecord {
    dimension: usize,
}

impl TryFrom<LinearRecord> for LinearEnumerateFunction {
    type Error = FunctionError;

    fn try_from(record: LinearRecord) -> Result<Self> {
        Self::new(record.dimension)
    }
}

impl From<LinearEnumerateFunction> for LinearRecord {
    fn from(phi: LinearEnumerateFunction) -> Self {
        Self {
            dimension: phi.dimension,
        }
    }
}

impl LinearEnumerateFunction {
    /// Create the enumeration of dimension `dimension`
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(FunctionError::invalid_argument(
                "enumerate function dimension must be positive",
            ));
        }
        Ok(Self { dimension })
    }

    /// Number of multi-indices of total degree `<= degree` in `dimension` components
    fn cumulated(dimension: usize, degree: u128) -> u128 {
        binomial(degree + dimension as u128, dimension as u128)
    }

    /// Number of multi-indices over `m + 1` components of total degree `degree`
    /// whose first component is at least `k`
    fn tail(m: usize, degree: u128, k: u128) -> u128 {
        if k > degree {
            0
        } else {
            binomial(degree - k + m as u128, m as u128)
        }
    }

    /// Smallest degree `r` with more than `index` multi-indices of degree `<= r`
    fn degree_of(&self, index: u128) -> u128 {
        let (mut low, mut high) = (0u128, index);
        while low < high {
            let mid = low + (high - low) / 2;
            if Self::cumulated(self.dimension, mid) > index {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        low
    }
}

impl Enumerate for LinearEnumerateFunction {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn multi_index(&self, index: usize) -> MultiIndex {
        let index = index as u128;
        let mut degree = self.degree_of(index);
        let mut rank = match degree {
            0 => index,
            _ => index - Self::cumulated(self.dimension, degree - 1),
        };

        let mut components = MultiIndex::zeros(self.dimension).0;
        for position in 0..self.dimension - 1 {
            let m = self.dimension - position - 1;
            // Largest first component k whose block still contains `rank`
            let (mut low, mut high) = (0u128, degree);
            while low < high {
                let mid = low + (high - low).div_ceil(2);
                if Self::tail(m, degree, mid) > rank {
                    low = mid;
                } else {
                    high = mid - 1;
                }
            }
            rank -= Self::tail(m, degree, low + 1);
            components[position] = low as usize;
            degree -= low;
        }
        components[self.dimension - 1] = degree as usize;
        MultiIndex(components)
    }

    fn inverse(&self, multi_index: &[usize]) -> Result<usize> {
        if multi_index.len() != self.dimension {
            return Err(FunctionError::dimension_mismatch(
                "multi-index length",
                self.dimension,
                multi_index.len(),
            ));
        }
        let overflow = || FunctionError::overflow("linear enumeration rank");

        let mut degree = multi_index
            .iter()
            .try_fold(0u128, |acc, &k| acc.checked_add(k as u128))
            .ok_or_else(overflow)?;
        let mut index = match degree {
            0 => 0,
            _ => Self::cumulated(self.dimension, degree - 1),
        };
        for (position, &k) in multi_index[..self.dimension - 1].iter().enumerate() {
            let m = self.dimension - position - 1;
            let k = k as u128;
            index = index
                .checked_add(Self::tail(m, degree, k + 1))
                .ok_or_else(overflow)?;
            degree -= k;
        }
        usize::try_from(index).map_err(|_| overflow())
    }

    fn strata_index(&self, multi_index: &[usize]) -> usize {
        multi_index.iter().fold(0usize, |acc, &k| acc.saturating_add(k))
    }

    fn strata_cardinal(&self, strata: usize) -> usize {
        saturate(binomial(
            strata as u128 + self.dimension as u128 - 1,
            self.dimension as u128 - 1,
        ))
    }

    fn strata_cumulated_cardinal(&self, strata: usize) -> usize {
        saturate(Self::cumulated(self.dimension, strata as u128))
    }
}
