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

//! Enumeration of multi-indices
//!
//! An enumerate function is a bijection between the non-negative integers and
//! the multi-indices of a fixed dimension `d`. Indices are graded: the degree of
//! `phi(i)` never decreases with `i`, and inside one degree (stratum) the
//! multi-indices are ordered with the first component largest first, then the
//! same rule applied to the remaining components. For `d = 2`:
//!
//! ```text
//! 0 -> [0,0]   1 -> [1,0]   2 -> [0,1]   3 -> [2,0]   4 -> [1,1]   5 -> [0,2]
//! ```

mod anisotropic;
mod linear;

pub use anisotropic::AnisotropicEnumerateFunction;
pub use linear::LinearEnumerateFunction;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::ops::Deref;

/// Ordered tuple of non-negative integers, one per input dimension
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiIndex(SmallVec<[usize; 8]>);

impl MultiIndex {
    /// Create a multi-index from its components
    pub fn new(components: impl Into<SmallVec<[usize; 8]>>) -> Self {
        Self(components.into())
    }

    /// Multi-index of `dimension` zeros
    pub fn zeros(dimension: usize) -> Self {
        Self(SmallVec::from_elem(0, dimension))
    }

    /// Number of components
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Sum of the components
    pub fn total_degree(&self) -> usize {
        self.0.iter().sum()
    }

    /// Components as a slice
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl Deref for MultiIndex {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for MultiIndex {
    fn from(components: Vec<usize>) -> Self {
        Self(SmallVec::from_vec(components))
    }
}

impl From<&[usize]> for MultiIndex {
    fn from(components: &[usize]) -> Self {
        Self(SmallVec::from_slice(components))
    }
}

impl<const N: usize> From<[usize; N]> for MultiIndex {
    fn from(components: [usize; N]) -> Self {
        Self(components.iter().copied().collect())
    }
}

impl FromIterator<usize> for MultiIndex {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for MultiIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{component}")?;
        }
        write!(f, "]")
    }
}

/// Bijection between linear indices and multi-indices of a fixed dimension
pub trait Enumerate {
    /// Dimension of the produced multi-indices
    fn dimension(&self) -> usize;

    /// The multi-index at `index`; total and idempotent
    fn multi_index(&self, index: usize) -> MultiIndex;

    /// The linear index of `multi_index`
    ///
    /// Fails on a length different from [`Enumerate::dimension`], or when the
    /// index does not fit a `usize`.
    fn inverse(&self, multi_index: &[usize]) -> Result<usize>;

    /// Stratum (degree) a multi-index belongs to
    fn strata_index(&self, multi_index: &[usize]) -> usize;

    /// Number of multi-indices in stratum `strata`, saturating at `usize::MAX`
    fn strata_cardinal(&self, strata: usize) -> usize;

    /// Number of multi-indices in strata `0..=strata`, saturating at `usize::MAX`
    fn strata_cumulated_cardinal(&self, strata: usize) -> usize;

    /// Multi-indices in index order
    fn iter(&self) -> EnumerateIter<'_, Self>
    where
        Self: Sized,
    {
        EnumerateIter {
            phi: self,
            next: 0,
        }
    }
}

/// Iterator over the multi-indices of an [`Enumerate`] in index order
#[derive(Debug, Clone)]
pub struct EnumerateIter<'a, E> {
    phi: &'a E,
    next: usize,
}

impl<E: Enumerate> Iterator for EnumerateIter<'_, E> {
    type Item = MultiIndex;

    fn next(&mut self) -> Option<MultiIndex> {
        let index = self.next;
        self.next = self.next.checked_add(1)?;
        Some(self.phi.multi_index(index))
    }
}

/// The enumeration strategies available to a factory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnumerateFunction {
    /// Graded by total degree
    Linear(LinearEnumerateFunction),
    /// Graded by weighted degree
    Anisotropic(AnisotropicEnumerateFunction),
}

impl EnumerateFunction {
    /// Default enumeration of dimension `dimension`
    pub fn default_for(dimension: usize) -> Result<Self> {
        Ok(Self::Linear(LinearEnumerateFunction::new(dimension)?))
    }

    /// Strategy name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Linear(_) => "linear",
            Self::Anisotropic(_) => "anisotropic",
        }
    }

    fn strategy(&self) -> &dyn Enumerate {
        match self {
            Self::Linear(phi) => phi,
            Self::Anisotropic(phi) => phi,
        }
    }
}

impl Enumerate for EnumerateFunction {
    fn dimension(&self) -> usize {
        self.strategy().dimension()
    }

    fn multi_index(&self, index: usize) -> MultiIndex {
        self.strategy().multi_index(index)
    }

    fn inverse(&self, multi_index: &[usize]) -> Result<usize> {
        self.strategy().inverse(multi_index)
    }

    fn strata_index(&self, multi_index: &[usize]) -> usize {
        self.strategy().strata_index(multi_index)
    }

    fn strata_cardinal(&self, strata: usize) -> usize {
        self.strategy().strata_cardinal(strata)
    }

    fn strata_cumulated_cardinal(&self, strata: usize) -> usize {
        self.strategy().strata_cumulated_cardinal(strata)
    }
}

impl From<LinearEnumerateFunction> for EnumerateFunction {
    fn from(phi: LinearEnumerateFunction) -> Self {
        Self::Linear(phi)
    }
}

impl From<AnisotropicEnumerateFunction> for EnumerateFunction {
    fn from(phi: AnisotropicEnumerateFunction) -> Self {
        Self::Anisotropic(phi)
    }
}

impl fmt::Display for EnumerateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear(phi) => write!(f, "LinearEnumerateFunction(dimension={})", phi.dimension()),
            Self::Anisotropic(phi) => {
                write!(f, "AnisotropicEnumerateFunction(weights={:?})", phi.weights())
            }
        }
    }
}

/// Binomial coefficient `C(n, k)`, saturating at `u128::MAX`
///
/// Saturation only happens when the exact value exceeds every `usize`, so
/// comparisons against indices stay correct.
pub(crate) fn binomial(n: u128, k: u128) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = match result.checked_mul(n - i) {
            Some(product) => product / (i + 1),
            None => return u128::MAX,
        };
    }
    result
}

pub(crate) fn saturate(value: u128) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}
