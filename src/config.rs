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

//! Configuration options for evaluation bookkeeping and formula binding

use serde::{Deserialize, Serialize};

/// Configuration for evaluation history recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Whether input/output pairs are recorded
    pub enabled: bool,

    /// Maximum number of recorded pairs; the oldest pair is evicted first.
    /// `None` means unbounded and the caller owns the growth.
    pub capacity: Option<usize>,
}

impl HistoryConfig {
    /// Create a new history configuration with custom settings
    pub fn new(enabled: bool, capacity: Option<usize>) -> Self {
        Self { enabled, capacity }
    }

    /// No recording
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            capacity: None,
        }
    }

    /// Record every call
    pub fn unbounded() -> Self {
        Self {
            enabled: true,
            capacity: None,
        }
    }

    /// Record only the last `capacity` calls
    pub fn bounded(capacity: usize) -> Self {
        Self {
            enabled: true,
            capacity: Some(capacity),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Configuration for binding and evaluating formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Fail instead of returning NaN or an infinity
    pub reject_non_finite: bool,

    /// Fold constant sub-expressions at binding time
    pub fold_constants: bool,
}

impl ParserConfig {
    /// Configuration that rejects non-finite results
    pub fn strict() -> Self {
        Self {
            reject_non_finite: true,
            fold_constants: true,
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            reject_non_finite: false,
            fold_constants: true,
        }
    }
}
