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

//! Registry of builtin functions and constants usable in formulas

pub mod functions;
pub mod signature;

pub use functions::{BUILTIN_CONSTANTS, BuiltinFunction, FunctionKind};
pub use signature::FunctionSignature;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

static GLOBAL_REGISTRY: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::with_builtins);

/// Name lookup for functions and constants
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: FxHashMap<&'static str, BuiltinFunction>,
    constants: FxHashMap<&'static str, f64>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every builtin function and constant
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for function in functions::builtin_functions() {
            registry.register(function);
        }
        for &(name, value) in BUILTIN_CONSTANTS {
            registry.register_constant(name, value);
        }
        registry
    }

    /// Shared registry of builtins
    pub fn global() -> &'static FunctionRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register a function, replacing any function of the same name
    pub fn register(&mut self, function: BuiltinFunction) {
        self.functions.insert(function.name(), function);
    }

    /// Register a named constant
    pub fn register_constant(&mut self, name: &'static str, value: f64) {
        self.constants.insert(name, value);
    }

    /// Look up a function by name
    pub fn get_function(&self, name: &str) -> Option<&BuiltinFunction> {
        self.functions.get(name)
    }

    /// Look up a constant by name
    pub fn get_constant(&self, name: &str) -> Option<f64> {
        self.constants.get(name).copied()
    }

    /// Check if a function exists
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Names of all registered functions, sorted
    pub fn function_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
