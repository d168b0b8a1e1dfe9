//! Saving and loading functions and factories as JSON
//!
//! Loading re-runs the constructors, so a record that violates an invariant
//! (for instance more output names than formulas) fails to load exactly like
//! the equivalent direct construction.

use crate::error::{FunctionError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};

fn serialization_error(error: serde_json::Error) -> FunctionError {
    FunctionError::serialization(error.to_string())
}

/// Serialize `value` to a JSON string
pub fn save_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(serialization_error)
}

/// Serialize `value` to an indented JSON string
pub fn save_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(serialization_error)
}

/// Rebuild a value from a JSON string
pub fn load_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(serialization_error)
}

/// Serialize `value` as JSON into `writer`
pub fn save_to_writer<T: Serialize + ?Sized, W: Write>(writer: W, value: &T) -> Result<()> {
    serde_json::to_writer(writer, value).map_err(serialization_error)
}

/// Rebuild a value from JSON read from `reader`
pub fn load_from_reader<T: DeserializeOwned, R: Read>(reader: R) -> Result<T> {
    serde_json::from_reader(reader).map_err(serialization_error)
}
