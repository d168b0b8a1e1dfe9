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

//! Evaluation of per-output formulas over named inputs

use super::{CallTracker, Evaluation};
use crate::config::{HistoryConfig, ParserConfig};
use crate::error::{FunctionError, Result, check_selection};
use crate::evaluator::FormulaParser;
use ndarray::Array2;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A vector-valued function given by one formula per output
///
/// The formula parser is bound once at construction from the input names and
/// the formulas. Only the call counter and the history change afterwards.
///
/// ```
/// use tensorized_basis::{Evaluation, SymbolicEvaluation};
///
/// let f = SymbolicEvaluation::new(["x", "y"], ["z"], ["x+y"]).unwrap();
/// assert_eq!(f.evaluate(&[2.0, 3.0]).unwrap(), vec![5.0]);
/// ```
#[derive(Debug, Clone)]
pub struct SymbolicEvaluation {
    input_variables_names: Vec<String>,
    output_variables_names: Vec<String>,
    formulas: Vec<String>,
    parser: FormulaParser,
    tracker: CallTracker,
}

fn to_strings<I>(items: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl SymbolicEvaluation {
    /// Create an evaluation with the default parser configuration
    ///
    /// Fails when the number of output names differs from the number of
    /// formulas, or when a formula does not bind over the input names.
    pub fn new<I, O, F>(inputs: I, outputs: O, formulas: F) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self::with_parser_config(inputs, outputs, formulas, ParserConfig::default())
    }

    /// Create an evaluation with an explicit parser configuration
    pub fn with_parser_config<I, O, F>(
        inputs: I,
        outputs: O,
        formulas: F,
        config: ParserConfig,
    ) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self::from_parts(
            to_strings(inputs),
            to_strings(outputs),
            to_strings(formulas),
            config,
        )
    }

    fn from_parts(
        input_variables_names: Vec<String>,
        output_variables_names: Vec<String>,
        formulas: Vec<String>,
        config: ParserConfig,
    ) -> Result<Self> {
        if output_variables_names.len() != formulas.len() {
            return Err(FunctionError::dimension_mismatch(
                "output variable names vs formulas",
                output_variables_names.len(),
                formulas.len(),
            ));
        }
        let parser = FormulaParser::with_config(&input_variables_names, &formulas, config)?;
        let tracker =
            CallTracker::with_dimensions(input_variables_names.len(), output_variables_names.len());
        Ok(Self {
            input_variables_names,
            output_variables_names,
            formulas,
            parser,
            tracker,
        })
    }

    /// Replace the call tracker by a fresh one using `config`
    pub fn with_history_config(mut self, config: HistoryConfig) -> Self {
        self.tracker = CallTracker::new(self.input_dimension(), self.output_dimension(), config);
        self
    }

    /// Input variable names
    pub fn input_variables_names(&self) -> &[String] {
        &self.input_variables_names
    }

    /// Output variable names
    pub fn output_variables_names(&self) -> &[String] {
        &self.output_variables_names
    }

    /// Formulas, index-aligned with the output names
    pub fn formulas(&self) -> &[String] {
        &self.formulas
    }

    /// Parser configuration used for binding
    pub fn parser_config(&self) -> ParserConfig {
        self.parser.config()
    }

    /// Single-output sub-function for output `index`
    pub fn marginal_at(&self, index: usize) -> Result<SymbolicEvaluation> {
        self.marginal(&[index])
    }

    /// Sub-function of the selected outputs, in the given order
    pub fn marginal(&self, indices: &[usize]) -> Result<SymbolicEvaluation> {
        check_selection(indices, self.output_dimension())?;
        let outputs = indices
            .iter()
            .map(|&i| self.output_variables_names[i].clone())
            .collect();
        let formulas = indices.iter().map(|&i| self.formulas[i].clone()).collect();
        log::trace!("Extracting marginal {indices:?} of {self}");
        Self::from_parts(
            self.input_variables_names.clone(),
            outputs,
            formulas,
            self.parser.config(),
        )
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

    /// Recorded output points, one row per call
    pub fn history_output(&self) -> Array2<f64> {
        self.tracker.history_output()
    }
}

impl Evaluation for SymbolicEvaluation {
    fn input_dimension(&self) -> usize {
        self.input_variables_names.len()
    }

    fn output_dimension(&self) -> usize {
        self.output_variables_names.len()
    }

    fn evaluate(&self, point: &[f64]) -> Result<Vec<f64>> {
        let output = self.parser.evaluate(point)?;
        self.tracker.record(point, &output);
        Ok(output)
    }

    fn marginal(&self, indices: &[usize]) -> Result<Box<dyn Evaluation>> {
        Ok(Box::new(SymbolicEvaluation::marginal(self, indices)?))
    }

    fn calls_number(&self) -> usize {
        self.tracker.calls_number()
    }
}

impl PartialEq for SymbolicEvaluation {
    fn eq(&self, other: &Self) -> bool {
        self.input_variables_names == other.input_variables_names
            && self.output_variables_names == other.output_variables_names
            && self.formulas == other.formulas
    }
}

impl Eq for SymbolicEvaluation {}

impl fmt::Display for SymbolicEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]->[{}]",
            self.input_variables_names.join(","),
            self.formulas.join(",")
        )
    }
}

#[derive(Serialize)]
struct SymbolicRecordRef<'a> {
    input_variables_names: &'a [String],
    output_variables_names: &'a [String],
    formulas: &'a [String],
    parser_config: ParserConfig,
}

#[derive(Deserialize)]
struct SymbolicRecord {
    input_variables_names: Vec<String>,
    output_variables_names: Vec<String>,
    formulas: Vec<String>,
    #[serde(default)]
    parser_config: ParserConfig,
}

impl Serialize for SymbolicEvaluation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        SymbolicRecordRef {
            input_variables_names: &self.input_variables_names,
            output_variables_names: &self.output_variables_names,
            formulas: &self.formulas,
            parser_config: self.parser.config(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SymbolicEvaluation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let record = SymbolicRecord::deserialize(deserializer)?;
        Self::from_parts(
            record.input_variables_names,
            record.output_variables_names,
            record.formulas,
            record.parser_config,
        )
        .map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use pretty_assertions::assert_eq;

    fn sum_xy() -> SymbolicEvaluation {
        SymbolicEvaluation::new(["x", "y"], ["z"], ["x+y"]).unwrap()
    }

    #[test]
    fn test_output_count_must_match_formulas() {
        let err = SymbolicEvaluation::new(["x"], ["a", "b"], ["x"]).unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn test_binding_errors_propagate() {
        let err = SymbolicEvaluation::new(["x"], ["a"], ["x + t"]).unwrap_err();
        assert!(matches!(err, FunctionError::UnknownVariable { .. }));
    }

    #[test]
    fn test_evaluate_and_sample() {
        let f = sum_xy();
        assert_eq!(f.input_dimension(), 2);
        assert_eq!(f.output_dimension(), 1);
        assert_eq!(f.evaluate(&[2.0, 3.0]).unwrap(), vec![5.0]);

        let sample = array![[2.0, 3.0], [0.0, 0.0], [1.0, -1.0]];
        let output = f.evaluate_sample(sample.view()).unwrap();
        assert_eq!(output, array![[5.0], [0.0], [0.0]]);
        assert_eq!(f.calls_number(), 4);
    }

    #[test]
    fn test_sample_with_wrong_width_fails() {
        let f = sum_xy();
        let sample = array![[1.0, 2.0, 3.0]];
        assert!(f.evaluate_sample(sample.view()).unwrap_err().is_dimension_mismatch());
        assert_eq!(f.calls_number(), 0);
    }

    #[test]
    fn test_failed_evaluation_is_not_counted() {
        let f = sum_xy();
        assert!(f.evaluate(&[1.0]).is_err());
        assert_eq!(f.calls_number(), 0);
    }

    #[test]
    fn test_marginals() {
        let f = SymbolicEvaluation::new(["x"], ["a", "b"], ["x", "x*x"]).unwrap();
        let second = f.marginal_at(1).unwrap();
        assert_eq!(second.output_variables_names(), &["b".to_string()]);
        assert_eq!(second.evaluate(&[3.0]).unwrap(), vec![9.0]);
        assert_eq!(second.evaluate(&[3.0]).unwrap()[0], f.evaluate(&[3.0]).unwrap()[1]);

        let swapped = f.marginal(&[1, 0]).unwrap();
        assert_eq!(swapped.evaluate(&[3.0]).unwrap(), vec![9.0, 3.0]);

        assert!(f.marginal_at(2).unwrap_err().is_selection_error());
        assert!(f.marginal(&[0, 0]).unwrap_err().is_selection_error());
    }

    #[test]
    fn test_marginal_gets_fresh_tracker() {
        let f = SymbolicEvaluation::new(["x"], ["a", "b"], ["x", "2*x"])
            .unwrap()
            .with_history_config(HistoryConfig::unbounded());
        f.evaluate(&[1.0]).unwrap();
        let m = f.marginal_at(0).unwrap();
        assert_eq!(m.calls_number(), 0);
        assert!(!m.is_history_enabled());
    }

    #[test]
    fn test_history() {
        let f = sum_xy();
        f.evaluate(&[0.0, 0.0]).unwrap();
        f.enable_history();
        f.evaluate(&[1.0, 2.0]).unwrap();
        f.evaluate(&[3.0, 4.0]).unwrap();
        assert_eq!(f.history_input(), array![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(f.history_output(), array![[3.0], [7.0]]);
        assert_eq!(f.calls_number(), 3);

        f.clear_history();
        assert_eq!(f.history_input().nrows(), 0);
    }

    #[test]
    fn test_tracker_history_has_function_widths() {
        let f = SymbolicEvaluation::new(["x"], ["a", "b"], ["x", "-x"])
            .unwrap()
            .with_history_config(HistoryConfig::unbounded());
        f.evaluate(&[2.0]).unwrap();
        assert_eq!(f.tracker().history_input(), array![[2.0]]);
        assert_eq!(f.tracker().history_output(), array![[2.0, -2.0]]);

        let m = f.marginal_at(1).unwrap();
        m.enable_history();
        m.evaluate(&[3.0]).unwrap();
        assert_eq!(m.history_output(), array![[-3.0]]);
    }

    #[test]
    fn test_deeply_nested_formula_is_rejected() {
        let deep = format!("{}x{}", "(".repeat(50_000), ")".repeat(50_000));
        let err = SymbolicEvaluation::new(["x"], ["y"], [deep]).unwrap_err();
        assert!(matches!(err, FunctionError::InvalidFormula { .. }));
    }

    #[test]
    fn test_field_wise_equality() {
        let a = SymbolicEvaluation::new(["x"], ["y"], ["x+1"]).unwrap();
        let b = SymbolicEvaluation::new(["x"], ["y"], ["x+2"]).unwrap();
        let c = SymbolicEvaluation::new(["x"], ["y"], ["x+1"]).unwrap();
        c.evaluate(&[1.0]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_display() {
        assert_eq!(sum_xy().to_string(), "[x,y]->[x+y]");
    }

    #[test]
    fn test_deserialize_rejects_inconsistent_record() {
        let json = r#"{"input_variables_names":["x"],"output_variables_names":["a","b"],"formulas":["x"]}"#;
        assert!(serde_json::from_str::<SymbolicEvaluation>(json).is_err());

        let json = r#"{"input_variables_names":["x"],"output_variables_names":["a"],"formulas":["2*x"]}"#;
        let f: SymbolicEvaluation = serde_json::from_str(json).unwrap();
        assert_eq!(f.evaluate(&[4.0]).unwrap(), vec![8.0]);
        assert_eq!(f.parser_config(), ParserConfig::default());
    }
}
