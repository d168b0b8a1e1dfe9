//! Call counting and evaluation history

use crate::config::HistoryConfig;
use ndarray::Array2;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Clone, Default)]
struct History {
    capacity: Option<usize>,
    pairs: VecDeque<(Vec<f64>, Vec<f64>)>,
}

impl History {
    fn push(&mut self, input: Vec<f64>, output: Vec<f64>) {
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return;
            }
            while self.pairs.len() >= capacity {
                self.pairs.pop_front();
            }
        }
        self.pairs.push_back((input, output));
    }
}

/// Call counter plus optional history of input/output pairs
///
/// The counter is atomic and each input/output pair is appended under a single
/// lock, so concurrent evaluations neither lose counts nor misalign the two
/// recorded samples. Only pairs matching the tracker's input and output widths
/// enter the history.
#[derive(Debug)]
pub struct CallTracker {
    input_dimension: usize,
    output_dimension: usize,
    calls: AtomicUsize,
    history_enabled: AtomicBool,
    history: Mutex<History>,
}

impl CallTracker {
    /// Tracker for a function `R^input_dimension -> R^output_dimension`
    pub fn new(input_dimension: usize, output_dimension: usize, config: HistoryConfig) -> Self {
        Self {
            input_dimension,
            output_dimension,
            calls: AtomicUsize::new(0),
            history_enabled: AtomicBool::new(config.enabled),
            history: Mutex::new(History {
                capacity: config.capacity,
                pairs: VecDeque::new(),
            }),
        }
    }

    /// Tracker with history disabled
    pub fn with_dimensions(input_dimension: usize, output_dimension: usize) -> Self {
        Self::new(input_dimension, output_dimension, HistoryConfig::default())
    }

    /// Width of the recorded inputs
    pub fn input_dimension(&self) -> usize {
        self.input_dimension
    }

    /// Width of the recorded outputs
    pub fn output_dimension(&self) -> usize {
        self.output_dimension
    }

    /// Count one call and record it when history is enabled
    pub fn record(&self, input: &[f64], output: &[f64]) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.history_enabled.load(Ordering::Relaxed) {
            return;
        }
        if input.len() != self.input_dimension || output.len() != self.output_dimension {
            log::warn!(
                "Not recording a {}->{} call in a {}->{} history",
                input.len(),
                output.len(),
                self.input_dimension,
                self.output_dimension
            );
            return;
        }
        self.history.lock().push(input.to_vec(), output.to_vec());
    }

    /// Number of recorded calls
    pub fn calls_number(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Start recording input/output pairs
    pub fn enable_history(&self) {
        self.history_enabled.store(true, Ordering::Relaxed);
    }

    /// Stop recording; already recorded pairs are kept
    pub fn disable_history(&self) {
        self.history_enabled.store(false, Ordering::Relaxed);
    }

    /// Whether calls are currently recorded
    pub fn is_history_enabled(&self) -> bool {
        self.history_enabled.load(Ordering::Relaxed)
    }

    /// Drop every recorded pair
    pub fn clear_history(&self) {
        self.history.lock().pairs.clear();
    }

    /// Change the history capacity, evicting the oldest pairs if needed
    pub fn set_history_capacity(&self, capacity: Option<usize>) {
        let mut history = self.history.lock();
        history.capacity = capacity;
        if let Some(capacity) = capacity {
            while history.pairs.len() > capacity {
                history.pairs.pop_front();
            }
        }
    }

    /// Current history configuration
    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig::new(self.is_history_enabled(), self.history.lock().capacity)
    }

    /// Number of recorded pairs
    pub fn history_len(&self) -> usize {
        self.history.lock().pairs.len()
    }

    /// Recorded inputs, one row per call
    pub fn history_input(&self) -> Array2<f64> {
        let history = self.history.lock();
        Array2::from_shape_fn((history.pairs.len(), self.input_dimension), |(i, j)| {
            history.pairs[i].0[j]
        })
    }

    /// Recorded outputs, one row per call
    pub fn history_output(&self) -> Array2<f64> {
        let history = self.history.lock();
        Array2::from_shape_fn((history.pairs.len(), self.output_dimension), |(i, j)| {
            history.pairs[i].1[j]
        })
    }
}

impl Clone for CallTracker {
    fn clone(&self) -> Self {
        Self {
            input_dimension: self.input_dimension,
            output_dimension: self.output_dimension,
            calls: AtomicUsize::new(self.calls_number()),
            history_enabled: AtomicBool::new(self.is_history_enabled()),
            history: Mutex::new(self.history.lock().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_disabled_history_still_counts() {
        let tracker = CallTracker::with_dimensions(1, 1);
        tracker.record(&[1.0], &[2.0]);
        tracker.record(&[3.0], &[4.0]);
        assert_eq!(tracker.calls_number(), 2);
        assert_eq!(tracker.history_len(), 0);
        assert_eq!(tracker.history_input().dim(), (0, 1));
    }

    #[test]
    fn test_history_in_call_order() {
        let tracker = CallTracker::new(2, 1, HistoryConfig::unbounded());
        tracker.record(&[1.0, 2.0], &[3.0]);
        tracker.record(&[4.0, 5.0], &[9.0]);
        assert_eq!(tracker.history_input(), array![[1.0, 2.0], [4.0, 5.0]]);
        assert_eq!(tracker.history_output(), array![[3.0], [9.0]]);

        tracker.clear_history();
        assert_eq!(tracker.history_len(), 0);
        assert_eq!(tracker.calls_number(), 2);
    }

    #[test]
    fn test_bounded_history_evicts_oldest() {
        let tracker = CallTracker::new(1, 1, HistoryConfig::bounded(2));
        for i in 0..5 {
            tracker.record(&[i as f64], &[i as f64 * 10.0]);
        }
        assert_eq!(tracker.history_input(), array![[3.0], [4.0]]);

        tracker.set_history_capacity(Some(1));
        assert_eq!(tracker.history_output(), array![[40.0]]);
        assert_eq!(tracker.history_config(), HistoryConfig::bounded(1));
    }

    #[test]
    fn test_toggle_history() {
        let tracker = CallTracker::with_dimensions(1, 1);
        tracker.record(&[0.0], &[0.0]);
        tracker.enable_history();
        tracker.record(&[1.0], &[1.0]);
        tracker.disable_history();
        tracker.record(&[2.0], &[2.0]);
        assert_eq!(tracker.history_input(), array![[1.0]]);
        assert_eq!(tracker.calls_number(), 3);
    }

    #[test]
    fn test_mismatched_pairs_are_counted_but_not_recorded() {
        let tracker = CallTracker::new(1, 2, HistoryConfig::unbounded());
        tracker.record(&[1.0, 2.0], &[3.0, 4.0]);
        tracker.record(&[5.0], &[6.0]);
        tracker.record(&[7.0], &[8.0, 9.0]);
        assert_eq!(tracker.calls_number(), 3);
        assert_eq!(tracker.history_input(), array![[7.0]]);
        assert_eq!(tracker.history_output(), array![[8.0, 9.0]]);
    }

    #[test]
    fn test_clone_copies_state() {
        let tracker = CallTracker::new(1, 1, HistoryConfig::unbounded());
        tracker.record(&[1.0], &[1.0]);
        let copy = tracker.clone();
        tracker.record(&[2.0], &[2.0]);
        assert_eq!(copy.calls_number(), 1);
        assert_eq!(copy.history_len(), 1);
        assert!(copy.is_history_enabled());
        assert_eq!(copy.history_input(), array![[1.0]]);
    }

    #[test]
    fn test_concurrent_recording() {
        let tracker = Arc::new(CallTracker::new(1, 1, HistoryConfig::unbounded()));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let tracker = Arc::clone(&tracker);
                thread::spawn(move || {
                    for i in 0..250 {
                        let x = (t * 1000 + i) as f64;
                        tracker.record(&[x], &[2.0 * x]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.calls_number(), 1000);
        let input = tracker.history_input();
        let output = tracker.history_output();
        assert_eq!(input.nrows(), 1000);
        for (x, y) in input.column(0).iter().zip(output.column(0)) {
            assert_eq!(*y, 2.0 * x);
        }
    }
}
