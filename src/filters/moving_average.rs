use super::{check_len, AngleFilter};
use crate::{pose_features::AngleVector, Error, Result};
use std::collections::VecDeque;

/// Fill level of a moving average history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmootherState {
    /// Nothing recorded; no output available
    Empty,
    /// Fewer than `window_size` entries
    Filling(usize),
    /// Exactly `window_size` entries; every new entry evicts the oldest
    Full,
}

/// Moving average filter.
///
/// Keeps the most recent `window_size` angle vectors and outputs their
/// element-wise mean. Lag is roughly `window_size / fps` seconds.
pub struct MovingAverageFilter {
    window_size: usize,
    history: VecDeque<AngleVector>,
}

impl MovingAverageFilter {
    /// # Panics
    ///
    /// Panics if `window_size` is 0.
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        Self {
            window_size,
            history: VecDeque::with_capacity(window_size),
        }
    }

    /// # Errors
    ///
    /// Returns an error if `window_size` is 0.
    pub fn try_new(window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::FilterError("Window size must be greater than 0".to_string()));
        }
        Ok(Self::new(window_size))
    }

    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Number of vectors currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    #[must_use]
    pub fn state(&self) -> SmootherState {
        match self.history.len() {
            0 => SmootherState::Empty,
            n if n < self.window_size => SmootherState::Filling(n),
            _ => SmootherState::Full,
        }
    }

    /// Recorded vectors, oldest first
    pub fn history(&self) -> impl Iterator<Item = &AngleVector> {
        self.history.iter()
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean(&self) -> Option<AngleVector> {
        let first = self.history.front()?;
        let mut sums = vec![0.0; first.len()];
        for angles in &self.history {
            for (sum, value) in sums.iter_mut().zip(angles.iter()) {
                *sum += value;
            }
        }
        let n = self.history.len() as f64;
        Some(sums.into_iter().map(|sum| sum / n).collect::<Vec<_>>().into())
    }
}

impl AngleFilter for MovingAverageFilter {
    fn apply(&mut self, angles: &AngleVector) -> Result<AngleVector> {
        check_len(self.history.front().map(AngleVector::len), angles)?;

        if self.history.len() >= self.window_size {
            self.history.pop_front();
        }
        self.history.push_back(angles.clone());

        self.mean()
            .ok_or_else(|| Error::FilterError("History unexpectedly empty".to_string()))
    }

    fn current(&self) -> Option<AngleVector> {
        self.mean()
    }

    fn reset(&mut self) {
        self.history.clear();
    }

    fn name(&self) -> &str {
        "MovingAverageFilter"
    }
}
