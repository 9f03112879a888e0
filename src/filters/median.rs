use super::{check_len, AngleFilter};
use crate::{pose_features::AngleVector, Error, Result};
use std::collections::VecDeque;

/// Element-wise median over a window of angle vectors
pub struct MedianFilter {
    window_size: usize,
    history: VecDeque<AngleVector>,
}

impl MedianFilter {
    /// # Panics
    ///
    /// Panics if `window_size` is 0 or even.
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        assert!(window_size % 2 == 1, "Median filter window size must be odd");
        Self {
            window_size,
            history: VecDeque::with_capacity(window_size),
        }
    }

    /// # Errors
    ///
    /// Returns an error if `window_size` is 0 or even.
    pub fn try_new(window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::FilterError("Window size must be greater than 0".to_string()));
        }
        if window_size % 2 == 0 {
            return Err(Error::FilterError("Median filter window size must be odd".to_string()));
        }
        Ok(Self::new(window_size))
    }

    fn calculate_median(values: &mut [f64]) -> f64 {
        values.sort_by(f64::total_cmp);

        let len = values.len();
        if len % 2 == 0 {
            (values[len / 2 - 1] + values[len / 2]) / 2.0
        } else {
            values[len / 2]
        }
    }

    fn median(&self) -> Option<AngleVector> {
        let width = self.history.front()?.len();
        let mut column = Vec::with_capacity(self.history.len());
        let medians = (0..width)
            .map(|i| {
                column.clear();
                column.extend(self.history.iter().map(|a| a[i]));
                Self::calculate_median(&mut column)
            })
            .collect::<Vec<_>>();
        Some(medians.into())
    }
}

impl AngleFilter for MedianFilter {
    fn apply(&mut self, angles: &AngleVector) -> Result<AngleVector> {
        check_len(self.history.front().map(AngleVector::len), angles)?;

        if self.history.len() >= self.window_size {
            self.history.pop_front();
        }
        self.history.push_back(angles.clone());

        self.median()
            .ok_or_else(|| Error::FilterError("History unexpectedly empty".to_string()))
    }

    fn current(&self) -> Option<AngleVector> {
        self.median()
    }

    fn reset(&mut self) {
        self.history.clear();
    }

    fn name(&self) -> &str {
        "MedianFilter"
    }
}
