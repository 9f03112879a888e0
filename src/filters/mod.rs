//! Temporal filters over angle vectors.
//!
//! The landmark detector jitters from frame to frame even when the hand is
//! still. These filters trade a little latency for a stable angle readout.

/// Moving average over a fixed window (the default temporal smoother)
pub mod moving_average;

/// Median filter for outlier rejection
pub mod median;

/// Exponential filter for responsive smoothing
pub mod exponential;

use crate::{
    constants::{DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_HISTORY_WINDOW, DEFAULT_MEDIAN_WINDOW},
    pose_features::AngleVector,
    Error, Result,
};

/// Trait for all angle filters
pub trait AngleFilter: Send + Sync {
    /// Record a new angle vector and return the filtered output
    ///
    /// # Errors
    ///
    /// Returns an error if the vector length differs from previously recorded
    /// vectors.
    fn apply(&mut self, angles: &AngleVector) -> Result<AngleVector>;

    /// Filtered output for the data recorded so far, `None` before any input
    fn current(&self) -> Option<AngleVector>;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
#[derive(Default)]
pub struct NoFilter {
    last: Option<AngleVector>,
}

impl AngleFilter for NoFilter {
    fn apply(&mut self, angles: &AngleVector) -> Result<AngleVector> {
        self.last = Some(angles.clone());
        Ok(angles.clone())
    }

    fn current(&self) -> Option<AngleVector> {
        self.last.clone()
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Reject a vector whose length differs from the recorded ones
pub(crate) fn check_len(expected: Option<usize>, angles: &AngleVector) -> Result<()> {
    match expected {
        Some(len) if len != angles.len() => Err(Error::FilterError(format!(
            "Angle vector length {} does not match history length {len}",
            angles.len()
        ))),
        _ => Ok(()),
    }
}

fn parse_param<T: std::str::FromStr>(filter_type: &str, value: Option<&str>, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::FilterError(format!("Invalid parameter '{raw}' for filter {filter_type}"))),
    }
}

/// Create an angle filter by type name.
///
/// Parameters may follow the name separated by a colon, e.g.
/// `moving_average:5`, `median:3` or `exponential:0.3`.
///
/// # Errors
///
/// Returns an error for unknown names or invalid parameters.
pub fn create_filter(filter_type: &str) -> Result<Box<dyn AngleFilter>> {
    let spec = filter_type.to_lowercase();
    let mut parts = spec.split(':');
    let name = parts.next().unwrap_or_default();
    let param = parts.next();
    if parts.next().is_some() {
        return Err(Error::FilterError(format!("Too many parameters for filter: {filter_type}")));
    }

    match name {
        "none" | "nofilter" => Ok(Box::new(NoFilter::default())),
        "moving_average" | "movingaverage" => {
            let window = parse_param(name, param, DEFAULT_HISTORY_WINDOW)?;
            Ok(Box::new(moving_average::MovingAverageFilter::try_new(window)?))
        }
        "median" => {
            let window = parse_param(name, param, DEFAULT_MEDIAN_WINDOW)?;
            Ok(Box::new(median::MedianFilter::try_new(window)?))
        }
        "exponential" => {
            let alpha = parse_param(name, param, DEFAULT_EXPONENTIAL_ALPHA)?;
            Ok(Box::new(exponential::ExponentialFilter::try_new(alpha)?))
        }
        _ => Err(Error::FilterError(format!("Unknown filter type: {filter_type}"))),
    }
}
