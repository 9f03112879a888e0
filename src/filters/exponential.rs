use super::{check_len, AngleFilter};
use crate::{pose_features::AngleVector, Error, Result};

/// Exponential smoothing filter
pub struct ExponentialFilter {
    alpha: f64,
    last: Option<AngleVector>,
}

impl ExponentialFilter {
    /// # Panics
    ///
    /// Panics if `alpha` is outside `(0, 1]`.
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, last: None }
    }

    /// # Errors
    ///
    /// Returns an error if `alpha` is outside `(0, 1]`.
    pub fn try_new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")));
        }
        Ok(Self::new(alpha))
    }
}

impl AngleFilter for ExponentialFilter {
    fn apply(&mut self, angles: &AngleVector) -> Result<AngleVector> {
        check_len(self.last.as_ref().map(AngleVector::len), angles)?;

        let filtered: AngleVector = match &self.last {
            Some(last) => angles
                .iter()
                .zip(last.iter())
                .map(|(new, old)| self.alpha * new + (1.0 - self.alpha) * old)
                .collect::<Vec<_>>()
                .into(),
            None => angles.clone(),
        };

        self.last = Some(filtered.clone());
        Ok(filtered)
    }

    fn current(&self) -> Option<AngleVector> {
        self.last.clone()
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_filter() {
        let mut filter = ExponentialFilter::new(0.5);

        // First value passes through
        let out = filter.apply(&AngleVector::new(vec![10.0, 20.0])).unwrap();
        assert_eq!(out.as_slice(), &[10.0, 20.0]);

        // Second value is smoothed
        let out = filter.apply(&AngleVector::new(vec![20.0, 30.0])).unwrap();
        assert_eq!(out.as_slice(), &[15.0, 25.0]);
    }

    #[test]
    fn test_alpha_bounds() {
        assert!(ExponentialFilter::try_new(0.0).is_err());
        assert!(ExponentialFilter::try_new(1.5).is_err());
        assert!(ExponentialFilter::try_new(f64::NAN).is_err());

        let mut filter = ExponentialFilter::new(0.1);
        filter.apply(&AngleVector::new(vec![10.0])).unwrap();
        let out = filter.apply(&AngleVector::new(vec![20.0])).unwrap();
        assert!((out[0] - 11.0).abs() < 1e-9);
    }
}
