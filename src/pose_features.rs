//! Joint-to-joint angle features of a hand pose.

use crate::keypoints::KeypointSet;
use std::ops::Index;

/// Ordered angles in degrees, each in `(-180, 180]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AngleVector(Vec<f64>);

impl AngleVector {
    #[must_use]
    pub fn new(angles: Vec<f64>) -> Self {
        Self(angles)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl Index<usize> for AngleVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl From<Vec<f64>> for AngleVector {
    fn from(angles: Vec<f64>) -> Self {
        Self(angles)
    }
}

/// Direction of the segment from `(x1, y1)` to `(x2, y2)` in degrees
#[must_use]
pub fn segment_angle(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let degrees = (y2 - y1).atan2(x2 - x1).to_degrees();
    // atan2 can return exactly -180 for a -0.0 vertical component
    if degrees <= -180.0 {
        degrees + 360.0
    } else {
        degrees
    }
}

/// Angles between consecutive keypoints.
///
/// Angle `i` is the direction of the vector from keypoint `i` to keypoint
/// `i + 1` in the image plane, measured on the normalized coordinates. A set
/// of N keypoints yields N - 1 angles; a single keypoint yields none.
#[must_use]
pub fn extract_angles(keypoints: &KeypointSet) -> AngleVector {
    keypoints
        .points()
        .windows(2)
        .map(|pair| {
            segment_angle(
                f64::from(pair[0].x),
                f64::from(pair[0].y),
                f64::from(pair[1].x),
                f64::from(pair[1].y),
            )
        })
        .collect::<Vec<_>>()
        .into()
}
