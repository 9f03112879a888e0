//! Region of interest extraction around detected hands.

use crate::{
    keypoints::KeypointSet,
    utils::safe_cast::{f32_to_i32_saturating, usize_to_i32},
    Error, Result,
};

/// Axis-aligned pixel rectangle, `min` inclusive and `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self { x_min, y_min, x_max, y_max }
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.x_max - self.x_min
    }

    #[must_use]
    pub const fn height(&self) -> i32 {
        self.y_max - self.y_min
    }

    /// True when the box covers no pixels
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Grow the box by `padding` pixels on every side
    #[must_use]
    pub fn expand(&self, padding: i32) -> Self {
        Self {
            x_min: self.x_min.saturating_sub(padding),
            y_min: self.y_min.saturating_sub(padding),
            x_max: self.x_max.saturating_add(padding),
            y_max: self.y_max.saturating_add(padding),
        }
    }

    /// Clamp every edge into `[0, width]` x `[0, height]`.
    ///
    /// Each edge is clamped independently so `min <= max` is preserved.
    #[must_use]
    pub fn clamp_to(&self, width: i32, height: i32) -> Self {
        Self {
            x_min: self.x_min.clamp(0, width),
            y_min: self.y_min.clamp(0, height),
            x_max: self.x_max.clamp(0, width),
            y_max: self.y_max.clamp(0, height),
        }
    }
}

/// Computes padded, frame-clamped boxes around keypoint sets.
#[derive(Debug, Clone, Copy)]
pub struct RoiExtractor {
    padding: i32,
}

impl RoiExtractor {
    /// Create an extractor with a fixed padding margin
    ///
    /// # Errors
    ///
    /// Returns an error if `padding` is negative.
    pub fn new(padding: i32) -> Result<Self> {
        if padding < 0 {
            return Err(Error::InvalidInput(format!("ROI padding must be non-negative, got {padding}")));
        }
        Ok(Self { padding })
    }

    #[must_use]
    pub fn padding(&self) -> i32 {
        self.padding
    }

    /// Bounding box around `keypoints` for a `width` x `height` frame
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateRoi`] when the clamped box has zero width or
    /// height, so the caller can skip this hand for the current frame.
    #[allow(clippy::cast_precision_loss)]
    pub fn extract(&self, keypoints: &KeypointSet, width: usize, height: usize) -> Result<BoundingBox> {
        let frame_w = usize_to_i32(width)?;
        let frame_h = usize_to_i32(height)?;
        let (min_x, min_y, max_x, max_y) = keypoints.extent();

        // Denormalize and truncate toward zero, matching integer pixel indexing
        let raw = BoundingBox::new(
            f32_to_i32_saturating(min_x * frame_w as f32),
            f32_to_i32_saturating(min_y * frame_h as f32),
            f32_to_i32_saturating(max_x * frame_w as f32),
            f32_to_i32_saturating(max_y * frame_h as f32),
        );

        let bbox = raw.expand(self.padding).clamp_to(frame_w, frame_h);
        if bbox.is_empty() {
            return Err(Error::DegenerateRoi {
                width: bbox.width().max(0),
                height: bbox.height().max(0),
            });
        }
        Ok(bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::Keypoint;

    fn single_point(x: f32, y: f32) -> KeypointSet {
        KeypointSet::new(vec![Keypoint::new(x, y, 0.0); 21]).unwrap()
    }

    #[test]
    fn test_padded_box() {
        let extractor = RoiExtractor::new(10).unwrap();
        let set = KeypointSet::new(vec![Keypoint::new(0.25, 0.5, 0.0), Keypoint::new(0.5, 0.75, 0.0)]).unwrap();
        let bbox = extractor.extract(&set, 200, 100).unwrap();
        assert_eq!(bbox, BoundingBox::new(40, 40, 110, 85));
    }

    #[test]
    fn test_interior_point_gives_square_of_twice_padding() {
        let extractor = RoiExtractor::new(60).unwrap();
        let bbox = extractor.extract(&single_point(0.5, 0.5), 640, 480).unwrap();
        assert_eq!(bbox, BoundingBox::new(260, 180, 380, 300));
        assert_eq!(bbox.width(), 120);
        assert_eq!(bbox.height(), 120);
    }

    #[test]
    fn test_point_near_edge_is_clipped() {
        let extractor = RoiExtractor::new(60).unwrap();
        // 0.05 * 640 = 32 px from the left edge
        let bbox = extractor.extract(&single_point(0.05, 0.5), 640, 480).unwrap();
        assert_eq!(bbox.x_min, 0);
        assert_eq!(bbox.x_max, 92);
        assert!(!bbox.is_empty());
    }

    #[test]
    fn test_point_far_outside_is_degenerate() {
        let extractor = RoiExtractor::new(60).unwrap();
        // 1.2 * 640 = 768, more than 60 px past the right edge
        let result = extractor.extract(&single_point(1.2, 0.5), 640, 480);
        assert!(matches!(result, Err(Error::DegenerateRoi { width: 0, .. })));

        let result = extractor.extract(&single_point(0.5, -0.2), 640, 480);
        assert!(matches!(result, Err(Error::DegenerateRoi { height: 0, .. })));
    }

    #[test]
    fn test_zero_padding_single_point_is_degenerate() {
        let extractor = RoiExtractor::new(0).unwrap();
        assert!(extractor.extract(&single_point(0.5, 0.5), 640, 480).is_err());
    }

    #[test]
    fn test_negative_padding_rejected() {
        assert!(RoiExtractor::new(-1).is_err());
    }

    #[test]
    fn test_clamp_preserves_order() {
        let bbox = BoundingBox::new(-50, -20, -10, 700).clamp_to(640, 480);
        assert_eq!(bbox, BoundingBox::new(0, 0, 0, 480));
        assert!(bbox.x_min <= bbox.x_max);
        assert!(bbox.is_empty());
    }
}
