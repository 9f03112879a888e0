//! Hand keypoint sets as delivered by a landmark source.

use crate::{Error, Result};

/// A single landmark in normalized image coordinates.
///
/// `x` and `y` are fractions of the frame width and height. Values slightly
/// outside `[0, 1]` are legal when the hand extends past the frame edge. `z`
/// is relative depth with no fixed unit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Keypoint {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Pixel position of this keypoint in a `width` x `height` frame
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_pixel(&self, width: i32, height: i32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

/// Ordered, immutable set of keypoints for one detected hand.
///
/// The order is the landmark source's indexing convention and is never changed
/// after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointSet {
    points: Vec<Keypoint>,
}

impl KeypointSet {
    /// Create a keypoint set
    ///
    /// # Errors
    ///
    /// Returns an error if `points` is empty or contains non-finite x/y values.
    pub fn new(points: Vec<Keypoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::InvalidInput("Keypoint set must not be empty".to_string()));
        }
        if let Some(idx) = points.iter().position(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(Error::InvalidInput(format!("Keypoint {idx} has non-finite coordinates")));
        }
        Ok(Self { points })
    }

    /// Build a set from a flat `[x0, y0, z0, x1, y1, z1, ...]` slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not a multiple of 3 or the
    /// resulting set is invalid.
    pub fn from_flat(values: &[f32]) -> Result<Self> {
        if values.len() % 3 != 0 {
            return Err(Error::InvalidInput(format!(
                "Flat keypoint data length {} is not a multiple of 3",
                values.len()
            )));
        }
        Self::new(
            values
                .chunks_exact(3)
                .map(|c| Keypoint::new(c[0], c[1], c[2]))
                .collect(),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn points(&self) -> &[Keypoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keypoint> {
        self.points.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Keypoint> {
        self.points.get(index)
    }

    /// Axis-aligned extent `(min_x, min_y, max_x, max_y)` in normalized units
    #[must_use]
    pub fn extent(&self) -> (f32, f32, f32, f32) {
        self.points.iter().fold(
            (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), p| (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y)),
        )
    }
}

/// Names for the 21 hand landmarks, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Skeleton edges drawn over a detected hand
pub const HAND_CONNECTIONS: &[(HandLandmark, HandLandmark)] = {
    use HandLandmark::*;
    &[
        // Palm
        (Wrist, ThumbCmc),
        (Wrist, IndexFingerMcp),
        (IndexFingerMcp, MiddleFingerMcp),
        (MiddleFingerMcp, RingFingerMcp),
        (RingFingerMcp, PinkyMcp),
        (Wrist, PinkyMcp),
        // Thumb
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        // Index
        (IndexFingerMcp, IndexFingerPip),
        (IndexFingerPip, IndexFingerDip),
        (IndexFingerDip, IndexFingerTip),
        // Middle
        (MiddleFingerMcp, MiddleFingerPip),
        (MiddleFingerPip, MiddleFingerDip),
        (MiddleFingerDip, MiddleFingerTip),
        // Ring
        (RingFingerMcp, RingFingerPip),
        (RingFingerPip, RingFingerDip),
        (RingFingerDip, RingFingerTip),
        // Pinky
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};
