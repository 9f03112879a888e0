//! Hand landmark sources.
//!
//! A landmark source turns a frame into zero or more [`KeypointSet`]s of 21
//! hand landmarks in normalized frame coordinates. The pipeline only depends on
//! the [`LandmarkSource`] trait; the bundled implementation runs the `MediaPipe`
//! hand landmark network through `ONNX` Runtime.

use crate::{
    constants::{DEFAULT_MAX_HANDS, DEFAULT_MIN_DETECTION_CONFIDENCE, DEFAULT_MIN_TRACKING_CONFIDENCE},
    frame::Frame,
    keypoints::KeypointSet,
    roi::BoundingBox,
    utils::safe_cast::{f32_to_i32_saturating, usize_to_i32},
    Error, Result,
};
use serde::{Deserialize, Serialize};

/// Detection parameters shared by landmark sources
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkSettings {
    /// Minimum presence score to accept a hand found in a full-frame search
    pub min_detection_confidence: f32,
    /// Minimum presence score to keep following a hand from the previous frame
    pub min_tracking_confidence: f32,
    /// Maximum number of hands reported per frame
    pub max_hands: usize,
    /// Treat every frame as unrelated to the previous one
    pub static_image_mode: bool,
}

impl Default for LandmarkSettings {
    fn default() -> Self {
        Self {
            min_detection_confidence: DEFAULT_MIN_DETECTION_CONFIDENCE,
            min_tracking_confidence: DEFAULT_MIN_TRACKING_CONFIDENCE,
            max_hands: DEFAULT_MAX_HANDS,
            static_image_mode: false,
        }
    }
}

impl LandmarkSettings {
    /// Validate the settings
    ///
    /// # Errors
    ///
    /// Returns an error if a confidence is outside `[0, 1]` or `max_hands` is 0.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("min_detection_confidence", self.min_detection_confidence),
            ("min_tracking_confidence", self.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::ConfigError(format!("{name} must be in [0, 1], got {value}")));
            }
        }
        if self.max_hands == 0 {
            return Err(Error::ConfigError("max_hands must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Anything that can locate hand landmarks in a frame.
pub trait LandmarkSource {
    /// Detect hands in `frame`
    ///
    /// Returns one keypoint set per hand, possibly none. Hand order is stable
    /// across frames for as long as the source keeps tracking the same hands.
    ///
    /// # Errors
    ///
    /// Returns an error if detection fails for this frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<KeypointSet>>;

    /// Forget any hands followed from previous frames
    fn reset(&mut self) {}
}

/// Square search region around a previously tracked hand.
///
/// The region is centered on the hand's extent with a side of twice its
/// longer edge, clamped to the frame. Returns `None` when nothing of the
/// region remains inside the frame.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn tracking_region(previous: &KeypointSet, width: usize, height: usize) -> Option<BoundingBox> {
    let frame_w = usize_to_i32(width).ok()?;
    let frame_h = usize_to_i32(height).ok()?;
    let (min_x, min_y, max_x, max_y) = previous.extent();

    let (min_x, max_x) = (min_x * frame_w as f32, max_x * frame_w as f32);
    let (min_y, max_y) = (min_y * frame_h as f32, max_y * frame_h as f32);
    let center_x = (min_x + max_x) / 2.0;
    let center_y = (min_y + max_y) / 2.0;
    let half = (max_x - min_x).max(max_y - min_y).max(1.0);

    let region = BoundingBox::new(
        f32_to_i32_saturating(center_x - half),
        f32_to_i32_saturating(center_y - half),
        f32_to_i32_saturating(center_x + half),
        f32_to_i32_saturating(center_y + half),
    )
    .clamp_to(frame_w, frame_h);

    (!region.is_empty()).then_some(region)
}

/// Map landmarks given in model-input pixels back to normalized frame units.
///
/// `raw` is the flat `[x, y, z] * n` model output for a square input of
/// `input_size` pixels that was resized from `region` of a `width` x `height`
/// frame.
///
/// # Errors
///
/// Returns an error if the output is malformed.
#[allow(clippy::cast_precision_loss)]
pub fn region_to_frame(
    raw: &[f32],
    input_size: usize,
    region: &BoundingBox,
    width: usize,
    height: usize,
) -> Result<KeypointSet> {
    if raw.len() % 3 != 0 || raw.is_empty() {
        return Err(Error::ModelOutputError(format!(
            "Landmark output length {} is not a non-zero multiple of 3",
            raw.len()
        )));
    }
    let scale_x = region.width() as f32 / input_size as f32;
    let scale_y = region.height() as f32 / input_size as f32;
    let flat: Vec<f32> = raw
        .chunks_exact(3)
        .flat_map(|c| {
            [
                (c[0] * scale_x + region.x_min as f32) / width as f32,
                (c[1] * scale_y + region.y_min as f32) / height as f32,
                c[2] / input_size as f32,
            ]
        })
        .collect();
    KeypointSet::from_flat(&flat)
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxHandLandmarker;

#[cfg(feature = "onnx")]
mod onnx {
    use super::{region_to_frame, tracking_region, LandmarkSettings, LandmarkSource};
    use crate::{
        constants::NUM_HAND_LANDMARKS,
        error::Error,
        frame::{ChannelOrder, Frame},
        keypoints::KeypointSet,
        normalizer::resize_bilinear,
        roi::BoundingBox,
        utils::safe_cast::usize_to_i32,
        Result,
    };
    use ndarray::{Array4, CowArray};
    use ort::{Environment, GraphOptimizationLevel, Session, SessionBuilder, Value};
    use std::path::Path;
    use std::sync::Arc;

    /// Input side length of the `MediaPipe` hand landmark network
    const LANDMARK_INPUT_SIZE: usize = 224;

    /// `MediaPipe` hand landmark network running on `ONNX` Runtime.
    ///
    /// The network sees one square region per frame and reports at most one
    /// hand. In video mode the region follows the previous hand; when the
    /// hand is lost it falls back to the full frame.
    pub struct OnnxHandLandmarker {
        session: Session,
        settings: LandmarkSettings,
        previous: Option<KeypointSet>,
    }

    impl OnnxHandLandmarker {
        /// Load the landmark model
        ///
        /// # Errors
        ///
        /// Returns an error if:
        /// - The settings are invalid
        /// - The ONNX model file cannot be loaded
        /// - The model does not have landmark and presence outputs
        pub fn new<P: AsRef<Path>>(model_path: P, settings: LandmarkSettings) -> Result<Self> {
            settings.validate()?;
            if !model_path.as_ref().exists() {
                return Err(Error::ModelError(format!(
                    "Hand landmark model not found: {}",
                    model_path.as_ref().display()
                )));
            }
            log::info!("Loading hand landmark model: {}", model_path.as_ref().display());
            let environment = Arc::new(
                Environment::builder()
                    .with_name("hand_landmarker")
                    .with_log_level(ort::LoggingLevel::Warning)
                    .build()?,
            );

            let session = SessionBuilder::new(&environment)?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .with_model_from_file(model_path)?;

            if session.inputs.is_empty() {
                return Err(Error::ModelInputError("Model has no inputs".to_string()));
            }
            if session.outputs.len() < 2 {
                return Err(Error::ModelOutputError(format!(
                    "Expected landmark and presence outputs, model has {}",
                    session.outputs.len()
                )));
            }
            if settings.max_hands > 1 {
                log::warn!(
                    "Hand landmark model reports one hand per frame, max_hands = {} has no effect",
                    settings.max_hands
                );
            }

            Ok(Self {
                session,
                settings,
                previous: None,
            })
        }

        /// NCHW RGB tensor in `[0, 1]`
        fn preprocess(&self, region: &Frame) -> Result<Array4<f32>> {
            let resized = resize_bilinear(&region.to_order(ChannelOrder::Rgb), LANDMARK_INPUT_SIZE, LANDMARK_INPUT_SIZE)?;
            let pixels = resized.pixels();
            Ok(Array4::from_shape_fn(
                (1, 3, LANDMARK_INPUT_SIZE, LANDMARK_INPUT_SIZE),
                |(_, ch, row, col)| f32::from(pixels[[row, col, ch]]) / 255.0,
            ))
        }

        /// Run the network on one region, returning landmarks and presence
        fn forward(&self, input: Array4<f32>) -> Result<(Vec<f32>, f32)> {
            let cow_array = CowArray::from(input.into_dyn());
            let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
            let outputs = self.session.run(vec![input_tensor])?;

            let landmarks = outputs
                .first()
                .ok_or_else(|| Error::ModelOutputError("No landmark output".to_string()))?
                .try_extract::<f32>()?;
            let landmarks: Vec<f32> = landmarks.view().iter().copied().collect();

            let presence = outputs
                .get(1)
                .ok_or_else(|| Error::ModelOutputError("No presence output".to_string()))?
                .try_extract::<f32>()?;
            let presence = presence
                .view()
                .iter()
                .next()
                .copied()
                .ok_or_else(|| Error::ModelOutputError("Empty presence output".to_string()))?;

            if landmarks.len() < NUM_HAND_LANDMARKS * 3 {
                return Err(Error::ModelOutputError(format!(
                    "Expected {} landmark values, got {}",
                    NUM_HAND_LANDMARKS * 3,
                    landmarks.len()
                )));
            }
            Ok((landmarks, presence))
        }

        fn search(&self, frame: &Frame, region: &BoundingBox, min_confidence: f32) -> Result<Option<KeypointSet>> {
            let crop = frame.crop(region)?;
            let (raw, presence) = self.forward(self.preprocess(&crop)?)?;
            log::debug!("Hand presence {presence:.3} in region {region:?}");
            if presence < min_confidence {
                return Ok(None);
            }
            let keypoints = region_to_frame(
                &raw[..NUM_HAND_LANDMARKS * 3],
                LANDMARK_INPUT_SIZE,
                region,
                frame.width(),
                frame.height(),
            )?;
            Ok(Some(keypoints))
        }
    }

    impl LandmarkSource for OnnxHandLandmarker {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<KeypointSet>> {
            let full = BoundingBox::new(0, 0, usize_to_i32(frame.width())?, usize_to_i32(frame.height())?);

            let tracked = match (&self.previous, self.settings.static_image_mode) {
                (Some(previous), false) => match tracking_region(previous, frame.width(), frame.height()) {
                    Some(region) => self.search(frame, &region, self.settings.min_tracking_confidence)?,
                    None => None,
                },
                _ => None,
            };

            let hand = match tracked {
                Some(hand) => Some(hand),
                None => self.search(frame, &full, self.settings.min_detection_confidence)?,
            };

            self.previous = if self.settings.static_image_mode { None } else { hand.clone() };
            Ok(hand.into_iter().collect())
        }

        fn reset(&mut self) {
            self.previous = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::Keypoint;

    fn hand_at(x0: f32, y0: f32, x1: f32, y1: f32) -> KeypointSet {
        KeypointSet::new(vec![Keypoint::new(x0, y0, 0.0), Keypoint::new(x1, y1, 0.0)]).unwrap()
    }

    #[test]
    fn test_default_settings_valid() {
        assert!(LandmarkSettings::default().validate().is_ok());
        let bad = LandmarkSettings {
            min_detection_confidence: 1.5,
            ..LandmarkSettings::default()
        };
        assert!(bad.validate().is_err());
        let bad = LandmarkSettings {
            max_hands: 0,
            ..LandmarkSettings::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_tracking_region_is_square_around_hand() {
        // Hand spans 128x64 px centered at (256, 256)
        let hand = hand_at(0.375, 0.4375, 0.625, 0.5625);
        let region = tracking_region(&hand, 512, 512).unwrap();
        assert_eq!(region, BoundingBox::new(128, 128, 384, 384));
    }

    #[test]
    fn test_tracking_region_clamped() {
        let hand = hand_at(0.0, 0.0, 0.1, 0.1);
        let region = tracking_region(&hand, 640, 480).unwrap();
        assert_eq!((region.x_min, region.y_min), (0, 0));
        assert!(tracking_region(&hand_at(3.0, 3.0, 3.1, 3.1), 640, 480).is_none());
    }

    #[test]
    fn test_region_to_frame_mapping() {
        let region = BoundingBox::new(100, 50, 300, 250);
        // Model input center maps to region center
        let set = region_to_frame(&[112.0, 112.0, 22.4], 224, &region, 400, 400).unwrap();
        let p = set.get(0).unwrap();
        assert!((p.x - 0.5).abs() < 1e-6);
        assert!((p.y - 0.375).abs() < 1e-6);
        assert!((p.z - 0.1).abs() < 1e-6);
        assert!(region_to_frame(&[1.0, 2.0], 224, &region, 400, 400).is_err());
    }
}
