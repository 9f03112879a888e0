//! Real-time hand mudra recognition.
//!
//! This library turns camera frames into stable, human-readable hand gesture
//! labels:
//! - A landmark source locates 21 hand keypoints per hand
//! - A padded region around the hand is normalized exactly as the classifier
//!   was trained and scored by a pretrained model
//! - A confidence gate turns the scores into a label or "Unknown"
//! - Joint-to-joint angles are smoothed over the last few frames for display
//!
//! The core pipeline is pure Rust. The `onnx` feature adds `ONNX` Runtime
//! backed landmark and classifier models; the `opencv` feature adds capture,
//! drawing and display.
//!
//! # Examples
//!
//! ## Pipeline with custom collaborators
//!
//! ```
//! use mudra_recognition::{
//!     classification::Classifier,
//!     decision::{ClassDistribution, Vocabulary},
//!     frame::{ChannelOrder, Frame},
//!     hand_detection::LandmarkSource,
//!     keypoints::{Keypoint, KeypointSet},
//!     normalizer::NormalizedImage,
//!     pipeline::{Pipeline, PipelineSettings},
//!     Result,
//! };
//!
//! struct FixedHand;
//!
//! impl LandmarkSource for FixedHand {
//!     fn detect(&mut self, _frame: &Frame) -> Result<Vec<KeypointSet>> {
//!         let points = (0..21).map(|i| Keypoint::new(0.4 + i as f32 * 0.01, 0.5, 0.0)).collect();
//!         Ok(vec![KeypointSet::new(points)?])
//!     }
//! }
//!
//! struct AlwaysFirst(Vocabulary);
//!
//! impl Classifier for AlwaysFirst {
//!     fn infer(&mut self, _batch: &NormalizedImage) -> Result<ClassDistribution> {
//!         let mut scores = vec![0.0; self.0.len()];
//!         scores[0] = 0.9;
//!         ClassDistribution::new(&self.0, &scores)
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let vocabulary = Vocabulary::default();
//! let classifier = AlwaysFirst(vocabulary.clone());
//! let mut pipeline = Pipeline::new(FixedHand, classifier, &vocabulary, &PipelineSettings::default())?;
//!
//! let frame = Frame::filled(640, 480, [40, 40, 40], ChannelOrder::Bgr)?;
//! let result = pipeline.process_frame(&frame)?;
//! let decision = result.hands[0].decision.as_ref().map(ToString::to_string);
//! assert_eq!(decision.as_deref(), Some("Alapadmam (90.0%)"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Smoothing angles
//!
//! ```
//! use mudra_recognition::{filters::create_filter, pose_features::AngleVector};
//!
//! # fn main() -> mudra_recognition::Result<()> {
//! let mut filter = create_filter("moving_average:5")?;
//! filter.apply(&AngleVector::new(vec![0.0, 90.0]))?;
//! let smoothed = filter.apply(&AngleVector::new(vec![10.0, 80.0]))?;
//! assert_eq!(smoothed.as_slice(), &[5.0, 85.0]);
//! # Ok(())
//! # }
//! ```

/// Hand keypoints and skeleton topology
pub mod keypoints;

/// Owned frames and channel order handling
pub mod frame;

/// Padded hand bounding boxes
pub mod roi;

/// Classifier input preprocessing
pub mod normalizer;

/// Joint-to-joint angle features
pub mod pose_features;

/// Temporal filters over angle vectors
pub mod filters;

/// Vocabulary, class scores and the label decision policy
pub mod decision;

/// Classifier interface and `ONNX` backend
pub mod classification;

/// Landmark source interface and `ONNX` hand landmarker
pub mod hand_detection;

/// Frame-to-decision pipeline
pub mod pipeline;

/// Overlay text layout
pub mod overlay;

/// Drawing of results onto frames
#[cfg(feature = "opencv")]
pub mod render;

/// Camera loop and GUI
#[cfg(feature = "opencv")]
pub mod app;

/// Configuration management
pub mod config;

/// Error types and result aliases
pub mod error;

/// Utility functions for numeric and image conversion
pub mod utils;

/// Application constants
pub mod constants;

pub use error::{Error, Result};
