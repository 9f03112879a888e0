//! Frame-to-decision pipeline.
//!
//! For every hand the landmark source reports, the pipeline runs two
//! branches: ROI, normalization, classification and label decision on one
//! side; angle features and temporal smoothing on the other. Each hand slot
//! (the i-th hand reported in a frame) owns its own smoothing and voting
//! state for the whole session.

use crate::{
    classification::Classifier,
    constants::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_HANDS, DEFAULT_ROI_PADDING, DEFAULT_VOTE_WINDOW},
    decision::{ClassDistribution, LabelDecision, LabelPolicy, LabelVoter, Vocabulary},
    filters::{create_filter, AngleFilter},
    frame::Frame,
    hand_detection::LandmarkSource,
    keypoints::KeypointSet,
    normalizer::{ImageNormalizer, NormalizerSettings},
    pose_features::{extract_angles, AngleVector},
    roi::{BoundingBox, RoiExtractor},
    Error, Result,
};

/// Runtime settings of the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Pixels added on every side of the keypoint extent
    pub roi_padding: i32,
    pub normalizer: NormalizerSettings,
    /// Filter spec as accepted by [`create_filter`]
    pub filter: String,
    /// Minimum top probability for a recognized label (exclusive)
    pub threshold: f32,
    /// Decisions per slot that vote on the shown label
    pub vote_window: usize,
    /// Number of hand slots
    pub max_hands: usize,
    /// Keep the prepared classifier input for preview
    pub keep_model_input: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            roi_padding: DEFAULT_ROI_PADDING,
            normalizer: NormalizerSettings::default(),
            filter: "moving_average".to_string(),
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            vote_window: DEFAULT_VOTE_WINDOW,
            max_hands: DEFAULT_MAX_HANDS,
            keep_model_input: false,
        }
    }
}

/// Everything known about one hand in one frame
#[derive(Debug, Clone)]
pub struct HandResult {
    pub keypoints: KeypointSet,
    /// `None` when the region collapsed after clamping
    pub roi: Option<BoundingBox>,
    /// Classifier scores, `None` if the hand was skipped or inference failed
    pub distribution: Option<ClassDistribution>,
    /// `None` if the hand was skipped or inference failed
    pub decision: Option<LabelDecision>,
    /// Smoothed angles for this hand's slot
    pub smoothed: Option<AngleVector>,
    /// Contrast-adjusted crop as fed to the classifier
    pub model_input: Option<Frame>,
}

impl HandResult {
    fn skipped(keypoints: KeypointSet) -> Self {
        Self {
            keypoints,
            roi: None,
            distribution: None,
            decision: None,
            smoothed: None,
            model_input: None,
        }
    }

    /// Whether label and angle text should be drawn for this hand
    #[must_use]
    pub fn has_overlay(&self) -> bool {
        self.roi.is_some() && self.decision.is_some()
    }
}

/// Per-frame output, one entry per processed hand in slot order
#[derive(Debug, Clone, Default)]
pub struct FrameResult {
    pub hands: Vec<HandResult>,
}

impl FrameResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }
}

/// Session state of one hand slot
struct HandTrack {
    smoother: Box<dyn AngleFilter>,
    voter: LabelVoter,
}

impl HandTrack {
    fn new(settings: &PipelineSettings) -> Result<Self> {
        Ok(Self {
            smoother: create_filter(&settings.filter)?,
            voter: LabelVoter::new(settings.vote_window)?,
        })
    }

    fn reset(&mut self) {
        self.smoother.reset();
        self.voter.reset();
    }
}

/// The mudra recognition pipeline
pub struct Pipeline<L: LandmarkSource, C: Classifier> {
    landmarks: L,
    classifier: C,
    extractor: RoiExtractor,
    normalizer: ImageNormalizer,
    policy: LabelPolicy,
    tracks: Vec<HandTrack>,
    keep_model_input: bool,
}

impl<L: LandmarkSource, C: Classifier> Pipeline<L, C> {
    /// Build a pipeline and validate the classifier against it
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any setting is out of range or the filter spec is unknown
    /// - The classifier does not accept the normalizer's tensor shape
    /// - The classifier output width differs from the vocabulary size
    pub fn new(landmarks: L, classifier: C, vocabulary: &Vocabulary, settings: &PipelineSettings) -> Result<Self> {
        if settings.max_hands == 0 {
            return Err(Error::ConfigError("max_hands must be at least 1".to_string()));
        }
        let extractor = RoiExtractor::new(settings.roi_padding)?;
        let normalizer = ImageNormalizer::new(settings.normalizer)?;
        let policy = LabelPolicy::new(settings.threshold)?;

        classifier.validate_input(normalizer.output_shape())?;
        if let Some(width) = classifier.output_width() {
            if width != vocabulary.len() {
                return Err(Error::VocabularyMismatch {
                    model: width,
                    vocabulary: vocabulary.len(),
                });
            }
        }

        let tracks = (0..settings.max_hands)
            .map(|_| HandTrack::new(settings))
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "Pipeline ready: {} hand slot(s), {} smoothing, threshold {}",
            tracks.len(),
            tracks.first().map_or("none", |t| t.smoother.name()),
            policy.threshold()
        );

        Ok(Self {
            landmarks,
            classifier,
            extractor,
            normalizer,
            policy,
            tracks,
            keep_model_input: settings.keep_model_input,
        })
    }

    /// Process one frame
    ///
    /// Hands beyond the slot count are ignored. Slots without a hand in this
    /// frame keep their history untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the landmark source fails. Per-hand problems are
    /// logged and reflected in the [`HandResult`] instead.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameResult> {
        let mut detections = self.landmarks.detect(frame)?;
        if detections.len() > self.tracks.len() {
            log::debug!(
                "{} hands detected, keeping the first {}",
                detections.len(),
                self.tracks.len()
            );
            detections.truncate(self.tracks.len());
        }

        let mut hands = Vec::with_capacity(detections.len());
        for (slot, keypoints) in detections.into_iter().enumerate() {
            hands.push(self.process_hand(slot, frame, keypoints)?);
        }
        Ok(FrameResult { hands })
    }

    fn process_hand(&mut self, slot: usize, frame: &Frame, keypoints: KeypointSet) -> Result<HandResult> {
        let roi = match self.extractor.extract(&keypoints, frame.width(), frame.height()) {
            Ok(roi) => roi,
            Err(err @ Error::DegenerateRoi { .. }) => {
                log::warn!("Skipping hand {slot}: {err}");
                return Ok(HandResult::skipped(keypoints));
            }
            Err(err) => return Err(err),
        };

        let crop = frame.crop(&roi)?;
        let prepared = self.normalizer.prepare(&crop)?;
        let input = self.normalizer.to_tensor(&prepared)?;

        let track = &mut self.tracks[slot];
        let (distribution, decision) = match self.classifier.infer(&input) {
            Ok(distribution) => {
                let decision = track.voter.vote(self.policy.decide(&distribution));
                log::debug!("Hand {slot}: {decision}");
                (Some(distribution), Some(decision))
            }
            Err(err) => {
                log::warn!("Classification failed for hand {slot}: {err}");
                (None, None)
            }
        };

        let angles = extract_angles(&keypoints);
        let smoothed = match track.smoother.apply(&angles) {
            Ok(smoothed) => Some(smoothed),
            Err(err) => {
                log::warn!("Smoothing failed for hand {slot}: {err}");
                None
            }
        };

        Ok(HandResult {
            keypoints,
            roi: Some(roi),
            distribution,
            decision,
            smoothed,
            model_input: self.keep_model_input.then_some(prepared),
        })
    }

    /// Clear the smoothing history and votes of every slot
    pub fn reset_tracking(&mut self) {
        log::info!("Resetting hand tracking state");
        self.landmarks.reset();
        for track in &mut self.tracks {
            track.reset();
        }
    }

    /// Smoothed angles currently held for `slot`
    #[must_use]
    pub fn smoothed(&self, slot: usize) -> Option<AngleVector> {
        self.tracks.get(slot).and_then(|t| t.smoother.current())
    }

    #[must_use]
    pub fn slots(&self) -> usize {
        self.tracks.len()
    }
}
