//! Configuration management for the mudra recognition application

use crate::{
    constants::{
        DEFAULT_ANGLE_ROWS, DEFAULT_BRIGHTNESS, DEFAULT_CLASSIFIER_INPUT_SIZE, DEFAULT_CONFIDENCE_THRESHOLD,
        DEFAULT_CONTRAST, DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_FPS, DEFAULT_HISTORY_WINDOW, DEFAULT_MEDIAN_WINDOW,
        DEFAULT_ROI_PADDING, DEFAULT_VOTE_WINDOW, MODEL_PREVIEW_SIZE, TOP_K_PREDICTIONS,
    },
    decision::{Vocabulary, DEFAULT_VOCABULARY},
    frame::{ChannelOrder, InvertMode},
    hand_detection::LandmarkSettings,
    normalizer::NormalizerSettings,
    overlay::OverlayLayout,
    pipeline::PipelineSettings,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model configuration
    pub models: ModelConfig,

    /// Ordered class labels, index i names classifier output i
    pub vocabulary: Vec<String>,

    /// Hand landmark detection
    pub landmarks: LandmarkSettings,

    /// Hand region extraction
    pub roi: RoiConfig,

    /// Classifier input preprocessing
    pub normalization: NormalizationConfig,

    /// Angle smoothing
    pub smoothing: SmoothingConfig,

    /// Label decision
    pub decision: DecisionConfig,

    /// Display configuration
    pub display: DisplayConfig,
}

/// Model file paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the mudra classifier ONNX model
    pub classifier: PathBuf,

    /// Path to the hand landmark ONNX model
    pub hand_landmarks: PathBuf,

    /// Optional label file replacing `vocabulary`, one label per line
    pub labels: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    /// Pixels added around the hand on every side
    pub padding: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Side length of the classifier input
    pub input_size: usize,

    /// Contrast multiplier
    pub contrast: f32,

    /// Brightness offset
    pub brightness: f32,

    /// Channel order the classifier was trained on
    pub channel_order: ChannelOrder,
}

/// Filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Filter type: `moving_average`, `median`, `exponential` or `none`
    pub filter: String,

    /// Moving average window size
    pub window: usize,

    /// Median filter window size
    pub median_window: usize,

    /// Exponential filter alpha value
    pub exponential_alpha: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Top probability must exceed this to show a label
    pub threshold: f32,

    /// Majority vote window, 1 disables voting
    pub vote_window: usize,

    /// Predictions listed in still-image mode
    pub top_k: usize,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Default GUI mode
    pub gui_mode: String,

    /// Mirror or flip frames before detection
    pub invert: InvertMode,

    /// Show the classifier input in a second window
    pub show_model_input: bool,

    /// Side length of the model input preview
    pub model_preview_size: usize,

    /// Draw the frame rate in the corner
    pub show_fps: bool,

    /// Number of smoothed angles drawn per hand
    pub angle_rows: usize,

    /// Playback rate for video files
    pub target_fps: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: ModelConfig::default(),
            vocabulary: DEFAULT_VOCABULARY.iter().map(ToString::to_string).collect(),
            landmarks: LandmarkSettings::default(),
            roi: RoiConfig::default(),
            normalization: NormalizationConfig::default(),
            smoothing: SmoothingConfig::default(),
            decision: DecisionConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            classifier: PathBuf::from("assets/mudra_model.onnx"),
            hand_landmarks: PathBuf::from("assets/hand_landmark.onnx"),
            labels: None,
        }
    }
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            padding: DEFAULT_ROI_PADDING,
        }
    }
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_CLASSIFIER_INPUT_SIZE,
            contrast: DEFAULT_CONTRAST,
            brightness: DEFAULT_BRIGHTNESS,
            channel_order: ChannelOrder::Rgb,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            filter: "moving_average".to_string(),
            window: DEFAULT_HISTORY_WINDOW,
            median_window: DEFAULT_MEDIAN_WINDOW,
            exponential_alpha: DEFAULT_EXPONENTIAL_ALPHA,
        }
    }
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            vote_window: DEFAULT_VOTE_WINDOW,
            top_k: TOP_K_PREDICTIONS,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            gui_mode: "all".to_string(),
            invert: InvertMode::X,
            show_model_input: true,
            model_preview_size: MODEL_PREVIEW_SIZE,
            show_fps: true,
            angle_rows: DEFAULT_ANGLE_ROWS,
            target_fps: DEFAULT_FPS,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Filter spec for [`crate::filters::create_filter`].
    ///
    /// A spec with an explicit parameter (`median:3`) is used as is,
    /// otherwise the parameter comes from the matching config field.
    #[must_use]
    pub fn filter_spec(&self) -> String {
        let name = self.smoothing.filter.to_lowercase();
        if name.contains(':') {
            return name;
        }
        match name.as_str() {
            "moving_average" | "movingaverage" => format!("{name}:{}", self.smoothing.window),
            "median" => format!("{name}:{}", self.smoothing.median_window),
            "exponential" => format!("{name}:{}", self.smoothing.exponential_alpha),
            _ => name,
        }
    }

    /// Runtime pipeline settings derived from this configuration
    #[must_use]
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            roi_padding: self.roi.padding,
            normalizer: NormalizerSettings {
                target_size: self.normalization.input_size,
                contrast: self.normalization.contrast,
                brightness: self.normalization.brightness,
                channel_order: self.normalization.channel_order,
            },
            filter: self.filter_spec(),
            threshold: self.decision.threshold,
            vote_window: self.decision.vote_window,
            max_hands: self.landmarks.max_hands,
            keep_model_input: self.display.show_model_input,
        }
    }

    #[must_use]
    pub fn overlay_layout(&self) -> OverlayLayout {
        OverlayLayout::new(self.display.angle_rows)
    }

    /// The class vocabulary, from the label file if one is configured
    ///
    /// # Errors
    ///
    /// Returns an error if the label file cannot be read or the labels are
    /// empty or duplicated.
    pub fn vocabulary(&self) -> Result<Vocabulary> {
        match &self.models.labels {
            Some(path) => {
                log::info!("Loading labels from {}", path.display());
                Vocabulary::from_file(path)
            }
            None => Vocabulary::new(&self.vocabulary),
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.landmarks.validate()?;

        if self.roi.padding < 0 {
            return Err(Error::ConfigError("ROI padding must be non-negative".to_string()));
        }

        if self.normalization.input_size == 0 {
            return Err(Error::ConfigError("Classifier input size must be greater than 0".to_string()));
        }
        if !self.normalization.contrast.is_finite() || !self.normalization.brightness.is_finite() {
            return Err(Error::ConfigError("Contrast and brightness must be finite".to_string()));
        }

        if self.smoothing.window == 0 {
            return Err(Error::ConfigError(
                "Moving average window size must be greater than 0".to_string(),
            ));
        }
        if self.smoothing.median_window == 0 || self.smoothing.median_window % 2 == 0 {
            return Err(Error::ConfigError(
                "Median window size must be odd and greater than 0".to_string(),
            ));
        }
        if !(self.smoothing.exponential_alpha > 0.0 && self.smoothing.exponential_alpha <= 1.0) {
            return Err(Error::ConfigError(
                "Exponential alpha must be in (0.0, 1.0]".to_string(),
            ));
        }
        crate::filters::create_filter(&self.filter_spec()).map_err(|e| Error::ConfigError(e.to_string()))?;

        if !(0.0..=1.0).contains(&self.decision.threshold) {
            return Err(Error::ConfigError(
                "Confidence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.decision.vote_window == 0 {
            return Err(Error::ConfigError("Vote window must be greater than 0".to_string()));
        }

        if self.display.target_fps <= 0.0 {
            return Err(Error::ConfigError("Target FPS must be greater than 0".to_string()));
        }
        if self.display.model_preview_size == 0 {
            return Err(Error::ConfigError("Model preview size must be greater than 0".to_string()));
        }

        if self.models.labels.is_none() {
            Vocabulary::new(&self.vocabulary)?;
        }

        Ok(())
    }

    /// Check that the configured model files exist
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing file.
    pub fn check_model_paths(&self) -> Result<()> {
        if !self.models.classifier.exists() {
            return Err(Error::ConfigError(format!(
                "Classifier model not found: {}",
                self.models.classifier.display()
            )));
        }
        if !self.models.hand_landmarks.exists() {
            return Err(Error::ConfigError(format!(
                "Hand landmark model not found: {}",
                self.models.hand_landmarks.display()
            )));
        }
        if let Some(labels) = &self.models.labels {
            if !labels.exists() {
                return Err(Error::ConfigError(format!("Label file not found: {}", labels.display())));
            }
        }
        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Mudra Recognition Configuration

# Model paths
models:
  classifier: "assets/mudra_model.onnx"
  hand_landmarks: "assets/hand_landmark.onnx"
  # labels: "assets/labels.txt"

# Hand landmark detection
landmarks:
  min_detection_confidence: 0.6
  min_tracking_confidence: 0.6
  max_hands: 1
  static_image_mode: false

# Hand region
roi:
  padding: 60

# Classifier preprocessing
normalization:
  input_size: 128
  contrast: 1.3
  brightness: 10.0
  channel_order: rgb

# Angle smoothing
smoothing:
  filter: "moving_average"
  window: 5
  median_window: 5
  exponential_alpha: 0.5

# Label decision
decision:
  threshold: 0.4
  vote_window: 1
  top_k: 3

# Display settings
display:
  gui_mode: "all"
  invert: x
  show_model_input: true
  model_preview_size: 256
  show_fps: true
  angle_rows: 5
  target_fps: 30.0
"#;
