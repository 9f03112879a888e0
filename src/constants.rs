//! Constants used throughout the application

/// Number of landmarks reported per hand
pub const NUM_HAND_LANDMARKS: usize = 21;

/// Default frames per second assumption
pub const DEFAULT_FPS: f64 = 30.0;

/// Pixels added on every side of the landmark bounding box
pub const DEFAULT_ROI_PADDING: i32 = 60;

/// Side length of the square classifier input
pub const DEFAULT_CLASSIFIER_INPUT_SIZE: usize = 128;

/// Contrast multiplier applied to the crop before resizing
pub const DEFAULT_CONTRAST: f32 = 1.3;

/// Brightness offset applied after the contrast multiplier
pub const DEFAULT_BRIGHTNESS: f32 = 10.0;

/// Minimum top probability for a recognized label (strictly greater)
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.4;

/// Number of angle vectors kept by the temporal smoother
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// Default window sizes and parameters for alternative filters
pub const DEFAULT_MEDIAN_WINDOW: usize = 5;
pub const DEFAULT_EXPONENTIAL_ALPHA: f64 = 0.5;

/// Number of recent decisions considered by the label voter (1 = no voting)
pub const DEFAULT_VOTE_WINDOW: usize = 1;

/// Landmark detector defaults
pub const DEFAULT_MIN_DETECTION_CONFIDENCE: f32 = 0.6;
pub const DEFAULT_MIN_TRACKING_CONFIDENCE: f32 = 0.6;
pub const DEFAULT_MAX_HANDS: usize = 1;

/// Number of smoothed angles drawn below the label
pub const DEFAULT_ANGLE_ROWS: usize = 5;

/// Overlay text layout, in pixels relative to the bounding box corner
pub const LABEL_OFFSET_Y: i32 = 10;
pub const ANGLE_ROW_OFFSET_Y: i32 = 25;
pub const ANGLE_ROW_SPACING: i32 = 25;

/// Side length of the model input preview window
pub const MODEL_PREVIEW_SIZE: usize = 256;

/// Number of ranked predictions printed in still-image mode
pub const TOP_K_PREDICTIONS: usize = 3;

