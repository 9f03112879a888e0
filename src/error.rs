//! Error types for the mudra recognition library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// `ONNX` Runtime inference failed
    #[cfg(feature = "onnx")]
    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(#[from] ort::OrtError),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Hand region collapsed to zero area after clamping to the frame
    #[error("Degenerate ROI: clamped box is {width}x{height}")]
    DegenerateRoi {
        /// Width after clamping
        width: i32,
        /// Height after clamping
        height: i32,
    },

    /// Camera or video device could not be opened
    #[error("Device error: {0}")]
    Device(String),

    /// A single frame could not be read
    #[error("Capture error: {0}")]
    Capture(String),

    /// Model loading or inference error
    #[error("Model error: {0}")]
    ModelError(String),

    /// Model input configuration error
    #[error("Model input error: {0}")]
    ModelInputError(String),

    /// Model output processing error
    #[error("Model output error: {0}")]
    ModelOutputError(String),

    /// Model validation error (wrong tensor shape, etc.)
    #[error("Model validation error: {0}")]
    ModelValidationError(String),

    /// Classifier output width does not match the label vocabulary
    #[error("Vocabulary mismatch: model produces {model} classes, vocabulary has {vocabulary} labels")]
    VocabularyMismatch {
        /// Number of scores the classifier produces
        model: usize,
        /// Number of labels in the vocabulary
        vocabulary: usize,
    },

    /// Filter initialization or processing error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error only affects the current frame and the loop may continue
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Capture(_) | Self::DegenerateRoi { .. } | Self::ModelOutputError(_)
        )
    }
}
