//! Mudra classifier interface and its ONNX Runtime backend.

use crate::{decision::ClassDistribution, normalizer::NormalizedImage, Result};

/// A pretrained image classifier over a fixed vocabulary.
pub trait Classifier {
    /// Score one normalized hand crop
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the output cannot be paired
    /// with the vocabulary. The caller skips the hand for this frame.
    fn infer(&mut self, batch: &NormalizedImage) -> Result<ClassDistribution>;

    /// Check that the model accepts tensors of `shape` (NHWC)
    ///
    /// # Errors
    ///
    /// Returns an error describing the first mismatching dimension.
    fn validate_input(&self, _shape: [usize; 4]) -> Result<()> {
        Ok(())
    }

    /// Number of scores per inference, if the model declares it
    fn output_width(&self) -> Option<usize> {
        None
    }
}

/// Compare declared model dimensions (`None` = dynamic) with a concrete shape
///
/// # Errors
///
/// Returns a model validation error on rank or dimension mismatch.
pub fn check_dimensions(declared: &[Option<usize>], shape: &[usize]) -> Result<()> {
    if declared.len() != shape.len() {
        return Err(crate::Error::ModelValidationError(format!(
            "Model expects rank {} input, normalizer produces rank {}",
            declared.len(),
            shape.len()
        )));
    }
    for (axis, (dim, &actual)) in declared.iter().zip(shape).enumerate() {
        if let Some(expected) = dim {
            if *expected != actual {
                return Err(crate::Error::ModelValidationError(format!(
                    "Input axis {axis}: model expects {expected}, normalizer produces {actual}"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

#[cfg(feature = "onnx")]
mod onnx {
    use super::{check_dimensions, Classifier};
    use crate::{
        decision::{ClassDistribution, Vocabulary},
        error::Error,
        normalizer::NormalizedImage,
        Result,
    };
    use ndarray::CowArray;
    use ort::{Environment, GraphOptimizationLevel, Session, SessionBuilder, Value};
    use std::path::Path;
    use std::sync::Arc;

    /// Keras-exported mudra classifier running on `ONNX` Runtime
    pub struct OnnxClassifier {
        session: Session,
        vocabulary: Arc<Vocabulary>,
        input_dims: Vec<Option<usize>>,
        output_width: Option<usize>,
    }

    impl OnnxClassifier {
        /// Load the classifier from an `ONNX` model file
        ///
        /// # Errors
        ///
        /// Returns an error if:
        /// - The model file does not exist or cannot be loaded
        /// - The model has no inputs or outputs
        /// - The ONNX runtime environment cannot be created
        pub fn new<P: AsRef<Path>>(model_path: P, vocabulary: Arc<Vocabulary>) -> Result<Self> {
            if !model_path.as_ref().exists() {
                return Err(Error::ModelError(format!(
                    "Classifier model not found: {}",
                    model_path.as_ref().display()
                )));
            }
            log::info!("Loading classifier model: {}", model_path.as_ref().display());
            let environment = Arc::new(
                Environment::builder()
                    .with_name("mudra_classifier")
                    .with_log_level(ort::LoggingLevel::Warning)
                    .build()?,
            );

            let session = SessionBuilder::new(&environment)?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .with_model_from_file(model_path)?;

            let input_dims = session
                .inputs
                .first()
                .ok_or_else(|| Error::ModelInputError("Model has no inputs".to_string()))?
                .dimensions
                .iter()
                .map(|d| d.map(|v| v as usize))
                .collect();

            let output_width = session
                .outputs
                .first()
                .ok_or_else(|| Error::ModelOutputError("Model has no outputs".to_string()))?
                .dimensions
                .last()
                .copied()
                .flatten()
                .map(|v| v as usize);

            log::debug!("Classifier input dims {input_dims:?}, output width {output_width:?}");

            Ok(Self {
                session,
                vocabulary,
                input_dims,
                output_width,
            })
        }

        /// Run forward pass through the model
        fn forward(&self, batch: &NormalizedImage) -> Result<Vec<f32>> {
            let cow_array = CowArray::from(batch.tensor().view().into_dyn());
            let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;

            let outputs = self.session.run(vec![input_tensor])?;
            let scores = outputs
                .into_iter()
                .next()
                .ok_or_else(|| Error::ModelOutputError("No output from model".to_string()))?;

            let scores = scores.try_extract::<f32>()?;
            let scores = scores.view().iter().copied().collect();
            Ok(scores)
        }
    }

    impl Classifier for OnnxClassifier {
        fn infer(&mut self, batch: &NormalizedImage) -> Result<ClassDistribution> {
            let scores = self.forward(batch)?;
            ClassDistribution::new(&self.vocabulary, &scores)
        }

        fn validate_input(&self, shape: [usize; 4]) -> Result<()> {
            // Batch axis is always 1 here
            let mut declared = self.input_dims.clone();
            if let Some(batch) = declared.first_mut() {
                *batch = None;
            }
            check_dimensions(&declared, &shape)
        }

        fn output_width(&self) -> Option<usize> {
            self.output_width
        }
    }
}
