//! Error handling tests for all modules

use mudra_recognition::{
    decision::{ClassDistribution, LabelPolicy, LabelVoter, Vocabulary},
    frame::{ChannelOrder, Frame},
    hand_detection::{region_to_frame, LandmarkSettings},
    keypoints::{Keypoint, KeypointSet},
    normalizer::{resize_bilinear, ImageNormalizer, NormalizerSettings},
    roi::{BoundingBox, RoiExtractor},
    utils::safe_cast::usize_to_i32,
    Error, Result,
};

#[test]
fn test_frame_construction_errors() {
    assert!(Frame::from_raw(0, 10, Vec::new(), ChannelOrder::Bgr).is_err());
    assert!(Frame::from_raw(2, 2, vec![0; 11], ChannelOrder::Bgr).is_err());
    assert!(Frame::filled(2, 2, [0; 3], ChannelOrder::Rgb).is_ok());
}

#[test]
fn test_crop_errors() -> Result<()> {
    let frame = Frame::filled(100, 50, [1, 2, 3], ChannelOrder::Bgr)?;

    let result = frame.crop(&BoundingBox::new(10, 10, 10, 20));
    assert!(matches!(result, Err(Error::DegenerateRoi { width: 0, height: 10 })));

    let result = frame.crop(&BoundingBox::new(90, 0, 110, 20));
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    let crop = frame.crop(&BoundingBox::new(90, 40, 100, 50))?;
    assert_eq!((crop.width(), crop.height()), (10, 10));
    Ok(())
}

#[test]
fn test_keypoint_errors() {
    assert!(KeypointSet::new(Vec::new()).is_err());
    assert!(KeypointSet::new(vec![Keypoint::new(f32::INFINITY, 0.0, 0.0)]).is_err());
    assert!(KeypointSet::from_flat(&[0.1; 4]).is_err());
}

#[test]
fn test_roi_errors() {
    assert!(matches!(RoiExtractor::new(-5), Err(Error::InvalidInput(_))));
    let set = KeypointSet::new(vec![Keypoint::new(-1.0, -1.0, 0.0)]).unwrap();
    let result = RoiExtractor::new(60).unwrap().extract(&set, 640, 480);
    assert!(matches!(result, Err(Error::DegenerateRoi { .. })));
    assert!(result.unwrap_err().is_transient());
}

#[test]
fn test_normalizer_errors() {
    let zero = NormalizerSettings {
        target_size: 0,
        ..NormalizerSettings::default()
    };
    assert!(ImageNormalizer::new(zero).is_err());

    let nan = NormalizerSettings {
        contrast: f32::NAN,
        ..NormalizerSettings::default()
    };
    assert!(ImageNormalizer::new(nan).is_err());

    let frame = Frame::filled(4, 4, [0; 3], ChannelOrder::Rgb).unwrap();
    assert!(resize_bilinear(&frame, 4, 0).is_err());
}

#[test]
fn test_vocabulary_errors() {
    assert!(matches!(Vocabulary::new(Vec::<String>::new()), Err(Error::ConfigError(_))));
    assert!(Vocabulary::new(["Pathaka", "  "]).is_err());
    assert!(Vocabulary::new(["Pathaka", "Pathaka"]).is_err());
    assert!(Vocabulary::from_file("does/not/exist.txt").is_err());
}

#[test]
fn test_distribution_length_mismatch() {
    let vocabulary = Vocabulary::new(["a", "b", "c"]).unwrap();
    let result = ClassDistribution::new(&vocabulary, &[0.5, 0.5]);
    assert!(matches!(
        result,
        Err(Error::VocabularyMismatch {
            model: 2,
            vocabulary: 3
        })
    ));
}

#[test]
fn test_decision_parameter_errors() {
    assert!(LabelPolicy::new(-0.1).is_err());
    assert!(LabelPolicy::new(1.1).is_err());
    assert!(LabelPolicy::new(0.0).is_ok());
    assert!(LabelVoter::new(0).is_err());
}

#[test]
fn test_landmark_settings_errors() {
    let settings = LandmarkSettings {
        min_tracking_confidence: -0.2,
        ..LandmarkSettings::default()
    };
    assert!(matches!(settings.validate(), Err(Error::ConfigError(_))));
    assert!(region_to_frame(&[], 224, &BoundingBox::new(0, 0, 10, 10), 10, 10).is_err());
}

#[test]
fn test_transient_classification() {
    assert!(Error::Capture("dropped frame".to_string()).is_transient());
    assert!(!Error::Device("no camera".to_string()).is_transient());
    assert!(!Error::ConfigError("bad".to_string()).is_transient());
}

#[test]
fn test_safe_cast_errors() {
    assert_eq!(usize_to_i32(640).unwrap(), 640);
    if std::mem::size_of::<usize>() > 4 {
        assert!(usize_to_i32(usize::MAX).is_err());
    }
}
