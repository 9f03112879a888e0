//! End-to-end tests of the frame-to-decision pipeline with mock collaborators


use mudra_recognition::{
    decision::{LabelDecision, Vocabulary},
    overlay::OverlayLayout,
    pipeline::{Pipeline, PipelineSettings},
    Error,
};
use test_helpers::{camera_frame, hand_at, peaked_scores, segment, MockClassifier, ScriptedLandmarks};

fn settings() -> PipelineSettings {
    PipelineSettings::default()
}

#[test]
fn test_confident_prediction_is_recognized() {
    let landmarks = ScriptedLandmarks::repeat(&[hand_at(0.5, 0.5, 0.1)], 1);
    let classifier = MockClassifier::confident(3, 0.41);
    let shape = classifier.last_shape.clone();
    let mut pipeline = Pipeline::new(landmarks, classifier, &Vocabulary::default(), &settings()).unwrap();

    let result = pipeline.process_frame(&camera_frame()).unwrap();
    assert_eq!(result.hands.len(), 1);
    let hand = &result.hands[0];

    assert!(hand.roi.is_some());
    assert!(hand.has_overlay());
    assert_eq!(shape.get(), Some([1, 128, 128, 3]));
    match hand.decision.as_ref().unwrap() {
        LabelDecision::Recognized { name, confidence } => {
            assert_eq!(&**name, "Aralam");
            assert!((confidence - 0.41).abs() < 1e-6);
        }
        LabelDecision::Unknown => panic!("Expected a recognized label"),
    }
    assert_eq!(hand.decision.as_ref().unwrap().to_string(), "Aralam (41.0%)");
    assert_eq!(hand.smoothed.as_ref().unwrap().len(), 20);
}

#[test]
fn test_low_confidence_is_unknown() {
    let landmarks = ScriptedLandmarks::repeat(&[hand_at(0.5, 0.5, 0.1)], 1);
    let classifier = MockClassifier::confident(10, 0.35);
    let mut pipeline = Pipeline::new(landmarks, classifier, &Vocabulary::default(), &settings()).unwrap();

    let result = pipeline.process_frame(&camera_frame()).unwrap();
    assert_eq!(result.hands[0].decision, Some(LabelDecision::Unknown));
    // Unknown still gets a label row and angle rows
    assert_eq!(OverlayLayout::default().rows(&result.hands[0]).len(), 6);
}

#[test]
fn test_no_hand_leaves_history_untouched() {
    let landmarks = ScriptedLandmarks::new(vec![Some(vec![segment(true)]), Some(Vec::new())]);
    let classifier = MockClassifier::confident(0, 0.9);
    let calls = classifier.calls.clone();
    let mut pipeline = Pipeline::new(landmarks, classifier, &Vocabulary::default(), &settings()).unwrap();

    pipeline.process_frame(&camera_frame()).unwrap();
    let before = pipeline.smoothed(0);
    let result = pipeline.process_frame(&camera_frame()).unwrap();

    assert!(result.is_empty());
    assert_eq!(pipeline.smoothed(0), before);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_degenerate_roi_skips_hand() {
    // Every keypoint far to the right of the frame
    let outside = hand_at(2.0, 0.5, 0.05);
    let landmarks = ScriptedLandmarks::repeat(&[outside], 1);
    let classifier = MockClassifier::confident(0, 0.9);
    let calls = classifier.calls.clone();
    let mut pipeline = Pipeline::new(landmarks, classifier, &Vocabulary::default(), &settings()).unwrap();

    let result = pipeline.process_frame(&camera_frame()).unwrap();
    let hand = &result.hands[0];
    assert!(hand.roi.is_none());
    assert!(hand.decision.is_none());
    assert!(hand.smoothed.is_none());
    assert!(!hand.has_overlay());
    assert_eq!(calls.get(), 0);
    assert!(pipeline.smoothed(0).is_none());
}

#[test]
fn test_degenerate_hand_does_not_affect_other_slot() {
    let hands = vec![hand_at(2.0, 0.5, 0.05), hand_at(0.5, 0.5, 0.1)];
    let landmarks = ScriptedLandmarks::repeat(&hands, 1);
    let settings = PipelineSettings {
        max_hands: 2,
        ..settings()
    };
    let mut pipeline = Pipeline::new(landmarks, MockClassifier::confident(1, 0.8), &Vocabulary::default(), &settings).unwrap();

    let result = pipeline.process_frame(&camera_frame()).unwrap();
    assert!(result.hands[0].decision.is_none());
    assert_eq!(result.hands[1].decision.as_ref().and_then(LabelDecision::name), Some("Alapadmam(1)"));
    assert!(pipeline.smoothed(0).is_none());
    assert!(pipeline.smoothed(1).is_some());
}

#[test]
fn test_classifier_failure_hides_overlay_but_updates_history() {
    let landmarks = ScriptedLandmarks::repeat(&[hand_at(0.5, 0.5, 0.1)], 1);
    let mut pipeline =
        Pipeline::new(landmarks, MockClassifier::failing(), &Vocabulary::default(), &settings()).unwrap();

    let result = pipeline.process_frame(&camera_frame()).unwrap();
    let hand = &result.hands[0];
    assert!(hand.roi.is_some());
    assert!(hand.decision.is_none());
    assert!(hand.distribution.is_none());
    assert!(hand.smoothed.is_some());
    assert!(!hand.has_overlay());
    assert!(OverlayLayout::default().rows(hand).is_empty());
    assert!(pipeline.smoothed(0).is_some());
}

#[test]
fn test_landmark_failure_is_reported() {
    let landmarks = ScriptedLandmarks::new(vec![None, Some(vec![segment(false)])]);
    let mut pipeline =
        Pipeline::new(landmarks, MockClassifier::confident(0, 0.9), &Vocabulary::default(), &settings()).unwrap();

    assert!(pipeline.process_frame(&camera_frame()).is_err());
    // The next frame is processed normally
    assert_eq!(pipeline.process_frame(&camera_frame()).unwrap().hands.len(), 1);
}

#[test]
fn test_vocabulary_mismatch_rejected_at_construction() {
    let mut classifier = MockClassifier::confident(0, 0.9);
    classifier.declared_width = Some(50);
    let result = Pipeline::new(ScriptedLandmarks::new(Vec::new()), classifier, &Vocabulary::default(), &settings());
    assert!(matches!(
        result,
        Err(Error::VocabularyMismatch {
            model: 50,
            vocabulary: 72
        })
    ));
}

#[test]
fn test_input_shape_mismatch_rejected_at_construction() {
    let mut classifier = MockClassifier::confident(0, 0.9);
    classifier.declared_input = Some(vec![None, Some(224), Some(224), Some(3)]);
    let result = Pipeline::new(ScriptedLandmarks::new(Vec::new()), classifier, &Vocabulary::default(), &settings());
    assert!(matches!(result, Err(Error::ModelValidationError(_))));

    let mut classifier = MockClassifier::confident(0, 0.9);
    classifier.declared_input = Some(vec![None, Some(128), Some(128), Some(3)]);
    classifier.declared_width = Some(72);
    assert!(Pipeline::new(ScriptedLandmarks::new(Vec::new()), classifier, &Vocabulary::default(), &settings()).is_ok());
}

#[test]
fn test_invalid_settings_rejected() {
    let bad_filter = PipelineSettings {
        filter: "kalman".to_string(),
        ..settings()
    };
    assert!(Pipeline::new(
        ScriptedLandmarks::new(Vec::new()),
        MockClassifier::confident(0, 0.9),
        &Vocabulary::default(),
        &bad_filter
    )
    .is_err());

    let no_slots = PipelineSettings {
        max_hands: 0,
        ..settings()
    };
    assert!(Pipeline::new(
        ScriptedLandmarks::new(Vec::new()),
        MockClassifier::confident(0, 0.9),
        &Vocabulary::default(),
        &no_slots
    )
    .is_err());
}

#[test]
fn test_smoothing_converges_after_eviction() {
    // One frame pointing right (0 degrees), then five pointing down (90 degrees)
    let mut script = vec![Some(vec![segment(false)])];
    script.extend(std::iter::repeat(Some(vec![segment(true)])).take(5));
    let mut pipeline = Pipeline::new(
        ScriptedLandmarks::new(script),
        MockClassifier::confident(0, 0.9),
        &Vocabulary::default(),
        &settings(),
    )
    .unwrap();

    let mut outputs = Vec::new();
    for _ in 0..6 {
        let result = pipeline.process_frame(&camera_frame()).unwrap();
        outputs.push(result.hands[0].smoothed.as_ref().unwrap()[0]);
    }
    assert_eq!(outputs[0], 0.0);
    assert_eq!(outputs[4], 72.0);
    assert_eq!(outputs[5], 90.0);
}

#[test]
fn test_extra_hands_are_ignored() {
    let hands = vec![hand_at(0.3, 0.5, 0.05), hand_at(0.5, 0.5, 0.05), hand_at(0.7, 0.5, 0.05)];
    let settings = PipelineSettings {
        max_hands: 2,
        ..settings()
    };
    let mut pipeline = Pipeline::new(
        ScriptedLandmarks::repeat(&hands, 1),
        MockClassifier::confident(0, 0.9),
        &Vocabulary::default(),
        &settings,
    )
    .unwrap();

    assert_eq!(pipeline.slots(), 2);
    assert_eq!(pipeline.process_frame(&camera_frame()).unwrap().hands.len(), 2);
}

#[test]
fn test_slots_smooth_independently() {
    let script = vec![Some(vec![segment(false), segment(true)]); 3];
    let settings = PipelineSettings {
        max_hands: 2,
        ..settings()
    };
    let mut pipeline = Pipeline::new(
        ScriptedLandmarks::new(script),
        MockClassifier::confident(0, 0.9),
        &Vocabulary::default(),
        &settings,
    )
    .unwrap();

    for _ in 0..3 {
        pipeline.process_frame(&camera_frame()).unwrap();
    }
    assert_eq!(pipeline.smoothed(0).unwrap().as_slice(), &[0.0]);
    assert_eq!(pipeline.smoothed(1).unwrap().as_slice(), &[90.0]);
}

#[test]
fn test_reset_tracking_clears_history() {
    let landmarks = ScriptedLandmarks::repeat(&[segment(true)], 2);
    let resets = landmarks.resets.clone();
    let mut pipeline =
        Pipeline::new(landmarks, MockClassifier::confident(0, 0.9), &Vocabulary::default(), &settings()).unwrap();

    pipeline.process_frame(&camera_frame()).unwrap();
    assert!(pipeline.smoothed(0).is_some());

    pipeline.reset_tracking();
    assert!(pipeline.smoothed(0).is_none());
    assert_eq!(resets.get(), 1);
}

#[test]
fn test_vote_window_holds_majority_label() {
    let vocabulary = Vocabulary::default();
    let a = peaked_scores(vocabulary.len(), 5, 0.9);
    let b = peaked_scores(vocabulary.len(), 6, 0.9);
    let classifier = MockClassifier::new(vocabulary.clone(), a.clone()).with_script(vec![a.clone(), a, b]);
    let settings = PipelineSettings {
        vote_window: 3,
        ..settings()
    };
    let mut pipeline =
        Pipeline::new(ScriptedLandmarks::repeat(&[hand_at(0.5, 0.5, 0.1)], 3), classifier, &vocabulary, &settings)
            .unwrap();

    let names: Vec<Option<String>> = (0..3)
        .map(|_| {
            let result = pipeline.process_frame(&camera_frame()).unwrap();
            result.hands[0].decision.as_ref().and_then(|d| d.name().map(ToString::to_string))
        })
        .collect();

    // A single frame of "b" does not displace the majority label
    let expected = vocabulary.get(5).map(|s| s.to_string());
    assert_eq!(names, vec![None, expected.clone(), expected]);
}

#[test]
fn test_model_input_preview_kept_on_request() {
    let settings = PipelineSettings {
        keep_model_input: true,
        ..settings()
    };
    let mut pipeline = Pipeline::new(
        ScriptedLandmarks::repeat(&[hand_at(0.5, 0.5, 0.1)], 1),
        MockClassifier::confident(0, 0.9),
        &Vocabulary::default(),
        &settings,
    )
    .unwrap();

    let result = pipeline.process_frame(&camera_frame()).unwrap();
    let hand = &result.hands[0];
    let preview = hand.model_input.as_ref().unwrap();
    let roi = hand.roi.unwrap();
    assert_eq!(preview.width() as i32, roi.width());
    assert_eq!(preview.height() as i32, roi.height());
}
