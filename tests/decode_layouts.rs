use detpipe::lowlevel::{decode, filter_by_score, DecodeParams};
use detpipe::{CenterBox, DetError, Layout, RawOutput, ScoreCombination};

/// Builds one anchor: box, optional objectness, then class scores.
fn anchor(center: [f32; 4], objectness: Option<f32>, class_scores: &[f32]) -> Vec<f32> {
    let mut out = center.to_vec();
    out.extend(objectness);
    out.extend_from_slice(class_scores);
    out
}

/// Transposes an anchor-major buffer into attribute-major order.
fn to_attribute_major(data: &[f32], anchors: usize, attributes: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; data.len()];
    for a in 0..anchors {
        for k in 0..attributes {
            out[k * anchors + a] = data[a * attributes + k];
        }
    }
    out
}

fn one_hot(num_classes: usize, class_id: usize, score: f32, rest: f32) -> Vec<f32> {
    let mut scores = vec![rest; num_classes];
    scores[class_id] = score;
    scores
}

#[test]
fn objectness_weighted_confidence_multiplies_scores() {
    let num_classes = 80;
    let data = anchor(
        [320.0, 320.0, 100.0, 100.0],
        Some(0.9),
        &one_hot(num_classes, 3, 0.8, 0.1),
    );
    assert_eq!(data.len(), 85);
    let raw = RawOutput::new(&data, 1, 85, Layout::AnchorMajor).unwrap();
    let params = DecodeParams {
        num_classes,
        score_combination: ScoreCombination::ObjectnessWeighted,
    };

    let out = decode(&raw, &params).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].class_id, 3);
    assert!((out[0].score - 0.72).abs() < 1e-6);
    assert_eq!(out[0].center, CenterBox::new(320.0, 320.0, 100.0, 100.0));
}

#[test]
fn direct_confidence_is_best_class_score() {
    let num_classes = 4;
    let data = anchor([10.0, 20.0, 4.0, 6.0], None, &[0.1, 0.3, 0.6, 0.2]);
    let raw = RawOutput::new(&data, 1, 8, Layout::AnchorMajor).unwrap();
    let params = DecodeParams {
        num_classes,
        score_combination: ScoreCombination::Direct,
    };

    let out = decode(&raw, &params).unwrap();
    assert_eq!(out[0].class_id, 2);
    assert_eq!(out[0].score, 0.6);
}

#[test]
fn class_ties_resolve_to_lowest_index() {
    let data = anchor([10.0, 10.0, 4.0, 4.0], None, &[0.2, 0.5, 0.5, 0.5]);
    let raw = RawOutput::new(&data, 1, 8, Layout::AnchorMajor).unwrap();
    let params = DecodeParams {
        num_classes: 4,
        score_combination: ScoreCombination::Direct,
    };
    assert_eq!(decode(&raw, &params).unwrap()[0].class_id, 1);
}

#[test]
fn both_layouts_decode_identically() {
    let num_classes = 3;
    let attributes = 4 + num_classes;
    let mut anchor_major = Vec::new();
    anchor_major.extend(anchor([100.0, 100.0, 50.0, 40.0], None, &[0.1, 0.7, 0.2]));
    anchor_major.extend(anchor([300.0, 200.0, 20.0, 80.0], None, &[0.9, 0.0, 0.3]));
    anchor_major.extend(anchor([600.0, 500.0, 10.0, 10.0], None, &[0.2, 0.2, 0.4]));
    let attribute_major = to_attribute_major(&anchor_major, 3, attributes);

    let params = DecodeParams {
        num_classes,
        score_combination: ScoreCombination::Direct,
    };
    let a = RawOutput::new(&anchor_major, 3, attributes, Layout::AnchorMajor).unwrap();
    let b = RawOutput::new(&attribute_major, 3, attributes, Layout::AttributeMajor).unwrap();

    let from_a = decode(&a, &params).unwrap();
    let from_b = decode(&b, &params).unwrap();
    assert_eq!(from_a, from_b);
    let classes: Vec<usize> = from_a.iter().map(|c| c.class_id).collect();
    assert_eq!(classes, vec![1, 0, 2]);
    let anchors: Vec<usize> = from_a.iter().map(|c| c.anchor).collect();
    assert_eq!(anchors, vec![0, 1, 2]);
}

#[test]
fn yolov8_tensor_dims_are_read_attribute_major() {
    let num_classes = 80;
    let anchors = 8400;
    let attributes = 4 + num_classes;
    let mut data = vec![0.0f32; attributes * anchors];
    // Anchor 42: box and a class-7 score of 0.95.
    let target = 42;
    data[target] = 123.0;
    data[anchors + target] = 234.0;
    data[2 * anchors + target] = 30.0;
    data[3 * anchors + target] = 60.0;
    data[(4 + 7) * anchors + target] = 0.95;

    let raw = RawOutput::from_tensor_shape(&data, &[1, 84, 8400], Layout::AttributeMajor).unwrap();
    let params = DecodeParams {
        num_classes,
        score_combination: ScoreCombination::Direct,
    };
    let out = decode(&raw, &params).unwrap();
    assert_eq!(out.len(), anchors);
    let best = &out[target];
    assert_eq!(best.class_id, 7);
    assert_eq!(best.score, 0.95);
    assert_eq!(best.center, CenterBox::new(123.0, 234.0, 30.0, 60.0));
}

#[test]
fn buffer_length_must_match_declared_shape() {
    let data = vec![0.0f32; 85 * 2 + 1];
    let err = RawOutput::new(&data, 2, 85, Layout::AnchorMajor).unwrap_err();
    assert_eq!(
        err,
        DetError::BufferLength {
            anchors: 2,
            attributes: 85,
            needed: 170,
            got: 171,
        }
    );
    assert!(err.is_shape_error());
}

#[test]
fn fewer_than_four_attributes_is_rejected() {
    let data = vec![0.0f32; 6];
    let err = RawOutput::new(&data, 2, 3, Layout::AnchorMajor).unwrap_err();
    assert_eq!(err, DetError::TooFewAttributes { attributes: 3 });
}

#[test]
fn objectness_layout_needs_the_extra_attribute() {
    let data = vec![0.0f32; 84];
    let raw = RawOutput::new(&data, 1, 84, Layout::AnchorMajor).unwrap();
    let params = DecodeParams {
        num_classes: 80,
        score_combination: ScoreCombination::ObjectnessWeighted,
    };
    let err = decode(&raw, &params).unwrap_err();
    assert_eq!(
        err,
        DetError::AttributeMismatch {
            attributes: 84,
            expected: 85,
            num_classes: 80,
        }
    );
}

#[test]
fn non_finite_objectness_sinks_the_candidate() {
    let data = anchor([10.0, 10.0, 4.0, 4.0], Some(f32::INFINITY), &[0.9]);
    let raw = RawOutput::new(&data, 1, 6, Layout::AnchorMajor).unwrap();
    let params = DecodeParams {
        num_classes: 1,
        score_combination: ScoreCombination::ObjectnessWeighted,
    };
    let out = decode(&raw, &params).unwrap();
    assert_eq!(out[0].score, f32::NEG_INFINITY);
}

#[test]
fn infinite_class_score_never_wins_or_passes() {
    let mut data = anchor([10.0, 10.0, 4.0, 4.0], None, &[f32::INFINITY, 0.3, 0.1]);
    data.extend(anchor([50.0, 50.0, 4.0, 4.0], None, &[f32::INFINITY, f32::INFINITY, f32::NAN]));
    let raw = RawOutput::new(&data, 2, 7, Layout::AnchorMajor).unwrap();
    let params = DecodeParams {
        num_classes: 3,
        score_combination: ScoreCombination::Direct,
    };

    let out = decode(&raw, &params).unwrap();
    assert_eq!(out[0].class_id, 1);
    assert_eq!(out[0].score, 0.3);
    assert_eq!(out[1].score, f32::NEG_INFINITY);

    let kept = filter_by_score(&out, 0.0);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].anchor, 0);
}

#[test]
fn empty_output_decodes_to_nothing() {
    let raw = RawOutput::new(&[], 0, 84, Layout::AttributeMajor).unwrap();
    let params = DecodeParams {
        num_classes: 80,
        score_combination: ScoreCombination::Direct,
    };
    assert!(decode(&raw, &params).unwrap().is_empty());
}
