//! Greedy IoU non-maximum suppression.
//!
//! Candidates are visited by descending score (stable on ties). Each visited
//! candidate is kept and removes every remaining candidate whose IoU with it
//! is strictly greater than the threshold.

use std::collections::VecDeque;

use crate::bbox::{iou, BBox};
use crate::candidate::order::indices_by_score_desc;
use crate::detection::Detection;
use crate::trace::{trace_event, trace_span};
use crate::util::{DetError, DetResult};

/// Which candidates may suppress each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SuppressionMode {
    /// Any two overlapping boxes compete regardless of class.
    #[default]
    ClassAgnostic,
    /// Boxes only suppress boxes of the same class.
    PerClass,
}

/// Runs NMS over parallel box and score slices and returns the kept indices.
///
/// Indices come back in selection order, i.e. by descending score.
pub fn nms_indices(boxes: &[BBox], scores: &[f32], iou_threshold: f32) -> DetResult<Vec<usize>> {
    if scores.len() != boxes.len() {
        return Err(DetError::LengthMismatch {
            context: "scores",
            expected: boxes.len(),
            got: scores.len(),
        });
    }
    Ok(greedy_suppress(boxes, scores, None, iou_threshold))
}

/// Runs NMS over detections and returns the survivors by descending score.
pub fn nms(detections: &[Detection], iou_threshold: f32, mode: SuppressionMode) -> Vec<Detection> {
    let _span = trace_span!("suppress", candidates = detections.len()).entered();

    let boxes: Vec<BBox> = detections.iter().map(|d| d.bbox).collect();
    let scores: Vec<f32> = detections.iter().map(|d| d.score).collect();
    let classes: Vec<usize>;
    let groups = match mode {
        SuppressionMode::ClassAgnostic => None,
        SuppressionMode::PerClass => {
            classes = detections.iter().map(|d| d.class_id).collect();
            Some(classes.as_slice())
        }
    };

    let kept: Vec<Detection> = greedy_suppress(&boxes, &scores, groups, iou_threshold)
        .into_iter()
        .map(|idx| detections[idx])
        .collect();

    trace_event!("suppressed", kept = kept.len(), removed = detections.len() - kept.len());
    kept
}

fn greedy_suppress(
    boxes: &[BBox],
    scores: &[f32],
    groups: Option<&[usize]>,
    iou_threshold: f32,
) -> Vec<usize> {
    let mut remaining: VecDeque<usize> = indices_by_score_desc(scores).into();
    let mut keep = Vec::new();

    while let Some(best) = remaining.pop_front() {
        keep.push(best);
        remaining.retain(|&other| {
            if let Some(groups) = groups {
                if groups[best] != groups[other] {
                    return true;
                }
            }
            iou(&boxes[best], &boxes[other]) <= iou_threshold
        });
    }

    keep
}
