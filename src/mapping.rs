//! Mapping boxes from model space onto the display surface.

use crate::bbox::{BBox, CoordSpace, TargetSize};
use crate::detection::Detection;
use crate::trace::{trace_event, trace_span};

/// Rescales boxes from `source` into `target`, clamps them to the target
/// bounds and drops boxes left with no width or height.
///
/// X and Y are scaled independently by `target / source` extent, so a
/// non-square display stretches the model's square input.
pub fn map_to_target(
    detections: &[Detection],
    source: CoordSpace,
    target: TargetSize,
) -> Vec<Detection> {
    let _span = trace_span!("map", candidates = detections.len()).entered();

    let (src_w, src_h) = source.extent();
    let sx = target.width / src_w;
    let sy = target.height / src_h;

    let mut out = Vec::with_capacity(detections.len());
    for det in detections {
        let bbox = BBox::new(
            clamp_coord(det.bbox.x1 * sx, target.width),
            clamp_coord(det.bbox.y1 * sy, target.height),
            clamp_coord(det.bbox.x2 * sx, target.width),
            clamp_coord(det.bbox.y2 * sy, target.height),
        );
        if !(bbox.width() > 0.0 && bbox.height() > 0.0) {
            continue;
        }
        out.push(Detection { bbox, ..*det });
    }

    trace_event!("mapped", kept = out.len(), dropped = detections.len() - out.len());
    out
}

#[inline]
fn clamp_coord(value: f32, max: f32) -> f32 {
    value.max(0.0).min(max)
}
