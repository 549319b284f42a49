//! Intersection over union for corner-form boxes.

use crate::bbox::BBox;

/// Computes the intersection over union of two corner-form boxes.
///
/// Returns 0 when the union is not positive (degenerate boxes) or not a
/// number, so callers can compare the result against a threshold directly.
pub fn iou(a: &BBox, b: &BBox) -> f32 {
    let inter_w = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let inter_h = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let inter = inter_w * inter_h;
    let union = a.area() + b.area() - inter;
    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}
