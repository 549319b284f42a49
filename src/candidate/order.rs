//! Deterministic score ordering.

use crate::util::math::cmp_score_desc;

/// Returns indices `0..scores.len()` ordered by descending score.
///
/// The sort is stable, so equal scores keep their input order. Non-finite
/// scores sort last.
pub(crate) fn indices_by_score_desc(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| cmp_score_desc(scores[a], scores[b]));
    order
}
