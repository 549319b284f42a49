//! Confidence filtering.

use crate::detection::Scored;
use crate::util::math::rank_score;

/// Keeps items whose score is at least `threshold`, in input order.
///
/// The boundary is inclusive: a score equal to `threshold` is kept. NaN and
/// infinite scores rank as negative infinity and are never kept.
pub fn filter_by_score<T>(items: &[T], threshold: f32) -> Vec<T>
where
    T: Scored + Clone,
{
    items
        .iter()
        .filter(|item| rank_score(item.score()) >= threshold)
        .cloned()
        .collect()
}
