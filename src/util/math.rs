//! Numeric helpers shared by the decode and suppression stages.

use std::cmp::Ordering;

/// Maps non-finite scores to negative infinity so they rank below everything.
#[inline]
pub(crate) fn rank_score(score: f32) -> f32 {
    if score.is_finite() {
        score
    } else {
        f32::NEG_INFINITY
    }
}

/// Orders two scores descending, treating non-finite values as the lowest.
#[inline]
pub(crate) fn cmp_score_desc(a: f32, b: f32) -> Ordering {
    rank_score(b).total_cmp(&rank_score(a))
}

/// Returns `(index, value)` of the largest ranked value; the first wins ties.
///
/// An empty iterator yields `(0, -inf)`.
pub(crate) fn argmax_first<I>(values: I) -> (usize, f32)
where
    I: IntoIterator<Item = f32>,
{
    let mut best_idx = 0usize;
    let mut best = f32::NEG_INFINITY;
    for (idx, value) in values.into_iter().enumerate() {
        let value = rank_score(value);
        if value > best {
            best = value;
            best_idx = idx;
        }
    }
    (best_idx, best)
}

#[cfg(test)]
mod tests {
    use super::{argmax_first, cmp_score_desc, rank_score};
    use std::cmp::Ordering;

    #[test]
    fn rank_score_sinks_non_finite() {
        assert_eq!(rank_score(0.5), 0.5);
        assert_eq!(rank_score(f32::NAN), f32::NEG_INFINITY);
        assert_eq!(rank_score(f32::INFINITY), f32::NEG_INFINITY);
    }

    #[test]
    fn cmp_score_desc_puts_nan_last() {
        assert_eq!(cmp_score_desc(0.9, 0.1), Ordering::Less);
        assert_eq!(cmp_score_desc(f32::NAN, 0.0), Ordering::Greater);
        assert_eq!(cmp_score_desc(0.3, 0.3), Ordering::Equal);
    }

    #[test]
    fn argmax_first_prefers_lowest_index_on_tie() {
        assert_eq!(argmax_first([0.2, 0.7, 0.7, 0.1]), (1, 0.7));
        assert_eq!(argmax_first([f32::NAN, 0.1]), (1, 0.1));
        let (idx, value) = argmax_first([f32::NAN, f32::NAN]);
        assert_eq!(idx, 0);
        assert_eq!(value, f32::NEG_INFINITY);
    }
}
