//! Decoding raw detector tensors into scored candidates.
//!
//! Every anchor starts with `(cx, cy, w, h)` in model-input pixels, followed by
//! an optional objectness score and one score per class. How those scores are
//! combined is fixed per model through `ScoreCombination`.

mod decoded;
mod raw;

pub use decoded::{BoxOrder, DecodedOutput};
pub use raw::{Layout, RawOutput};

use crate::bbox::CenterBox;
use crate::detection::Candidate;
use crate::trace::{trace_event, trace_span};
use crate::util::math::{argmax_first, rank_score};
use crate::util::{DetError, DetResult};

/// How per-class scores turn into a detection confidence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScoreCombination {
    /// The best per-class score is the confidence (`4 + num_classes` attributes).
    #[default]
    Direct,
    /// Objectness times the best per-class score (`5 + num_classes` attributes).
    ObjectnessWeighted,
}

impl ScoreCombination {
    /// Index of the first per-class score within an anchor.
    pub fn class_offset(self) -> usize {
        match self {
            ScoreCombination::Direct => 4,
            ScoreCombination::ObjectnessWeighted => 5,
        }
    }
}

/// Per-model decoding parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodeParams {
    /// Number of classes the detector scores.
    pub num_classes: usize,
    /// Score combination rule.
    pub score_combination: ScoreCombination,
}

impl DecodeParams {
    /// Attribute count each anchor must carry for these parameters.
    pub fn expected_attributes(&self) -> usize {
        self.score_combination.class_offset() + self.num_classes
    }

    /// Checks a raw output against these parameters.
    pub fn check(&self, raw: &RawOutput<'_>) -> DetResult<()> {
        let expected = self.expected_attributes();
        if raw.attributes() != expected {
            return Err(DetError::AttributeMismatch {
                attributes: raw.attributes(),
                expected,
                num_classes: self.num_classes,
            });
        }
        Ok(())
    }
}

/// Decodes every anchor of `raw` into a candidate, in anchor order.
///
/// Anchors whose box attributes are not finite are skipped. Non-finite
/// scores rank as negative infinity and therefore never pass a filter.
pub fn decode(raw: &RawOutput<'_>, params: &DecodeParams) -> DetResult<Vec<Candidate>> {
    params.check(raw)?;

    let _span = trace_span!(
        "decode",
        anchors = raw.anchors(),
        attributes = raw.attributes()
    )
    .entered();

    let offset = params.score_combination.class_offset();
    let mut out = Vec::with_capacity(raw.anchors());
    let mut skipped = 0usize;
    for anchor in 0..raw.anchors() {
        let center = CenterBox::new(
            raw.value(anchor, 0),
            raw.value(anchor, 1),
            raw.value(anchor, 2),
            raw.value(anchor, 3),
        );
        if !center.is_finite() {
            skipped += 1;
            continue;
        }

        let (class_id, best) =
            argmax_first((0..params.num_classes).map(|c| raw.value(anchor, offset + c)));
        let score = match params.score_combination {
            ScoreCombination::Direct => best,
            ScoreCombination::ObjectnessWeighted => rank_score(raw.value(anchor, 4)) * best,
        };

        out.push(Candidate {
            anchor,
            center,
            score: rank_score(score),
            class_id,
        });
    }

    trace_event!("decoded", candidates = out.len(), skipped = skipped);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{decode, DecodeParams, Layout, RawOutput, ScoreCombination};
    use crate::util::DetError;

    #[test]
    fn expected_attributes_counts_objectness() {
        let direct = DecodeParams {
            num_classes: 80,
            score_combination: ScoreCombination::Direct,
        };
        let weighted = DecodeParams {
            num_classes: 80,
            score_combination: ScoreCombination::ObjectnessWeighted,
        };
        assert_eq!(direct.expected_attributes(), 84);
        assert_eq!(weighted.expected_attributes(), 85);
    }

    #[test]
    fn attribute_mismatch_is_rejected() {
        let data = vec![0.0f32; 2 * 6];
        let raw = RawOutput::new(&data, 2, 6, Layout::AnchorMajor).unwrap();
        let params = DecodeParams {
            num_classes: 3,
            score_combination: ScoreCombination::Direct,
        };
        let err = decode(&raw, &params).unwrap_err();
        assert_eq!(
            err,
            DetError::AttributeMismatch {
                attributes: 6,
                expected: 7,
                num_classes: 3,
            }
        );
    }

    #[test]
    fn non_finite_box_is_skipped_and_nan_score_sinks() {
        #[rustfmt::skip]
        let data = [
            f32::NAN, 1.0, 1.0, 1.0, 0.9,
            5.0, 5.0, 2.0, 2.0, f32::NAN,
        ];
        let raw = RawOutput::new(&data, 2, 5, Layout::AnchorMajor).unwrap();
        let params = DecodeParams {
            num_classes: 1,
            score_combination: ScoreCombination::Direct,
        };
        let out = decode(&raw, &params).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].anchor, 1);
        assert_eq!(out[0].score, f32::NEG_INFINITY);
    }
}
