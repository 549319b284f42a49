//! Candidate and detection records passed between pipeline stages.

use crate::bbox::{BBox, CenterBox};

/// Anything carrying a confidence score the filter and suppressor can rank.
pub trait Scored {
    /// Returns the confidence score.
    fn score(&self) -> f32;
}

/// Raw decoder output for a single anchor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Anchor slot the candidate was read from.
    pub anchor: usize,
    /// Box in center form, model-pixel space.
    pub center: CenterBox,
    /// Combined confidence (class score, optionally weighted by objectness).
    pub score: f32,
    /// Index of the best-scoring class.
    pub class_id: usize,
}

impl Candidate {
    /// Converts to a corner-form detection, dropping the anchor index.
    pub fn into_detection(self) -> Detection {
        Detection {
            bbox: self.center.to_corners(),
            score: self.score,
            class_id: self.class_id,
        }
    }
}

/// Final detection record: corner-form box, score and class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BBox,
    pub score: f32,
    pub class_id: usize,
}

impl Detection {
    pub const fn new(bbox: BBox, score: f32, class_id: usize) -> Self {
        Self {
            bbox,
            score,
            class_id,
        }
    }
}

impl Scored for Candidate {
    fn score(&self) -> f32 {
        self.score
    }
}

impl Scored for Detection {
    fn score(&self) -> f32 {
        self.score
    }
}
