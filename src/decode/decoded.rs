//! Entry point for detectors that emit already-decoded triplets.
//!
//! Some exported graphs end in their own decode (and often suppression) step
//! and hand back `boxes`, `scores`, `class_ids` plus a valid count. These skip
//! the tensor decoder and enter the pipeline at the confidence filter.

use crate::bbox::{BBox, CoordSpace};
use crate::detection::Detection;
use crate::util::math::rank_score;
use crate::util::{DetError, DetResult};

/// Coordinate order of each decoded box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BoxOrder {
    /// `[x1, y1, x2, y2]`.
    #[default]
    Xyxy,
    /// `[ymin, xmin, ymax, xmax]`, as produced by TF object detection graphs.
    Yxyx,
}

/// Borrowed, length-checked decoded detector output.
#[derive(Clone, Copy, Debug)]
pub struct DecodedOutput<'a> {
    boxes: &'a [[f32; 4]],
    scores: &'a [f32],
    class_ids: &'a [usize],
    valid_count: usize,
    box_order: BoxOrder,
    space: CoordSpace,
}

impl<'a> DecodedOutput<'a> {
    /// Creates a view over parallel arrays of which the first `valid_count`
    /// entries are meaningful.
    ///
    /// Boxes default to `Xyxy` order in normalized space.
    pub fn new(
        boxes: &'a [[f32; 4]],
        scores: &'a [f32],
        class_ids: &'a [usize],
        valid_count: usize,
    ) -> DetResult<Self> {
        if scores.len() != boxes.len() {
            return Err(DetError::LengthMismatch {
                context: "scores",
                expected: boxes.len(),
                got: scores.len(),
            });
        }
        if class_ids.len() != boxes.len() {
            return Err(DetError::LengthMismatch {
                context: "class_ids",
                expected: boxes.len(),
                got: class_ids.len(),
            });
        }
        if valid_count > boxes.len() {
            return Err(DetError::ValidCount {
                valid_count,
                len: boxes.len(),
            });
        }
        Ok(Self {
            boxes,
            scores,
            class_ids,
            valid_count,
            box_order: BoxOrder::default(),
            space: CoordSpace::Normalized,
        })
    }

    /// Sets the box coordinate order.
    pub fn with_box_order(mut self, order: BoxOrder) -> Self {
        self.box_order = order;
        self
    }

    /// Sets the coordinate space of the boxes.
    pub fn with_space(mut self, space: CoordSpace) -> Self {
        self.space = space;
        self
    }

    /// Number of leading entries that are read.
    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    /// Coordinate order of the boxes.
    pub fn box_order(&self) -> BoxOrder {
        self.box_order
    }

    /// Coordinate space the boxes are expressed in.
    pub fn space(&self) -> CoordSpace {
        self.space
    }

    /// Converts the valid entries into corner-form detections.
    ///
    /// Entries with a class id outside `0..num_classes` or a non-finite box are
    /// dropped; order is otherwise preserved. Non-finite scores become
    /// negative infinity.
    pub fn to_detections(&self, num_classes: usize) -> Vec<Detection> {
        let mut out = Vec::with_capacity(self.valid_count);
        for idx in 0..self.valid_count {
            let class_id = self.class_ids[idx];
            if class_id >= num_classes {
                continue;
            }
            let coords = self.boxes[idx];
            let bbox = match self.box_order {
                BoxOrder::Xyxy => BBox::new(coords[0], coords[1], coords[2], coords[3]),
                BoxOrder::Yxyx => BBox::from_yxyx(coords),
            };
            if !bbox.is_finite() {
                continue;
            }
            out.push(Detection::new(bbox, rank_score(self.scores[idx]), class_id));
        }
        out
    }
}
