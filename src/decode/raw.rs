//! Borrowed view over a detector's flat output tensor.
//!
//! `RawOutput` pairs the flat buffer with an explicit anchor count, attribute
//! count and layout tag. The layout is supplied by the caller once per model;
//! it is never sniffed from the tensor contents.

use crate::util::{DetError, DetResult};

/// Memory order of the per-anchor attributes in the flat buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Layout {
    /// All attributes of anchor 0, then anchor 1, ... (`[anchors, attrs]`).
    AnchorMajor,
    /// Attribute 0 of every anchor, then attribute 1, ... (`[attrs, anchors]`).
    ///
    /// This is the layout of YOLOv8-style `[1, 84, 8400]` heads.
    #[default]
    AttributeMajor,
}

/// Borrowed, shape-checked detector output.
#[derive(Clone, Copy, Debug)]
pub struct RawOutput<'a> {
    data: &'a [f32],
    anchors: usize,
    attributes: usize,
    layout: Layout,
}

impl<'a> RawOutput<'a> {
    /// Creates a view after checking that the buffer matches the declared shape.
    pub fn new(
        data: &'a [f32],
        anchors: usize,
        attributes: usize,
        layout: Layout,
    ) -> DetResult<Self> {
        if attributes < 4 {
            return Err(DetError::TooFewAttributes { attributes });
        }
        let needed = anchors
            .checked_mul(attributes)
            .ok_or(DetError::BufferLength {
                anchors,
                attributes,
                needed: usize::MAX,
                got: data.len(),
            })?;
        if data.len() != needed {
            return Err(DetError::BufferLength {
                anchors,
                attributes,
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            anchors,
            attributes,
            layout,
        })
    }

    /// Creates a view from tensor dims interpreted through `layout`.
    ///
    /// Accepts `[a, b]` or `[1, a, b]`. For `AttributeMajor` the dims read as
    /// `[attributes, anchors]`, for `AnchorMajor` as `[anchors, attributes]`.
    pub fn from_tensor_shape(data: &'a [f32], dims: &[usize], layout: Layout) -> DetResult<Self> {
        let (outer, inner) = match *dims {
            [outer, inner] => (outer, inner),
            [1, outer, inner] => (outer, inner),
            _ => {
                return Err(DetError::UnsupportedDims {
                    dims: dims.to_vec(),
                })
            }
        };
        match layout {
            Layout::AnchorMajor => Self::new(data, outer, inner, layout),
            Layout::AttributeMajor => Self::new(data, inner, outer, layout),
        }
    }

    /// Returns the number of anchor slots.
    pub fn anchors(&self) -> usize {
        self.anchors
    }

    /// Returns the number of attributes per anchor.
    pub fn attributes(&self) -> usize {
        self.attributes
    }

    /// Returns the layout tag.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Returns the backing buffer.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Returns attribute `attr` of anchor `anchor`, or `None` when out of range.
    pub fn get(&self, anchor: usize, attr: usize) -> Option<f32> {
        if anchor >= self.anchors || attr >= self.attributes {
            return None;
        }
        self.data.get(self.index(anchor, attr)).copied()
    }

    /// Unchecked-by-contract read used by the decoder inner loop.
    ///
    /// Callers must keep `anchor < anchors` and `attr < attributes`; the slice
    /// index still panics rather than reading out of bounds.
    #[inline]
    pub(crate) fn value(&self, anchor: usize, attr: usize) -> f32 {
        self.data[self.index(anchor, attr)]
    }

    #[inline]
    fn index(&self, anchor: usize, attr: usize) -> usize {
        match self.layout {
            Layout::AnchorMajor => anchor * self.attributes + attr,
            Layout::AttributeMajor => attr * self.anchors + anchor,
        }
    }
}
