//! Box encodings and coordinate spaces.
//!
//! Boxes are held in corner form (`x1, y1, x2, y2`) once they leave the
//! decoder. `CenterBox` exists only for the raw decoder output, and the space a
//! box lives in is always declared through `CoordSpace` rather than guessed
//! from coordinate magnitudes.

mod iou;

pub use iou::iou;

/// Axis-aligned box in corner form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
}

impl BBox {
    /// Creates a box from corner coordinates.
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Creates a box from TF-style `[ymin, xmin, ymax, xmax]` coordinates.
    pub const fn from_yxyx(coords: [f32; 4]) -> Self {
        Self::new(coords[1], coords[0], coords[3], coords[2])
    }

    /// Returns `x2 - x1`, negative for inverted boxes.
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Returns `y2 - y1`, negative for inverted boxes.
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Signed area `width * height`.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// True when all four coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }

    /// Returns the corners as `[x1, y1, x2, y2]`.
    pub fn to_array(self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Axis-aligned box in center form, as emitted by detector heads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CenterBox {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl CenterBox {
    pub const fn new(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self { cx, cy, w, h }
    }

    /// Converts to corner form.
    pub fn to_corners(self) -> BBox {
        let half_w = self.w / 2.0;
        let half_h = self.h / 2.0;
        BBox::new(
            self.cx - half_w,
            self.cy - half_h,
            self.cx + half_w,
            self.cy + half_h,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.cx.is_finite() && self.cy.is_finite() && self.w.is_finite() && self.h.is_finite()
    }
}

impl From<CenterBox> for BBox {
    fn from(value: CenterBox) -> Self {
        value.to_corners()
    }
}

/// Coordinate space a set of boxes is expressed in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CoordSpace {
    /// Coordinates in `[0, 1]` relative to the model input.
    Normalized,
    /// Coordinates in model-input pixels.
    ModelPixels { width: f32, height: f32 },
}

impl CoordSpace {
    /// Returns the `(width, height)` extent of the space.
    pub fn extent(&self) -> (f32, f32) {
        match *self {
            CoordSpace::Normalized => (1.0, 1.0),
            CoordSpace::ModelPixels { width, height } => (width, height),
        }
    }
}

/// Size of the display surface boxes are mapped onto.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetSize {
    pub width: f32,
    pub height: f32,
}

impl TargetSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::{BBox, CenterBox, CoordSpace};

    #[test]
    fn center_box_converts_to_corners() {
        let bbox = CenterBox::new(320.0, 240.0, 100.0, 50.0).to_corners();
        assert_eq!(bbox, BBox::new(270.0, 215.0, 370.0, 265.0));
        assert_eq!(bbox.width(), 100.0);
        assert_eq!(bbox.height(), 50.0);
    }

    #[test]
    fn yxyx_order_is_swapped() {
        let bbox = BBox::from_yxyx([0.1, 0.2, 0.3, 0.4]);
        assert_eq!(bbox.to_array(), [0.2, 0.1, 0.4, 0.3]);
    }

    #[test]
    fn normalized_space_has_unit_extent() {
        assert_eq!(CoordSpace::Normalized.extent(), (1.0, 1.0));
        let px = CoordSpace::ModelPixels {
            width: 640.0,
            height: 480.0,
        };
        assert_eq!(px.extent(), (640.0, 480.0));
    }
}
