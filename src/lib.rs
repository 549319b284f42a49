//! detpipe turns raw object-detector output tensors into clean detections.
//!
//! The pipeline decodes a flat tensor into scored candidates, drops those
//! below a confidence threshold, removes overlapping duplicates with greedy
//! IoU non-maximum suppression and maps the survivors onto a display surface.
//! Every stage is a pure function over frame-local data; batch processing can
//! run in parallel via the `rayon` feature.

pub mod bbox;
mod candidate;
pub mod decode;
pub mod detection;
pub mod labels;
pub mod lowlevel;
mod mapping;
pub mod pipeline;
mod trace;
pub mod util;

pub use bbox::{iou, BBox, CenterBox, CoordSpace, TargetSize};
pub use candidate::nms::SuppressionMode;
pub use decode::{BoxOrder, DecodedOutput, Layout, RawOutput, ScoreCombination};
pub use detection::{Candidate, Detection, Scored};
pub use labels::{ClassLabels, COCO_CLASSES};
pub use pipeline::{FrameDetections, Pipeline, PipelineConfig};
pub use util::{DetError, DetResult};
