//! Individual pipeline stages for custom post-processing chains.
//!
//! Most users should prefer `Pipeline`, which composes these in order and
//! validates its configuration once.

pub use crate::candidate::filter::filter_by_score;
pub use crate::candidate::nms::{nms, nms_indices, SuppressionMode};
pub use crate::decode::{decode, DecodeParams};
pub use crate::mapping::map_to_target;
