//! Candidate selection and pruning.
//!
//! Includes the confidence filter, score ordering and IoU-based non-maximum
//! suppression shared by every detection source.

pub(crate) mod filter;
pub(crate) mod nms;
pub(crate) mod order;
