//! End-to-end post-processing: decode, filter, suppress, map.
//!
//! A `Pipeline` holds only validated configuration and a label table. Every
//! call works on frame-local buffers, so one pipeline can serve many threads
//! and repeated calls on the same input return identical results.

mod config;

pub use config::PipelineConfig;

use std::borrow::Cow;

use crate::bbox::CoordSpace;
use crate::candidate::filter::filter_by_score;
use crate::candidate::nms::nms;
use crate::decode::{decode, DecodedOutput, RawOutput};
use crate::detection::{Candidate, Detection};
use crate::labels::ClassLabels;
use crate::mapping::map_to_target;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::DetResult;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Detections for one frame, plus the error that emptied them, if any.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameDetections {
    pub detections: Vec<Detection>,
    pub error: Option<crate::util::DetError>,
}

impl FrameDetections {
    /// True when the frame decoded without a shape error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Stateless detection post-processor.
#[derive(Clone, Debug)]
pub struct Pipeline {
    cfg: PipelineConfig,
    labels: ClassLabels,
}

impl Pipeline {
    /// Creates a pipeline after validating `cfg`. Labels default to COCO.
    pub fn new(cfg: PipelineConfig) -> DetResult<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            labels: ClassLabels::default(),
        })
    }

    /// Replaces the class-name table.
    pub fn with_labels(mut self, labels: ClassLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Validated configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Class-name table used by `label`.
    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    /// Returns the display name for a detection's class.
    pub fn label(&self, detection: &Detection) -> Cow<'_, str> {
        self.labels.name(detection.class_id)
    }

    /// Builds a raw view over `data` using the configured layout and the
    /// attribute count implied by the class count and score combination.
    pub fn view<'a>(&self, data: &'a [f32], anchors: usize) -> DetResult<RawOutput<'a>> {
        RawOutput::new(data, anchors, self.cfg.expected_attributes(), self.cfg.layout)
    }

    /// Builds a raw view from detector tensor dims using the configured layout.
    pub fn view_tensor<'a>(&self, data: &'a [f32], dims: &[usize]) -> DetResult<RawOutput<'a>> {
        RawOutput::from_tensor_shape(data, dims, self.cfg.layout)
    }

    /// Decodes the configured score rule over `raw` and runs the remaining
    /// stages.
    ///
    /// Shape errors are returned as-is; an empty vector is a normal outcome.
    pub fn process(&self, raw: &RawOutput<'_>) -> DetResult<Vec<Detection>> {
        let _span = trace_span!("process", anchors = raw.anchors()).entered();

        let candidates = decode(raw, &self.cfg.decode_params())?;
        let passed = filter_by_score(&candidates, self.cfg.score_threshold);
        trace_event!("filtered", kept = passed.len(), total = candidates.len());

        let detections: Vec<Detection> = passed.into_iter().map(Candidate::into_detection).collect();
        Ok(self.suppress_and_map(&detections, self.cfg.model_space()))
    }

    /// Runs already-decoded detector output through filter, suppression and
    /// mapping.
    pub fn process_decoded(&self, decoded: &DecodedOutput<'_>) -> Vec<Detection> {
        let _span = trace_span!("process_decoded", valid = decoded.valid_count()).entered();

        let detections = decoded.to_detections(self.cfg.num_classes);
        let passed = filter_by_score(&detections, self.cfg.score_threshold);
        trace_event!("filtered", kept = passed.len(), total = detections.len());

        self.suppress_and_map(&passed, decoded.space())
    }

    /// Like `process`, but folds a shape error into an empty frame result so
    /// a frame loop can move on to the next output.
    pub fn process_frame(&self, raw: &RawOutput<'_>) -> FrameDetections {
        self.frame_result(self.process(raw))
    }

    /// Shapes `data` with tensor `dims` and processes it, folding any shape
    /// error (including a buffer that does not match `dims`) into the result.
    pub fn process_tensor(&self, data: &[f32], dims: &[usize]) -> FrameDetections {
        let result = self
            .view_tensor(data, dims)
            .and_then(|raw| self.process(&raw));
        self.frame_result(result)
    }

    /// Processes frames one after another, in input order.
    pub fn process_batch(&self, frames: &[RawOutput<'_>]) -> Vec<FrameDetections> {
        let _span = trace_span!("process_batch", frames = frames.len(), parallel = false).entered();
        frames.iter().map(|raw| self.process_frame(raw)).collect()
    }

    /// Processes frames in parallel; the result equals `process_batch`.
    #[cfg(feature = "rayon")]
    pub fn process_batch_par(&self, frames: &[RawOutput<'_>]) -> Vec<FrameDetections> {
        let _span = trace_span!("process_batch", frames = frames.len(), parallel = true).entered();
        frames
            .par_iter()
            .map(|raw| self.process_frame(raw))
            .collect()
    }

    fn frame_result(&self, result: DetResult<Vec<Detection>>) -> FrameDetections {
        match result {
            Ok(detections) => FrameDetections {
                detections,
                error: None,
            },
            Err(err) => {
                let message = err.to_string();
                trace_warn!("frame_error", error = message.as_str());
                FrameDetections {
                    detections: Vec::new(),
                    error: Some(err),
                }
            }
        }
    }

    fn suppress_and_map(&self, detections: &[Detection], source: CoordSpace) -> Vec<Detection> {
        let mut kept = nms(detections, self.cfg.iou_threshold, self.cfg.suppression);
        if let Some(max) = self.cfg.max_detections {
            kept.truncate(max);
        }
        map_to_target(&kept, source, self.cfg.target_or_model())
    }
}
