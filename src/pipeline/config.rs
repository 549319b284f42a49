//! Pipeline configuration and validation.

use crate::bbox::{CoordSpace, TargetSize};
use crate::candidate::nms::SuppressionMode;
use crate::decode::{DecodeParams, Layout, ScoreCombination};
use crate::util::{DetError, DetResult};

/// Configuration for a detection post-processing pipeline.
///
/// Values describe one model deployment and are validated once by
/// `Pipeline::new`; nothing here is re-read per frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Minimum confidence kept by the filter (inclusive), in `[0, 1]`.
    pub score_threshold: f32,
    /// IoU above which the suppressor removes a box, in `[0, 1]`.
    pub iou_threshold: f32,
    /// Number of classes scored by the detector.
    pub num_classes: usize,
    /// Layout used when building raw views through the pipeline.
    pub layout: Layout,
    /// How class scores combine into a confidence.
    pub score_combination: ScoreCombination,
    /// Model input width in pixels.
    pub model_width: f32,
    /// Model input height in pixels.
    pub model_height: f32,
    /// Display surface; `None` keeps boxes in model pixels.
    pub target: Option<TargetSize>,
    /// Suppression grouping.
    pub suppression: SuppressionMode,
    /// Cap on detections kept after suppression.
    pub max_detections: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.25,
            iou_threshold: 0.45,
            num_classes: 80,
            layout: Layout::AttributeMajor,
            score_combination: ScoreCombination::Direct,
            model_width: 640.0,
            model_height: 640.0,
            target: None,
            suppression: SuppressionMode::ClassAgnostic,
            max_detections: None,
        }
    }
}

impl PipelineConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> DetResult<()> {
        check_unit("score_threshold", self.score_threshold)?;
        check_unit("iou_threshold", self.iou_threshold)?;
        if self.num_classes == 0 {
            return Err(DetError::InvalidConfig {
                field: "num_classes",
                reason: "must be at least 1",
            });
        }
        check_extent("model_width", self.model_width)?;
        check_extent("model_height", self.model_height)?;
        if let Some(target) = self.target {
            check_extent("target.width", target.width)?;
            check_extent("target.height", target.height)?;
        }
        Ok(())
    }

    /// Decoder parameters derived from this configuration.
    pub fn decode_params(&self) -> DecodeParams {
        DecodeParams {
            num_classes: self.num_classes,
            score_combination: self.score_combination,
        }
    }

    /// Attribute count a raw output must have for this configuration.
    pub fn expected_attributes(&self) -> usize {
        self.decode_params().expected_attributes()
    }

    /// Model-pixel coordinate space of decoded boxes.
    pub fn model_space(&self) -> CoordSpace {
        CoordSpace::ModelPixels {
            width: self.model_width,
            height: self.model_height,
        }
    }

    /// Display surface boxes are mapped onto, defaulting to the model input.
    pub fn target_or_model(&self) -> TargetSize {
        self.target
            .unwrap_or(TargetSize::new(self.model_width, self.model_height))
    }
}

fn check_unit(field: &'static str, value: f32) -> DetResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DetError::InvalidConfig {
            field,
            reason: "must be within [0, 1]",
        });
    }
    Ok(())
}

fn check_extent(field: &'static str, value: f32) -> DetResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DetError::InvalidConfig {
            field,
            reason: "must be finite and positive",
        });
    }
    Ok(())
}
