//! Python bindings for the detpipe post-processing pipeline.
//!
//! This module exposes `PipelineConfig`, `Pipeline` and `Detection` to Python
//! via PyO3; tensors are passed in as `float32` numpy arrays.

use numpy::{PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArrayDyn, PyUntypedArrayMethods};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use detpipe::{
    BoxOrder, ClassLabels, CoordSpace, DecodedOutput, DetError, Detection as RustDetection, Layout,
    Pipeline as RustPipeline, PipelineConfig as RustPipelineConfig, ScoreCombination,
    SuppressionMode, TargetSize,
};

/// Convert a DetError to a Python exception.
fn to_py_err(err: DetError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn parse_layout(value: &str) -> PyResult<Layout> {
    match value.to_lowercase().as_str() {
        "attribute_major" => Ok(Layout::AttributeMajor),
        "anchor_major" => Ok(Layout::AnchorMajor),
        _ => Err(PyValueError::new_err(
            "layout must be 'attribute_major' or 'anchor_major'",
        )),
    }
}

fn parse_score_combination(value: &str) -> PyResult<ScoreCombination> {
    match value.to_lowercase().as_str() {
        "direct" => Ok(ScoreCombination::Direct),
        "objectness_weighted" => Ok(ScoreCombination::ObjectnessWeighted),
        _ => Err(PyValueError::new_err(
            "score_combination must be 'direct' or 'objectness_weighted'",
        )),
    }
}

fn parse_suppression(value: &str) -> PyResult<SuppressionMode> {
    match value.to_lowercase().as_str() {
        "class_agnostic" => Ok(SuppressionMode::ClassAgnostic),
        "per_class" => Ok(SuppressionMode::PerClass),
        _ => Err(PyValueError::new_err(
            "suppression must be 'class_agnostic' or 'per_class'",
        )),
    }
}

/// Detection in target pixel space.
#[pyclass]
#[derive(Clone)]
pub struct Detection {
    #[pyo3(get)]
    pub x1: f32,
    #[pyo3(get)]
    pub y1: f32,
    #[pyo3(get)]
    pub x2: f32,
    #[pyo3(get)]
    pub y2: f32,
    /// Confidence score.
    #[pyo3(get)]
    pub score: f32,
    #[pyo3(get)]
    pub class_id: usize,
    /// Class name, or "class {id}" when the label table has no entry.
    #[pyo3(get)]
    pub label: String,
}

impl Detection {
    fn new(det: &RustDetection, pipeline: &RustPipeline) -> Self {
        Self {
            x1: det.bbox.x1,
            y1: det.bbox.y1,
            x2: det.bbox.x2,
            y2: det.bbox.y2,
            score: det.score,
            class_id: det.class_id,
            label: pipeline.label(det).into_owned(),
        }
    }
}

#[pymethods]
impl Detection {
    fn __repr__(&self) -> String {
        format!(
            "Detection(label='{}', score={:.4}, box=({:.1}, {:.1}, {:.1}, {:.1}))",
            self.label, self.score, self.x1, self.y1, self.x2, self.y2
        )
    }
}

/// Configuration for the post-processing pipeline.
#[pyclass]
#[derive(Clone)]
pub struct PipelineConfig {
    inner: RustPipelineConfig,
}

#[pymethods]
impl PipelineConfig {
    /// Create a new PipelineConfig.
    ///
    /// Args:
    ///     score_threshold: Minimum confidence kept, inclusive (default: 0.25)
    ///     iou_threshold: IoU above which boxes are suppressed (default: 0.45)
    ///     num_classes: Number of detector classes (default: 80)
    ///     layout: "attribute_major" or "anchor_major" (default: "attribute_major")
    ///     score_combination: "direct" or "objectness_weighted" (default: "direct")
    ///     model_width: Model input width in pixels (default: 640)
    ///     model_height: Model input height in pixels (default: 640)
    ///     target_width: Display width; None keeps model pixels
    ///     target_height: Display height; None keeps model pixels
    ///     suppression: "class_agnostic" or "per_class" (default: "class_agnostic")
    ///     max_detections: Cap on kept detections (default: None)
    #[new]
    #[pyo3(signature = (
        score_threshold = 0.25,
        iou_threshold = 0.45,
        num_classes = 80,
        layout = "attribute_major",
        score_combination = "direct",
        model_width = 640.0,
        model_height = 640.0,
        target_width = None,
        target_height = None,
        suppression = "class_agnostic",
        max_detections = None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        score_threshold: f32,
        iou_threshold: f32,
        num_classes: usize,
        layout: &str,
        score_combination: &str,
        model_width: f32,
        model_height: f32,
        target_width: Option<f32>,
        target_height: Option<f32>,
        suppression: &str,
        max_detections: Option<usize>,
    ) -> PyResult<Self> {
        let target = match (target_width, target_height) {
            (Some(width), Some(height)) => Some(TargetSize::new(width, height)),
            (None, None) => None,
            _ => {
                return Err(PyValueError::new_err(
                    "target_width and target_height must be given together",
                ))
            }
        };
        let inner = RustPipelineConfig {
            score_threshold,
            iou_threshold,
            num_classes,
            layout: parse_layout(layout)?,
            score_combination: parse_score_combination(score_combination)?,
            model_width,
            model_height,
            target,
            suppression: parse_suppression(suppression)?,
            max_detections,
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Validate the configuration.
    fn validate(&self) -> PyResult<()> {
        self.inner.validate().map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "PipelineConfig(score_threshold={}, iou_threshold={}, num_classes={}, layout={:?}, score_combination={:?})",
            self.inner.score_threshold,
            self.inner.iou_threshold,
            self.inner.num_classes,
            self.inner.layout,
            self.inner.score_combination
        )
    }
}

/// Stateless detection post-processor.
#[pyclass]
pub struct Pipeline {
    inner: RustPipeline,
}

#[pymethods]
impl Pipeline {
    /// Create a pipeline.
    ///
    /// Args:
    ///     config: PipelineConfig (default: PipelineConfig())
    ///     labels: Class names in id order (default: COCO-80)
    #[new]
    #[pyo3(signature = (config = None, labels = None))]
    fn new(config: Option<PipelineConfig>, labels: Option<Vec<String>>) -> PyResult<Self> {
        let cfg = config.map(|c| c.inner).unwrap_or_default();
        let mut inner = RustPipeline::new(cfg).map_err(to_py_err)?;
        if let Some(labels) = labels {
            inner = inner.with_labels(ClassLabels::new(labels));
        }
        Ok(Self { inner })
    }

    /// Decode, filter, suppress and map a raw detector output.
    ///
    /// Args:
    ///     tensor: float32 array, either flat or shaped [a, b] / [1, a, b]
    ///
    /// Returns:
    ///     List of Detection objects, best score first
    fn process(&self, tensor: PyReadonlyArrayDyn<'_, f32>) -> PyResult<Vec<Detection>> {
        let dims = tensor.shape().to_vec();
        let data = tensor.as_slice()?;
        let raw = if dims.len() == 1 {
            let attributes = self.inner.config().expected_attributes();
            self.inner.view(data, data.len() / attributes)
        } else {
            self.inner.view_tensor(data, &dims)
        }
        .map_err(to_py_err)?;

        let detections = self.inner.process(&raw).map_err(to_py_err)?;
        Ok(detections
            .iter()
            .map(|det| Detection::new(det, &self.inner))
            .collect())
    }

    /// Filter, suppress and map already-decoded detector output.
    ///
    /// Args:
    ///     boxes: float32 array of shape [N, 4]
    ///     scores: float32 array of shape [N]
    ///     class_ids: int64 array of shape [N]
    ///     valid_count: Number of leading entries to use (default: N)
    ///     box_order: "xyxy" or "yxyx" (default: "xyxy")
    ///     normalized: Boxes are in [0, 1] rather than model pixels (default: True)
    #[pyo3(signature = (boxes, scores, class_ids, valid_count = None, box_order = "xyxy", normalized = true))]
    fn process_decoded(
        &self,
        boxes: PyReadonlyArray2<'_, f32>,
        scores: PyReadonlyArray1<'_, f32>,
        class_ids: PyReadonlyArray1<'_, i64>,
        valid_count: Option<usize>,
        box_order: &str,
        normalized: bool,
    ) -> PyResult<Vec<Detection>> {
        let shape = boxes.shape();
        if shape[1] != 4 {
            return Err(PyValueError::new_err("boxes must have shape [N, 4]"));
        }
        let box_rows: Vec<[f32; 4]> = boxes
            .as_slice()?
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        // Negative ids map out of range and are dropped by the decoder.
        let ids: Vec<usize> = class_ids
            .as_slice()?
            .iter()
            .map(|&id| usize::try_from(id).unwrap_or(usize::MAX))
            .collect();
        let order = match box_order.to_lowercase().as_str() {
            "xyxy" => BoxOrder::Xyxy,
            "yxyx" => BoxOrder::Yxyx,
            _ => return Err(PyValueError::new_err("box_order must be 'xyxy' or 'yxyx'")),
        };
        let space = if normalized {
            CoordSpace::Normalized
        } else {
            self.inner.config().model_space()
        };

        let count = valid_count.unwrap_or(box_rows.len());
        let decoded = DecodedOutput::new(&box_rows, scores.as_slice()?, &ids, count)
            .map_err(to_py_err)?
            .with_box_order(order)
            .with_space(space);
        Ok(self
            .inner
            .process_decoded(&decoded)
            .iter()
            .map(|det| Detection::new(det, &self.inner))
            .collect())
    }

    /// Look up the label for a class id.
    fn label(&self, class_id: usize) -> String {
        self.inner.labels().name(class_id).into_owned()
    }

    fn __repr__(&self) -> String {
        let cfg = self.inner.config();
        format!(
            "Pipeline(num_classes={}, score_threshold={}, iou_threshold={})",
            cfg.num_classes, cfg.score_threshold, cfg.iou_threshold
        )
    }
}

/// Python module for detpipe.
#[pymodule]
fn _detpipe(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Detection>()?;
    m.add_class::<PipelineConfig>()?;
    m.add_class::<Pipeline>()?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
