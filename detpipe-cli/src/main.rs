use clap::Parser;
use detpipe::{
    ClassLabels, Detection, Layout, Pipeline, PipelineConfig, ScoreCombination, SuppressionMode,
    TargetSize,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "detpipe CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for each pipeline stage.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LayoutConfig {
    AttributeMajor,
    AnchorMajor,
}

impl From<LayoutConfig> for Layout {
    fn from(value: LayoutConfig) -> Self {
        match value {
            LayoutConfig::AttributeMajor => Layout::AttributeMajor,
            LayoutConfig::AnchorMajor => Layout::AnchorMajor,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ScoreCombinationConfig {
    Direct,
    ObjectnessWeighted,
}

impl From<ScoreCombinationConfig> for ScoreCombination {
    fn from(value: ScoreCombinationConfig) -> Self {
        match value {
            ScoreCombinationConfig::Direct => ScoreCombination::Direct,
            ScoreCombinationConfig::ObjectnessWeighted => ScoreCombination::ObjectnessWeighted,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SuppressionConfig {
    ClassAgnostic,
    PerClass,
}

impl From<SuppressionConfig> for SuppressionMode {
    fn from(value: SuppressionConfig) -> Self {
        match value {
            SuppressionConfig::ClassAgnostic => SuppressionMode::ClassAgnostic,
            SuppressionConfig::PerClass => SuppressionMode::PerClass,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PipelineConfigJson {
    score_threshold: f32,
    iou_threshold: f32,
    num_classes: usize,
    layout: LayoutConfig,
    score_combination: ScoreCombinationConfig,
    model_width: f32,
    model_height: f32,
    target_width: Option<f32>,
    target_height: Option<f32>,
    suppression: SuppressionConfig,
    max_detections: Option<usize>,
}

impl Default for PipelineConfigJson {
    fn default() -> Self {
        let cfg = PipelineConfig::default();
        Self {
            score_threshold: cfg.score_threshold,
            iou_threshold: cfg.iou_threshold,
            num_classes: cfg.num_classes,
            layout: LayoutConfig::AttributeMajor,
            score_combination: ScoreCombinationConfig::Direct,
            model_width: cfg.model_width,
            model_height: cfg.model_height,
            target_width: None,
            target_height: None,
            suppression: SuppressionConfig::ClassAgnostic,
            max_detections: cfg.max_detections,
        }
    }
}

impl PipelineConfigJson {
    fn into_config(self) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
        let target = match (self.target_width, self.target_height) {
            (Some(width), Some(height)) => Some(TargetSize::new(width, height)),
            (None, None) => None,
            _ => return Err("target_width and target_height must be set together".into()),
        };
        Ok(PipelineConfig {
            score_threshold: self.score_threshold,
            iou_threshold: self.iou_threshold,
            num_classes: self.num_classes,
            layout: self.layout.into(),
            score_combination: self.score_combination.into(),
            model_width: self.model_width,
            model_height: self.model_height,
            target,
            suppression: self.suppression.into(),
            max_detections: self.max_detections,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    tensor_path: String,
    tensor_dims: Option<Vec<usize>>,
    output_path: Option<String>,
    labels_path: Option<String>,
    pipeline: PipelineConfigJson,
}

#[derive(Debug, Deserialize)]
struct TensorJson {
    dims: Vec<usize>,
    data: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
    class_id: usize,
    label: String,
}

impl DetectionRecord {
    fn new(det: &Detection, pipeline: &Pipeline) -> Self {
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

#[derive(Debug, Serialize)]
struct Output {
    count: usize,
    detections: Vec<DetectionRecord>,
}

/// Loads a tensor either from a JSON `{dims, data}` file or raw `f32` bytes.
fn load_tensor(
    path: &Path,
    dims_override: Option<Vec<usize>>,
) -> Result<(Vec<usize>, Vec<f32>), Box<dyn std::error::Error>> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let tensor: TensorJson = serde_json::from_str(&fs::read_to_string(path)?)?;
        return Ok((dims_override.unwrap_or(tensor.dims), tensor.data));
    }

    let dims = dims_override.ok_or("tensor_dims must be set for raw f32 tensor files")?;
    let bytes = fs::read(path)?;
    if bytes.len() % 4 != 0 {
        return Err(format!("raw tensor has {} bytes, not a multiple of 4", bytes.len()).into());
    }
    let data = bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    Ok((dims, data))
}

fn load_labels(path: &str) -> Result<ClassLabels, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    Ok(ClassLabels::new(
        text.lines().map(str::trim).filter(|line| !line.is_empty()),
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("detpipe=debug".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.tensor_path.is_empty() {
        return Err("tensor_path must be set in the config".into());
    }

    let mut pipeline = Pipeline::new(config.pipeline.into_config()?)?;
    if let Some(path) = config.labels_path.as_deref() {
        pipeline = pipeline.with_labels(load_labels(path)?);
    }

    let (dims, data) = load_tensor(Path::new(&config.tensor_path), config.tensor_dims)?;
    let raw = pipeline.view_tensor(&data, &dims)?;
    let detections = pipeline.process(&raw)?;
    tracing::info!(
        anchors = raw.anchors(),
        detections = detections.len(),
        "processed tensor"
    );

    let records: Vec<DetectionRecord> = detections
        .iter()
        .map(|det| DetectionRecord::new(det, &pipeline))
        .collect();
    let output = Output {
        count: records.len(),
        detections: records,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
