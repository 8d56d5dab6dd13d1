// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use crate::download::DEFAULT_POSE_MODEL;
use crate::labeling::DEFAULT_POSITIVE_EVENT;
use clap::{Args, Parser, Subcommand};

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Extract Options:
    --annotations, -a <FILE>  Temporal annotation file (6 fields per line)
    --videos, -i <DIR>        Directory of input videos [default: dataset]
    --output, -o <DIR>        Output directory for CSV tables [default: csv]
    --model, -m <MODEL>       Path to ONNX pose model [default: yolo11n-pose.onnx]
    --event <EVENT>           Positive event label [default: Fighting]
    --conf <CONF>             Confidence threshold [default: 0.25]
    --iou <IOU>               IoU threshold for NMS [default: 0.45]
    --imgsz <IMGSZ>           Inference image size
    --threads <N>             ONNX Runtime intra-op threads (0 = auto)
    --verbose                 Show verbose output

Examples:
    pose-extract extract --annotations annotations/temporal_annotation.txt
    pose-extract extract -a ann.txt -i dataset -o csv --conf 0.5
    pose-extract extract -a ann.txt -m custom-pose.onnx --event Assault"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract per-frame pose keypoint tables from an annotated video corpus
    Extract(ExtractArgs),
}

/// Arguments for the extract command.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Temporal annotation file
    #[arg(short, long)]
    pub annotations: String,

    /// Directory containing the input videos
    #[arg(short = 'i', long, default_value = "dataset")]
    pub videos: String,

    /// Output directory for the CSV tables
    #[arg(short, long, default_value = "csv")]
    pub output: String,

    /// Path to ONNX pose model file
    #[arg(short, long, default_value = DEFAULT_POSE_MODEL)]
    pub model: String,

    /// Positive event label (frames inside its intervals get label 1)
    #[arg(long, default_value = DEFAULT_POSITIVE_EVENT)]
    pub event: String,

    /// Confidence threshold
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    /// `IoU` threshold for NMS
    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,

    /// Inference image size
    #[arg(long)]
    pub imgsz: Option<usize>,

    /// ONNX Runtime intra-op threads (0 = auto)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}
