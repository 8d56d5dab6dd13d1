// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use crate::cli::args::ExtractArgs;
#[cfg(feature = "video")]
use crate::corpus::{CorpusConfig, run_corpus};
#[cfg(feature = "video")]
use crate::detector::{DetectorConfig, YoloPose};
#[cfg(feature = "video")]
use crate::download::ensure_model;
use crate::warn;
#[cfg(feature = "video")]
use crate::{VERSION, error, success, verbose};

/// Run the corpus extraction command.
#[cfg(feature = "video")]
pub fn run_extraction(args: &ExtractArgs) {
    crate::cli::logging::set_verbose(args.verbose);

    let model_path = match ensure_model(&args.model) {
        Ok(path) => path,
        Err(e) => {
            error!("Error resolving model: {e}");
            process::exit(1);
        }
    };

    let mut config = DetectorConfig::new()
        .with_confidence(args.conf)
        .with_iou(args.iou)
        .with_threads(args.threads);
    if let Some(sz) = args.imgsz {
        config = config.with_imgsz(sz, sz);
    }

    let mut detector = match YoloPose::load_with_config(&model_path, config) {
        Ok(detector) => detector,
        Err(e) => {
            error!("Error loading model: {e}");
            process::exit(1);
        }
    };

    let imgsz = detector.imgsz();
    verbose!("pose-extract {VERSION} 🚀 {} imgsz=({}, {})", model_path.display(), imgsz.0, imgsz.1);
    verbose!("");

    let corpus = CorpusConfig::new(&args.annotations, &args.videos, &args.output)
        .with_positive_event(args.event.clone());

    match run_corpus(&corpus, &mut detector) {
        Ok(summary) => {
            if summary.skipped > 0 {
                warn!("{} video(s) could not be opened and were skipped", summary.skipped);
            }
            success!(
                "Processed {} video(s) into {}",
                summary.processed,
                args.output
            );
        }
        Err(e) => {
            error!("Extraction failed: {e}");
            process::exit(1);
        }
    }
}

/// Run the corpus extraction command.
#[cfg(not(feature = "video"))]
pub fn run_extraction(args: &ExtractArgs) {
    crate::cli::logging::set_verbose(args.verbose);

    warn!(
        "Video decoding requires the 'video' feature. Compile with --features video to enable extraction."
    );
    process::exit(1);
}
