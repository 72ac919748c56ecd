mod utils;
mod detectors;
mod detection_processing;
pub mod data;
pub mod detection_runners;
pub mod common;

use std::sync::Arc;
use std::time::Instant;
use crate::common::{BoundingRect, Observation, Orientation};
use crate::data::{DetectionRequest, DetectorConfig, RawLayerOutput};
use crate::detection_runners::compute::ComputeDevice;

pub use crate::detectors::{
    default_device, detector_worker, initialize_decoder, recommended_decoder, shared_detector, spawn_detector, Detector,
};

/// Validates the configuration and builds a detector for `device`, or for the CPU
/// when no device is given.
pub fn init_detector(config: &DetectorConfig, device: Option<Arc<dyn ComputeDevice>>) -> anyhow::Result<Detector> {
    log::info!("Initializing detector\n{}", config.summary());
    Detector::new(config.clone(), device)
}

pub fn run_detection(detector: &Detector, request: &DetectionRequest) -> Vec<Observation> {
    let now = Instant::now();

    let observations = detector.detect(&request.layers, request.bounds, request.orientation);

    log::debug!("Processing time: {:?}", now.elapsed());
    observations
}

/// Turns the raw output layers of a YOLOv5 network into the final, numbered
/// detections in `bounds` coordinates.
///
/// Uses the process wide default compute device when one is available and the
/// backend recommended for it, the CPU decoder otherwise. The detector, and with
/// it the kernel pipelines, is built on the first call for a model input size and
/// reused afterwards. Layers that cannot be decoded are skipped; an unusable model
/// input size yields no detections.
pub fn detect(raw_layer_outputs: &[RawLayerOutput], model_input_width: u32, model_input_height: u32,
              bounds: BoundingRect, orientation: Orientation) -> Vec<Observation> {
    if raw_layer_outputs.is_empty() {
        return vec![];
    }

    match shared_detector(model_input_width, model_input_height) {
        Ok(detector) => detector.detect(raw_layer_outputs, bounds, orientation),
        Err(err) => {
            log::warn!("{err}");
            vec![]
        }
    }
}

/// Runs a detection on tokio's blocking pool.
pub async fn detect_async(detector: Arc<Detector>, request: DetectionRequest) -> anyhow::Result<Vec<Observation>> {
    let observations = tokio::task::spawn_blocking(move || run_detection(&detector, &request)).await?;
    Ok(observations)
}
