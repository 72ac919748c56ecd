use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;
use std::time::Instant;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use crate::common::{BoundingRect, DecoderType, Observation, Orientation};
use crate::data::{detection_channels, DetectionState, DetectorConfig, QueuedRequest, RawLayerOutput, SendState, TimeCalc, IOU_THRESHOLD, MAX_BOUNDING_BOXES};
use crate::detection_runners::compute::{ComputeDevice, FeatureTier, HostComputeDevice};
use crate::detection_runners::{enumerate_observations, non_max_suppression, CpuDecoder, DecodeProcess, HybridDecoder, ParallelDecoder};

/// The process wide compute device, created on first use.
pub fn default_device() -> Option<Arc<dyn ComputeDevice>> {
    static DEVICE: OnceLock<Option<Arc<dyn ComputeDevice>>> = OnceLock::new();
    DEVICE.get_or_init(HostComputeDevice::system_default).clone()
}

/// Detector on the default device for a model input size, built once per size.
pub fn shared_detector(model_width: u32, model_height: u32) -> Result<Arc<Detector>> {
    static DETECTORS: OnceLock<Mutex<HashMap<(u32, u32), Arc<Detector>>>> = OnceLock::new();

    let mut detectors = DETECTORS.get_or_init(Default::default).lock();
    if let Some(detector) = detectors.get(&(model_width, model_height)) {
        return Ok(Arc::clone(detector));
    }

    let config = DetectorConfig::new().with_model_size(model_width, model_height);
    let detector = Arc::new(Detector::new(config, default_device())?);
    detectors.insert((model_width, model_height), Arc::clone(&detector));
    Ok(detector)
}

/// Backend best suited to the given device.
pub fn recommended_decoder(device: Option<&dyn ComputeDevice>) -> DecoderType {
    match device {
        None => DecoderType::Cpu,
        Some(device) if device.supports_tier(FeatureTier::Tier2) => DecoderType::Parallel,
        Some(_) => DecoderType::Hybrid,
    }
}

/// Builds a decoder of the requested type, falling back to the CPU decoder when a
/// device backend is requested without a device.
pub fn initialize_decoder(decoder_type: DecoderType, device: Option<Arc<dyn ComputeDevice>>,
                          model_width: u32, model_height: u32) -> Box<dyn DecodeProcess> {
    match (decoder_type, device) {
        (DecoderType::Parallel, Some(device)) => Box::new(ParallelDecoder::new(device, model_width, model_height)),
        (DecoderType::Hybrid, Some(device)) => Box::new(HybridDecoder::new(device, model_width, model_height)),
        (DecoderType::Cpu, _) => Box::new(CpuDecoder::new(model_width, model_height)),
        (requested, None) => {
            log::warn!("{requested} decoder needs a compute device, falling back to CPU");
            Box::new(CpuDecoder::new(model_width, model_height))
        }
    }
}

pub struct Detector {
    config: DetectorConfig,
    decoder: Box<dyn DecodeProcess>,
    timings: Mutex<TimeCalc>,
}

impl Detector {
    pub fn new(config: DetectorConfig, device: Option<Arc<dyn ComputeDevice>>) -> Result<Self> {
        config.validate()?;

        let decoder_type = config.decoder.unwrap_or_else(|| recommended_decoder(device.as_deref()));
        let decoder = initialize_decoder(decoder_type, device, config.model_width, config.model_height);
        log::debug!("Initialized {} decoder for {}x{} model input",
            decoder.decoder_type(), config.model_width, config.model_height);

        Ok(Self { config, decoder, timings: Mutex::new(TimeCalc::default()) })
    }

    /// Backend actually in use, after any fallback.
    pub fn decoder_type(&self) -> DecoderType {
        self.decoder.decoder_type()
    }

    /// Decodes, suppresses overlaps and numbers the detections of one frame.
    pub fn detect(&self, layers: &[RawLayerOutput], bounds: BoundingRect, orientation: Orientation) -> Vec<Observation> {
        if !self.config.profile {
            return self.decoder.forward(layers, bounds, orientation);
        }

        let t_decode = Instant::now();
        let candidates = self.decoder.process(layers, bounds, orientation);
        let t_decode = t_decode.elapsed();

        let t_nms = Instant::now();
        let observations = enumerate_observations(non_max_suppression(&candidates, MAX_BOUNDING_BOXES, IOU_THRESHOLD));
        let t_nms = t_nms.elapsed();

        let mut timings = self.timings.lock();
        timings.add_or_push(0, t_decode);
        timings.add_or_push(1, t_nms);

        let len = 10usize;
        let n = 4usize;
        log::info!("[Profile] {:>len$.n$?} ({:>len$.n$?} avg) [decode: {:>len$.n$?} ({:>len$.n$?} avg) | nms: {:>len$.n$?} ({:>len$.n$?} avg)] {} candidates, {} kept",
            t_decode + t_nms,
            timings.avg(),
            t_decode,
            timings.avg_i(0).unwrap_or_default(),
            t_nms,
            timings.avg_i(1).unwrap_or_default(),
            candidates.len(),
            observations.len(),
        );
        observations
    }

    /// Average per stage timings recorded so far, `(decode, nms)`.
    pub fn average_timings(&self) -> Option<(std::time::Duration, std::time::Duration)> {
        let timings = self.timings.lock();
        Some((timings.avg_i(0)?, timings.avg_i(1)?))
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("config", &self.config)
            .field("decoder", &self.decoder.decoder_type())
            .finish()
    }
}

/// Serves requests until every [`SendState`] is dropped.
pub fn detector_worker(detection_state: DetectionState, detector: Arc<Detector>) -> Result<()> {
    loop {
        // MESSAGE LOOP STARTS HERE
        let queued = match detection_state.req_rx.recv() {
            Ok(msg) => msg,
            Err(_) => {
                log::debug!("Detection queue closed, stopping worker");
                return Ok(());
            }
        };

        let QueuedRequest { request, det_tx } = *queued;
        let observations = detector.detect(&request.layers, request.bounds, request.orientation);
        if det_tx.send(observations).is_err() {
            log::debug!("Detection caller went away before its reply");
        }
    }
}

/// Starts the background detection thread.
pub fn spawn_detector(detector: Arc<Detector>) -> Result<(SendState, JoinHandle<Result<()>>)> {
    let (send_state, detection_state) = detection_channels();
    let handle = std::thread::Builder::new()
        .name("detection-queue".to_string())
        .spawn(move || detector_worker(detection_state, detector))
        .context("Failed to spawn detection thread")?;
    Ok((send_state, handle))
}
