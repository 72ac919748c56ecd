use std::time::Instant;
use crate::common::{BoundingRect, DecoderType, Observation, Orientation};
use crate::data::{RawLayerOutput, IOU_THRESHOLD, MAX_BOUNDING_BOXES};
use crate::detection_runners::assembler::enumerate_observations;
use crate::detection_runners::nms::non_max_suppression;
use crate::utils;

/// Shared contract of the decode backends.
pub trait DecodeProcess: Send + Sync {
    fn decoder_type(&self) -> DecoderType;

    /// Model input `(width, height)` the decoder was built for.
    fn model_size(&self) -> (u32, u32);

    /// Decodes every layer into unfiltered candidate observations.
    ///
    /// Layers that cannot be decoded are skipped; this never fails.
    fn process(&self, layers: &[RawLayerOutput], bounds: BoundingRect, orientation: Orientation) -> Vec<Observation>;

    /// Executes the full pipeline: decode, suppress overlaps, number the survivors.
    fn run(&self, layers: &[RawLayerOutput], bounds: BoundingRect, orientation: Orientation) -> Vec<Observation> {
        let candidates = self.process(layers, bounds, orientation);
        let filtered = non_max_suppression(&candidates, MAX_BOUNDING_BOXES, IOU_THRESHOLD);
        enumerate_observations(filtered)
    }

    /// Same as [`DecodeProcess::run`], tracing the time spent in every stage.
    fn forward(&self, layers: &[RawLayerOutput], bounds: BoundingRect, orientation: Orientation) -> Vec<Observation> {
        let detect_time = Instant::now();
        let mut detect_elapsed = detect_time.elapsed();

        let candidates = self.process(layers, bounds, orientation);
        detect_elapsed = utils::trace("TIME", "Decode", detect_time, detect_elapsed);

        let filtered = non_max_suppression(&candidates, MAX_BOUNDING_BOXES, IOU_THRESHOLD);
        detect_elapsed = utils::trace("TIME", "NMS", detect_time, detect_elapsed);

        log::debug!(
            "{} decoder: {} candidates, {} kept",
            self.decoder_type(), candidates.len(), filtered.len()
        );
        enumerate_observations(filtered)
    }
}
