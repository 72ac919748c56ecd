use crate::common::{BoundingRect, DecoderType, Observation, Orientation};
use crate::data::RawLayerOutput;
use crate::detection_processing::{decode_cell, resolve_layer};
use crate::detection_runners::decode_process::DecodeProcess;
use crate::detection_runners::frame_decoder::{FrameDecoder, ScaleFactors};

/// Single threaded decoder, used when no compute device is available.
#[derive(Debug, Clone)]
pub struct CpuDecoder {
    model_width: u32,
    model_height: u32,
}

impl CpuDecoder {
    pub fn new(model_width: u32, model_height: u32) -> Self {
        Self { model_width, model_height }
    }

    fn decode_layer(&self, layer: &RawLayerOutput, index: usize,
                    frame_decoder: &FrameDecoder, scale: ScaleFactors) -> Vec<Observation> {
        let Some((geometry, anchors)) = resolve_layer(layer, index, self.model_width, self.model_height) else {
            return vec![];
        };
        let data = layer.as_slice();

        let mut observations = Vec::new();
        for bx in 0..geometry.boxes {
            for row in 0..geometry.rows {
                for col in 0..geometry.cols {
                    if let Some(observation) = decode_cell(data, &geometry, anchors[bx], bx, row, col, frame_decoder, scale) {
                        observations.push(observation);
                    }
                }
            }
        }
        observations
    }
}

impl DecodeProcess for CpuDecoder {
    fn decoder_type(&self) -> DecoderType {
        DecoderType::Cpu
    }

    fn model_size(&self) -> (u32, u32) {
        (self.model_width, self.model_height)
    }

    fn process(&self, layers: &[RawLayerOutput], bounds: BoundingRect, orientation: Orientation) -> Vec<Observation> {
        let frame_decoder = FrameDecoder::for_orientation(orientation, bounds);
        let scale = ScaleFactors::for_bounds(&bounds, self.model_width, self.model_height);

        layers
            .iter()
            .enumerate()
            .flat_map(|(index, layer)| self.decode_layer(layer, index, &frame_decoder, scale))
            .collect()
    }
}
