use std::sync::Arc;
use crate::common::{BoundingRect, DecoderType, Observation, Orientation};
use crate::data::{LayerGeometry, RawLayerOutput};
use crate::detection_processing::{class_items, passes_objectness};
use crate::detection_runners::compute::{dispatch_layers, ComputeDevice, ComputePipeline, KernelOutput, HYBRID_DECODE_KERNEL};
use crate::detection_runners::decode_process::DecodeProcess;
use crate::detection_runners::frame_decoder::{FrameDecoder, RawBox, ScaleFactors};

/// Decoder for devices without atomic result append: the device activates the
/// tensor in place, thresholding and grouping run on the host after readback.
#[derive(Debug)]
pub struct HybridDecoder {
    model_width: u32,
    model_height: u32,
    device: Arc<dyn ComputeDevice>,
    pipeline: Option<ComputePipeline>,
}

impl HybridDecoder {
    pub fn new(device: Arc<dyn ComputeDevice>, model_width: u32, model_height: u32) -> Self {
        let pipeline = match device.make_pipeline(HYBRID_DECODE_KERNEL) {
            Ok(pipeline) => Some(pipeline),
            Err(err) => {
                log::warn!("{err}, hybrid decoder will report no detections");
                None
            }
        };
        Self { model_width, model_height, device, pipeline }
    }
}

fn collect_activated(data: &[f32], geometry: &LayerGeometry,
                     frame_decoder: &FrameDecoder, scale: ScaleFactors) -> Vec<Observation> {
    let mut observations = Vec::new();
    for bx in 0..geometry.boxes {
        for row in 0..geometry.rows {
            for col in 0..geometry.cols {
                let base = geometry.base_index(bx, row, col);
                let objectness = data[base + 4];
                if !passes_objectness(objectness) {
                    continue;
                }
                let objects = class_items(objectness, data[base + 5..base + 5 + geometry.class_count].iter().copied());
                if objects.is_empty() {
                    continue;
                }
                let raw = RawBox::new(data[base], data[base + 1], data[base + 2], data[base + 3]);
                observations.push(Observation::new(frame_decoder.decode(&raw, scale), objectness, objects));
            }
        }
    }
    observations
}

impl DecodeProcess for HybridDecoder {
    fn decoder_type(&self) -> DecoderType {
        DecoderType::Hybrid
    }

    fn model_size(&self) -> (u32, u32) {
        (self.model_width, self.model_height)
    }

    fn process(&self, layers: &[RawLayerOutput], bounds: BoundingRect, orientation: Orientation) -> Vec<Observation> {
        let Some(pipeline) = &self.pipeline else {
            return vec![];
        };
        let frame_decoder = FrameDecoder::for_orientation(orientation, bounds);
        let scale = ScaleFactors::for_bounds(&bounds, self.model_width, self.model_height);

        dispatch_layers(
            self.device.as_ref(),
            pipeline,
            layers,
            self.model_width,
            self.model_height,
            KernelOutput::InPlace,
            move |args, geometry| collect_activated(&args.data.read_f32(), geometry, &frame_decoder, scale),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection_runners::compute::{FeatureTier, HostComputeDevice, KernelLibrary};
    use crate::detection_runners::cpu_decoder::CpuDecoder;

    fn device() -> Arc<dyn ComputeDevice> {
        Arc::new(HostComputeDevice::new(2).unwrap().with_feature_tier(FeatureTier::Tier1))
    }

    /// 2 boxes on a 3x2 grid, 3 classes, a handful of hot cells.
    fn layers() -> Vec<RawLayerOutput> {
        let channels = 8;
        let mut data = vec![-8.; 2 * 3 * 2 * channels];
        for (cell, objectness) in [(1, 4.), (4, 0.5), (9, 2.)] {
            let base = cell * channels;
            data[base..base + 4].copy_from_slice(&[0.3, 0.7, -0.4, 0.9]);
            data[base + 4] = objectness;
            data[base + 5] = 1.;
            data[base + 7] = -1.;
        }
        vec![RawLayerOutput::from_shape_vec(&[1, 2, 3, 2, channels], data).unwrap()]
    }

    #[test]
    fn matches_cpu_decoder() {
        let bounds = BoundingRect::new(0., 0., 640., 480.);
        for orientation in [Orientation::Portrait, Orientation::LandscapeRight] {
            let expected = CpuDecoder::new(96, 96).process(&layers(), bounds, orientation);
            let decoded = HybridDecoder::new(device(), 96, 96).process(&layers(), bounds, orientation);
            assert_eq!(decoded.len(), 3);
            assert_eq!(decoded, expected);
            for (decoded, expected) in decoded.iter().zip(&expected) {
                assert_eq!(decoded.objects, expected.objects);
            }
        }
    }

    #[test]
    fn missing_kernel_reports_nothing() {
        let device: Arc<dyn ComputeDevice> = Arc::new(
            HostComputeDevice::new(1).unwrap().with_library(KernelLibrary::empty())
        );
        let decoder = HybridDecoder::new(device, 96, 96);
        assert!(decoder.process(&layers(), BoundingRect::from_size(96., 96.), Orientation::Portrait).is_empty());
    }
}
