use std::sync::Arc;
use crate::common::{BoundingRect, DecoderType, Observation, ObservationItem, Orientation};
use crate::data::RawLayerOutput;
use crate::detection_processing::group_observations;
use crate::detection_runners::compute::{dispatch_layers, ComputeDevice, ComputePipeline, KernelOutput, DECODE_KERNEL};
use crate::detection_runners::decode_process::DecodeProcess;
use crate::detection_runners::frame_decoder::{FrameDecoder, RawBox, ScaleFactors};

/// Decoder running the whole per cell decode on a compute device.
///
/// Every cell is one kernel invocation; surviving `(cell, class)` pairs are appended
/// to a per layer result buffer and regrouped on the host after readback.
#[derive(Debug)]
pub struct ParallelDecoder {
    model_width: u32,
    model_height: u32,
    device: Arc<dyn ComputeDevice>,
    pipeline: Option<ComputePipeline>,
}

impl ParallelDecoder {
    pub fn new(device: Arc<dyn ComputeDevice>, model_width: u32, model_height: u32) -> Self {
        let pipeline = match device.make_pipeline(DECODE_KERNEL) {
            Ok(pipeline) => Some(pipeline),
            Err(err) => {
                log::warn!("{err}, parallel decoder will report no detections");
                None
            }
        };
        Self { model_width, model_height, device, pipeline }
    }
}

impl DecodeProcess for ParallelDecoder {
    fn decoder_type(&self) -> DecoderType {
        DecoderType::Parallel
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
            KernelOutput::Records,
            move |args, _geometry| {
                let mut records = args.output
                    .as_ref()
                    .map(|output| output.read_records())
                    .unwrap_or_default();
                // append order depends on scheduling
                records.sort_unstable_by_key(|record| (record.cell, record.class_id));

                group_observations(records.into_iter().map(|record| {
                    let raw = RawBox::new(record.x, record.y, record.width, record.height);
                    (
                        frame_decoder.decode(&raw, scale),
                        record.objectness,
                        ObservationItem::new(record.class_id as usize, record.score),
                    )
                }))
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection_runners::compute::{HostComputeDevice, KernelLibrary};
    use crate::detection_runners::cpu_decoder::CpuDecoder;

    fn device() -> Arc<dyn ComputeDevice> {
        Arc::new(HostComputeDevice::new(2).unwrap())
    }

    /// 1 box, 2x2 grid, 2 classes with two hot cells.
    fn layer() -> RawLayerOutput {
        let mut data = vec![-10.; 2 * 2 * 7];
        for base in [0, 21] {
            data[base..base + 4].copy_from_slice(&[0.5, -0.5, 0.1, 0.2]);
            data[base + 4] = 3.;
            data[base + 5] = 2.;
            data[base + 6] = 1.;
        }
        RawLayerOutput::from_shape_vec(&[1, 1, 2, 2, 7], data).unwrap()
    }

    #[test]
    fn matches_cpu_decoder() {
        let bounds = BoundingRect::new(10., 20., 300., 200.);
        for orientation in [Orientation::Portrait, Orientation::LandscapeLeft, Orientation::LandscapeRight, Orientation::UpsideDown] {
            let expected = CpuDecoder::new(64, 64).process(&[layer()], bounds, orientation);
            let decoded = ParallelDecoder::new(device(), 64, 64).process(&[layer()], bounds, orientation);
            assert_eq!(decoded.len(), 2);
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
        let decoder = ParallelDecoder::new(device, 64, 64);
        assert!(decoder.process(&[layer()], BoundingRect::from_size(64., 64.), Orientation::Portrait).is_empty());
    }

    #[test]
    fn no_layers_no_dispatch() {
        let decoder = ParallelDecoder::new(device(), 64, 64);
        assert!(decoder.process(&[], BoundingRect::from_size(64., 64.), Orientation::Portrait).is_empty());
    }
}
