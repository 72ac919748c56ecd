pub mod buffer;
pub mod device;
pub mod kernels;

pub use buffer::*;
pub use device::*;
pub use kernels::{DECODE_KERNEL, HYBRID_DECODE_KERNEL};

use std::sync::Arc;
use crossbeam_utils::sync::WaitGroup;
use parking_lot::Mutex;
use crate::common::Observation;
use crate::data::{LayerGeometry, RawLayerOutput, CONFIDENCE_THRESHOLD};
use crate::detection_processing::resolve_layer;

/// Where a kernel leaves its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KernelOutput {
    /// Appended to a result buffer sized for every `(cell, class)` pair.
    Records,
    /// Written back into the uploaded tensor.
    InPlace,
}

/// Dispatches `pipeline` once per decodable layer and blocks until every
/// dispatched layer has been read back.
///
/// `readback` runs in each layer's completion handler. Results are concatenated
/// in layer order regardless of the order in which layers complete.
pub(crate) fn dispatch_layers<F>(device: &dyn ComputeDevice, pipeline: &ComputePipeline,
                                 layers: &[RawLayerOutput], input_width: u32, input_height: u32,
                                 output: KernelOutput, readback: F) -> Vec<Observation>
where
    F: Fn(&KernelArgs, &LayerGeometry) -> Vec<Observation> + Send + Sync + 'static,
{
    let readback = Arc::new(readback);
    let results: Arc<Vec<Mutex<Vec<Observation>>>> =
        Arc::new((0..layers.len()).map(|_| Mutex::new(Vec::new())).collect());
    let wait_group = WaitGroup::new();

    for (index, layer) in layers.iter().enumerate() {
        let Some((geometry, anchors)) = resolve_layer(layer, index, input_width, input_height) else {
            continue;
        };
        let Some(setup) = LayerSetup::from_geometry(&geometry, CONFIDENCE_THRESHOLD) else {
            log::debug!("Skipping layer {index}: too large for {}", device.name());
            continue;
        };

        let args = KernelArgs {
            data: Arc::new(DeviceBuffer::from_f32(layer.as_slice())),
            setup,
            anchors,
            output: (output == KernelOutput::Records)
                .then(|| Arc::new(ResultBuffer::with_capacity(geometry.max_records()))),
        };

        let results = Arc::clone(&results);
        let readback = Arc::clone(&readback);
        let layer_done = wait_group.clone();
        device.dispatch(pipeline, GridSize::for_layer(&geometry), args, Box::new(move |args| {
            let observations = (*readback)(&args, &geometry);
            *results[index].lock() = observations;
            drop(layer_done);
        }));
    }

    wait_group.wait();

    results
        .iter()
        .flat_map(|slot| std::mem::take(&mut *slot.lock()))
        .collect()
}
