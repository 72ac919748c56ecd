use std::collections::HashMap;
use std::sync::Arc;
use anyhow::{anyhow, Result};
use rayon::prelude::*;
use crate::data::{AnchorPair, LayerGeometry, ANCHORS_PER_LAYER};
use crate::detection_runners::compute::buffer::{DeviceBuffer, ResultBuffer};
use crate::detection_runners::compute::kernels;

/// Capability level of a compute device.
///
/// `Tier2` devices run the full decode, thresholding and atomic result append
/// included, on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureTier {
    Tier1,
    Tier2,
}

/// Extent of a dispatch: one invocation per `(x, y, z)` position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl GridSize {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self { width, height, depth }
    }

    /// `cols x rows x boxes`, one invocation per layer cell.
    pub fn for_layer(geometry: &LayerGeometry) -> Self {
        Self::new(geometry.cols, geometry.rows, geometry.boxes)
    }

    pub fn len(&self) -> usize {
        self.width * self.height * self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self, index: usize) -> GridPosition {
        GridPosition {
            x: index % self.width,
            y: (index / self.width) % self.height,
            z: index / (self.width * self.height),
        }
    }
}

/// Layer geometry in the form uploaded next to the tensor.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerSetup {
    pub class_count: u32,
    pub confidence_threshold: f32,
    pub channel_stride: u32,
    pub vertical_stride: u32,
    pub horizontal_stride: u32,
    pub boxes: u32,
    pub rows: u32,
    pub cols: u32,
    pub vertical_block_size: f32,
    pub horizontal_block_size: f32,
}

impl LayerSetup {
    /// `None` when a dimension does not fit the 32-bit device layout.
    pub fn from_geometry(geometry: &LayerGeometry, confidence_threshold: f32) -> Option<Self> {
        Some(Self {
            class_count: u32::try_from(geometry.class_count).ok()?,
            confidence_threshold,
            channel_stride: u32::try_from(geometry.channel_stride).ok()?,
            vertical_stride: u32::try_from(geometry.vertical_stride).ok()?,
            horizontal_stride: u32::try_from(geometry.horizontal_stride).ok()?,
            boxes: u32::try_from(geometry.boxes).ok()?,
            rows: u32::try_from(geometry.rows).ok()?,
            cols: u32::try_from(geometry.cols).ok()?,
            vertical_block_size: geometry.vertical_block_size,
            horizontal_block_size: geometry.horizontal_block_size,
        })
    }

    pub fn contains(&self, position: GridPosition) -> bool {
        position.x < self.cols as usize && position.y < self.rows as usize && position.z < self.boxes as usize
    }

    pub fn base_index(&self, position: GridPosition) -> usize {
        position.z * self.channel_stride as usize
            + position.y * self.vertical_stride as usize
            + position.x * self.horizontal_stride as usize
    }

    pub fn cell_index(&self, position: GridPosition) -> u32 {
        ((position.z * self.rows as usize + position.y) * self.cols as usize + position.x) as u32
    }
}

/// Buffers bound to a dispatch.
#[derive(Debug, Clone)]
pub struct KernelArgs {
    pub data: Arc<DeviceBuffer>,
    pub setup: LayerSetup,
    pub anchors: [AnchorPair; ANCHORS_PER_LAYER],
    /// Present for kernels that append results instead of working in place.
    pub output: Option<Arc<ResultBuffer>>,
}

pub type KernelFn = fn(&KernelArgs, GridPosition);

/// Called once a dispatch completed, on one of the device's threads.
pub type CompletionHandler = Box<dyn FnOnce(KernelArgs) + Send + 'static>;

/// A kernel ready to be dispatched.
#[derive(Clone)]
pub struct ComputePipeline {
    name: String,
    kernel: KernelFn,
}

impl ComputePipeline {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for ComputePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputePipeline").field("name", &self.name).finish()
    }
}

/// Named kernels a device can build pipelines from.
#[derive(Clone, Default)]
pub struct KernelLibrary {
    kernels: HashMap<String, KernelFn>,
}

impl KernelLibrary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The decode kernels shipped with the crate.
    pub fn standard() -> Self {
        Self::empty()
            .with_kernel(kernels::DECODE_KERNEL, kernels::decode_yolo5)
            .with_kernel(kernels::HYBRID_DECODE_KERNEL, kernels::decode_yolo5_hybrid)
    }

    pub fn with_kernel(mut self, name: &str, kernel: KernelFn) -> Self {
        self.kernels.insert(name.to_string(), kernel);
        self
    }

    pub fn get(&self, name: &str) -> Option<KernelFn> {
        self.kernels.get(name).copied()
    }
}

impl std::fmt::Debug for KernelLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.kernels.keys()).finish()
    }
}

pub trait ComputeDevice: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    fn feature_tier(&self) -> FeatureTier;

    fn supports_tier(&self, tier: FeatureTier) -> bool {
        self.feature_tier() >= tier
    }

    /// Builds a pipeline for a named kernel. Fails when the kernel is unknown.
    fn make_pipeline(&self, kernel_name: &str) -> Result<ComputePipeline>;

    /// Runs `pipeline` once per grid position and returns immediately.
    ///
    /// `completion` receives the bound buffers after every invocation finished.
    fn dispatch(&self, pipeline: &ComputePipeline, grid: GridSize, args: KernelArgs, completion: CompletionHandler);
}

/// Compute device running kernels on a dedicated rayon thread pool.
#[derive(Debug)]
pub struct HostComputeDevice {
    name: String,
    feature_tier: FeatureTier,
    library: KernelLibrary,
    pool: Arc<rayon::ThreadPool>,
}

impl HostComputeDevice {
    /// Creates a device with `threads` workers, 0 meaning one per logical core.
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("compute-{i}"))
            .panic_handler(|_| log::error!("Compute kernel panicked, its layer yields no detections"))
            .build()?;

        Ok(Self {
            name: format!("Host compute ({} threads)", pool.current_num_threads()),
            feature_tier: FeatureTier::Tier2,
            library: KernelLibrary::standard(),
            pool: Arc::new(pool),
        })
    }

    pub fn with_feature_tier(mut self, feature_tier: FeatureTier) -> Self {
        self.feature_tier = feature_tier;
        self
    }

    pub fn with_library(mut self, library: KernelLibrary) -> Self {
        self.library = library;
        self
    }

    /// The default device of this machine, if one can be created.
    pub fn system_default() -> Option<Arc<dyn ComputeDevice>> {
        match Self::new(0) {
            Ok(device) => {
                log::info!("Compute device: {}", device.name);
                Some(Arc::new(device))
            }
            Err(err) => {
                log::warn!("{err}, no compute device available");
                None
            }
        }
    }
}

impl ComputeDevice for HostComputeDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_tier(&self) -> FeatureTier {
        self.feature_tier
    }

    fn make_pipeline(&self, kernel_name: &str) -> Result<ComputePipeline> {
        let kernel = self.library
            .get(kernel_name)
            .ok_or_else(|| anyhow!("Kernel `{kernel_name}` not found on {}", self.name))?;
        Ok(ComputePipeline { name: kernel_name.to_string(), kernel })
    }

    fn dispatch(&self, pipeline: &ComputePipeline, grid: GridSize, args: KernelArgs, completion: CompletionHandler) {
        let kernel = pipeline.kernel;
        self.pool.spawn(move || {
            (0..grid.len())
                .into_par_iter()
                .for_each(|index| kernel(&args, grid.position(index)));
            completion(args);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn grid_positions_cover_every_cell() {
        let grid = GridSize::new(4, 3, 2);
        assert_eq!(grid.len(), 24);
        assert_eq!(grid.position(0), GridPosition { x: 0, y: 0, z: 0 });
        assert_eq!(grid.position(5), GridPosition { x: 1, y: 1, z: 0 });
        assert_eq!(grid.position(23), GridPosition { x: 3, y: 2, z: 1 });
    }

    #[test]
    fn missing_kernel_fails_pipeline_build() {
        let device = HostComputeDevice::new(1).unwrap().with_library(KernelLibrary::empty());
        assert!(device.make_pipeline(kernels::DECODE_KERNEL).is_err());

        let device = HostComputeDevice::new(1).unwrap();
        assert_eq!(device.make_pipeline(kernels::DECODE_KERNEL).unwrap().name(), kernels::DECODE_KERNEL);
    }

    #[test]
    fn tiers_are_ordered() {
        let device = HostComputeDevice::new(1).unwrap().with_feature_tier(FeatureTier::Tier1);
        assert!(device.supports_tier(FeatureTier::Tier1));
        assert!(!device.supports_tier(FeatureTier::Tier2));
    }

    fn fill_cell(args: &KernelArgs, position: GridPosition) {
        let index = args.setup.cell_index(position) as usize;
        args.data.store_f32(index, index as f32);
    }

    #[test]
    fn dispatch_runs_every_invocation_before_completion() {
        let device = HostComputeDevice::new(2)
            .unwrap()
            .with_library(KernelLibrary::empty().with_kernel("fill", fill_cell));
        let pipeline = device.make_pipeline("fill").unwrap();

        let geometry = LayerGeometry {
            boxes: 2,
            rows: 3,
            cols: 4,
            channel_stride: 12,
            vertical_stride: 4,
            horizontal_stride: 1,
            vertical_block_size: 1.,
            horizontal_block_size: 1.,
            class_count: 0,
        };
        let args = KernelArgs {
            data: Arc::new(DeviceBuffer::zeroed(24)),
            setup: LayerSetup::from_geometry(&geometry, 0.).unwrap(),
            anchors: [AnchorPair::default(); ANCHORS_PER_LAYER],
            output: None,
        };

        let (tx, rx) = bounded(1);
        device.dispatch(&pipeline, GridSize::for_layer(&geometry), args, Box::new(move |args| {
            tx.send(args.data.read_f32()).unwrap();
        }));
        let values = rx.recv().unwrap();
        assert_eq!(values, (0..24).map(|i| i as f32).collect::<Vec<_>>());
    }
}
