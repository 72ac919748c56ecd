mod anchors;
mod class_info;
mod config_detector;
mod layer_geometry;
mod layer_output;
mod time_calc;
pub mod send_channels;

pub use anchors::{AnchorPair, AnchorTable, ANCHORS, ANCHORS_PER_LAYER};
pub use class_info::{ClassCatalog, DetectionClassInfo};
pub use config_detector::DetectorConfig;
pub use layer_geometry::{LayerGeometry, BOX_CHANNELS, LAYER_RANK};
pub use layer_output::RawLayerOutput;
pub use send_channels::{detection_channels, DetectionRequest, DetectionState, QueuedRequest, SendState};
pub use time_calc::TimeCalc;

/// Minimum objectness, and minimum per class score, for a detection to be kept.
pub const CONFIDENCE_THRESHOLD: f32 = 0.05;

/// Overlap above which the lower scoring of two detections is suppressed.
pub const IOU_THRESHOLD: f32 = 0.2;

/// Maximum number of detections returned for one frame.
pub const MAX_BOUNDING_BOXES: usize = 32;
