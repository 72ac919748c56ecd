use serde::{Deserialize, Serialize};
use crate::common::{BoundingRect, Orientation};

/// A decoded box in model input space, centre based.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RawBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    fn left(&self) -> f32 {
        self.x - self.width / 2.
    }

    fn top(&self) -> f32 {
        self.y - self.height / 2.
    }
}

/// Canvas pixels per model pixel, per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub horizontal: f32,
    pub vertical: f32,
}

impl ScaleFactors {
    pub fn new(horizontal: f32, vertical: f32) -> Self {
        Self { horizontal, vertical }
    }

    pub fn for_bounds(bounds: &BoundingRect, input_width: u32, input_height: u32) -> Self {
        Self::new(bounds.width() / input_width as f32, bounds.height() / input_height as f32)
    }
}

/// Maps model space boxes onto the canvas for one device orientation.
///
/// The width and height are computed first since the mirrored variants place the
/// origin against the far canvas edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameDecoder {
    Portrait,
    LandscapeLeft { bounds: BoundingRect },
    LandscapeRight { bounds: BoundingRect },
    UpsideDown { bounds: BoundingRect },
}

impl FrameDecoder {
    pub fn for_orientation(orientation: Orientation, bounds: BoundingRect) -> Self {
        match orientation {
            Orientation::Portrait => FrameDecoder::Portrait,
            Orientation::LandscapeLeft => FrameDecoder::LandscapeLeft { bounds },
            Orientation::LandscapeRight => FrameDecoder::LandscapeRight { bounds },
            Orientation::UpsideDown => FrameDecoder::UpsideDown { bounds },
        }
    }

    pub fn compute_width(&self, raw: &RawBox, scale: ScaleFactors) -> f32 {
        match self {
            FrameDecoder::Portrait | FrameDecoder::UpsideDown { .. } => raw.width * scale.horizontal,
            FrameDecoder::LandscapeLeft { .. } | FrameDecoder::LandscapeRight { .. } => raw.height * scale.horizontal,
        }
    }

    pub fn compute_height(&self, raw: &RawBox, scale: ScaleFactors) -> f32 {
        match self {
            FrameDecoder::Portrait | FrameDecoder::UpsideDown { .. } => raw.height * scale.vertical,
            FrameDecoder::LandscapeLeft { .. } | FrameDecoder::LandscapeRight { .. } => raw.width * scale.vertical,
        }
    }

    pub fn compute_x(&self, raw: &RawBox, width: f32, scale: ScaleFactors) -> f32 {
        match self {
            FrameDecoder::Portrait => raw.left() * scale.horizontal,
            FrameDecoder::LandscapeLeft { bounds } => (bounds.width() - width) - raw.top() * scale.horizontal,
            FrameDecoder::LandscapeRight { .. } => raw.top() * scale.horizontal,
            FrameDecoder::UpsideDown { bounds } => (bounds.width() - width) - raw.left() * scale.horizontal,
        }
    }

    pub fn compute_y(&self, raw: &RawBox, height: f32, scale: ScaleFactors) -> f32 {
        match self {
            FrameDecoder::Portrait => raw.top() * scale.vertical,
            FrameDecoder::LandscapeLeft { .. } => raw.left() * scale.vertical,
            FrameDecoder::LandscapeRight { bounds } => (bounds.height() - height) - raw.left() * scale.vertical,
            FrameDecoder::UpsideDown { bounds } => (bounds.height() - height) - raw.top() * scale.vertical,
        }
    }

    /// Canvas rectangle of a model space box.
    pub fn decode(&self, raw: &RawBox, scale: ScaleFactors) -> BoundingRect {
        let width = self.compute_width(raw, scale);
        let height = self.compute_height(raw, scale);
        let x = self.compute_x(raw, width, scale);
        let y = self.compute_y(raw, height, scale);
        BoundingRect::new(x, y, width, height)
    }
}
