use serde::{Deserialize, Serialize};
use crate::data::RawLayerOutput;

/// Number of leading channels per cell before the class logits: x, y, w, h, objectness.
pub const BOX_CHANNELS: usize = 5;

/// Expected rank of a layer tensor: batch, boxes, rows, cols, channels.
pub const LAYER_RANK: usize = 5;

/// Geometry of one detection layer, derived once per call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerGeometry {
    pub boxes: usize,
    pub rows: usize,
    pub cols: usize,
    pub channel_stride: usize,
    pub vertical_stride: usize,
    pub horizontal_stride: usize,
    /// Model input pixels covered by one grid row.
    pub vertical_block_size: f32,
    /// Model input pixels covered by one grid column.
    pub horizontal_block_size: f32,
    pub class_count: usize,
}

impl LayerGeometry {
    /// Resolves the layer geometry from a tensor and the fixed model input size.
    ///
    /// Returns `None` when the tensor cannot be decoded as a detection layer: wrong
    /// rank, no room for box channels, an empty grid, a zero input size, or a buffer
    /// that does not cover every addressed cell.
    pub fn resolve(layer: &RawLayerOutput, input_width: u32, input_height: u32) -> Option<Self> {
        let shape = layer.shape();
        if shape.len() != LAYER_RANK || input_width == 0 || input_height == 0 {
            return None;
        }
        let (boxes, rows, cols, channels) = (shape[1], shape[2], shape[3], shape[4]);
        if boxes == 0 || rows == 0 || cols == 0 || channels < BOX_CHANNELS {
            return None;
        }

        let strides = layer.strides();
        let geometry = Self {
            boxes,
            rows,
            cols,
            channel_stride: strides[1],
            vertical_stride: strides[2],
            horizontal_stride: strides[3],
            vertical_block_size: input_height as f32 / rows as f32,
            horizontal_block_size: input_width as f32 / cols as f32,
            class_count: channels - BOX_CHANNELS,
        };

        let last_cell = geometry.base_index(boxes - 1, rows - 1, cols - 1);
        if last_cell + channels > layer.as_slice().len() {
            return None;
        }
        Some(geometry)
    }

    /// Flat index of the first channel of a cell.
    pub fn base_index(&self, bx: usize, row: usize, col: usize) -> usize {
        bx * self.channel_stride + row * self.vertical_stride + col * self.horizontal_stride
    }

    pub fn cell_count(&self) -> usize {
        self.boxes * self.rows * self.cols
    }

    /// Upper bound of `(cell, class)` pairs a layer can produce.
    pub fn max_records(&self) -> usize {
        self.cell_count() * self.class_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(shape: &[usize]) -> RawLayerOutput {
        let len = shape.iter().product();
        RawLayerOutput::from_shape_vec(shape, vec![0.; len]).unwrap()
    }

    #[test]
    fn resolves_yolo_layer() {
        let geometry = LayerGeometry::resolve(&layer(&[1, 3, 20, 10, 8]), 320, 640).unwrap();
        assert_eq!(geometry.boxes, 3);
        assert_eq!(geometry.rows, 20);
        assert_eq!(geometry.cols, 10);
        assert_eq!(geometry.class_count, 3);
        assert_eq!(geometry.horizontal_stride, 8);
        assert_eq!(geometry.vertical_stride, 80);
        assert_eq!(geometry.channel_stride, 1600);
        assert_eq!(geometry.vertical_block_size, 32.);
        assert_eq!(geometry.horizontal_block_size, 32.);
        assert_eq!(geometry.base_index(1, 2, 3), 1600 + 160 + 24);
        assert_eq!(geometry.max_records(), 600 * 3);
    }

    #[test]
    fn rejects_wrong_rank() {
        assert!(LayerGeometry::resolve(&layer(&[3, 20, 20, 8]), 640, 640).is_none());
        assert!(LayerGeometry::resolve(&layer(&[1, 1, 3, 20, 20, 8]), 640, 640).is_none());
    }

    #[test]
    fn rejects_degenerate_shapes() {
        assert!(LayerGeometry::resolve(&layer(&[1, 3, 4, 4, 4]), 640, 640).is_none());
        assert!(LayerGeometry::resolve(&layer(&[1, 3, 0, 4, 8]), 640, 640).is_none());
        assert!(LayerGeometry::resolve(&layer(&[1, 3, 4, 4, 8]), 0, 640).is_none());
    }

    #[test]
    fn class_free_layer_is_valid() {
        let geometry = LayerGeometry::resolve(&layer(&[1, 1, 2, 2, 5]), 64, 64).unwrap();
        assert_eq!(geometry.class_count, 0);
        assert_eq!(geometry.max_records(), 0);
    }
}
